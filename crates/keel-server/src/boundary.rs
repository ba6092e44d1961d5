//! Outermost request boundary.
//!
//! Every operation passes through here exactly once. The boundary starts
//! the elapsed-time measurement, builds the per-operation context, routes
//! the request, and, whatever happens below, writes exactly one
//! response and emits exactly one structured log record. Faults never
//! escape: classification into the wire taxonomy happens here and nowhere
//! else.

use crate::claims::decode_claims;
use crate::routes;
use crate::state::AppState;
use bytes::Bytes;
use http::request::Parts;
use http::{header, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use keel_core::{ApiError, AppContext, Fault, LogDetail};
use std::net::SocketAddr;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Paths excluded from per-request access logging.
const UNLOGGED_PATH_PREFIX: &str = "/swagger";

/// Serves one inbound operation end to end.
pub async fn handle(
    state: AppState,
    request: Request<Incoming>,
    peer: SocketAddr,
    cancel: CancellationToken,
) -> Response<Full<Bytes>> {
    let started = Instant::now();
    let (parts, body) = request.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => {
            let fault = Fault::unclassified_from("request body read failed", error);
            let ctx = build_context(&state, &parts, peer);
            return translate(&state, &ctx, &parts, started, &fault);
        }
    };

    let ctx = build_context(&state, &parts, peer);

    match routes::dispatch(
        &state,
        &ctx,
        &parts.method,
        parts.uri.path(),
        &body,
        &cancel,
    )
    .await
    {
        Ok(response) => {
            access_log(&state, &ctx, &parts, started, response.status());
            response
        }
        Err(fault) => translate(&state, &ctx, &parts, started, &fault),
    }
}

/// Builds the per-operation context from the carrier.
fn build_context(state: &AppState, parts: &Parts, peer: SocketAddr) -> AppContext {
    let claims = decode_claims(&parts.headers, &state.settings.auth.jwt_secret);
    AppContext::new(
        parts.headers.clone(),
        Some(peer.ip()),
        claims,
        state.settings.auth.system.clone(),
        Some(state.settings.localization.header_name.clone()),
    )
}

/// Classifies a fault and writes the error response.
///
/// Side effects always run in this order: stop the timer, assemble the
/// log record (identity best-effort), emit it, then build one fresh
/// response with the mapped status, serialized error envelope, and the
/// cross-origin-allow header.
fn translate(
    state: &AppState,
    ctx: &AppContext,
    parts: &Parts,
    started: Instant,
    fault: &Fault,
) -> Response<Full<Bytes>> {
    let status = fault.status();

    let mut detail = base_detail(ctx, parts, started, status);
    detail.record_fault(fault);
    detail.emit();

    let envelope = ApiError::new(state.version(), fault.client_message(), fault.kind());
    // The envelope is all strings; the static fallback only exists so the
    // boundary can never fail to produce a body.
    let payload = serde_json::to_vec(&envelope)
        .unwrap_or_else(|_| br#"{"message":"internal_server_error"}"#.to_vec());

    let builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");

    builder
        .body(Full::new(Bytes::from(payload)))
        .unwrap_or_else(|_| {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

/// Emits the per-operation record for non-fault paths.
fn access_log(
    state: &AppState,
    ctx: &AppContext,
    parts: &Parts,
    started: Instant,
    status: StatusCode,
) {
    if !state.settings.log.requests || parts.uri.path().starts_with(UNLOGGED_PATH_PREFIX) {
        return;
    }
    base_detail(ctx, parts, started, status).emit();
}

/// Assembles the transport, carrier, and identity attributes.
fn base_detail(ctx: &AppContext, parts: &Parts, started: Instant, status: StatusCode) -> LogDetail {
    let mut detail = LogDetail::new();
    detail.host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| host.split(':').next().unwrap_or(host).to_string())
        .unwrap_or_default();
    detail.protocol = format!("{:?}", parts.version);
    detail.method = parts.method.to_string();
    detail.path = parts.uri.path().to_string();
    detail.path_and_query = parts
        .uri
        .path_and_query()
        .map(ToString::to_string)
        .unwrap_or_else(|| parts.uri.path().to_string());
    detail.status = status.as_u16();
    detail.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    detail.capture_carrier(ctx);
    detail.capture_identity(ctx);
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;
    use http_body_util::BodyExt;
    use keel_config::Settings;
    use serde_json::Value;

    fn state() -> AppState {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        bootstrap::build_state(settings)
    }

    fn parts(method: &str, uri: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "svc.local:8080")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    fn context(state: &AppState, parts: &Parts) -> AppContext {
        build_context(state, parts, "10.0.0.7:55555".parse().unwrap())
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_fault_translates_to_400_with_generic_message() {
        let state = state();
        let parts = parts("POST", "/api/v1/auth/login");
        let ctx = context(&state, &parts);

        let mut errors = keel_core::FieldErrors::new();
        errors.add("user_name", "user_name_should_not_be_empty");
        let fault = Fault::validation(errors);

        let response = translate(&state, &ctx, &parts, Instant::now(), &fault);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );

        let json = body_json(response).await;
        // Field detail is logged, never returned.
        assert_eq!(json["message"], "request_model_is_invalid");
        assert_eq!(json["exceptionType"], "validation");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn declared_fault_keeps_status_and_message() {
        let state = state();
        let parts = parts("GET", "/api/v1/auth/validate");
        let ctx = context(&state, &parts);

        let fault = Fault::declared("invalid_token", StatusCode::UNAUTHORIZED);
        let response = translate(&state, &ctx, &parts, Instant::now(), &fault);

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["message"], "invalid_token");
        assert_eq!(json["exceptionType"], "info");
    }

    #[tokio::test]
    async fn unclassified_fault_hides_internal_text() {
        let state = state();
        let parts = parts("GET", "/health");
        let ctx = context(&state, &parts);

        let fault = Fault::unclassified("pool exhausted at 10.0.0.3:5432");
        let response = translate(&state, &ctx, &parts, Instant::now(), &fault);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "internal_server_error");
        assert_eq!(json["exceptionType"], "undefined");
    }

    #[test]
    fn base_detail_captures_transport_attributes() {
        let state = state();
        let parts = parts("GET", "/health?verbose=1");
        let ctx = context(&state, &parts);

        let detail = base_detail(&ctx, &parts, Instant::now(), StatusCode::OK);
        assert_eq!(detail.host, "svc.local");
        assert_eq!(detail.method, "GET");
        assert_eq!(detail.path, "/health");
        assert_eq!(detail.path_and_query, "/health?verbose=1");
        assert_eq!(detail.status, 200);
        assert_eq!(detail.ip, "10.0.0.7");
    }
}
