//! Route table.
//!
//! Maps `(method, path)` pairs to operations. Endpoints stay thin: they
//! shape carrier data into typed requests, dispatch through the mediator,
//! and wrap the result in the success envelope. All failures propagate as
//! faults for the boundary translator.

use crate::state::AppState;
use bytes::Bytes;
use http::{header, Method, Response, StatusCode};
use http_body_util::Full;
use keel_core::{ApiResponse, AppContext, Fault};
use keel_service::{render_header, HealthRequest, LoginRequest};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Wire model for the login endpoint body.
#[derive(Debug, Deserialize)]
struct LoginModel {
    username: String,
    password: String,
}

/// Dispatches one operation to its endpoint.
pub async fn dispatch(
    state: &AppState,
    ctx: &AppContext,
    method: &Method,
    path: &str,
    body: &[u8],
    cancel: &CancellationToken,
) -> Result<Response<Full<Bytes>>, Fault> {
    match (method, path) {
        (&Method::GET, "/") => status(state),
        (&Method::GET, "/health") => health(state, ctx, cancel).await,
        (&Method::POST, "/api/v1/auth/login") => login(state, body, cancel).await,
        (&Method::GET, "/api/v1/auth/validate") => validate_token(state, ctx),
        (&Method::GET, "/api/v1/hello") => hello(state),
        _ => Err(Fault::declared("resource_not_found", StatusCode::NOT_FOUND)),
    }
}

/// `GET /`: bare liveness answer.
fn status(state: &AppState) -> Result<Response<Full<Bytes>>, Fault> {
    ok(state, "Healthy")
}

/// `GET /health`: aggregated health report.
async fn health(
    state: &AppState,
    ctx: &AppContext,
    cancel: &CancellationToken,
) -> Result<Response<Full<Bytes>>, Fault> {
    let request = HealthRequest {
        origin: ctx.origin_address(),
        headers: ctx
            .headers()
            .iter()
            .map(|(name, value)| render_header(name, value))
            .collect(),
    };
    let report = state.mediator.send(request, cancel).await?;
    ok(state, report)
}

/// `POST /api/v1/auth/login`: credential exchange for a token grant.
async fn login(
    state: &AppState,
    body: &[u8],
    cancel: &CancellationToken,
) -> Result<Response<Full<Bytes>>, Fault> {
    let model: LoginModel = serde_json::from_slice(body)
        .map_err(|_| Fault::bad_request("request_body_is_invalid"))?;

    let grant = state
        .mediator
        .send(LoginRequest::new(model.username, model.password), cancel)
        .await?;
    ok(state, grant)
}

/// `GET /api/v1/auth/validate`: echoes the authenticated caller's name.
fn validate_token(state: &AppState, ctx: &AppContext) -> Result<Response<Full<Bytes>>, Fault> {
    let user_name = ctx.user_name()?;
    ok(state, format!("your token is valid {user_name}"))
}

/// `GET /api/v1/hello`: demo endpoint.
fn hello(state: &AppState) -> Result<Response<Full<Bytes>>, Fault> {
    ok(state, "Hello World!")
}

/// Wraps `data` in the success envelope.
fn ok<T: Serialize>(state: &AppState, data: T) -> Result<Response<Full<Bytes>>, Fault> {
    let envelope = ApiResponse::new(state.version(), data);
    let payload = serde_json::to_vec(&envelope)
        .map_err(|e| Fault::unclassified_from("response envelope did not serialize", e))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(payload)))
        .map_err(|e| Fault::unclassified_from("response did not build", e))
}
