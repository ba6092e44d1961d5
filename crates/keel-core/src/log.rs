//! Per-operation structured log record.
//!
//! One [`LogDetail`] is assembled per operation at the boundary and
//! emitted as a single record with named fields. Transport attributes are
//! always present; identity attributes only when the carrier's system tag
//! matched; failure attributes only on fault paths. Identity capture is
//! best-effort: extraction failures are swallowed here because the record
//! must never prevent the response from being written.

use crate::context::AppContext;
use crate::error::{ErrorKind, Fault, FieldErrors};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Aggregate assembled once per operation.
#[derive(Debug, Default)]
pub struct LogDetail {
    /// Request authority (host without port).
    pub host: String,
    /// Transport protocol version, e.g. `HTTP/1.1`.
    pub protocol: String,
    /// Request method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Path including the query string.
    pub path_and_query: String,
    /// Response status written for this operation.
    pub status: u16,
    /// Elapsed time from operation entry, whole milliseconds.
    pub elapsed_ms: u64,
    /// Client network origin.
    pub ip: String,
    /// Machine handling the operation.
    pub machine: String,
    /// Caller locale, when the configured header resolved.
    pub culture: Option<String>,
    /// All carrier headers.
    pub headers: BTreeMap<String, String>,
    /// Request body, when captured.
    pub body: Option<String>,
    /// Authenticated flag, present only with a matching system tag.
    pub is_authenticated: Option<bool>,
    /// Caller user id, present only with a matching system tag.
    pub user_id: Option<Uuid>,
    /// Caller session id, present only with a matching system tag.
    pub session_id: Option<Uuid>,
    /// Fault diagnostic text, on failure paths.
    pub fault: Option<String>,
    /// Wire classification of the fault.
    pub fault_kind: Option<ErrorKind>,
    /// Field-level validation detail, logged but never returned.
    pub field_errors: Option<FieldErrors>,
}

impl LogDetail {
    /// Creates an empty record stamped with this machine's name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            machine: hostname::get()
                .ok()
                .and_then(|name| name.into_string().ok())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Captures carrier attributes: headers, locale, and network origin.
    ///
    /// Locale extraction failures are swallowed; a misconfigured header
    /// name must not keep the operation from being logged.
    pub fn capture_carrier(&mut self, ctx: &AppContext) {
        self.headers = ctx.headers();
        self.culture = ctx.locale().ok().flatten();
        self.ip = ctx.origin_address();
    }

    /// Captures identity attributes when the system tag matches.
    ///
    /// Each accessor is tried independently and failures are swallowed so
    /// partially-populated carriers still produce a record.
    pub fn capture_identity(&mut self, ctx: &AppContext) {
        if !ctx.has_identity_system_tag() {
            return;
        }
        self.is_authenticated = ctx.is_authenticated().ok();
        self.user_id = ctx.user_id().ok();
        self.session_id = ctx.session_id().ok();
    }

    /// Records the classified fault for this operation.
    pub fn record_fault(&mut self, fault: &Fault) {
        self.fault = Some(fault.to_string());
        self.fault_kind = Some(fault.kind());
        self.field_errors = fault.field_errors().cloned();
    }

    /// Emits the record: one ERROR event on fault paths, INFO otherwise.
    pub fn emit(&self) {
        if self.fault.is_some() {
            tracing::error!(
                host = %self.host,
                protocol = %self.protocol,
                method = %self.method,
                path = %self.path,
                path_and_query = %self.path_and_query,
                status = self.status,
                elapsed_ms = self.elapsed_ms,
                ip = %self.ip,
                machine = %self.machine,
                culture = self.culture.as_deref(),
                headers = ?self.headers,
                body = self.body.as_deref(),
                is_authenticated = self.is_authenticated,
                user_id = ?self.user_id,
                session_id = ?self.session_id,
                fault = self.fault.as_deref(),
                fault_kind = ?self.fault_kind,
                field_errors = ?self.field_errors,
                "{} {} {} responded {} in {} ms",
                self.protocol,
                self.method,
                self.path,
                self.status,
                self.elapsed_ms,
            );
        } else {
            tracing::info!(
                host = %self.host,
                protocol = %self.protocol,
                method = %self.method,
                path = %self.path,
                path_and_query = %self.path_and_query,
                status = self.status,
                elapsed_ms = self.elapsed_ms,
                ip = %self.ip,
                machine = %self.machine,
                culture = self.culture.as_deref(),
                headers = ?self.headers,
                body = self.body.as_deref(),
                is_authenticated = self.is_authenticated,
                user_id = ?self.user_id,
                session_id = ?self.session_id,
                "{} {} {} responded {} in {} ms",
                self.protocol,
                self.method,
                self.path,
                self.status,
                self.elapsed_ms,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Claims;
    use http::HeaderMap;

    fn context(claims: Option<Claims>) -> AppContext {
        AppContext::new(
            HeaderMap::new(),
            Some("10.0.0.1".parse().unwrap()),
            claims,
            "keel",
            Some("accept-language".to_string()),
        )
    }

    #[test]
    fn identity_skipped_without_system_tag() {
        let mut detail = LogDetail::new();
        detail.capture_identity(&context(None));
        assert!(detail.is_authenticated.is_none());
        assert!(detail.user_id.is_none());
    }

    #[test]
    fn identity_captured_best_effort() {
        // System tag present, user id present, session claim missing:
        // the record keeps what resolved and drops the rest.
        let claims = Claims {
            system: Some("keel".to_string()),
            is_authenticated: Some("True".to_string()),
            user_id: Some(Uuid::new_v4().to_string()),
            session_id: None,
            ..Claims::default()
        };
        let mut detail = LogDetail::new();
        detail.capture_identity(&context(Some(claims)));

        assert_eq!(detail.is_authenticated, Some(true));
        assert!(detail.user_id.is_some());
        assert!(detail.session_id.is_none());
    }

    #[test]
    fn carrier_capture_fills_origin() {
        let mut detail = LogDetail::new();
        detail.capture_carrier(&context(None));
        assert_eq!(detail.ip, "10.0.0.1");
        assert!(detail.culture.is_none());
    }

    #[test]
    fn fault_recording_keeps_diagnostics_and_kind() {
        let mut errors = FieldErrors::new();
        errors.add("name", "name_should_not_be_empty");
        let fault = Fault::validation(errors);

        let mut detail = LogDetail::new();
        detail.record_fault(&fault);

        assert_eq!(detail.fault_kind, Some(ErrorKind::Validation));
        assert!(detail.field_errors.is_some());
        assert!(detail.fault.is_some());
    }
}
