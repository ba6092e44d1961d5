//! Per-operation context extraction.
//!
//! [`AppContext`] wraps one inbound carrier (headers, decoded claims,
//! transport peer address) and exposes identity, session, locale, and
//! network origin as lazy accessors. Each accessor fails independently so
//! that unauthenticated or partially-populated requests (anonymous health
//! checks, for instance) can still be logged and processed without an
//! all-or-nothing identity check.

use crate::error::Fault;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use thiserror::Error;
use uuid::Uuid;

/// Trusted proxy header consulted first for the client network origin.
pub const CLIENT_IP_HEADER: &str = "client-ip";

/// Fallback proxy header for the client network origin.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Claims carried by an identity token.
///
/// Every field is optional; accessors decide per claim whether absence is
/// an error. The same shape is used when issuing tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// System tag identifying which deployment issued the token.
    #[serde(rename = "System", skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Authenticated flag, the string `"True"` when set.
    #[serde(rename = "IsAuthenticated", skip_serializing_if = "Option::is_none")]
    pub is_authenticated: Option<String>,
    /// Caller's user id.
    #[serde(rename = "UserId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Caller's user name.
    #[serde(rename = "UserName", skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Session id minted at token issue time.
    #[serde(rename = "SessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Machine that issued the token.
    #[serde(rename = "Provider", skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Expiry as seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Failure raised by a context accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A required claim is absent from the carrier.
    #[error("{0}")]
    MissingClaim(&'static str),
    /// A claim is present but does not parse as its expected shape.
    #[error("{0}")]
    MalformedClaim(&'static str),
    /// No bearer credential is present in the carrier.
    #[error("invalid_token")]
    Unauthorized,
    /// A startup-class settings defect, not a per-request condition.
    #[error("{0}")]
    Configuration(&'static str),
}

impl From<ContextError> for Fault {
    fn from(error: ContextError) -> Self {
        match error {
            ContextError::MissingClaim(message) | ContextError::MalformedClaim(message) => {
                Fault::declared(message, http::StatusCode::UNAUTHORIZED)
            }
            ContextError::Unauthorized => {
                Fault::declared("invalid_token", http::StatusCode::UNAUTHORIZED)
            }
            ContextError::Configuration(message) => {
                Fault::declared(message, http::StatusCode::BAD_REQUEST)
            }
        }
    }
}

/// One operation's carrier plus the configuration needed to read it.
#[derive(Debug, Clone)]
pub struct AppContext {
    headers: HeaderMap,
    peer: Option<IpAddr>,
    claims: Option<Claims>,
    expected_system: String,
    locale_header: Option<String>,
}

impl AppContext {
    /// Wraps a carrier.
    ///
    /// `claims` are trusted as already verified upstream; `expected_system`
    /// is the configured system tag; `locale_header` is the configured
    /// header name for the caller's locale (`None` or empty means the
    /// setting is missing).
    #[must_use]
    pub fn new(
        headers: HeaderMap,
        peer: Option<IpAddr>,
        claims: Option<Claims>,
        expected_system: impl Into<String>,
        locale_header: Option<String>,
    ) -> Self {
        Self {
            headers,
            peer,
            claims,
            expected_system: expected_system.into(),
            locale_header,
        }
    }

    /// Returns `true` iff the carrier's system tag equals the configured
    /// value. Never fails; an absent or foreign tag reads as `false`.
    #[must_use]
    pub fn has_identity_system_tag(&self) -> bool {
        self.claims
            .as_ref()
            .and_then(|c| c.system.as_deref())
            .map_or(false, |system| system == self.expected_system)
    }

    /// Returns the authenticated flag.
    pub fn is_authenticated(&self) -> Result<bool, ContextError> {
        let value = self
            .claims
            .as_ref()
            .and_then(|c| c.is_authenticated.as_deref())
            .ok_or(ContextError::MissingClaim(
                "is_authenticated_is_missing_in_claims",
            ))?;
        Ok(value == "True")
    }

    /// Returns the caller's user id.
    pub fn user_id(&self) -> Result<Uuid, ContextError> {
        let value = self
            .claims
            .as_ref()
            .and_then(|c| c.user_id.as_deref())
            .ok_or(ContextError::MissingClaim("user_is_missing_in_claims"))?;
        value
            .parse()
            .map_err(|_| ContextError::MalformedClaim("user_id_claim_is_malformed"))
    }

    /// Returns the caller's user name.
    pub fn user_name(&self) -> Result<String, ContextError> {
        self.claims
            .as_ref()
            .and_then(|c| c.user_name.clone())
            .ok_or(ContextError::MissingClaim("user_is_missing_in_claims"))
    }

    /// Returns the caller's session id.
    pub fn session_id(&self) -> Result<Uuid, ContextError> {
        let value = self
            .claims
            .as_ref()
            .and_then(|c| c.session_id.as_deref())
            .ok_or(ContextError::MissingClaim("session_is_missing_in_claims"))?;
        value
            .parse()
            .map_err(|_| ContextError::MalformedClaim("session_id_claim_is_malformed"))
    }

    /// Returns the bearer credential stripped of its scheme prefix.
    pub fn authorization_token(&self) -> Result<String, ContextError> {
        let raw = self
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(ContextError::Unauthorized)?;
        let credential = raw.rfind(' ').map_or(raw, |at| &raw[at + 1..]);
        Ok(credential.to_string())
    }

    /// Returns the caller's locale from the configured header.
    ///
    /// `None` means the header is simply absent on this request; an
    /// unconfigured header *name* is a configuration error instead.
    pub fn locale(&self) -> Result<Option<String>, ContextError> {
        let name = self
            .locale_header
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or(ContextError::Configuration(
                "localization_header_name_is_missing_in_settings",
            ))?;
        Ok(self
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string))
    }

    /// Returns the client network origin.
    ///
    /// Precedence: first value of [`CLIENT_IP_HEADER`], then first value of
    /// [`FORWARDED_FOR_HEADER`], then the transport peer address. Never
    /// fails, may return empty.
    #[must_use]
    pub fn origin_address(&self) -> String {
        for header in [CLIENT_IP_HEADER, FORWARDED_FOR_HEADER] {
            if let Some(value) = self.headers.get(header).and_then(|v| v.to_str().ok()) {
                return value
                    .split(',')
                    .next()
                    .unwrap_or(value)
                    .trim()
                    .to_string();
            }
        }
        self.peer.map(|ip| ip.to_string()).unwrap_or_default()
    }

    /// Returns all carrier headers for the log record.
    #[must_use]
    pub fn headers(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    const SYSTEM: &str = "keel";

    fn claims() -> Claims {
        Claims {
            system: Some(SYSTEM.to_string()),
            is_authenticated: Some("True".to_string()),
            user_id: Some("9f0c1de4-8b86-4a49-93a4-f9a6f0f0b001".to_string()),
            user_name: Some("alice".to_string()),
            session_id: Some("35b2bb5c-7aad-4a25-9d93-5a3b1c6a4f77".to_string()),
            provider: None,
            exp: None,
        }
    }

    fn context(headers: HeaderMap, claims: Option<Claims>) -> AppContext {
        AppContext::new(
            headers,
            Some("10.1.2.3".parse().unwrap()),
            claims,
            SYSTEM,
            Some("accept-language".to_string()),
        )
    }

    #[test]
    fn system_tag_matches_configured_value() {
        let ctx = context(HeaderMap::new(), Some(claims()));
        assert!(ctx.has_identity_system_tag());
    }

    #[test]
    fn foreign_system_tag_reads_as_absent() {
        let mut c = claims();
        c.system = Some("other".to_string());
        let ctx = context(HeaderMap::new(), Some(c));
        assert!(!ctx.has_identity_system_tag());
    }

    #[test]
    fn accessors_fail_independently() {
        // Session claim missing, user id present: user_id succeeds while
        // session_id fails on its own.
        let mut c = claims();
        c.session_id = None;
        let ctx = context(HeaderMap::new(), Some(c));

        assert!(ctx.user_id().is_ok());
        assert_eq!(
            ctx.session_id(),
            Err(ContextError::MissingClaim("session_is_missing_in_claims"))
        );
    }

    #[test]
    fn missing_authenticated_flag_is_a_missing_claim() {
        let mut c = claims();
        c.is_authenticated = None;
        let ctx = context(HeaderMap::new(), Some(c));
        assert_eq!(
            ctx.is_authenticated(),
            Err(ContextError::MissingClaim(
                "is_authenticated_is_missing_in_claims"
            ))
        );
    }

    #[test]
    fn malformed_user_id_is_distinguished_from_missing() {
        let mut c = claims();
        c.user_id = Some("not-a-uuid".to_string());
        let ctx = context(HeaderMap::new(), Some(c));
        assert_eq!(
            ctx.user_id(),
            Err(ContextError::MalformedClaim("user_id_claim_is_malformed"))
        );
    }

    #[test]
    fn no_claims_at_all_still_answers_system_tag() {
        let ctx = context(HeaderMap::new(), None);
        assert!(!ctx.has_identity_system_tag());
        assert!(ctx.user_id().is_err());
    }

    #[test]
    fn bearer_credential_is_stripped_of_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        let ctx = context(headers, None);
        assert_eq!(ctx.authorization_token().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_credential_is_unauthorized() {
        let ctx = context(HeaderMap::new(), None);
        assert_eq!(ctx.authorization_token(), Err(ContextError::Unauthorized));
    }

    #[test]
    fn locale_reads_configured_header() {
        let mut headers = HeaderMap::new();
        headers.insert("accept-language", HeaderValue::from_static("tr-TR"));
        let ctx = context(headers, None);
        assert_eq!(ctx.locale().unwrap(), Some("tr-TR".to_string()));
    }

    #[test]
    fn absent_locale_header_is_none_not_default() {
        let ctx = context(HeaderMap::new(), None);
        assert_eq!(ctx.locale().unwrap(), None);
    }

    #[test]
    fn unconfigured_locale_header_name_is_a_configuration_error() {
        let ctx = AppContext::new(HeaderMap::new(), None, None, SYSTEM, None);
        assert_eq!(
            ctx.locale(),
            Err(ContextError::Configuration(
                "localization_header_name_is_missing_in_settings"
            ))
        );
    }

    #[test]
    fn origin_prefers_client_ip_header_first_value() {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_IP_HEADER, HeaderValue::from_static("1.1.1.1, 2.2.2.2"));
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static("3.3.3.3"));
        let ctx = context(headers, None);
        assert_eq!(ctx.origin_address(), "1.1.1.1");
    }

    #[test]
    fn origin_falls_back_to_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static("3.3.3.3, 4.4.4.4"));
        let ctx = context(headers, None);
        assert_eq!(ctx.origin_address(), "3.3.3.3");
    }

    #[test]
    fn origin_falls_back_to_peer_address() {
        let ctx = context(HeaderMap::new(), None);
        assert_eq!(ctx.origin_address(), "10.1.2.3");
    }

    #[test]
    fn origin_is_empty_when_nothing_is_known() {
        let ctx = AppContext::new(HeaderMap::new(), None, None, SYSTEM, None);
        assert_eq!(ctx.origin_address(), "");
    }

    #[test]
    fn context_error_maps_to_declared_fault() {
        let fault: Fault = ContextError::Unauthorized.into();
        assert_eq!(fault.status(), http::StatusCode::UNAUTHORIZED);
        assert_eq!(fault.client_message(), "invalid_token");

        let fault: Fault = ContextError::Configuration(
            "localization_header_name_is_missing_in_settings",
        )
        .into();
        assert_eq!(fault.status(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn claims_serialize_with_token_field_names() {
        let json = serde_json::to_value(claims()).unwrap();
        assert!(json.get("System").is_some());
        assert!(json.get("IsAuthenticated").is_some());
        assert!(json.get("UserId").is_some());
        assert!(json.get("exp").is_none());
    }
}
