//! Bearer token verification at the transport boundary.
//!
//! The pipeline itself trusts claims; this is the one place inbound
//! tokens are checked. A missing, malformed, or expired token yields no
//! claims rather than an error; routes that need identity fail through
//! the context extractor's own accessors.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use keel_core::Claims;

/// Verifies the carrier's bearer token and returns its claims.
#[must_use]
pub fn decode_claims(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
    decode_claims_from_token(token, secret)
}

/// Verifies a bare compact token and returns its claims.
#[must_use]
pub fn decode_claims_from_token(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|error| {
        tracing::debug!(%error, "bearer token rejected");
        error
    })
    .ok()
}
