//! Identity token issuing.
//!
//! The issuer mints HMAC-SHA256 tokens carrying the claim set the context
//! extractor reads back. Verification of inbound tokens happens at the
//! transport boundary; nothing in the pipeline re-checks signatures or
//! expiry.

use crate::context::Claims;
use crate::error::Fault;
use crate::pipeline::CachePayload;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Grant returned by the login operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    /// Credential scheme, always `Bearer`.
    #[serde(rename = "type")]
    pub token_type: String,
    /// The signed compact token.
    pub token: String,
    /// Validity window in minutes.
    pub expire_in: u64,
}

impl CachePayload for TokenGrant {}

/// Mints identity tokens for authenticated callers.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: String,
    system: String,
    duration_minutes: u64,
    provider: String,
}

impl TokenIssuer {
    /// Creates an issuer for the configured system tag and signing secret.
    #[must_use]
    pub fn new(secret: impl Into<String>, system: impl Into<String>, duration_minutes: u64) -> Self {
        let provider = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_default();
        Self {
            secret: secret.into(),
            system: system.into(),
            duration_minutes,
            provider,
        }
    }

    /// Issues a grant for the given user, minting a fresh session id.
    pub fn issue(&self, user_id: Uuid, user_name: &str) -> Result<TokenGrant, Fault> {
        let expires_at = SystemTime::now() + Duration::from_secs(self.duration_minutes * 60);
        let exp = expires_at
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Fault::unclassified_from("token expiry before epoch", e))?
            .as_secs();

        let claims = Claims {
            system: Some(self.system.clone()),
            is_authenticated: Some("True".to_string()),
            user_id: Some(user_id.to_string()),
            user_name: Some(user_name.to_string()),
            session_id: Some(Uuid::new_v4().to_string()),
            provider: Some(self.provider.clone()),
            exp: Some(exp),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| Fault::unclassified_from("token signing failed", e))?;

        Ok(TokenGrant {
            token_type: "Bearer".to_string(),
            token,
            expire_in: self.duration_minutes,
        })
    }

    /// Returns the configured system tag.
    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Returns the configured signing secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

/// Encodes a uuid as a 22-character url-safe opaque token.
#[must_use]
pub fn encode_compact(id: Uuid) -> String {
    let encoded = STANDARD.encode(id.as_bytes());
    encoded.replace('/', "_").replace('+', "-")[..22].to_string()
}

/// Decodes a token produced by [`encode_compact`].
pub fn decode_compact(encoded: &str) -> Result<Uuid, Fault> {
    let restored = format!("{}==", encoded.replace('_', "/").replace('-', "+"));
    let bytes = STANDARD
        .decode(restored)
        .map_err(|e| Fault::unclassified_from("compact token did not decode", e))?;
    Uuid::from_slice(&bytes)
        .map_err(|e| Fault::unclassified_from("compact token has wrong length", e))
}
