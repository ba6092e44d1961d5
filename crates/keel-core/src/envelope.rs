//! Wire-level response envelopes.
//!
//! Every response leaving the service is wrapped in one of two shapes:
//! a success envelope `{ version, data }` or an error envelope
//! `{ version, message, exceptionType }`. The version string is the
//! configured service version, stamped by the boundary.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

/// Success envelope wrapping a typed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Service version the response was produced by.
    pub version: String,
    /// Operation payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` under the given service version.
    #[must_use]
    pub fn new(version: impl Into<String>, data: T) -> Self {
        Self {
            version: version.into(),
            data,
        }
    }
}

/// Error envelope produced by the boundary translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Service version the response was produced by.
    pub version: String,
    /// Client-safe message; generic for all but declared faults.
    pub message: String,
    /// Wire classification of the underlying fault.
    pub exception_type: ErrorKind,
}

impl ApiError {
    /// Builds an error envelope.
    #[must_use]
    pub fn new(version: impl Into<String>, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            version: version.into(),
            message: message.into(),
            exception_type: kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let envelope = ApiResponse::new("1.0.0", "Healthy");
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"version":"1.0.0","data":"Healthy"}"#);
    }

    #[test]
    fn error_envelope_shape() {
        let envelope = ApiError::new("1.0.0", "request_model_is_invalid", ErrorKind::Validation);
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            json,
            r#"{"version":"1.0.0","message":"request_model_is_invalid","exceptionType":"validation"}"#
        );
    }

    #[test]
    fn error_envelope_round_trips() {
        let envelope = ApiError::new("2.1.0", "internal_server_error", ErrorKind::Undefined);
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: ApiError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, envelope);
    }
}
