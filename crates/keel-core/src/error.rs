//! Fault taxonomy for Keel.
//!
//! Every failure that surfaces from the request pipeline is one of three
//! [`Fault`] variants, and the boundary translator maps each variant to
//! exactly one wire-level response shape:
//!
//! | Fault | Wire status | [`ErrorKind`] | Client message |
//! |---|---|---|---|
//! | `Validation` | 400 | `Validation` | `request_model_is_invalid` |
//! | `Declared` | its own status | `Info` | its own message |
//! | `Unclassified` | 500 | `Undefined` | `internal_server_error` |
//!
//! Handlers and behaviors never catch-and-suppress faults; everything
//! propagates to the boundary, which is the single point of classification.
//! Internal error text is logged but never reaches clients.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias using [`Fault`].
pub type FaultResult<T> = Result<T, Fault>;

/// Wire-level classification of a fault.
///
/// Serialized into the error envelope's `exceptionType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Anything the taxonomy could not classify. Message is always generic.
    Undefined,
    /// Structural request validation failure.
    Validation,
    /// Operator-declared fault whose message is intended for clients.
    Info,
}

/// Field-level validation messages, one message per offending field.
///
/// The first violation recorded for a field wins; later violations for an
/// already-flagged field are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    fields: BTreeMap<String, String>,
}

impl FieldErrors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation for `field` unless one is already present.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Returns the recorded message for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Returns `true` if no violations were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of offending fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A failure surfacing from the request pipeline.
///
/// The taxonomy is closed: every error raised anywhere below the boundary
/// is one of these three shapes, so the translator never has to guess.
///
/// # Example
///
/// ```
/// use keel_core::{Fault, ErrorKind};
/// use http::StatusCode;
///
/// let fault = Fault::declared("account_is_locked", StatusCode::FORBIDDEN);
/// assert_eq!(fault.kind(), ErrorKind::Info);
/// assert_eq!(fault.status(), StatusCode::FORBIDDEN);
/// assert_eq!(fault.client_message(), "account_is_locked");
/// ```
#[derive(Debug, Error)]
pub enum Fault {
    /// Structural validation failure, field detail logged but not returned.
    #[error("request validation failed")]
    Validation {
        /// One message per offending field.
        errors: FieldErrors,
    },

    /// Operator-raised fault carrying its own status and client message.
    #[error("{message}")]
    Declared {
        /// Operator-authored message, safe for clients.
        message: String,
        /// Whether the raiser marked the message as client-safe.
        friendly: bool,
        /// Wire status chosen by the raiser.
        status: StatusCode,
    },

    /// Anything else. Clients see a generic message; the source is logged.
    #[error("{message}")]
    Unclassified {
        /// Internal diagnostic message, never sent to clients.
        message: String,
        /// Underlying error chain, when one exists.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl Fault {
    /// Creates a validation fault from recorded field violations.
    #[must_use]
    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation { errors }
    }

    /// Creates a declared fault with the default `Bad Request` status.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::declared(message, StatusCode::BAD_REQUEST)
    }

    /// Creates a declared fault with an explicit status.
    #[must_use]
    pub fn declared(message: impl Into<String>, status: StatusCode) -> Self {
        Self::Declared {
            message: message.into(),
            friendly: false,
            status,
        }
    }

    /// Creates a declared fault whose message the raiser marks client-safe.
    #[must_use]
    pub fn friendly(message: impl Into<String>, status: StatusCode) -> Self {
        Self::Declared {
            message: message.into(),
            friendly: true,
            status,
        }
    }

    /// Creates an unclassified fault from a message alone.
    #[must_use]
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unclassified fault preserving the underlying error chain.
    pub fn unclassified_from(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Unclassified {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates the fault surfaced when an in-flight operation is cancelled.
    ///
    /// Status 499 (client closed request) is non-standard but well within
    /// the valid range, and keeps cancellations out of the 5xx bucket.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::Declared {
            message: "operation_cancelled".to_string(),
            friendly: false,
            status: StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Returns the wire-level classification for this fault.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Declared { .. } => ErrorKind::Info,
            Self::Unclassified { .. } => ErrorKind::Undefined,
        }
    }

    /// Returns the wire status the translator writes for this fault.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Declared { status, .. } => *status,
            Self::Unclassified { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message exposed to clients.
    ///
    /// Only declared faults expose their own text; the other variants map
    /// to fixed operator-authored strings so internal detail cannot leak.
    #[must_use]
    pub fn client_message(&self) -> &str {
        match self {
            Self::Validation { .. } => "request_model_is_invalid",
            Self::Declared { message, .. } => message,
            Self::Unclassified { .. } => "internal_server_error",
        }
    }

    /// Returns the field violations carried by a validation fault.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }

    /// Returns `true` for cancellation faults.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Declared { message, .. } if message == "operation_cancelled")
    }
}
