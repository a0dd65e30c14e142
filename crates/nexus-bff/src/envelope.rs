//! Outbound response envelope.
//!
//! Every response that leaves the BFF, success or failure, is a
//! [`ResponseEnvelope`]:
//!
//! ```text
//! {
//!   "success": bool,
//!   "data":    {...} | {},
//!   "error":   null | {"message": "...", "code": "...", "details"?: {...}},
//!   "meta":    {"execution_id": "...", "stage": "ASK"}
//! }
//! ```
//!
//! Envelopes are only built through [`crate::builder`] and are never mutated
//! after construction.

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Stage label used when the caller does not name one.
pub const DEFAULT_STAGE: &str = "ASK";

// ─────────────────────────────────────────────────────────────────────────────
// Execution id
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque per-request correlation token (random UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// Closed set of error codes that may appear in `error.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed input or bad request shape.
    ValidationError,
    /// Authorization / permission failure.
    AuthError,
    /// Missing resource.
    NotFound,
    /// Classified data-store fault.
    DbError,
    /// Classified downstream-service fault.
    ServiceError,
    /// Anything unclassified.
    InternalError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::ValidationError,
        ErrorCode::AuthError,
        ErrorCode::NotFound,
        ErrorCode::DbError,
        ErrorCode::ServiceError,
        ErrorCode::InternalError,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::AuthError => "AUTH_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::DbError => "DB_ERROR",
            ErrorCode::ServiceError => "SERVICE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Transport status used when a wrapped handler faults with this code.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::AuthError => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::DbError | ErrorCode::ServiceError | ErrorCode::InternalError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// `error` block of a failed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

/// `meta` block attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub execution_id: ExecutionId,
    pub stage: String,
}

/// The single response shape allowed across the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub(crate) success: bool,
    pub(crate) data: Map<String, Value>,
    pub(crate) error: Option<ErrorBody>,
    pub(crate) meta: ResponseMeta,
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    pub fn execution_id(&self) -> &ExecutionId {
        &self.meta.execution_id
    }

    /// Materialize the envelope as a JSON mapping.
    pub fn to_value(&self) -> Value {
        // Serializing our own types into a `Value` cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Render the envelope as a compact JSON string.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

/// Always emits all four top-level keys and re-applies the data/error
/// exclusivity rule regardless of how the value was built.
impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let empty = Map::new();
        let data = if self.success { &self.data } else { &empty };
        let error = if self.success { None } else { self.error.as_ref() };

        let mut state = serializer.serialize_struct("ResponseEnvelope", 4)?;
        state.serialize_field("success", &self.success)?;
        state.serialize_field("data", data)?;
        state.serialize_field("error", &error)?;
        state.serialize_field("meta", &self.meta)?;
        state.end()
    }
}
