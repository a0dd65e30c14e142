//! Inbound request types.
//!
//! [`RequestEnvelope`] is the tracking record callers may send in the body.
//! It is accepted and passed through, never enforced. [`InboundRequest`] is
//! what the filters see; [`RequestContext`] is what a handler receives once
//! the governance wrapper has assigned an execution id.

use crate::envelope::ExecutionId;
use axum::http::Method;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RequestEnvelopeError {
    #[error("request body is not a JSON object")]
    NotAnObject,

    #[error("malformed request envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid UUID in request_id: {0}")]
    InvalidRequestId(String),

    #[error("invalid UUID in correlation_id: {0}")]
    InvalidCorrelationId(String),
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Tracking record: `{request_id?, correlation_id?, timestamp?, payload?, metadata?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default = "new_id")]
    pub request_id: String,
    #[serde(default = "new_id")]
    pub correlation_id: String,
    #[serde(default = "now_iso")]
    pub timestamp: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Default for RequestEnvelope {
    fn default() -> Self {
        Self {
            request_id: new_id(),
            correlation_id: new_id(),
            timestamp: now_iso(),
            payload: Map::new(),
            metadata: Map::new(),
        }
    }
}

impl RequestEnvelope {
    /// Read the envelope fields out of a JSON mapping, generating any missing
    /// identifiers. Unknown keys are ignored.
    pub fn from_value(value: Value) -> Result<Self, RequestEnvelopeError> {
        if !value.is_object() {
            return Err(RequestEnvelopeError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Check that both identifiers are well-formed UUIDs.
    pub fn validate(&self) -> Result<(), RequestEnvelopeError> {
        Uuid::parse_str(&self.request_id)
            .map_err(|e| RequestEnvelopeError::InvalidRequestId(e.to_string()))?;
        Uuid::parse_str(&self.correlation_id)
            .map_err(|e| RequestEnvelopeError::InvalidCorrelationId(e.to_string()))?;
        Ok(())
    }
}

/// Parse a raw body into its JSON value and tracking envelope.
///
/// An empty body is fine and yields `Value::Null` plus a fresh envelope.
/// Anything else must be a JSON object.
pub fn parse_body(bytes: &[u8]) -> Result<(Value, RequestEnvelope), RequestEnvelopeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok((Value::Null, RequestEnvelope::default()));
    }
    let value: Value = serde_json::from_slice(bytes)?;
    let envelope = RequestEnvelope::from_value(value.clone())?;
    Ok((value, envelope))
}

// ─────────────────────────────────────────────────────────────────────────────
// Request as seen by filters and handlers
// ─────────────────────────────────────────────────────────────────────────────

/// A routed request before the governance wrapper runs.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    /// Name of the matched route, used in logs.
    pub endpoint: String,
    /// Path parameters extracted from the route template.
    pub path_params: HashMap<String, String>,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: Value,
    pub envelope: RequestEnvelope,
    /// Set by the API key filter when it admits the request.
    pub principal: Option<String>,
}

impl InboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            endpoint: String::new(),
            path_params: HashMap::new(),
            headers: HashMap::new(),
            body: Value::Null,
            envelope: RequestEnvelope::default(),
            principal: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value, envelope: RequestEnvelope) -> Self {
        self.body = body;
        self.envelope = envelope;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Everything a route handler gets to see.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Same id that ends up in `meta.execution_id` of the response.
    pub execution_id: ExecutionId,
    pub request: InboundRequest,
}

impl RequestContext {
    pub fn new(execution_id: ExecutionId, request: InboundRequest) -> Self {
        Self {
            execution_id,
            request,
        }
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.request.path_params.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Value {
        &self.request.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_ids_are_generated() {
        let env = RequestEnvelope::from_value(json!({"payload": {"action": "start"}})).unwrap();
        assert!(env.validate().is_ok());
        assert_eq!(env.payload["action"], json!("start"));
        assert!(env.metadata.is_empty());

        let other = RequestEnvelope::from_value(json!({})).unwrap();
        assert_ne!(env.request_id, other.request_id);
        assert_ne!(env.request_id, env.correlation_id);
    }

    #[test]
    fn supplied_fields_are_preserved() {
        let id = Uuid::new_v4().to_string();
        let env = RequestEnvelope::from_value(json!({
            "request_id": id,
            "timestamp": "2024-01-01T00:00:00Z",
            "metadata": {"source": "cli"},
        }))
        .unwrap();
        assert_eq!(env.request_id, id);
        assert_eq!(env.timestamp, "2024-01-01T00:00:00Z");
        assert_eq!(env.metadata["source"], json!("cli"));
    }

    #[test]
    fn validate_rejects_non_uuid_ids() {
        let env = RequestEnvelope::from_value(json!({"request_id": "abc123"})).unwrap();
        assert!(matches!(
            env.validate(),
            Err(RequestEnvelopeError::InvalidRequestId(_))
        ));

        let env = RequestEnvelope::from_value(json!({"correlation_id": "nope"})).unwrap();
        assert!(matches!(
            env.validate(),
            Err(RequestEnvelopeError::InvalidCorrelationId(_))
        ));
    }

    #[test]
    fn parse_body_accepts_empty_and_objects() {
        let (value, env) = parse_body(b"").unwrap();
        assert_eq!(value, Value::Null);
        assert!(env.validate().is_ok());

        let (value, _) = parse_body(br#"{"repo_url": "https://github.com/a/b"}"#).unwrap();
        assert_eq!(value["repo_url"], json!("https://github.com/a/b"));
    }

    #[test]
    fn parse_body_rejects_garbage() {
        assert!(matches!(
            parse_body(b"{not json"),
            Err(RequestEnvelopeError::Malformed(_))
        ));
        assert!(matches!(
            parse_body(b"[1, 2, 3]"),
            Err(RequestEnvelopeError::NotAnObject)
        ));
        assert!(parse_body(br#"{"request_id": 7}"#).is_err());
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = InboundRequest::new(Method::GET, "/health").with_header("X-Api-Key", "k");
        assert_eq!(req.header("x-api-key"), Some("k"));
        assert_eq!(req.header("X-API-KEY"), Some("k"));
    }
}
