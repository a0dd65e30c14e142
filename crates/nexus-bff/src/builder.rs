//! Response builder - the only way to construct a [`ResponseEnvelope`].

use crate::envelope::{ErrorBody, ErrorCode, ExecutionId, ResponseEnvelope, ResponseMeta};
use serde_json::{Map, Value};

/// Build a successful envelope carrying `data`.
pub fn build_success(
    data: Map<String, Value>,
    execution_id: &ExecutionId,
    stage: &str,
) -> ResponseEnvelope {
    ResponseEnvelope {
        success: true,
        data,
        error: None,
        meta: meta(execution_id, stage),
    }
}

/// Build a failed envelope.
///
/// `message` must already be a safe, caller-facing string; the builder does
/// not sanitize. Non-empty `details` are attached verbatim under
/// `error.details`.
pub fn build_error(
    message: impl Into<String>,
    code: ErrorCode,
    execution_id: &ExecutionId,
    stage: &str,
    details: Option<Map<String, Value>>,
) -> ResponseEnvelope {
    ResponseEnvelope {
        success: false,
        data: Map::new(),
        error: Some(ErrorBody {
            message: message.into(),
            code,
            details: details.filter(|d| !d.is_empty()),
        }),
        meta: meta(execution_id, stage),
    }
}

fn meta(execution_id: &ExecutionId, stage: &str) -> ResponseMeta {
    ResponseMeta {
        execution_id: execution_id.clone(),
        stage: stage.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::DEFAULT_STAGE;
    use serde_json::json;

    #[test]
    fn success_carries_payload_and_no_error() {
        let id = ExecutionId::generate();
        let mut data = Map::new();
        data.insert("status".into(), json!("started"));

        let envelope = build_success(data.clone(), &id, DEFAULT_STAGE);
        assert!(envelope.is_success());
        assert_eq!(envelope.data(), &data);
        assert!(envelope.error().is_none());
        assert_eq!(envelope.execution_id(), &id);
        assert_eq!(envelope.meta().stage, "ASK");
    }

    #[test]
    fn error_has_empty_data() {
        let id = ExecutionId::generate();
        let envelope = build_error("Access denied", ErrorCode::AuthError, &id, "PLAN", None);

        assert!(!envelope.is_success());
        assert!(envelope.data().is_empty());
        let error = envelope.error().unwrap();
        assert_eq!(error.message, "Access denied");
        assert_eq!(error.code, ErrorCode::AuthError);
        assert_eq!(envelope.meta().stage, "PLAN");
    }

    #[test]
    fn details_are_attached_verbatim() {
        let id = ExecutionId::generate();
        let mut details = Map::new();
        details.insert("field".into(), json!("repo_url"));

        let envelope = build_error(
            "Invalid request format",
            ErrorCode::ValidationError,
            &id,
            DEFAULT_STAGE,
            Some(details),
        );
        let value = envelope.to_value();
        assert_eq!(value["error"]["details"], json!({"field": "repo_url"}));
    }

    #[test]
    fn empty_details_are_omitted() {
        let id = ExecutionId::generate();
        let envelope = build_error(
            "Resource not found",
            ErrorCode::NotFound,
            &id,
            DEFAULT_STAGE,
            Some(Map::new()),
        );
        assert!(envelope.error().unwrap().details.is_none());
    }
}
