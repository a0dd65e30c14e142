//! Governance wrapper.
//!
//! [`Governor::govern`] is the interceptor the transport layer runs around
//! every handler invocation:
//!
//! ```text
//! RUNNING      generate execution id, call handler (errors and panics caught)
//!    │
//! NORMALIZING  envelope        → pass through (200)
//!    │         envelope+status → pass through
//!    │         raw / raw+status→ coerce via build_success, warn
//!    │         fault           → log full detail, classify, build_error
//!    ▼
//! RESPONDED    GovernedResponse { envelope, status }
//! ```

use crate::builder::{build_error, build_success};
use crate::classify::classify_fault;
use crate::diagnostics::{DiagnosticSink, FaultRecord};
use crate::envelope::{DEFAULT_STAGE, ExecutionId, ResponseEnvelope};
use crate::fault::Fault;
use crate::request::{InboundRequest, RequestContext};
use async_trait::async_trait;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, info_span};

// ─────────────────────────────────────────────────────────────────────────────
// Handler contract
// ─────────────────────────────────────────────────────────────────────────────

/// What a handler may hand back.
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    /// Contract-abiding envelope, sent with 200.
    Envelope(ResponseEnvelope),
    /// Contract-abiding envelope with an explicit status.
    EnvelopeWithStatus(ResponseEnvelope, StatusCode),
    /// Bare payload; coerced into a success envelope with 200.
    Raw(Value),
    /// Bare payload with an explicit status.
    RawWithStatus(Value, StatusCode),
}

impl From<ResponseEnvelope> for HandlerOutcome {
    fn from(envelope: ResponseEnvelope) -> Self {
        HandlerOutcome::Envelope(envelope)
    }
}

impl From<(ResponseEnvelope, StatusCode)> for HandlerOutcome {
    fn from((envelope, status): (ResponseEnvelope, StatusCode)) -> Self {
        HandlerOutcome::EnvelopeWithStatus(envelope, status)
    }
}

pub type HandlerResult = Result<HandlerOutcome, Fault>;

/// A route handler. Produces a payload or raises a [`Fault`].
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn call(&self, ctx: RequestContext) -> HandlerResult;
}

/// Adapter turning an async closure into a [`RouteHandler`].
pub struct FnHandler<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        (self.0)(ctx).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Governed response
// ─────────────────────────────────────────────────────────────────────────────

/// Final envelope plus transport status. Nothing touches it after this.
#[derive(Debug, Clone)]
pub struct GovernedResponse {
    pub envelope: ResponseEnvelope,
    pub status: StatusCode,
}

impl GovernedResponse {
    pub fn new(envelope: ResponseEnvelope, status: StatusCode) -> Self {
        Self { envelope, status }
    }
}

impl IntoResponse for GovernedResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Governor
// ─────────────────────────────────────────────────────────────────────────────

/// Runs handlers under envelope governance.
#[derive(Clone)]
pub struct Governor {
    sink: Arc<dyn DiagnosticSink>,
    stage: String,
}

impl Governor {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            sink,
            stage: DEFAULT_STAGE.to_string(),
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// Invoke `handler` and turn whatever happens into a governed response.
    pub async fn govern(
        &self,
        handler: &dyn RouteHandler,
        request: InboundRequest,
    ) -> GovernedResponse {
        let execution_id = ExecutionId::generate();
        let endpoint = request.endpoint.clone();
        let span = info_span!("govern", execution_id = %execution_id, endpoint = %endpoint);

        async {
            debug!("running handler");
            let ctx = RequestContext::new(execution_id.clone(), request);
            let result = AssertUnwindSafe(handler.call(ctx)).catch_unwind().await;

            let response = match result {
                Ok(Ok(outcome)) => self.normalize(&execution_id, &endpoint, outcome),
                Ok(Err(fault)) => self.contain(&execution_id, &endpoint, fault),
                Err(payload) => {
                    self.contain(&execution_id, &endpoint, Fault::from_panic(payload))
                }
            };
            debug!(status = response.status.as_u16(), "responded");
            response
        }
        .instrument(span)
        .await
    }

    fn normalize(
        &self,
        execution_id: &ExecutionId,
        endpoint: &str,
        outcome: HandlerOutcome,
    ) -> GovernedResponse {
        match outcome {
            HandlerOutcome::Envelope(envelope) => GovernedResponse::new(envelope, StatusCode::OK),
            HandlerOutcome::EnvelopeWithStatus(envelope, status) => {
                GovernedResponse::new(envelope, status)
            }
            HandlerOutcome::Raw(value) => {
                self.coerce(execution_id, endpoint, value, StatusCode::OK)
            }
            HandlerOutcome::RawWithStatus(value, status) => {
                self.coerce(execution_id, endpoint, value, status)
            }
        }
    }

    fn coerce(
        &self,
        execution_id: &ExecutionId,
        endpoint: &str,
        value: Value,
        status: StatusCode,
    ) -> GovernedResponse {
        self.sink.contract_bypass(execution_id, endpoint);
        let envelope = build_success(coerce_payload(value), execution_id, &self.stage);
        GovernedResponse::new(envelope, status)
    }

    fn contain(
        &self,
        execution_id: &ExecutionId,
        endpoint: &str,
        fault: Fault,
    ) -> GovernedResponse {
        self.sink.fault(FaultRecord::new(execution_id, endpoint, &fault));

        let (message, code) = classify_fault(&fault);
        let envelope = build_error(message, code, execution_id, &self.stage, None);
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        GovernedResponse::new(envelope, status)
    }
}

/// Mappings become `data` as-is; anything else is stringified under `result`.
fn coerce_payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::String(s) => Map::from_iter([("result".to_string(), Value::String(s))]),
        other => Map::from_iter([("result".to_string(), Value::String(other.to_string()))]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::envelope::ErrorCode;
    use axum::http::Method;
    use serde_json::json;

    fn governor() -> (Governor, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Governor::new(sink.clone()), sink)
    }

    fn request() -> InboundRequest {
        let mut req = InboundRequest::new(Method::GET, "/test");
        req.endpoint = "test".to_string();
        req
    }

    #[tokio::test]
    async fn envelope_passes_through_with_200() {
        let (gov, sink) = governor();
        let handler = handler_fn(|ctx: RequestContext| async move {
            let data = Map::from_iter([("ok".to_string(), json!(true))]);
            Ok(build_success(data, &ctx.execution_id, DEFAULT_STAGE).into())
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.envelope.is_success());
        assert_eq!(resp.envelope.data()["ok"], json!(true));
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn envelope_with_status_passes_through_unchanged() {
        let (gov, sink) = governor();
        let handler = handler_fn(|_ctx: RequestContext| async move {
            let pinned = ExecutionId::from("pinned-id");
            let env = build_error("Resource not found", ErrorCode::NotFound, &pinned, "X", None);
            Ok((env, StatusCode::NOT_FOUND).into())
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.envelope.execution_id().as_str(), "pinned-id");
        assert_eq!(resp.envelope.meta().stage, "X");
        assert_eq!(sink.warnings(), 0);
    }

    #[tokio::test]
    async fn raw_mapping_is_coerced_with_one_warning() {
        let (gov, sink) = governor();
        let handler = handler_fn(|_ctx: RequestContext| async move {
            Ok(HandlerOutcome::Raw(json!({"foo": "bar"})))
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.envelope.to_value()["data"], json!({"foo": "bar"}));
        assert_eq!(resp.envelope.to_value()["error"], Value::Null);
        assert_eq!(sink.warnings(), 1);
        assert!(sink.faults().is_empty());
    }

    #[tokio::test]
    async fn raw_scalar_with_status_is_wrapped_under_result() {
        let (gov, sink) = governor();
        let handler = handler_fn(|_ctx: RequestContext| async move {
            Ok(HandlerOutcome::RawWithStatus(json!(42), StatusCode::CREATED))
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(resp.status, StatusCode::CREATED);
        assert_eq!(resp.envelope.data()["result"], json!("42"));
        assert_eq!(sink.warnings(), 1);
    }

    #[tokio::test]
    async fn raw_string_is_not_quoted() {
        let (gov, _sink) = governor();
        let handler = handler_fn(|_ctx: RequestContext| async move {
            Ok(HandlerOutcome::Raw(json!("done")))
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(resp.envelope.data()["result"], json!("done"));
    }

    #[tokio::test]
    async fn fault_is_masked_and_logged_once() {
        let (gov, sink) = governor();
        let handler = handler_fn(|_ctx: RequestContext| async move {
            Err(Fault::msg("DynamoDB provisioned throughput exceeded"))
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);

        let body = resp.envelope.to_value();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["data"], json!({}));
        assert_eq!(
            body["error"],
            json!({"message": "Database operation failed", "code": "DB_ERROR"})
        );
        assert!(!resp.envelope.to_json().contains("DynamoDB"));

        let faults = sink.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].message, "DynamoDB provisioned throughput exceeded");
        assert_eq!(&faults[0].execution_id, resp.envelope.execution_id());
        assert_eq!(faults[0].origin, "test");
        assert!(!faults[0].backtrace.contains("disabled"));
        assert!(faults[0].location.is_none());
    }

    #[tokio::test]
    async fn auth_faults_map_to_403() {
        let (gov, _sink) = governor();
        let handler = handler_fn(|_ctx: RequestContext| async move {
            Err(Fault::msg("User is not authorized: IAM policy denies"))
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN);
        assert_eq!(resp.envelope.error().unwrap().code, ErrorCode::AuthError);
    }

    #[tokio::test]
    async fn panics_are_contained() {
        let (gov, sink) = governor();
        let handler = handler_fn(|_ctx: RequestContext| async move {
            if true {
                panic!("lambda invoke exploded");
            }
            Ok(HandlerOutcome::Raw(Value::Null))
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.envelope.error().unwrap().code, ErrorCode::ServiceError);
        assert_eq!(sink.faults()[0].kind, "panic");
    }

    #[tokio::test]
    async fn handler_sees_the_response_execution_id() {
        let (gov, _sink) = governor();
        let handler = handler_fn(|ctx: RequestContext| async move {
            Ok(HandlerOutcome::Raw(json!({"seen": ctx.execution_id.as_str()})))
        });

        let resp = gov.govern(&handler, request()).await;
        assert_eq!(
            resp.envelope.data()["seen"],
            json!(resp.envelope.execution_id().as_str())
        );
    }

    #[tokio::test]
    async fn each_call_gets_a_fresh_execution_id() {
        let (gov, _sink) = governor();
        let handler =
            handler_fn(|_ctx: RequestContext| async move { Ok(HandlerOutcome::Raw(json!({}))) });

        let a = gov.govern(&handler, request()).await;
        let b = gov.govern(&handler, request()).await;
        assert_ne!(a.envelope.execution_id(), b.envelope.execution_id());
    }

    #[tokio::test]
    async fn configured_stage_is_used_for_coerced_and_fault_envelopes() {
        let sink = Arc::new(MemorySink::new());
        let gov = Governor::new(sink).with_stage("PLAN");
        let ok =
            handler_fn(|_ctx: RequestContext| async move { Ok(HandlerOutcome::Raw(json!({}))) });
        let bad = handler_fn(|_ctx: RequestContext| async move { Err(Fault::msg("boom")) });

        assert_eq!(gov.govern(&ok, request()).await.envelope.meta().stage, "PLAN");
        assert_eq!(gov.govern(&bad, request()).await.envelope.meta().stage, "PLAN");
    }
}
