//! Boundary fault handlers.
//!
//! Transport-level conditions that happen outside any wrapped handler
//! (unmatched path, rejected request, unparseable body, panics in the service
//! stack) still have to leave as a governed envelope. Each condition gets a
//! fresh execution id.
//!
//! | Condition | Code | Status |
//! |-----------|------|--------|
//! | [`BoundaryFault::MalformedRequest`] | `VALIDATION_ERROR` | 400 |
//! | [`BoundaryFault::Forbidden`] | `AUTH_ERROR` | 403 |
//! | [`BoundaryFault::NotFound`] | `NOT_FOUND` | 404 |
//! | [`BoundaryFault::Internal`] | classifier | 500 |
//! | [`BoundaryFault::Unhandled`] | classifier | 500 |

use crate::builder::build_error;
use crate::classify::classify_fault;
use crate::diagnostics::{DiagnosticSink, FaultRecord};
use crate::envelope::{ErrorCode, ExecutionId};
use crate::fault::Fault;
use crate::governance::GovernedResponse;
use axum::http::StatusCode;
use std::any::Any;
use std::sync::Arc;

/// A transport-level condition that must be answered with an envelope.
#[derive(Debug)]
pub enum BoundaryFault {
    MalformedRequest,
    Forbidden,
    NotFound,
    /// Panic or crash in the transport stack.
    Internal(Fault),
    /// Any other fault that escaped outside a wrapped handler.
    Unhandled(Fault),
}

impl BoundaryFault {
    pub fn label(&self) -> &'static str {
        match self {
            BoundaryFault::MalformedRequest => "malformed_request",
            BoundaryFault::Forbidden => "forbidden",
            BoundaryFault::NotFound => "not_found",
            BoundaryFault::Internal(_) => "internal_error",
            BoundaryFault::Unhandled(_) => "unhandled_fault",
        }
    }

    /// Build the governed response for this condition.
    pub fn respond(self, sink: &dyn DiagnosticSink, stage: &str) -> GovernedResponse {
        let execution_id = ExecutionId::generate();
        let label = self.label();

        let (message, code, status) = match self {
            BoundaryFault::MalformedRequest => (
                "Invalid request format",
                ErrorCode::ValidationError,
                StatusCode::BAD_REQUEST,
            ),
            BoundaryFault::Forbidden => {
                ("Access denied", ErrorCode::AuthError, StatusCode::FORBIDDEN)
            }
            BoundaryFault::NotFound => {
                ("Resource not found", ErrorCode::NotFound, StatusCode::NOT_FOUND)
            }
            BoundaryFault::Internal(fault) | BoundaryFault::Unhandled(fault) => {
                sink.fault(FaultRecord::new(&execution_id, label, &fault));
                let (message, code) = classify_fault(&fault);
                (message, code, StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        tracing::debug!(
            execution_id = %execution_id,
            condition = label,
            status = status.as_u16(),
            "boundary fault answered"
        );
        GovernedResponse::new(build_error(message, code, &execution_id, stage, None), status)
    }
}

pub fn bad_request(sink: &dyn DiagnosticSink, stage: &str) -> GovernedResponse {
    BoundaryFault::MalformedRequest.respond(sink, stage)
}

pub fn forbidden(sink: &dyn DiagnosticSink, stage: &str) -> GovernedResponse {
    BoundaryFault::Forbidden.respond(sink, stage)
}

pub fn not_found(sink: &dyn DiagnosticSink, stage: &str) -> GovernedResponse {
    BoundaryFault::NotFound.respond(sink, stage)
}

pub fn internal_error(sink: &dyn DiagnosticSink, stage: &str, fault: Fault) -> GovernedResponse {
    BoundaryFault::Internal(fault).respond(sink, stage)
}

pub fn unhandled_fault(sink: &dyn DiagnosticSink, stage: &str, fault: Fault) -> GovernedResponse {
    BoundaryFault::Unhandled(fault).respond(sink, stage)
}

/// Panic responder for `tower_http::catch_panic::CatchPanicLayer`.
#[derive(Clone)]
pub struct PanicResponder {
    sink: Arc<dyn DiagnosticSink>,
    stage: String,
}

impl PanicResponder {
    pub fn new(sink: Arc<dyn DiagnosticSink>, stage: impl Into<String>) -> Self {
        Self {
            sink,
            stage: stage.into(),
        }
    }
}

impl tower_http::catch_panic::ResponseForPanic for PanicResponder {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn Any + Send + 'static>,
    ) -> axum::http::Response<Self::ResponseBody> {
        use axum::response::IntoResponse;
        internal_error(self.sink.as_ref(), &self.stage, Fault::from_panic(err)).into_response()
    }
}
