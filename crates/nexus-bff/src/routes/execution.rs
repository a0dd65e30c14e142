//! Execution workflow endpoints
//!
//! POST /executions/start - trigger a new execution workflow
//! GET  /executions/{id}  - status of one execution

use super::respond;
use crate::governance::{HandlerResult, RouteHandler};
use crate::request::RequestContext;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

pub struct StartExecutionHandler {
    stage: String,
}

impl StartExecutionHandler {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }
}

#[async_trait]
impl RouteHandler for StartExecutionHandler {
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        tracing::info!(
            request_id = %ctx.request.envelope.request_id,
            "execution workflow requested"
        );
        respond(
            &ctx,
            &self.stage,
            StatusCode::ACCEPTED,
            json!({
                "status": "ok",
                "route": "execution_start",
                "method": "POST",
                "endpoint": "/executions/start",
                "message": "Execution workflow started successfully",
            }),
        )
    }
}

pub struct GetExecutionHandler {
    stage: String,
}

impl GetExecutionHandler {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }
}

#[async_trait]
impl RouteHandler for GetExecutionHandler {
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        let id = ctx.path_param("id").unwrap_or_default().to_string();
        respond(
            &ctx,
            &self.stage,
            StatusCode::OK,
            json!({
                "status": "ok",
                "route": "get_execution",
                "method": "GET",
                "endpoint": format!("/executions/{id}"),
                "execution_id": id,
                "message": "Execution details retrieved successfully",
            }),
        )
    }
}
