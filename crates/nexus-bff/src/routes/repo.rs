//! POST /repos/connect - link a GitHub repository

use super::respond;
use crate::governance::{HandlerResult, RouteHandler};
use crate::request::RequestContext;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{Value, json};

pub struct ConnectRepoHandler {
    stage: String,
}

impl ConnectRepoHandler {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }
}

#[async_trait]
impl RouteHandler for ConnectRepoHandler {
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        // The access token is never echoed back.
        let repo_url = ctx.body().get("repo_url").cloned().unwrap_or(Value::Null);

        respond(
            &ctx,
            &self.stage,
            StatusCode::CREATED,
            json!({
                "status": "ok",
                "route": "connect_repo",
                "method": "POST",
                "endpoint": "/repos/connect",
                "message": "Repository connected successfully",
                "repository_id": "mock-repo-id-12345",
                "repo_url": repo_url,
                "connection_status": "active",
            }),
        )
    }
}
