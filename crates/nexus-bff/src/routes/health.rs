//! GET /health - liveness probe

use super::respond;
use crate::config::{APP_NAME, BffConfig, Deployment, VERSION};
use crate::governance::{HandlerResult, RouteHandler};
use crate::request::RequestContext;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

pub struct HealthHandler {
    deployment: Deployment,
    auth_bypass: bool,
    stage: String,
}

impl HealthHandler {
    pub fn new(config: &BffConfig) -> Self {
        Self {
            deployment: config.deployment,
            auth_bypass: config.auth_bypass(),
            stage: config.stage.clone(),
        }
    }
}

#[async_trait]
impl RouteHandler for HealthHandler {
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        respond(
            &ctx,
            &self.stage,
            StatusCode::OK,
            json!({
                "service": APP_NAME,
                "version": VERSION,
                "environment": self.deployment.as_str(),
                "auth_bypass": self.auth_bypass,
            }),
        )
    }
}
