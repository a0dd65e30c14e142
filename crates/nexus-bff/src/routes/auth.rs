//! POST /auth/login - mock credential exchange
//!
//! No credentials are checked; the token is a fixed placeholder whose text
//! depends on whether auth bypass is on.

use super::respond;
use crate::governance::{HandlerResult, RouteHandler};
use crate::request::RequestContext;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

pub struct LoginHandler {
    auth_bypass: bool,
    stage: String,
}

impl LoginHandler {
    pub fn new(auth_bypass: bool, stage: impl Into<String>) -> Self {
        Self {
            auth_bypass,
            stage: stage.into(),
        }
    }
}

#[async_trait]
impl RouteHandler for LoginHandler {
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        let (message, token) = if self.auth_bypass {
            ("Authentication bypassed (local mode)", "mock-token-local-mode")
        } else {
            ("Authentication successful", "mock-token-aws-mode")
        };

        respond(
            &ctx,
            &self.stage,
            StatusCode::OK,
            json!({
                "status": "ok",
                "route": "login",
                "method": "POST",
                "endpoint": "/auth/login",
                "message": message,
                "token": token,
                "auth_bypass": self.auth_bypass,
            }),
        )
    }
}
