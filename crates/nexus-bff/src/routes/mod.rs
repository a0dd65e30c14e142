//! Placeholder route handlers.
//!
//! | Method | Path | Status |
//! |--------|------|--------|
//! | `GET`  | `/health` | 200 |
//! | `POST` | `/executions/start` | 202 |
//! | `GET`  | `/executions/{id}` | 200 |
//! | `POST` | `/auth/login` | 200 |
//! | `POST` | `/repos/connect` | 201 |

mod auth;
mod execution;
mod health;
mod repo;

pub use auth::LoginHandler;
pub use execution::{GetExecutionHandler, StartExecutionHandler};
pub use health::HealthHandler;
pub use repo::ConnectRepoHandler;

use crate::builder::build_success;
use crate::config::BffConfig;
use crate::error::BffResult;
use crate::governance::HandlerResult;
use crate::request::RequestContext;
use crate::router::RouteTable;
use axum::http::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;

/// Register every built-in route on `table`.
pub fn register_default_routes(table: &mut RouteTable, config: &BffConfig) -> BffResult<()> {
    let stage = config.stage.clone();

    table.register(
        "health",
        Method::GET,
        "/health",
        Arc::new(HealthHandler::new(config)),
    )?;
    // Literal route first so it is not captured by `/executions/{id}`.
    table.register(
        "executions.start",
        Method::POST,
        "/executions/start",
        Arc::new(StartExecutionHandler::new(stage.clone())),
    )?;
    table.register(
        "executions.get",
        Method::GET,
        "/executions/{id}",
        Arc::new(GetExecutionHandler::new(stage.clone())),
    )?;
    table.register(
        "auth.login",
        Method::POST,
        "/auth/login",
        Arc::new(LoginHandler::new(config.auth_bypass(), stage.clone())),
    )?;
    table.register(
        "repos.connect",
        Method::POST,
        "/repos/connect",
        Arc::new(ConnectRepoHandler::new(stage)),
    )?;
    Ok(())
}

/// Wrap a JSON object in a success envelope with an explicit status.
fn respond(ctx: &RequestContext, stage: &str, status: StatusCode, data: Value) -> HandlerResult {
    let data = match data {
        Value::Object(map) => map,
        other => serde_json::Map::from_iter([("result".to_string(), other)]),
    };
    Ok((build_success(data, &ctx.execution_id, stage), status).into())
}
