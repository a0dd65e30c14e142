//! Axum-based BFF server.
//!
//! [`BffServer`] wires the route table, filter pipeline and governor into a
//! single axum service. Every request goes through one fallback dispatcher so
//! that unmatched paths, rejected requests and malformed bodies are answered
//! with the same envelope as handler output.
//!
//! ```text
//! request ─► resolve route ──(none)──────────────► 404 NOT_FOUND
//!               │
//!               ▼
//!            filters ──(reject)──────────────────► 403 AUTH_ERROR
//!               │    ──(error)───────────────────► 500 (classified)
//!               ▼
//!            body ──(not a JSON object)──────────► 400 VALIDATION_ERROR
//!               │
//!               ▼
//!            Governor::govern(handler) ──────────► envelope + status
//! ```
//!
//! Panics anywhere in the stack outside a governed handler are turned into an
//! internal-error envelope by `CatchPanicLayer`.

use crate::boundary::{PanicResponder, bad_request, not_found, unhandled_fault};
use crate::config::{APP_NAME, BffConfig};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::BffResult;
use crate::fault::install_panic_hook;
use crate::filter::{AccessLogFilter, ApiKeyFilter, FilterAction, FilterPipeline, RequestFilter};
use crate::governance::{Governor, RouteHandler};
use crate::request::{InboundRequest, parse_body};
use crate::router::RouteTable;
use crate::routes::register_default_routes;
use axum::{
    Router,
    body::to_bytes,
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

/// Upper bound on a buffered request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state injected into the dispatcher via [`State`].
#[derive(Clone)]
pub struct AppState {
    routes: Arc<RouteTable>,
    pipeline: Arc<FilterPipeline>,
    governor: Governor,
}

// ─────────────────────────────────────────────────────────────────────────────
// BffServer
// ─────────────────────────────────────────────────────────────────────────────

/// Pending route registration; applied in [`BffServer::build_app`].
struct ExtraRoute {
    id: String,
    method: Method,
    pattern: String,
    handler: Arc<dyn RouteHandler>,
}

pub struct BffServer {
    config: BffConfig,
    sink: Arc<dyn DiagnosticSink>,
    extra_routes: Vec<ExtraRoute>,
    extra_filters: Vec<Arc<dyn RequestFilter>>,
    default_routes: bool,
}

impl BffServer {
    /// Server with the built-in routes and a `tracing`-backed diagnostic sink.
    pub fn new(config: BffConfig) -> Self {
        Self {
            config,
            sink: Arc::new(TracingSink),
            extra_routes: Vec::new(),
            extra_filters: Vec::new(),
            default_routes: true,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Register an additional route. Built-in routes take precedence.
    pub fn with_route(
        mut self,
        id: impl Into<String>,
        method: Method,
        pattern: impl Into<String>,
        handler: Arc<dyn RouteHandler>,
    ) -> Self {
        self.extra_routes.push(ExtraRoute {
            id: id.into(),
            method,
            pattern: pattern.into(),
            handler,
        });
        self
    }

    /// Add a request filter next to the built-in access-log and API-key filters.
    pub fn with_filter(mut self, filter: Arc<dyn RequestFilter>) -> Self {
        self.extra_filters.push(filter);
        self
    }

    /// Skip the built-in placeholder routes.
    pub fn without_default_routes(mut self) -> Self {
        self.default_routes = false;
        self
    }

    pub fn config(&self) -> &BffConfig {
        &self.config
    }

    /// Build the axum [`Router`].
    ///
    /// Fails if a route id is empty, duplicated, or its pattern is invalid.
    pub fn build_app(&self) -> BffResult<Router> {
        let mut routes = RouteTable::new();
        if self.default_routes {
            register_default_routes(&mut routes, &self.config)?;
        }
        for extra in &self.extra_routes {
            routes.register(
                extra.id.clone(),
                extra.method.clone(),
                extra.pattern.clone(),
                extra.handler.clone(),
            )?;
        }

        let mut filters: Vec<Arc<dyn RequestFilter>> = vec![Arc::new(AccessLogFilter::new())];
        if !self.config.auth_bypass() {
            if self.config.api_keys.is_empty() {
                warn!("BFF_API_KEYS is empty; every request will be rejected");
            }
            filters.push(Arc::new(ApiKeyFilter::new(self.config.api_keys.clone())));
        }
        filters.extend(self.extra_filters.iter().cloned());
        let pipeline = FilterPipeline::new(filters);
        debug!(filters = ?pipeline.names(), routes = routes.routes().len(), "app assembled");

        let governor = Governor::new(self.sink.clone()).with_stage(self.config.stage.clone());
        let panic_responder = PanicResponder::new(self.sink.clone(), self.config.stage.clone());

        let state = AppState {
            routes: Arc::new(routes),
            pipeline: Arc::new(pipeline),
            governor,
        };

        Ok(Router::new().fallback(dispatch).with_state(state).layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(panic_responder))
                .layer(TraceLayer::new_for_http()),
        ))
    }

    /// Bind to the configured host and port and serve until the process exits.
    pub async fn start(self) -> BffResult<()> {
        install_panic_hook();
        let app = self.build_app()?;
        let addr = self.config.bind_addr();
        info!(
            addr = %addr,
            environment = %self.config.deployment,
            auth_bypass = self.config.auth_bypass(),
            "{APP_NAME} starting"
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let sink = state.governor.sink().as_ref();
    let stage = state.governor.stage();

    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let Some(route) = state.routes.resolve(&path, &parts.method) else {
        return not_found(sink, stage).into_response();
    };

    // Parsed up front so filters see the request ids; rejected after filters.
    let parsed = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => parse_body(&bytes).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let mut req = InboundRequest::new(parts.method.clone(), path);
    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            req = req.with_header(name.as_str(), v);
        }
    }
    req.endpoint = route.route_id.clone();
    req.path_params = route.path_params;
    let rejected_body = match parsed {
        Ok((body, envelope)) => {
            req = req.with_body(body, envelope);
            None
        }
        Err(reason) => Some(reason),
    };

    match state.pipeline.run_request(&mut req).await {
        Ok(FilterAction::Continue) => {}
        Ok(FilterAction::Reject(fault)) => return fault.respond(sink, stage).into_response(),
        Err(fault) => return unhandled_fault(sink, stage, fault).into_response(),
    }

    if let Some(reason) = rejected_body {
        debug!(endpoint = %req.endpoint, reason = %reason, "request body rejected");
        return bad_request(sink, stage).into_response();
    }

    state
        .governor
        .govern(route.handler.as_ref(), req)
        .await
        .into_response()
}
