//! `nexus-bff` - response governance for the NexusOps backend-for-frontend.
//!
//! Every response that leaves the service, whether it came from a handler,
//! from a handler that failed, or from the transport itself, is a
//! [`ResponseEnvelope`]:
//!
//! ```json
//! {
//!   "success": false,
//!   "data": {},
//!   "error": { "message": "Database operation failed", "code": "DB_ERROR" },
//!   "meta": { "execution_id": "…", "stage": "ASK" }
//! }
//! ```
//!
//! | Piece | Module |
//! |-------|--------|
//! | Envelope model | [`envelope`] |
//! | Response builder | [`builder`] |
//! | Error classifier | [`classify`] |
//! | Governance wrapper | [`governance`] |
//! | Boundary fault handlers | [`boundary`] |
//! | HTTP service | [`server`] |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use nexus_bff::{BffConfig, BffServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = BffConfig::load().expect("config");
//!     BffServer::new(config).start().await.unwrap();
//! }
//! ```

pub mod boundary;
pub mod builder;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod fault;
pub mod filter;
pub mod governance;
pub mod request;
pub mod router;
pub mod routes;
pub mod server;

pub use builder::{build_error, build_success};
pub use classify::{classify, classify_fault};
pub use config::{BffConfig, Deployment};
pub use diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use envelope::{ErrorBody, ErrorCode, ExecutionId, ResponseEnvelope, ResponseMeta};
pub use error::{BffError, BffResult};
pub use fault::Fault;
pub use governance::{
    GovernedResponse, Governor, HandlerOutcome, HandlerResult, RouteHandler, handler_fn,
};
pub use request::RequestContext;
pub use server::BffServer;
