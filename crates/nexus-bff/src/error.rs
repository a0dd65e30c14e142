//! Startup and configuration errors.
//!
//! These never reach a caller: they abort the process before the listener is
//! bound. Request-time failures go through [`crate::governance`] and
//! [`crate::boundary`] instead.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BffError {
    // ── Configuration ────────────────────────────────────────────────────────
    /// `ENV` is something other than `local` or `aws`.
    #[error("invalid ENV value: {0}. Expected 'local' or 'aws'")]
    InvalidEnvironment(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // ── Routes ───────────────────────────────────────────────────────────────
    #[error("route id cannot be empty")]
    EmptyRouteId,

    #[error("route '{0}' is already registered")]
    DuplicateRoute(String),

    #[error("route '{0}' has an invalid path pattern: {1}")]
    InvalidPathPattern(String, String),

    // ── Transport ────────────────────────────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BffResult<T> = Result<T, BffError>;
