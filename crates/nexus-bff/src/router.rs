//! Route table.
//!
//! Routes are kept in registration order and resolved by a linear scan with a
//! path-template matcher supporting `{param}` segments. Route tables here are
//! a handful of entries, so the scan is fine.

use crate::error::{BffError, BffResult};
use crate::governance::RouteHandler;
use axum::http::Method;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered route.
#[derive(Clone)]
pub struct Route {
    /// Stable name used in logs, e.g. `executions.start`.
    pub id: String,
    pub method: Method,
    pub pattern: String,
    pub handler: Arc<dyn RouteHandler>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Result of a successful lookup.
#[derive(Clone)]
pub struct RouteMatch {
    pub route_id: String,
    pub handler: Arc<dyn RouteHandler>,
    pub path_params: HashMap<String, String>,
}

#[derive(Default, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        method: Method,
        pattern: impl Into<String>,
        handler: Arc<dyn RouteHandler>,
    ) -> BffResult<()> {
        let id = id.into();
        let pattern = pattern.into();

        if id.trim().is_empty() {
            return Err(BffError::EmptyRouteId);
        }
        if self.routes.iter().any(|r| r.id == id) {
            return Err(BffError::DuplicateRoute(id));
        }
        validate_pattern(&pattern).map_err(|msg| BffError::InvalidPathPattern(id.clone(), msg))?;

        self.routes.push(Route {
            id,
            method,
            pattern,
            handler,
        });
        Ok(())
    }

    /// Find the first route whose method and template match.
    pub fn resolve(&self, path: &str, method: &Method) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                match_path(&route.pattern, path).map(|path_params| RouteMatch {
                    route_id: route.id.clone(),
                    handler: route.handler.clone(),
                    path_params,
                })
            })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn validate_pattern(pattern: &str) -> Result<(), String> {
    if !pattern.starts_with('/') {
        return Err("pattern must start with '/'".to_string());
    }
    for segment in pattern.trim_matches('/').split('/') {
        let opens = segment.matches('{').count();
        let closes = segment.matches('}').count();
        let is_param = segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2;
        if (opens > 0 || closes > 0) && !(is_param && opens == 1 && closes == 1) {
            return Err(format!("malformed segment '{segment}'"));
        }
    }
    Ok(())
}

/// Match a concrete path against a template such as `/executions/{id}`.
///
/// Captured values are percent-decoded; invalid UTF-8 is replaced.
fn match_path(template: &str, path: &str) -> Option<HashMap<String, String>> {
    let t_parts: Vec<&str> = template.trim_matches('/').split('/').collect();
    let p_parts: Vec<&str> = path.trim_matches('/').split('/').collect();

    if t_parts.len() != p_parts.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (t, p) in t_parts.iter().zip(p_parts.iter()) {
        if let Some(name) = t.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if p.is_empty() {
                return None;
            }
            let value = percent_decode_str(p).decode_utf8_lossy();
            params.insert(name.to_string(), value.into_owned());
        } else if t != p {
            return None;
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::{HandlerOutcome, handler_fn};
    use crate::request::RequestContext;
    use serde_json::Value;

    fn noop() -> Arc<dyn RouteHandler> {
        Arc::new(handler_fn(|_ctx: RequestContext| async move {
            Ok(HandlerOutcome::Raw(Value::Null))
        }))
    }

    #[test]
    fn exact_path_matches() {
        let mut table = RouteTable::new();
        table.register("health", Method::GET, "/health", noop()).unwrap();
        let m = table.resolve("/health", &Method::GET).unwrap();
        assert_eq!(m.route_id, "health");
        assert!(m.path_params.is_empty());
    }

    #[test]
    fn param_path_extracts_value() {
        let mut table = RouteTable::new();
        table
            .register("executions.get", Method::GET, "/executions/{id}", noop())
            .unwrap();
        let m = table.resolve("/executions/abc-123", &Method::GET).unwrap();
        assert_eq!(m.path_params.get("id").unwrap(), "abc-123");
    }

    #[test]
    fn param_values_are_percent_decoded() {
        let mut table = RouteTable::new();
        table
            .register("executions.get", Method::GET, "/executions/{id}", noop())
            .unwrap();

        let m = table.resolve("/executions/a%20b", &Method::GET).unwrap();
        assert_eq!(m.path_params["id"], "a b");

        let m = table.resolve("/executions/r%C3%A9sum%C3%A9", &Method::GET).unwrap();
        assert_eq!(m.path_params["id"], "résumé");

        let m = table.resolve("/executions/bad%FF", &Method::GET).unwrap();
        assert_eq!(m.path_params["id"], "bad\u{FFFD}");
    }

    #[test]
    fn literal_route_registered_first_wins() {
        let mut table = RouteTable::new();
        table
            .register("executions.start", Method::GET, "/executions/start", noop())
            .unwrap();
        table
            .register("executions.get", Method::GET, "/executions/{id}", noop())
            .unwrap();
        let m = table.resolve("/executions/start", &Method::GET).unwrap();
        assert_eq!(m.route_id, "executions.start");
    }

    #[test]
    fn method_must_match() {
        let mut table = RouteTable::new();
        table
            .register("login", Method::POST, "/auth/login", noop())
            .unwrap();
        assert!(table.resolve("/auth/login", &Method::GET).is_none());
        assert!(table.resolve("/auth/login", &Method::POST).is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let table = RouteTable::new();
        assert!(table.resolve("/nonexistent", &Method::GET).is_none());
    }

    #[test]
    fn trailing_slash_is_tolerated() {
        let mut table = RouteTable::new();
        table.register("health", Method::GET, "/health", noop()).unwrap();
        assert!(table.resolve("/health/", &Method::GET).is_some());
        assert!(table.resolve("/health/extra", &Method::GET).is_none());
    }

    #[test]
    fn duplicate_route_id_rejected() {
        let mut table = RouteTable::new();
        table.register("r1", Method::GET, "/a", noop()).unwrap();
        let err = table.register("r1", Method::GET, "/b", noop()).unwrap_err();
        assert!(matches!(err, BffError::DuplicateRoute(ref id) if id == "r1"));
    }

    #[test]
    fn invalid_patterns_rejected() {
        let mut table = RouteTable::new();
        assert!(matches!(
            table.register("r1", Method::GET, "no-slash", noop()),
            Err(BffError::InvalidPathPattern(..))
        ));
        assert!(matches!(
            table.register("r2", Method::GET, "/a/{broken", noop()),
            Err(BffError::InvalidPathPattern(..))
        ));
        assert!(matches!(
            table.register(" ", Method::GET, "/a", noop()),
            Err(BffError::EmptyRouteId)
        ));
    }
}
