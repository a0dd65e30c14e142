//! Static API-key gate.
//!
//! Accepts requests that carry a configured key in either:
//! - `X-Api-Key: <key>` header
//! - `Authorization: Bearer <key>` header
//!
//! Anything else is answered with the forbidden boundary condition. The
//! filter is only installed when auth bypass is off.

use super::{FilterAction, FilterOrder, RequestFilter};
use crate::boundary::BoundaryFault;
use crate::fault::Fault;
use crate::request::InboundRequest;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::warn;

pub struct ApiKeyFilter {
    valid_keys: HashSet<String>,
}

impl ApiKeyFilter {
    pub fn new(valid_keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            valid_keys: valid_keys.into_iter().map(Into::into).collect(),
        }
    }

    fn extract_key(req: &InboundRequest) -> Option<&str> {
        req.header("x-api-key").or_else(|| {
            req.header("authorization")
                .and_then(|auth| auth.strip_prefix("Bearer "))
        })
    }
}

#[async_trait]
impl RequestFilter for ApiKeyFilter {
    fn name(&self) -> &str {
        "api-key-gate"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::AUTH
    }

    async fn on_request(&self, req: &mut InboundRequest) -> Result<FilterAction, Fault> {
        match Self::extract_key(req).map(str::to_string) {
            Some(key) if self.valid_keys.contains(&key) => {
                req.principal = Some(key);
                Ok(FilterAction::Continue)
            }
            Some(_) => {
                warn!(path = %req.path, "rejected request: invalid API key");
                Ok(FilterAction::Reject(BoundaryFault::Forbidden))
            }
            None => {
                warn!(path = %req.path, "rejected request: missing API key");
                Ok(FilterAction::Reject(BoundaryFault::Forbidden))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn req(auth: Option<&str>, x_api: Option<&str>) -> InboundRequest {
        let mut req = InboundRequest::new(Method::POST, "/executions/start");
        if let Some(v) = auth {
            req = req.with_header("authorization", v);
        }
        if let Some(v) = x_api {
            req = req.with_header("x-api-key", v);
        }
        req
    }

    #[tokio::test]
    async fn bearer_key_admits_and_sets_principal() {
        let filter = ApiKeyFilter::new(["secret-key-1"]);
        let mut r = req(Some("Bearer secret-key-1"), None);
        let action = filter.on_request(&mut r).await.unwrap();
        assert!(matches!(action, FilterAction::Continue));
        assert_eq!(r.principal.as_deref(), Some("secret-key-1"));
    }

    #[tokio::test]
    async fn x_api_key_header_admits() {
        let filter = ApiKeyFilter::new(["sk-abc"]);
        let mut r = req(None, Some("sk-abc"));
        assert!(matches!(
            filter.on_request(&mut r).await.unwrap(),
            FilterAction::Continue
        ));
    }

    #[tokio::test]
    async fn missing_key_is_forbidden() {
        let filter = ApiKeyFilter::new(["sk-abc"]);
        let mut r = req(None, None);
        assert!(matches!(
            filter.on_request(&mut r).await.unwrap(),
            FilterAction::Reject(BoundaryFault::Forbidden)
        ));
    }

    #[tokio::test]
    async fn invalid_key_is_forbidden() {
        let filter = ApiKeyFilter::new(["good-key"]);
        let mut r = req(Some("Bearer bad-key"), None);
        assert!(matches!(
            filter.on_request(&mut r).await.unwrap(),
            FilterAction::Reject(BoundaryFault::Forbidden)
        ));
        assert!(r.principal.is_none());
    }
}
