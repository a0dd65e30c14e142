//! Access-log filter.

use super::{FilterAction, FilterOrder, RequestFilter};
use crate::fault::Fault;
use crate::request::InboundRequest;
use async_trait::async_trait;
use tracing::info;

/// Records every admitted request with its tracking ids.
#[derive(Default)]
pub struct AccessLogFilter;

impl AccessLogFilter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestFilter for AccessLogFilter {
    fn name(&self) -> &str {
        "access-log"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::LOGGING
    }

    async fn on_request(&self, req: &mut InboundRequest) -> Result<FilterAction, Fault> {
        info!(
            method         = %req.method,
            path           = %req.path,
            endpoint       = %req.endpoint,
            request_id     = %req.envelope.request_id,
            correlation_id = %req.envelope.correlation_id,
            principal      = ?req.principal,
            "→ inbound request"
        );
        Ok(FilterAction::Continue)
    }
}
