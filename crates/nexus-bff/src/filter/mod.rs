//! Request filters.
//!
//! Filters run after route resolution and before the governance wrapper, in
//! ascending [`FilterOrder`]. A filter may admit the request, reject it with a
//! [`BoundaryFault`], or fail; a failure is answered as an unhandled fault.

mod auth;
mod logger;

pub use auth::ApiKeyFilter;
pub use logger::AccessLogFilter;

use crate::boundary::BoundaryFault;
use crate::fault::Fault;
use crate::request::InboundRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// Numeric slot of a filter in the chain. Equal values keep registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilterOrder(pub u32);

impl FilterOrder {
    pub const AUTH: FilterOrder = FilterOrder(100);
    pub const LOGGING: FilterOrder = FilterOrder(400);
}

#[derive(Debug)]
pub enum FilterAction {
    Continue,
    Reject(BoundaryFault),
}

#[async_trait]
pub trait RequestFilter: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    fn order(&self) -> FilterOrder;

    async fn on_request(&self, req: &mut InboundRequest) -> Result<FilterAction, Fault>;
}

/// Ordered list of filters executed as a pipeline.
#[derive(Default, Clone)]
pub struct FilterPipeline {
    filters: Vec<Arc<dyn RequestFilter>>,
}

impl FilterPipeline {
    pub fn new(mut filters: Vec<Arc<dyn RequestFilter>>) -> Self {
        filters.sort_by_key(|f| f.order());
        Self { filters }
    }

    /// Run every filter; stop at the first rejection or failure.
    pub async fn run_request(&self, req: &mut InboundRequest) -> Result<FilterAction, Fault> {
        for filter in &self.filters {
            match filter.on_request(req).await? {
                FilterAction::Continue => {}
                reject => {
                    tracing::debug!(filter = filter.name(), path = %req.path, "request rejected");
                    return Ok(reject);
                }
            }
        }
        Ok(FilterAction::Continue)
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }
}
