/*!
The transient request-state record: created when a request enters
the adapter, owned exclusively by the driver that processes it,
destroyed on reply. Represented as a plain value threaded between
stages, never as a shared container.
*/

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Per-request context common to every pipeline: tenant, identity, and
/// the cancellation token wired from the transport.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant: String,
    pub request_id: uuid::Uuid,
    pub timestamp: DateTime<Utc>,
    pub principal: String,
    pub cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(tenant: impl Into<String>, principal: impl Into<String>) -> Self {
        RequestContext {
            tenant: tenant.into(),
            request_id: uuid::Uuid::new_v4(),
            timestamp: Utc::now(),
            principal: principal.into(),
            cancellation: CancellationToken::new(),
        }
    }
}
