//! Notification transport abstraction.

pub mod ntfy;

pub use ntfy::NtfyTransport;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::pipeline::types::DispatchOrder;

/// Header bag accompanying one notification body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyHeaders {
    pub title: String,
    /// Labels joined with `", "`.
    pub tags: String,
    /// Urgency as a decimal string.
    pub priority: String,
}

impl NotifyHeaders {
    pub fn for_order(order: &DispatchOrder) -> Self {
        Self {
            title: order.title.clone(),
            tags: order.labels.join(", "),
            priority: order.urgency.to_string(),
        }
    }
}

/// Status indicator returned by a transport call.
///
/// Informational only: it is logged but never alters routing decisions and
/// never triggers a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStatus {
    pub code: u16,
}

impl DispatchStatus {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// A notification sink, invoked once per addressed-and-enabled profile.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one notification. `Err` means the call itself failed
    /// (network, timeout); a reachable endpoint returning any HTTP status
    /// yields `Ok` with that status.
    async fn send(
        &self,
        endpoint: &str,
        body: &str,
        headers: &NotifyHeaders,
    ) -> Result<DispatchStatus, TransportError>;
}
