//! ntfy.sh transport — HTTP POST with Title/Tags/Priority headers.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{DispatchStatus, NotifyHeaders, Transport};

/// Per-request timeout, matching the gateway deployment.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP sink for ntfy topics. The endpoint is the full topic URL straight
/// from the profile; the core never interprets it.
pub struct NtfyTransport {
    client: reqwest::Client,
}

impl NtfyTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for NtfyTransport {
    async fn send(
        &self,
        endpoint: &str,
        body: &str,
        headers: &NotifyHeaders,
    ) -> Result<DispatchStatus, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .header("Title", &headers.title)
            .header("Tags", &headers.tags)
            .header("Priority", &headers.priority)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| TransportError::Request {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = DispatchStatus {
            code: response.status().as_u16(),
        };
        debug!(endpoint = %endpoint, status = status.code, "ntfy POST completed");
        Ok(status)
    }
}
