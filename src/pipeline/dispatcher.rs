//! Line dispatcher — runs one line (or one lifecycle notice) through
//! classify → route → transport, to completion.
//!
//! Transport calls for the profiles addressed by a single event are issued
//! strictly sequentially, in profile order, with a fixed gap between
//! consecutive calls so the receiving notification service cannot reorder
//! or coalesce near-simultaneous deliveries. A failed call is reported for
//! that profile only and never blocks the remaining profiles.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::router::route;
use crate::pipeline::types::{Event, EventKind, Notice, Profile};
use crate::transport::{DispatchStatus, NotifyHeaders, Transport};

/// Default gap between consecutive transport calls for one event.
pub const DISPATCH_GAP: Duration = Duration::from_secs(1);

/// Outcome of one transport call.
#[derive(Debug)]
pub struct Delivery {
    pub profile: String,
    pub result: Result<DispatchStatus, TransportError>,
}

/// What happened to one event: who it went to, and when we finished.
#[derive(Debug)]
pub struct DispatchReport {
    pub event: Event,
    pub deliveries: Vec<Delivery>,
    pub completed_at: DateTime<Utc>,
}

/// Drives the full pipeline for each incoming line.
///
/// Holds the immutable profile set for the run; classification and routing
/// are pure, the transport calls are the only side effects.
pub struct Dispatcher {
    classifier: Classifier,
    profiles: Vec<Profile>,
    transport: Arc<dyn Transport>,
    gap: Duration,
}

impl Dispatcher {
    pub fn new(classifier: Classifier, profiles: Vec<Profile>, transport: Arc<dyn Transport>) -> Self {
        Self {
            classifier,
            profiles,
            transport,
            gap: DISPATCH_GAP,
        }
    }

    /// Override the inter-call gap (tests, or transports with native
    /// ordered delivery).
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = gap;
        self
    }

    /// Process one log line to completion.
    ///
    /// Returns `None` for lines no pattern recognizes — not an error, the
    /// line is dropped before routing.
    pub async fn process_line(&self, line: &str) -> Option<DispatchReport> {
        let event = self.classifier.classify(line);
        if event.kind == EventKind::Unclassified {
            return None;
        }
        Some(self.dispatch(event).await)
    }

    /// Deliver a lifecycle notice through the same router as log events.
    pub async fn announce(&self, notice: Notice) -> DispatchReport {
        let event = notice.into_event(self.classifier.source());
        self.dispatch(event).await
    }

    /// Deliver a notice looked up by name. Unrecognized names are logged
    /// and skipped, never fatal.
    pub async fn announce_named(&self, name: &str, detail: Option<&str>) -> Option<DispatchReport> {
        match Notice::from_name(name, detail) {
            Some(notice) => Some(self.announce(notice).await),
            None => {
                warn!(notice = %name, "Unknown notice name, nothing dispatched");
                None
            }
        }
    }

    /// Route an event and issue one transport call per dispatch order.
    pub async fn dispatch(&self, event: Event) -> DispatchReport {
        let orders = route(&event, &self.profiles);
        info!(
            kind = event.kind.label(),
            device = %event.device_id,
            matched = orders.len(),
            "Dispatching event"
        );

        let mut deliveries = Vec::with_capacity(orders.len());
        for (i, order) in orders.iter().enumerate() {
            if i > 0 {
                sleep(self.gap).await;
            }

            let headers = NotifyHeaders::for_order(order);
            let result = self
                .transport
                .send(&order.endpoint, &order.body, &headers)
                .await;

            match &result {
                Ok(status) if status.is_success() => {
                    debug!(profile = %order.profile, status = status.code, "Delivered");
                }
                Ok(status) => {
                    warn!(
                        profile = %order.profile,
                        status = status.code,
                        "Transport returned non-success status"
                    );
                }
                Err(e) => {
                    warn!(profile = %order.profile, error = %e, "Transport call failed");
                }
            }

            deliveries.push(Delivery {
                profile: order.profile.clone(),
                result,
            });
        }

        DispatchReport {
            event,
            deliveries,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use tokio::time::Instant;

    use crate::pipeline::classifier::PatternRuleSet;

    /// Records every send with its endpoint and arrival time; can be told
    /// to fail for specific endpoints.
    struct RecordingTransport {
        calls: Mutex<Vec<(String, String, NotifyHeaders, Instant)>>,
        fail_endpoints: Vec<String>,
    }

    impl RecordingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_endpoints: Vec::new(),
            })
        }

        fn failing_on(endpoint: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_endpoints: vec![endpoint.to_string()],
            })
        }

        fn calls(&self) -> Vec<(String, String, NotifyHeaders, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn send(
            &self,
            endpoint: &str,
            body: &str,
            headers: &NotifyHeaders,
        ) -> Result<DispatchStatus, TransportError> {
            self.calls.lock().unwrap().push((
                endpoint.to_string(),
                body.to_string(),
                headers.clone(),
                Instant::now(),
            ));
            if self.fail_endpoints.iter().any(|e| e == endpoint) {
                return Err(TransportError::Request {
                    endpoint: endpoint.to_string(),
                    reason: "connection refused".into(),
                });
            }
            Ok(DispatchStatus { code: 200 })
        }
    }

    fn classifier() -> Classifier {
        let rules = PatternRuleSet::compile(
            r"^(\S+ \S+) MSG to (\d{7}): (.+)$",
            r"^(\S+ \S+) ERROR: (.+)$",
            r"^(\S+ \S+) DEBUG \[(\d{7})\] (.+)$",
        )
        .unwrap();
        Classifier::new(rules, "DAPNET")
    }

    fn profile(name: &str, device: &str) -> Profile {
        Profile {
            name: name.into(),
            enabled: true,
            kinds: vec![EventKind::Message, EventKind::Error, EventKind::Info],
            device_id: device.into(),
            callsign: "N0CALL".into(),
            alert_on_callsign: false,
            endpoint: format!("https://ntfy.example/{name}"),
        }
    }

    fn dispatcher(transport: Arc<RecordingTransport>, profiles: Vec<Profile>) -> Dispatcher {
        Dispatcher::new(classifier(), profiles, transport).with_gap(Duration::ZERO)
    }

    #[tokio::test]
    async fn unmatched_line_dispatches_nothing() {
        let transport = RecordingTransport::new();
        let d = dispatcher(Arc::clone(&transport), vec![profile("alice", "1234567")]);

        let report = d.process_line("noise the gateway never logs").await;
        assert!(report.is_none());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn matched_line_delivers_to_addressed_profile() {
        let transport = RecordingTransport::new();
        let d = dispatcher(Arc::clone(&transport), vec![profile("alice", "1234567")]);

        let report = d
            .process_line("2024-01-01 00:00:00 MSG to 1234567: hello")
            .await
            .unwrap();
        assert_eq!(report.deliveries.len(), 1);
        assert!(report.deliveries[0].result.is_ok());

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "https://ntfy.example/alice");
        assert_eq!(calls[0].1, "hello");
        assert_eq!(calls[0].2.title, "Message via DAPNET");
        assert_eq!(calls[0].2.priority, "3");
        assert!(calls[0].2.tags.contains("device-1234567"));
    }

    #[tokio::test]
    async fn deliveries_follow_profile_order() {
        let transport = RecordingTransport::new();
        let d = dispatcher(
            Arc::clone(&transport),
            vec![profile("p1", "0000001"), profile("p2", "0000002")],
        );

        d.process_line("2024-01-01 00:00:00 ERROR: link down").await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "https://ntfy.example/p1");
        assert_eq!(calls[1].0, "https://ntfy.example/p2");
        assert!(calls[0].3 <= calls[1].3);
        assert_eq!(calls[0].1, "[2024-01-01 00:00:00] link down");
    }

    #[tokio::test(start_paused = true)]
    async fn gap_enforced_between_consecutive_calls() {
        let transport = RecordingTransport::new();
        let d = Dispatcher::new(
            classifier(),
            vec![profile("p1", "0000001"), profile("p2", "0000002")],
            Arc::clone(&transport) as Arc<dyn Transport>,
        )
        .with_gap(Duration::from_secs(1));

        d.process_line("2024-01-01 00:00:00 ERROR: link down").await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].3.duration_since(calls[0].3) >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn failed_delivery_does_not_block_remaining_profiles() {
        let transport = RecordingTransport::failing_on("https://ntfy.example/p1");
        let d = dispatcher(
            Arc::clone(&transport),
            vec![profile("p1", "0000001"), profile("p2", "0000002")],
        );

        let report = d
            .process_line("2024-01-01 00:00:00 ERROR: link down")
            .await
            .unwrap();

        assert_eq!(report.deliveries.len(), 2);
        assert!(report.deliveries[0].result.is_err());
        assert!(report.deliveries[1].result.is_ok());
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn announce_flows_through_router() {
        let transport = RecordingTransport::new();
        let d = dispatcher(Arc::clone(&transport), vec![profile("alice", "1234567")]);

        let report = d.announce(Notice::Online).await;
        assert_eq!(report.event.kind, EventKind::Info);
        assert_eq!(report.deliveries.len(), 1);

        let calls = transport.calls();
        assert_eq!(calls[0].1, "Monitoring for DAPNET calls");
        assert_eq!(calls[0].2.title, "DAPNET pager notifier online");
    }

    #[tokio::test]
    async fn announce_named_unknown_is_noop() {
        let transport = RecordingTransport::new();
        let d = dispatcher(Arc::clone(&transport), vec![profile("alice", "1234567")]);

        assert!(d.announce_named("selfdestruct", None).await.is_none());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_informational() {
        struct Teapot;
        #[async_trait::async_trait]
        impl Transport for Teapot {
            async fn send(
                &self,
                _endpoint: &str,
                _body: &str,
                _headers: &NotifyHeaders,
            ) -> Result<DispatchStatus, TransportError> {
                Ok(DispatchStatus { code: 418 })
            }
        }

        let d = Dispatcher::new(
            classifier(),
            vec![profile("alice", "1234567")],
            Arc::new(Teapot),
        )
        .with_gap(Duration::ZERO);

        let report = d
            .process_line("2024-01-01 00:00:00 MSG to 1234567: hi")
            .await
            .unwrap();
        // Status is recorded but does not turn the delivery into an error.
        let status = report.deliveries[0].result.as_ref().unwrap();
        assert_eq!(status.code, 418);
        assert!(!status.is_success());
    }
}
