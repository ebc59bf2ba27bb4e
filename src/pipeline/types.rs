//! Shared types for the classification and routing pipeline.

use serde::{Deserialize, Serialize};

/// Reserved device id meaning "not addressed to a specific receiver".
///
/// Error and Info events carry this sentinel instead of a real pager device.
pub const UNADDRESSED_DEVICE: &str = "0000000";

// ── Event ───────────────────────────────────────────────────────────

/// Classification of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Message,
    Error,
    Debug,
    Info,
    /// No pattern matched. Never routed.
    Unclassified,
}

impl EventKind {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Error => "error",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Unclassified => "unclassified",
        }
    }

    /// Fixed severity per kind: Debug=1 < Info/Message=3 < Error=5.
    pub fn urgency(&self) -> u8 {
        match self {
            Self::Message | Self::Info => 3,
            Self::Error => 5,
            Self::Debug => 1,
            Self::Unclassified => 0,
        }
    }
}

/// One classified pager-network event.
///
/// Built whole by a single pattern rule (or notice constructor) — a later
/// matching rule replaces the entire value, never individual fields. Every
/// non-`Unclassified` event has all fields populated; `timestamp` stays an
/// opaque string for Info events it is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// Timestamp text as it appeared in the line, passed through verbatim.
    pub timestamp: String,
    /// Pager receiver id, or [`UNADDRESSED_DEVICE`] for Error/Info.
    pub device_id: String,
    /// Payload substring extracted from the line.
    pub text: String,
    /// Human-readable summary derived from the kind.
    pub title: String,
    /// Classification tags, used by the transport for iconography/filtering.
    pub labels: Vec<String>,
    pub urgency: u8,
}

impl Event {
    /// The default no-match state. Dropped before routing.
    pub fn unclassified() -> Self {
        Self {
            kind: EventKind::Unclassified,
            timestamp: String::new(),
            device_id: String::new(),
            text: String::new(),
            title: String::new(),
            labels: Vec::new(),
            urgency: EventKind::Unclassified.urgency(),
        }
    }

    /// A message addressed to a specific receiver.
    pub fn message(source: &str, timestamp: &str, device_id: &str, text: &str) -> Self {
        Self {
            kind: EventKind::Message,
            timestamp: timestamp.to_string(),
            device_id: device_id.to_string(),
            text: text.to_string(),
            title: format!("Message via {source}"),
            labels: vec![
                "notepad".into(),
                source.to_lowercase(),
                "message".into(),
                format!("device-{device_id}"),
                "v2".into(),
            ],
            urgency: EventKind::Message.urgency(),
        }
    }

    /// A gateway error line. Not addressed to any device.
    pub fn error(source: &str, timestamp: &str, text: &str) -> Self {
        Self {
            kind: EventKind::Error,
            timestamp: timestamp.to_string(),
            device_id: UNADDRESSED_DEVICE.to_string(),
            text: text.to_string(),
            title: format!("ERROR FROM {source}"),
            labels: vec![
                "alert".into(),
                source.to_lowercase(),
                "error".into(),
                "urgent".into(),
                "v2".into(),
            ],
            urgency: EventKind::Error.urgency(),
        }
    }

    /// A gateway debug line for a specific receiver.
    pub fn debug(source: &str, timestamp: &str, device_id: &str, text: &str) -> Self {
        Self {
            kind: EventKind::Debug,
            timestamp: timestamp.to_string(),
            device_id: device_id.to_string(),
            text: text.to_string(),
            title: format!("Debug via {source}"),
            labels: vec![
                "gear".into(),
                source.to_lowercase(),
                "debug".into(),
                format!("device-{device_id}"),
                "v2".into(),
            ],
            urgency: EventKind::Debug.urgency(),
        }
    }
}

// ── Lifecycle notices ───────────────────────────────────────────────

/// Closed set of process-lifecycle notices, delivered as Info events
/// through the same router as classified log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The daemon came up and is watching for pager traffic.
    Online,
    /// The configured log source does not exist yet.
    SourceWaiting { path: String },
    /// The log source appeared and is now being followed.
    SourceMonitoring { path: String },
}

impl Notice {
    /// Look up a notice by name. Unknown names yield `None`; the caller
    /// logs and moves on, never fails.
    pub fn from_name(name: &str, detail: Option<&str>) -> Option<Self> {
        let path = || detail.unwrap_or_default().to_string();
        match name {
            "online" => Some(Self::Online),
            "source_waiting" => Some(Self::SourceWaiting { path: path() }),
            "source_monitoring" => Some(Self::SourceMonitoring { path: path() }),
            _ => None,
        }
    }

    /// Build the Info event for this notice. Title/body/labels/urgency are
    /// static per notice; the body of source notices is the source path.
    pub fn into_event(self, source: &str) -> Event {
        let (title, text, labels, urgency) = match self {
            Self::Online => (
                format!("{source} pager notifier online"),
                format!("Monitoring for {source} calls"),
                vec!["wave", "notify", "online", "v2"],
                EventKind::Info.urgency(),
            ),
            Self::SourceWaiting { path } => (
                "Waiting for log source".to_string(),
                path,
                vec!["hourglass", "notify", "source", "v2"],
                1,
            ),
            Self::SourceMonitoring { path } => (
                "Monitoring log source".to_string(),
                path,
                vec!["floppy_disk", "notify", "source", "v2"],
                1,
            ),
        };
        Event {
            kind: EventKind::Info,
            timestamp: String::new(),
            device_id: UNADDRESSED_DEVICE.to_string(),
            text,
            title,
            labels: labels.into_iter().map(String::from).collect(),
            urgency,
        }
    }
}

// ── Profile ─────────────────────────────────────────────────────────

/// A named subscriber routing rule, loaded once from configuration and
/// immutable for the run. The router never mutates profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique key.
    pub name: String,
    /// When false, nothing is ever delivered to this profile.
    pub enabled: bool,
    /// Event kinds this profile wants.
    pub kinds: Vec<EventKind>,
    /// Receiver id this profile is bound to (may be the unaddressed sentinel).
    pub device_id: String,
    /// Case-insensitive substring searched for in event text.
    pub callsign: String,
    /// When false, callsign matches never cause addressing.
    pub alert_on_callsign: bool,
    /// Opaque destination reference for the transport.
    pub endpoint: String,
}

// ── Dispatch ────────────────────────────────────────────────────────

/// A routed delivery: a profile's endpoint paired with the event's
/// deliverable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOrder {
    pub profile: String,
    pub endpoint: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub urgency: u8,
}
