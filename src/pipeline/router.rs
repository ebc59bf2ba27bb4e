//! Profile-matching rule evaluator.
//!
//! Pure decision function: an event plus the ordered profile set in, a list
//! of dispatch orders out. Every profile is evaluated independently — there
//! is no first-match-wins across profiles; each enabled, addressable profile
//! gets its own dispatch order, in the order profiles are configured.

use tracing::debug;

use crate::pipeline::types::{DispatchOrder, Event, EventKind, Profile};

/// Device that can never be addressed via a callsign-substring match.
///
/// Looks like a special-cased workaround for one misbehaving receiver
/// rather than a general rule. Kept as a fixed policy constant pending
/// confirmation; do not generalize.
pub const CALLSIGN_EXCLUDED_DEVICE: &str = "0000008";

/// Decide which profiles receive this event.
///
/// `Unclassified` events are skipped outright. For each profile, two gates
/// must both hold:
///
/// 1. addressability — the profile accepts the event's kind AND the event's
///    device matches the watched device, or a permitted callsign substring
///    matches, or the kind is Info/Error (always addressable);
/// 2. enablement — the profile is enabled.
pub fn route(event: &Event, profiles: &[Profile]) -> Vec<DispatchOrder> {
    if event.kind == EventKind::Unclassified {
        return Vec::new();
    }

    let mut orders = Vec::new();
    for profile in profiles {
        let addressable = is_addressable(event, profile);
        if addressable && profile.enabled {
            orders.push(DispatchOrder {
                profile: profile.name.clone(),
                endpoint: profile.endpoint.clone(),
                title: event.title.clone(),
                body: delivery_body(event),
                labels: event.labels.clone(),
                urgency: event.urgency,
            });
        } else {
            debug!(
                profile = %profile.name,
                kind = event.kind.label(),
                addressable,
                enabled = profile.enabled,
                "Profile skipped"
            );
        }
    }
    orders
}

fn is_addressable(event: &Event, profile: &Profile) -> bool {
    if !profile.kinds.contains(&event.kind) {
        return false;
    }

    event.device_id == profile.device_id
        || callsign_matches(event, profile)
        || matches!(event.kind, EventKind::Info | EventKind::Error)
}

/// Case-insensitive callsign substring match, gated on the profile opting
/// in and on the event not targeting the excluded device.
fn callsign_matches(event: &Event, profile: &Profile) -> bool {
    profile.alert_on_callsign
        && event.device_id != CALLSIGN_EXCLUDED_DEVICE
        && event
            .text
            .to_uppercase()
            .contains(&profile.callsign.to_uppercase())
}

/// Error deliveries embed the timestamp; every other kind delivers the
/// event text verbatim.
fn delivery_body(event: &Event) -> String {
    match event.kind {
        EventKind::Error => format!("[{}] {}", event.timestamp, event.text),
        _ => event.text.clone(),
    }
}
