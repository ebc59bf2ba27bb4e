//! Pattern-based line classification.
//!
//! Three configured regexes (message, error, debug) are evaluated against
//! every line in that fixed order. Each match builds a complete replacement
//! [`Event`], so when a line satisfies more than one pattern the LAST match
//! in evaluation order wins. This is a documented contract, not an accident:
//! overlapping patterns must resolve Message → Error → Debug.

use regex::{Captures, Regex};
use tracing::debug;

use crate::error::ConfigError;
use crate::pipeline::types::{Event, EventKind};

/// The three compiled pattern rules, validated at load time.
///
/// Capture layout (positional):
/// - message: `(timestamp, device_id, text)`
/// - error:   `(timestamp, text)` — the device id is forced to the sentinel
/// - debug:   `(timestamp, device_id, text)`
#[derive(Debug, Clone)]
pub struct PatternRuleSet {
    message: Regex,
    error: Regex,
    debug: Regex,
}

impl PatternRuleSet {
    /// Compile the three configured patterns.
    ///
    /// Fails fast on a pattern that doesn't compile or that declares the
    /// wrong number of capture groups — both are fatal configuration errors.
    pub fn compile(message: &str, error: &str, debug: &str) -> Result<Self, ConfigError> {
        let message = compile_rule("message", message, 3)?;
        let error = compile_rule("error", error, 2)?;
        let debug = compile_rule("debug", debug, 3)?;
        Ok(Self {
            message,
            error,
            debug,
        })
    }
}

fn compile_rule(name: &str, pattern: &str, groups: usize) -> Result<Regex, ConfigError> {
    let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    // captures_len counts the implicit whole-match group
    let found = regex.captures_len() - 1;
    if found != groups {
        return Err(ConfigError::PatternGroups {
            name: name.to_string(),
            expected: groups,
            found,
        });
    }
    Ok(regex)
}

/// Stateless line classifier: raw text in, zero-or-one typed event out.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: PatternRuleSet,
    source: String,
}

impl Classifier {
    pub fn new(rules: PatternRuleSet, source: impl Into<String>) -> Self {
        Self {
            rules,
            source: source.into(),
        }
    }

    /// Name of the watched pager network, used in event titles and labels.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Classify one line.
    ///
    /// Applies the message, error, and debug rules independently to the full
    /// line, in that order; each match replaces the working event wholesale.
    /// Returns [`EventKind::Unclassified`] when nothing matches — callers
    /// must treat that as "do not route". Never fails on malformed input.
    pub fn classify(&self, line: &str) -> Event {
        let mut event = Event::unclassified();

        if let Some(caps) = self.rules.message.captures(line) {
            event = Event::message(
                &self.source,
                group(&caps, 1),
                group(&caps, 2),
                group(&caps, 3),
            );
        }
        if let Some(caps) = self.rules.error.captures(line) {
            event = Event::error(&self.source, group(&caps, 1), group(&caps, 2));
        }
        if let Some(caps) = self.rules.debug.captures(line) {
            event = Event::debug(
                &self.source,
                group(&caps, 1),
                group(&caps, 2),
                group(&caps, 3),
            );
        }

        if event.kind == EventKind::Unclassified {
            debug!(line = %line, "No pattern matched");
        } else {
            debug!(kind = event.kind.label(), device = %event.device_id, "Line classified");
        }
        event
    }
}

/// A capture group that didn't participate degrades to empty text rather
/// than panicking; group counts are already validated at compile time.
fn group<'a>(caps: &'a Captures<'a>, index: usize) -> &'a str {
    caps.get(index).map_or("", |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        let rules = PatternRuleSet::compile(
            r"^(\S+ \S+) MSG to (\d{7}): (.+)$",
            r"^(\S+ \S+) ERROR: (.+)$",
            r"^(\S+ \S+) DEBUG \[(\d{7})\] (.+)$",
        )
        .unwrap();
        Classifier::new(rules, "DAPNET")
    }

    #[test]
    fn classifies_message_line() {
        let event = classifier().classify("2024-01-01 00:00:00 MSG to 1234567: CQ CQ de N0CALL");
        assert_eq!(event.kind, EventKind::Message);
        assert_eq!(event.timestamp, "2024-01-01 00:00:00");
        assert_eq!(event.device_id, "1234567");
        assert_eq!(event.text, "CQ CQ de N0CALL");
        assert_eq!(event.title, "Message via DAPNET");
        assert_eq!(event.urgency, 3);
    }

    #[test]
    fn classifies_error_line_with_sentinel_device() {
        let event = classifier().classify("2024-01-01 00:00:01 ERROR: connection lost");
        assert_eq!(event.kind, EventKind::Error);
        assert_eq!(event.device_id, crate::pipeline::types::UNADDRESSED_DEVICE);
        assert_eq!(event.text, "connection lost");
        assert_eq!(event.urgency, 5);
    }

    #[test]
    fn classifies_debug_line() {
        let event = classifier().classify("2024-01-01 00:00:02 DEBUG [7654321] raw frame 0xAB");
        assert_eq!(event.kind, EventKind::Debug);
        assert_eq!(event.device_id, "7654321");
        assert_eq!(event.text, "raw frame 0xAB");
        assert_eq!(event.urgency, 1);
    }

    #[test]
    fn unmatched_line_is_unclassified() {
        let event = classifier().classify("completely unrelated noise");
        assert_eq!(event.kind, EventKind::Unclassified);
    }

    #[test]
    fn empty_line_is_unclassified() {
        assert_eq!(classifier().classify("").kind, EventKind::Unclassified);
    }

    #[test]
    fn later_rule_overwrites_earlier_match() {
        // Overlapping patterns: everything the debug rule matches also
        // satisfies the message rule. Debug is evaluated last, so it wins.
        let rules = PatternRuleSet::compile(
            r"^(\S+) (\d{7}) (.+)$",
            r"^ts ERROR: ()(.+)$",
            r"^(\S+) (\d{7}) DEBUG (.+)$",
        )
        .unwrap();
        let classifier = Classifier::new(rules, "DAPNET");

        let event = classifier.classify("ts 1234567 DEBUG payload");
        assert_eq!(event.kind, EventKind::Debug);
        assert_eq!(event.text, "payload");

        // A line matching only the message rule still classifies as Message.
        let event = classifier.classify("ts 1234567 plain payload");
        assert_eq!(event.kind, EventKind::Message);
    }

    #[test]
    fn whole_event_is_replaced_not_merged() {
        // The debug rule here captures a different device than the message
        // rule for the same line; the final event must carry the debug
        // capture everywhere, including derived labels.
        let rules = PatternRuleSet::compile(
            r"^(\S+) from (\d{7}) (.*)$",
            r"^never ERROR ()() matches$",
            r"^(\S+) from \d{7} to (\d{7}) (.+)$",
        )
        .unwrap();
        let classifier = Classifier::new(rules, "DAPNET");

        let event = classifier.classify("ts from 1111111 to 2222222 hi");
        assert_eq!(event.kind, EventKind::Debug);
        assert_eq!(event.device_id, "2222222");
        assert!(event.labels.contains(&"device-2222222".to_string()));
        assert!(!event.labels.contains(&"device-1111111".to_string()));
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let err = PatternRuleSet::compile(r"([unclosed", r"(a)(b)", r"(a)(b)(c)").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref name, .. } if name == "message"));
    }

    #[test]
    fn wrong_group_count_is_a_config_error() {
        let err = PatternRuleSet::compile(r"(a)(b)(c)", r"(a)", r"(a)(b)(c)").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PatternGroups {
                ref name,
                expected: 2,
                found: 1,
            } if name == "error"
        ));
    }
}
