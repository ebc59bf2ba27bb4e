//! Settings loading and validation.
//!
//! The settings file is JSON: the watched source (name + logfile path), the
//! three classification patterns, and the ordered profile list. Everything
//! here is validated before the first line is processed — a pattern that
//! doesn't compile or a malformed profile is fatal at startup, per the
//! rule that only configuration-shape errors may crash the daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::pipeline::classifier::PatternRuleSet;
use crate::pipeline::types::Profile;

fn default_dispatch_gap_ms() -> u64 {
    1_000
}

/// The pager network being watched.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Display name, e.g. "DAPNET". Used in titles and (lowercased) labels.
    pub name: String,
    /// Gateway logfile to tail.
    pub logfile: PathBuf,
}

/// Raw pattern strings for the three classification rules.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    /// Captures `(timestamp, device_id, text)`.
    pub message: String,
    /// Captures `(timestamp, text)`.
    pub error: String,
    /// Captures `(timestamp, device_id, text)`.
    pub debug: String,
}

/// Full daemon settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub source: SourceConfig,
    pub patterns: PatternConfig,
    /// Subscriber profiles, evaluated in this order.
    pub profiles: Vec<Profile>,
    /// Gap between consecutive transport calls, in milliseconds.
    #[serde(default = "default_dispatch_gap_ms")]
    pub dispatch_gap_ms: u64,
}

impl Settings {
    /// Read, parse, and validate a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Compile the configured patterns (also run by [`Self::validate`]).
    pub fn rule_set(&self) -> Result<PatternRuleSet, ConfigError> {
        PatternRuleSet::compile(
            &self.patterns.message,
            &self.patterns.error,
            &self.patterns.debug,
        )
    }

    pub fn dispatch_gap(&self) -> Duration {
        Duration::from_millis(self.dispatch_gap_ms)
    }

    /// Shape checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rule_set()?;

        let mut seen = std::collections::HashSet::new();
        for profile in &self.profiles {
            if profile.name.is_empty() {
                return Err(ConfigError::InvalidProfile {
                    name: "<unnamed>".into(),
                    reason: "profile name must not be empty".into(),
                });
            }
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigError::DuplicateProfile(profile.name.clone()));
            }
            if profile.endpoint.is_empty() {
                return Err(ConfigError::InvalidProfile {
                    name: profile.name.clone(),
                    reason: "endpoint must not be empty".into(),
                });
            }
            // An empty callsign substring matches every event text; with
            // alerting enabled that would broadcast all traffic.
            if profile.alert_on_callsign && profile.callsign.is_empty() {
                return Err(ConfigError::InvalidProfile {
                    name: profile.name.clone(),
                    reason: "alert_on_callsign requires a non-empty callsign".into(),
                });
            }
        }
        Ok(())
    }
}
