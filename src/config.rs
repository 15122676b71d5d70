//! Engine-wide options set by the host when a canvas is wired up.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_PLAYBACK_INTERVAL_MS;
use crate::error::RotodragError;

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pressing a recordable shape while paused records from the pause point
    /// instead of from the start.
    pub record_from_pause: bool,
    /// When playback runs off the end, recording resumes from there.
    pub record_from_playback_end: bool,
    /// Pressing a recordable shape during playback pauses and records from that point.
    pub record_during_playback: bool,
    /// Tick interval the host should use while playing.
    pub playback_interval_ms: u64,
    /// Fire [`crate::engine::Action::RecordingTimeout`] this long after each recording start.
    pub recording_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            record_from_pause: false,
            record_from_playback_end: false,
            record_during_playback: false,
            playback_interval_ms: DEFAULT_PLAYBACK_INTERVAL_MS,
            recording_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Parse options from a JSON object; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::Json`] for malformed JSON or mistyped fields.
    pub fn from_json(raw: &str) -> Result<Self, RotodragError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }
}
