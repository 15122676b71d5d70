//! Record/play mode and the transitions allowed between modes.
//!
//! Exactly one mode is active per engine. Every transition passes through
//! `Pause`: recording and playback never hand over to each other directly.
//! The engine asks [`Mode::check_transition`] before acting on an explicit
//! call; nothing here polls or changes state on its own.

#[cfg(test)]
#[path = "mode_test.rs"]
mod mode_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RotodragError;

/// The engine-wide record/play state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Nothing is running. Drags still move shapes but are not recorded.
    #[default]
    Pause,
    /// Drags of recordable shapes are written to the timeline.
    Record,
    /// The timeline drives shape poses on each tick.
    Play,
    /// Reserved. Has no recording or playback behavior.
    Overdub,
}

impl Mode {
    /// Lowercase name, as exposed to the host.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Record => "record",
            Self::Play => "play",
            Self::Overdub => "overdub",
        }
    }

    /// Whether `self → to` is a legal single step.
    ///
    /// Staying in the same mode is always legal (stop and pause are
    /// idempotent, and restarting playback replaces the running pass).
    #[must_use]
    pub fn can_transition(self, to: Mode) -> bool {
        match (self, to) {
            (a, b) if a == b => true,
            (Self::Pause, Self::Record | Self::Play) | (Self::Record | Self::Play, Self::Pause) => true,
            _ => false,
        }
    }

    /// Like [`Mode::can_transition`], but as a `Result` for `?` chaining.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidTransition`] when the step is illegal.
    pub fn check_transition(self, to: Mode) -> Result<(), RotodragError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(RotodragError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
