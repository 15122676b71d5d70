//! Playback clock driven by host ticks.
//!
//! The core never owns a timer. The host calls
//! [`crate::engine::EngineCore::tick`] from its own interval or animation-frame
//! callback, roughly every [`Player::interval_ms`], passing the wall clock.
//! The player turns that into a virtual playback time. Late ticks are not
//! compensated: a slow host simply skips frames.

#[cfg(test)]
#[path = "player_test.rs"]
mod player_test;

use crate::consts::DEFAULT_PLAYBACK_INTERVAL_MS;
use crate::timeline::Timepoint;

/// Wall-clock to playback-time mapping for one playback pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    running: bool,
    /// Wall-clock time of `start`, in milliseconds.
    started_at: u64,
    /// Playback time at `started_at`.
    offset: Timepoint,
    /// Playback time computed by the most recent `advance`.
    current: Timepoint,
    interval_ms: u64,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYBACK_INTERVAL_MS)
    }
}

impl Player {
    #[must_use]
    pub fn new(interval_ms: u64) -> Self {
        Self { running: false, started_at: 0, offset: 0, current: 0, interval_ms }
    }

    /// Begin a pass at playback time `offset`, replacing any running pass.
    pub fn start(&mut self, now: u64, offset: Timepoint) {
        self.stop();
        self.running = true;
        self.started_at = now;
        self.offset = offset;
        self.current = offset;
    }

    /// Stop the pass. Safe to call when nothing is running. Returns whether a pass was running.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    /// Compute the playback time for wall clock `now`, or `None` when stopped.
    ///
    /// A clock that runs backwards is treated as no time passing. The result
    /// saturates at `u64::MAX`.
    pub fn advance(&mut self, now: u64) -> Option<Timepoint> {
        let t = self.time_at(now)?;
        self.current = t;
        Some(t)
    }

    /// Playback time for wall clock `now` without recording it, or `None` when stopped.
    #[must_use]
    pub fn time_at(&self, now: u64) -> Option<Timepoint> {
        self.running.then(|| self.offset.saturating_add(now.saturating_sub(self.started_at)))
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Playback time as of the last `start` or `advance`.
    #[must_use]
    pub fn current(&self) -> Timepoint {
        self.current
    }

    /// How often the host should tick, in milliseconds.
    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}
