//! Recorded motion: snapshots of every recordable shape keyed by timepoint.
//!
//! The [`Timeline`] is the only owner of recorded data. It never looks inside
//! a [`Transform`]; a snapshot is stored and returned as a whole. Lookups go
//! through [`crate::search::nearest_at_or_before`], so playback holds each
//! frame until the next recorded one.
//!
//! On the wire a timeline is a JSON object keyed by the stringified
//! millisecond timepoint:
//!
//! ```json
//! { "0": { "cat": "matrix(1, 0, 0, 1, 10, 20)" }, "120": { "cat": "..." } }
//! ```

#[cfg(test)]
#[path = "timeline_test.rs"]
mod timeline_test;

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RotodragError;
use crate::geom::Transform;
use crate::scene::ShapeId;
use crate::search;

/// Milliseconds since the start of a recording.
pub type Timepoint = u64;

/// The pose of every recordable shape at one instant.
pub type Snapshot = BTreeMap<ShapeId, Transform>;

/// Outcome of a lenient bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of timepoints kept.
    pub accepted: usize,
    /// Keys that were dropped, either unparseable or not holding an object.
    pub rejected: Vec<String>,
}

/// Snapshots keyed by timepoint, plus the cached highest key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    frames: BTreeMap<Timepoint, Snapshot>,
    record_end: Timepoint,
}

impl Timeline {
    /// An empty timeline. Callers normally seed it with [`Timeline::with_origin`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A timeline holding a single frame at timepoint 0.
    #[must_use]
    pub fn with_origin(snapshot: Snapshot) -> Self {
        let mut timeline = Self::new();
        timeline.record(0, snapshot);
        timeline
    }

    /// Store `snapshot` at `timepoint`, replacing any frame already there.
    pub fn record(&mut self, timepoint: Timepoint, snapshot: Snapshot) {
        self.frames.insert(timepoint, snapshot);
        self.record_end = self.record_end.max(timepoint);
    }

    /// Drop every frame at or after `kill`.
    pub fn clear_from(&mut self, kill: Timepoint) {
        let removed = self.frames.split_off(&kill).len();
        self.record_end = self.last_timepoint().unwrap_or(0);
        debug!(kill, removed, record_end = self.record_end, "timeline: cleared tail");
    }

    /// Drop everything and start over with `origin` at timepoint 0.
    pub fn clear_all(&mut self, origin: Snapshot) {
        self.frames.clear();
        self.frames.insert(0, origin);
        self.record_end = 0;
    }

    /// A copy of `[start, end]` re-based so that `start` becomes 0.
    ///
    /// Frame 0 of the result is seeded with the last snapshot at or before
    /// `start`, so the segment always opens on a valid pose even when nothing
    /// was recorded exactly at `start`. A frame recorded exactly at `start`
    /// takes precedence over the seed.
    #[must_use]
    pub fn trim(&self, start: Timepoint, end: Timepoint) -> Timeline {
        let mut result = Timeline::new();
        if let Some((_, seed)) = self.snapshot_at(start) {
            result.record(0, seed.clone());
        }
        if start <= end {
            for (&t, snapshot) in self.frames.range(start..=end) {
                result.record(t - start, snapshot.clone());
            }
        }
        result
    }

    /// Replace the whole timeline.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::EmptyTimeline`] (and keeps the current frames)
    /// when `frames` is empty.
    pub fn load(&mut self, frames: BTreeMap<Timepoint, Snapshot>) -> Result<(), RotodragError> {
        if frames.is_empty() {
            return Err(RotodragError::EmptyTimeline);
        }
        self.frames = frames;
        self.record_end = self.last_timepoint().unwrap_or(0);
        Ok(())
    }

    /// Replace the whole timeline from its JSON form.
    ///
    /// Entries whose key is not a non-negative integer, or whose value is not
    /// an object, are dropped and listed in the report. Inside a kept
    /// snapshot, a shape whose transform is not a parseable string is left out
    /// of that snapshot, so playback leaves the shape where it is.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::EmptyTimeline`] when `value` is not an object
    /// or no entry survives.
    pub fn load_json(&mut self, value: &Value) -> Result<LoadReport, RotodragError> {
        let Some(entries) = value.as_object() else {
            return Err(RotodragError::EmptyTimeline);
        };

        let mut report = LoadReport::default();
        let mut frames = BTreeMap::new();
        for (key, raw) in entries {
            let (Ok(timepoint), Some(shapes)) = (key.trim().parse::<Timepoint>(), raw.as_object()) else {
                warn!(key = %key, "timeline: rejected imported entry");
                report.rejected.push(key.clone());
                continue;
            };
            frames.insert(timepoint, parse_snapshot(key, shapes));
        }

        report.accepted = frames.len();
        self.load(frames)?;
        Ok(report)
    }

    /// Every recorded timepoint, ascending. Computed from the live frames on each call.
    #[must_use]
    pub fn sorted_timepoints(&self) -> Vec<Timepoint> {
        self.frames.keys().copied().collect()
    }

    /// The recorded timepoint to show at `target`, or `None` if nothing is recorded.
    #[must_use]
    pub fn nearest(&self, target: Timepoint) -> Option<Timepoint> {
        search::nearest_at_or_before(&self.sorted_timepoints(), target, self.record_end)
    }

    /// The snapshot stored exactly at `timepoint`.
    #[must_use]
    pub fn fetch(&self, timepoint: Timepoint) -> Option<&Snapshot> {
        self.frames.get(&timepoint)
    }

    /// The frame to show at `target`: its timepoint and snapshot.
    #[must_use]
    pub fn snapshot_at(&self, target: Timepoint) -> Option<(Timepoint, &Snapshot)> {
        let t = self.nearest(target)?;
        self.fetch(t).map(|s| (t, s))
    }

    /// Highest recorded timepoint, or 0 when empty.
    #[must_use]
    pub fn record_end_time(&self) -> Timepoint {
        self.record_end
    }

    #[must_use]
    pub fn last_timepoint(&self) -> Option<Timepoint> {
        self.frames.last_key_value().map(|(&t, _)| t)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate frames in timepoint order.
    pub fn iter(&self) -> impl Iterator<Item = (Timepoint, &Snapshot)> {
        self.frames.iter().map(|(&t, s)| (t, s))
    }

    /// The JSON export form.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures; none occur for well-formed timelines.
    pub fn to_json(&self) -> Result<Value, RotodragError> {
        Ok(serde_json::to_value(self)?)
    }
}

fn parse_snapshot(key: &str, shapes: &serde_json::Map<String, Value>) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for (name, raw) in shapes {
        match raw.as_str().map(Transform::parse) {
            Some(Ok(transform)) => {
                snapshot.insert(name.clone(), transform);
            }
            Some(Err(e)) => warn!(key, shape = %name, error = %e, "timeline: dropped shape from imported snapshot"),
            None => warn!(key, shape = %name, "timeline: imported transform is not a string"),
        }
    }
    snapshot
}

impl Serialize for Timeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.frames.serialize(serializer)
    }
}
