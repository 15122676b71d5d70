//! Shared numeric constants for the rotodrag crate.

// ── Drag styles ─────────────────────────────────────────────────

/// Radius around a slippery shape's center inside which a grab slides instead of moving it.
pub const DEFAULT_SLIP_RADIUS: f64 = 100.0;

/// Start of the forbidden rotation arc when a shape does not configure one.
pub const DEFAULT_ROTATE_ABOVE: f64 = 0.0;

/// End of the forbidden rotation arc when a shape does not configure one.
pub const DEFAULT_ROTATE_BELOW: f64 = 360.0;

// ── Angles ──────────────────────────────────────────────────────

/// One full turn in degrees.
pub const FULL_TURN_DEG: f64 = 360.0;

/// Added to `atan2` so that 0° points up, matching on-screen rotation handles.
pub const UP_OFFSET_DEG: f64 = 90.0;

// ── Playback ────────────────────────────────────────────────────

/// Interval between playback ticks the host is expected to drive, in milliseconds.
pub const DEFAULT_PLAYBACK_INTERVAL_MS: u64 = 10;
