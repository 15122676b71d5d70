//! Drag math: how a pointer movement turns into a new pose for a shape.
//!
//! Each shape carries a [`DragStyle`]. Given the shape's current transform,
//! the [`DragSession`] captured at pointer-down, and the current pointer
//! position, [`compute_transform`] returns the transform to apply.
//!
//! Angles use a screen convention where 0° points up and values are brought
//! into `[0, 360)` by adding one full turn to negatives. The inputs here are
//! never more than one turn negative.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::consts::{DEFAULT_ROTATE_ABOVE, DEFAULT_ROTATE_BELOW, DEFAULT_SLIP_RADIUS, FULL_TURN_DEG, UP_OFFSET_DEG};
use crate::error::RotodragError;
use crate::geom::{Point, Transform};

/// How pointer movement maps to pose changes for one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragStyle {
    /// Follow the pointer and turn so the grab point stays under it.
    #[default]
    Default,
    /// Pinned at a fixed point; only rotation changes, outside a forbidden arc.
    Rotate,
    /// Grabs near the center slide under the pointer instead of moving the shape.
    Slippery,
    /// Only x changes, clamped to a range; y is pinned.
    Xaxis,
}

/// Per-shape drag configuration. Missing values take the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub drag_style: DragStyle,
    /// `slippery`: grabs closer than this to the center slide.
    pub slip_radius: f64,
    /// `rotate`: start of the forbidden arc, inclusive.
    pub rotate_above: f64,
    /// `rotate`: end of the forbidden arc, exclusive.
    pub rotate_below: f64,
    /// `rotate`: pivot x. Falls back to the shape's current x.
    pub fixed_x: Option<f64>,
    /// `rotate` / `xaxis`: pinned y. Falls back to the shape's current y.
    pub fixed_y: Option<f64>,
    /// `xaxis`: lower bound for x, unbounded when absent.
    pub min_x: Option<f64>,
    /// `xaxis`: upper bound for x, unbounded when absent.
    pub max_x: Option<f64>,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            drag_style: DragStyle::Default,
            slip_radius: DEFAULT_SLIP_RADIUS,
            rotate_above: DEFAULT_ROTATE_ABOVE,
            rotate_below: DEFAULT_ROTATE_BELOW,
            fixed_x: None,
            fixed_y: None,
            min_x: None,
            max_x: None,
        }
    }
}

impl ShapeConfig {
    /// Parse a configuration object built by the host from element attributes.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::Json`] if the JSON is malformed or a field has the wrong type.
    pub fn from_json(raw: &str) -> Result<Self, RotodragError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }
}

/// Pointer context captured when a drag begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Canvas-space point where the drag (re)started.
    pub drag_start: Point,
    /// The start point in the shape's local space, i.e. relative to its center
    /// and independent of its current rotation.
    pub offset: Point,
    /// Angle of `offset`, normalized.
    pub offset_angle: f64,
}

impl DragSession {
    /// Capture a session for a shape posed at `transform`, grabbed at canvas point `point`.
    ///
    /// Returns `None` when `transform` cannot be inverted.
    #[must_use]
    pub fn begin(transform: &Transform, point: Point) -> Option<Self> {
        let offset = transform.inverse()?.apply(point);
        Some(Self { drag_start: point, offset, offset_angle: pointer_angle(offset) })
    }
}

/// Bring a negative angle into `[0, 360)` by adding one full turn.
///
/// Not a modulo. A value still negative after one correction is logged and
/// returned as is.
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let out = if degrees < 0.0 { degrees + FULL_TURN_DEG } else { degrees };
    if out < 0.0 {
        error!(degrees, "angle is more than one turn negative");
    }
    out
}

/// Angle of a vector with 0° pointing up (negative y), normalized.
#[must_use]
pub fn pointer_angle(v: Point) -> f64 {
    normalize_degrees(v.y.atan2(v.x).to_degrees() + UP_OFFSET_DEG)
}

/// Whether `rotation` falls in the arc running clockwise from `above`
/// (inclusive) to `below` (exclusive), wrapping through 0°.
///
/// An arc whose span is a whole number of turns (the defaults 0 → 360
/// included) forbids nothing.
#[must_use]
pub fn in_forbidden_arc(rotation: f64, above: f64, below: f64) -> bool {
    let span = (below - above).rem_euclid(FULL_TURN_DEG);
    span > 0.0 && (rotation - above).rem_euclid(FULL_TURN_DEG) < span
}

/// Rotation that keeps the grab point of `session` under `drag_end`, for a
/// shape whose center is currently at `center`.
#[must_use]
pub fn drag_rotation(center: Point, session: &DragSession, drag_end: Point) -> f64 {
    let relative_angle = pointer_angle(drag_end.relative_to(center));
    normalize_degrees(relative_angle - session.offset_angle)
}

/// Compute the transform for a shape dragged to `drag_end`.
///
/// `current` is the shape's pose before this movement. A held pose is
/// returned as `current` unchanged.
///
/// **Side effect (`slippery` only):** while the grab offset stored in
/// `session` is inside the slip radius, the shape does not move and
/// `session` is rebuilt at `drag_end` against the unchanged pose. Every later
/// movement is then measured from the new point, so a larger motion picks the
/// shape up without a jump. All other styles leave `session` untouched.
pub fn compute_transform(
    current: &Transform,
    config: &ShapeConfig,
    session: &mut DragSession,
    drag_end: Point,
) -> Transform {
    let center = current.origin();
    let offset = session.offset;

    match config.drag_style {
        DragStyle::Rotate => {
            let rotation = drag_rotation(center, session, drag_end);
            if in_forbidden_arc(rotation, config.rotate_above, config.rotate_below) {
                return *current;
            }
            let pivot = Point::new(config.fixed_x.unwrap_or(center.x), config.fixed_y.unwrap_or(center.y));
            Transform::translate(pivot.x, pivot.y).then(Transform::rotate(rotation))
        }
        DragStyle::Slippery if offset.length() < config.slip_radius => {
            if let Some(rebased) = DragSession::begin(current, drag_end) {
                *session = rebased;
            }
            *current
        }
        DragStyle::Xaxis => {
            let mut x = drag_end.x - offset.x;
            if let Some(min) = config.min_x {
                x = x.max(min);
            }
            if let Some(max) = config.max_x {
                x = x.min(max);
            }
            Transform::translate(x, config.fixed_y.unwrap_or(center.y))
        }
        DragStyle::Default | DragStyle::Slippery => {
            let rotation = drag_rotation(center, session, drag_end);
            Transform::translate(drag_end.x, drag_end.y)
                .then(Transform::rotate(rotation))
                .then(Transform::translate(-offset.x, -offset.y))
        }
    }
}
