//! Input model: pointer events reduced to `(shape, point)` and per-gesture drag sessions.
//!
//! The host resolves each raw mouse or touch event to the name of the
//! draggable shape it belongs to and converts the position to canvas
//! coordinates before calling in. This module tracks which gesture is active
//! and keeps one [`DragSession`] per shape between press and release.
//!
//! Only one gesture runs at a time: the mouse path follows a single pressed
//! shape, and the touch path follows the first touch point, ignoring others.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::HashMap;

use tracing::debug;

use crate::drag::DragSession;
use crate::error::RotodragError;
use crate::geom::{Point, Transform};
use crate::scene::ShapeId;

/// One active touch point, already resolved to its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Touch {
    pub shape: ShapeId,
    pub point: Point,
}

impl Touch {
    #[must_use]
    pub fn new(shape: impl Into<ShapeId>, point: Point) -> Self {
        Self { shape: shape.into(), point }
    }
}

/// The gesture currently being tracked.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress; waiting for the next press.
    #[default]
    Idle,
    /// A mouse button is held on `shape`; moves anywhere on the canvas drag it.
    MouseDragging { shape: ShapeId },
    /// The first touch point is on `shape`.
    TouchDragging { shape: ShapeId },
}

impl InputState {
    /// The shape being dragged, if any.
    #[must_use]
    pub fn shape(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::MouseDragging { shape } | Self::TouchDragging { shape } => Some(shape),
        }
    }
}

/// Drag sessions keyed by shape, plus the active gesture.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    sessions: HashMap<ShapeId, DragSession>,
    pub state: InputState,
}

impl DragController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `shape`, posed at `transform`, grabbed at `point`.
    ///
    /// Replaces any session the shape already had.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::SingularTransform`] if the pose cannot be inverted.
    pub fn begin(&mut self, shape: &str, transform: &Transform, point: Point) -> Result<&DragSession, RotodragError> {
        let session =
            DragSession::begin(transform, point).ok_or_else(|| RotodragError::SingularTransform(shape.to_owned()))?;
        debug!(shape, offset_angle = session.offset_angle, "drag: session started");
        Ok(self.sessions.entry(shape.to_owned()).insert_entry(session).into_mut())
    }

    /// The live session for `shape`.
    pub fn session_mut(&mut self, shape: &str) -> Option<&mut DragSession> {
        self.sessions.get_mut(shape)
    }

    #[must_use]
    pub fn session(&self, shape: &str) -> Option<&DragSession> {
        self.sessions.get(shape)
    }

    /// Discard the session for `shape`. Returns whether one existed.
    pub fn end(&mut self, shape: &str) -> bool {
        let existed = self.sessions.remove(shape).is_some();
        if existed {
            debug!(shape, "drag: session ended");
        }
        existed
    }

    /// End the active gesture and its session, returning the shape it was on.
    pub fn release(&mut self) -> Option<ShapeId> {
        let shape = match std::mem::take(&mut self.state) {
            InputState::Idle => return None,
            InputState::MouseDragging { shape } | InputState::TouchDragging { shape } => shape,
        };
        self.end(&shape);
        Some(shape)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
