//! Scene model: the draggable shapes on one canvas and their current poses.
//!
//! Shapes are keyed by a stable name rather than by element identity, so a
//! recording made in one page load can be replayed in the next. The host
//! registers each draggable shape once with its initial transform and
//! configuration; the engine then owns the current transform and reports
//! every change back to the host as an action.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::BTreeMap;

use crate::drag::ShapeConfig;
use crate::error::RotodragError;
use crate::geom::Transform;
use crate::timeline::Snapshot;

/// Stable, unique name of a draggable shape.
pub type ShapeId = String;

/// A draggable shape as seen by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Current pose in canvas space.
    pub transform: Transform,
    /// Drag style and its parameters.
    pub config: ShapeConfig,
    /// Whether the shape's pose is captured in recorded snapshots.
    pub recordable: bool,
}

/// In-memory store of the shapes on one canvas.
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    shapes: BTreeMap<ShapeId, Shape>,
}

impl ShapeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { shapes: BTreeMap::new() }
    }

    /// Register a shape.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::DuplicateShape`] if the name is already taken.
    pub fn insert(&mut self, id: ShapeId, shape: Shape) -> Result<(), RotodragError> {
        if self.shapes.contains_key(&id) {
            return Err(RotodragError::DuplicateShape(id));
        }
        self.shapes.insert(id, shape);
        Ok(())
    }

    /// Remove a shape by name, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<Shape> {
        self.shapes.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Set the current pose of a shape. Returns false if the shape doesn't exist.
    pub fn set_transform(&mut self, id: &str, transform: Transform) -> bool {
        let Some(shape) = self.shapes.get_mut(id) else {
            return false;
        };
        shape.transform = transform;
        true
    }

    /// Whether `id` names a registered, recordable shape.
    #[must_use]
    pub fn is_recordable(&self, id: &str) -> bool {
        self.shapes.get(id).is_some_and(|s| s.recordable)
    }

    /// Current poses of every recordable shape.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.shapes
            .iter()
            .filter(|(_, s)| s.recordable)
            .map(|(id, s)| (id.clone(), s.transform))
            .collect()
    }

    /// Number of shapes currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the store contains no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
