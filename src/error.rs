//! Error type shared by every component of the crate.
//!
//! Nothing here is fatal. Each variant describes an operation that was
//! rejected and left the engine state untouched; per-frame problems (a
//! snapshot naming an unknown shape, a malformed imported key) are skipped and
//! logged instead of being raised.

use crate::mode::Mode;
use crate::scene::ShapeId;

#[derive(Debug, thiserror::Error)]
pub enum RotodragError {
    /// The operation is only legal in another mode (e.g. `seek` while playing).
    #[error("{op} is not allowed in {mode} mode")]
    InvalidMode { op: &'static str, mode: Mode },

    /// The requested mode change skips a required intermediate state.
    #[error("cannot go from {from} to {to}")]
    InvalidTransition { from: Mode, to: Mode },

    /// No shape is registered under this name.
    #[error("unknown shape: {0}")]
    UnknownShape(ShapeId),

    /// A shape with this name is already registered.
    #[error("duplicate shape: {0}")]
    DuplicateShape(ShapeId),

    /// The timeline (or the data offered to replace it) has no entries.
    #[error("timeline is empty")]
    EmptyTimeline,

    /// A transform string could not be parsed.
    #[error("malformed transform: {0}")]
    MalformedTransform(String),

    /// The shape's transform has no inverse, so a pointer cannot be mapped into it.
    #[error("transform of {0} is not invertible")]
    SingularTransform(ShapeId),

    /// JSON input could not be decoded.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
