//! Drag, rotate, record and replay shapes on an SVG canvas.
//!
//! This crate is compiled to WebAssembly and runs in the browser next to the
//! SVG it animates. It owns everything with state or math in it: the drag
//! styles that turn pointer motion into shape transforms, the per-gesture
//! drag sessions, the record/play mode machine, and the timeline of recorded
//! poses that playback steps through. The host JavaScript layer only resolves
//! DOM events to `(shape name, canvas point)` pairs, drives
//! [`engine::EngineCore::tick`] from its own timer, and writes the returned
//! transforms back onto the elements.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`drag`] | Drag styles and the pointer-to-transform math |
//! | [`input`] | Pointer/touch gesture state and drag sessions |
//! | [`timeline`] | Recorded snapshots keyed by millisecond timepoint |
//! | [`search`] | Floor lookup of a playback time in the timeline |
//! | [`player`] | Host-ticked playback clock |
//! | [`mode`] | Record/play/pause mode and legal transitions |
//! | [`scene`] | Registered shapes and their current poses |
//! | [`geom`] | Points and SVG affine transforms |
//! | [`config`] | Engine-wide options |
//! | [`error`] | Error type |
//! | [`consts`] | Shared numeric defaults |

pub mod config;
pub mod consts;
pub mod drag;
pub mod engine;
pub mod error;
pub mod geom;
pub mod input;
pub mod mode;
pub mod player;
pub mod scene;
pub mod search;
pub mod timeline;

pub use engine::{Action, Engine, EngineCore};
pub use error::RotodragError;
pub use geom::{Point, Transform};
pub use mode::Mode;
pub use timeline::{Snapshot, Timeline, Timepoint};
