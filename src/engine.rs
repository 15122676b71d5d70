use js_sys::Function;
use serde_json::Value;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

use crate::config::EngineConfig;
use crate::drag::{self, ShapeConfig};
use crate::error::RotodragError;
use crate::geom::{Point, Transform};
use crate::input::{DragController, InputState, Touch};
use crate::mode::Mode;
use crate::player::Player;
use crate::scene::{Shape, ShapeId, ShapeStore};
use crate::timeline::{LoadReport, Snapshot, Timeline, Timepoint};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from engine calls for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Set the shape's on-screen transform.
    TransformApplied { shape: ShapeId, transform: Transform },
    /// A drag session began on the shape.
    DragStarted { shape: ShapeId },
    /// The record/play mode changed.
    ModeChanged { from: Mode, to: Mode },
    /// The configured delay since the last recording start has elapsed.
    RecordingTimeout,
}

/// Core engine state: every piece of logic, with no browser types.
///
/// One instance serves one canvas. All calls that depend on time take the
/// host's wall clock `now` in milliseconds.
pub struct EngineCore {
    pub shapes: ShapeStore,
    pub timeline: Timeline,
    pub drag: DragController,
    pub player: Player,
    pub config: EngineConfig,
    mode: Mode,
    dragging_enabled: bool,
    recording_enabled: bool,
    /// Wall clock at the last recording start.
    record_started_at: u64,
    /// Timepoint the last recording started from.
    record_offset: Timepoint,
    pause_timepoint: Timepoint,
    timeout_deadline: Option<u64>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            shapes: ShapeStore::new(),
            timeline: Timeline::with_origin(Snapshot::new()),
            drag: DragController::new(),
            player: Player::new(config.playback_interval_ms),
            config,
            mode: Mode::Pause,
            dragging_enabled: false,
            recording_enabled: false,
            record_started_at: 0,
            record_offset: 0,
            pause_timepoint: 0,
            timeout_deadline: None,
        }
    }

    // --- Scene ---

    /// Register a draggable shape.
    ///
    /// While nothing beyond the origin frame has been recorded, the origin
    /// frame is refreshed so it includes the new shape's starting pose.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::DuplicateShape`] if the name is taken.
    pub fn add_shape(
        &mut self,
        id: impl Into<ShapeId>,
        transform: Transform,
        config: ShapeConfig,
        recordable: bool,
    ) -> Result<(), RotodragError> {
        self.shapes.insert(id.into(), Shape { transform, config, recordable })?;
        if recordable && self.timeline.record_end_time() == 0 {
            self.timeline.record(0, self.shapes.snapshot());
        }
        Ok(())
    }

    #[must_use]
    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.get(id)
    }

    // --- Gates ---

    pub fn enable_dragging(&mut self) {
        self.dragging_enabled = true;
    }

    pub fn disable_dragging(&mut self) {
        self.dragging_enabled = false;
    }

    pub fn enable_recording(&mut self) {
        self.recording_enabled = true;
    }

    /// Turn off press-to-record and stop any recording in progress.
    pub fn disable_recording(&mut self) -> Vec<Action> {
        self.recording_enabled = false;
        let mut actions = Vec::new();
        if self.mode == Mode::Record {
            self.timeout_deadline = None;
            self.set_mode(Mode::Pause, &mut actions);
        }
        actions
    }

    #[must_use]
    pub fn dragging_enabled(&self) -> bool {
        self.dragging_enabled
    }

    #[must_use]
    pub fn recording_enabled(&self) -> bool {
        self.recording_enabled
    }

    /// Arm (or with `None`, stop arming) the timeout fired after each recording start.
    pub fn set_recording_timeout(&mut self, delay_ms: Option<u64>) {
        self.config.recording_timeout_ms = delay_ms;
    }

    // --- Pointer input ---

    /// Mouse press on `shape` at canvas point `point`. Any gesture still in
    /// progress is released first.
    pub fn on_pointer_down(&mut self, shape: &str, point: Point, now: u64) -> Vec<Action> {
        if !self.dragging_enabled {
            return Vec::new();
        }
        self.drag.release();
        let mut actions = self.begin_or_skip(shape, point);
        if !actions.is_empty() {
            self.drag.state = InputState::MouseDragging { shape: shape.to_owned() };
        }
        actions.extend(self.trigger_recording(shape, now));
        actions
    }

    /// Mouse move anywhere on the canvas.
    pub fn on_pointer_move(&mut self, point: Point, now: u64) -> Vec<Action> {
        if !self.dragging_enabled {
            return Vec::new();
        }
        let InputState::MouseDragging { shape } = &self.drag.state else {
            return Vec::new();
        };
        let shape = shape.clone();
        self.update_or_skip(&shape, point, now)
    }

    /// Mouse release anywhere on the canvas.
    pub fn on_pointer_up(&mut self) {
        if self.dragging_enabled && matches!(self.drag.state, InputState::MouseDragging { .. }) {
            self.drag.release();
        }
    }

    /// Touch start. Only the first touch is followed.
    pub fn on_touch_start(&mut self, touches: &[Touch], now: u64) -> Vec<Action> {
        if !self.dragging_enabled {
            return Vec::new();
        }
        let Some(first) = touches.first() else {
            return Vec::new();
        };
        self.drag.release();
        let mut actions = self.begin_or_skip(&first.shape, first.point);
        if !actions.is_empty() {
            self.drag.state = InputState::TouchDragging { shape: first.shape.clone() };
        }
        actions.extend(self.trigger_recording(&first.shape, now));
        actions
    }

    /// Touch move. Only the first touch is followed, and only while it drags
    /// the shape its touch start landed on.
    pub fn on_touch_move(&mut self, touches: &[Touch], now: u64) -> Vec<Action> {
        if !self.dragging_enabled {
            return Vec::new();
        }
        let Some(first) = touches.first() else {
            return Vec::new();
        };
        if !matches!(&self.drag.state, InputState::TouchDragging { shape } if *shape == first.shape) {
            return Vec::new();
        }
        self.update_or_skip(&first.shape, first.point, now)
    }

    /// All touches lifted.
    pub fn on_touch_end(&mut self) {
        if matches!(self.drag.state, InputState::TouchDragging { .. }) {
            self.drag.release();
        }
    }

    // --- Drag sessions ---

    /// Start a drag session on `shape` grabbed at `point`.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::UnknownShape`] for an unregistered name and
    /// [`RotodragError::SingularTransform`] if the pose cannot be inverted.
    pub fn begin_drag(&mut self, shape: &str, point: Point) -> Result<Vec<Action>, RotodragError> {
        let current = self.shapes.get(shape).ok_or_else(|| RotodragError::UnknownShape(shape.to_owned()))?;
        self.drag.begin(shape, &current.transform, point)?;
        Ok(vec![Action::DragStarted { shape: shape.to_owned() }])
    }

    /// Move the dragged `shape` to `point` and, while recording a recordable
    /// shape, write a frame at `now`. Without a live session this does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::UnknownShape`] for an unregistered name.
    pub fn drag_to(&mut self, shape: &str, point: Point, now: u64) -> Result<Vec<Action>, RotodragError> {
        let current = self.shapes.get(shape).ok_or_else(|| RotodragError::UnknownShape(shape.to_owned()))?;
        let Some(session) = self.drag.session_mut(shape) else {
            return Ok(Vec::new());
        };
        let transform = drag::compute_transform(&current.transform, &current.config, session, point);
        let recordable = current.recordable;

        self.shapes.set_transform(shape, transform);
        if recordable && self.mode == Mode::Record {
            self.continue_recording(now);
        }
        Ok(vec![Action::TransformApplied { shape: shape.to_owned(), transform }])
    }

    /// Discard the session for `shape`.
    pub fn end_drag(&mut self, shape: &str) {
        if self.drag.state.shape() == Some(shape) {
            self.drag.state = InputState::Idle;
        }
        self.drag.end(shape);
    }

    fn begin_or_skip(&mut self, shape: &str, point: Point) -> Vec<Action> {
        self.begin_drag(shape, point).unwrap_or_else(|e| {
            warn!(shape, error = %e, "drag: press ignored");
            Vec::new()
        })
    }

    fn update_or_skip(&mut self, shape: &str, point: Point, now: u64) -> Vec<Action> {
        self.drag_to(shape, point, now).unwrap_or_else(|e| {
            warn!(shape, error = %e, "drag: move ignored");
            Vec::new()
        })
    }

    // --- Recording ---

    /// Start recording with the recording clock at `offset`.
    ///
    /// With `offset == 0` the current pose is written at timepoint 0 at once.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidTransition`] unless paused or already recording.
    pub fn start_recording(&mut self, now: u64, offset: Timepoint) -> Result<Vec<Action>, RotodragError> {
        self.mode.check_transition(Mode::Record)?;
        let mut actions = Vec::new();
        self.record_started_at = now;
        self.record_offset = offset;
        self.set_mode(Mode::Record, &mut actions);
        self.timeout_deadline = self.config.recording_timeout_ms.map(|delay| now.saturating_add(delay));
        if offset == 0 {
            self.continue_recording(now);
        }
        Ok(actions)
    }

    /// Drop everything from the pause point on and record from there.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidMode`] unless paused.
    pub fn start_recording_from_pause(&mut self, now: u64) -> Result<Vec<Action>, RotodragError> {
        self.require(Mode::Pause, "start_recording_from_pause")?;
        self.timeline.clear_from(self.pause_timepoint);
        self.start_recording(now, self.pause_timepoint)
    }

    /// Write the current poses at the recording clock's time for `now`.
    pub fn continue_recording(&mut self, now: u64) {
        let timepoint = self.elapsed_time(now);
        self.record_at(timepoint);
    }

    /// Write the current poses of all recordable shapes at `timepoint`.
    pub fn record_at(&mut self, timepoint: Timepoint) {
        self.timeline.record(timepoint, self.shapes.snapshot());
    }

    /// Stop recording and disarm the recording timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidTransition`] while playing.
    pub fn stop_recording(&mut self) -> Result<Vec<Action>, RotodragError> {
        if self.mode == Mode::Play {
            return Err(RotodragError::InvalidTransition { from: self.mode, to: Mode::Pause });
        }
        let mut actions = Vec::new();
        if self.mode == Mode::Record {
            self.timeout_deadline = None;
        }
        self.set_mode(Mode::Pause, &mut actions);
        Ok(actions)
    }

    /// Pause recording and remember where. The recording timeout stays armed.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidTransition`] while playing.
    pub fn pause_recording(&mut self, now: u64) -> Result<Vec<Action>, RotodragError> {
        if self.mode == Mode::Play {
            return Err(RotodragError::InvalidTransition { from: self.mode, to: Mode::Pause });
        }
        let mut actions = Vec::new();
        self.pause_at(now, &mut actions);
        Ok(actions)
    }

    /// Return every shape to the start and wipe the recording, keeping only
    /// the resulting pose at timepoint 0.
    pub fn clear_recording(&mut self, now: u64) -> Vec<Action> {
        let actions = self.reset(now);
        self.timeline.clear_all(self.shapes.snapshot());
        actions
    }

    /// Drop every frame at or after `kill`.
    pub fn clear_recording_from(&mut self, kill: Timepoint) {
        self.timeline.clear_from(kill);
    }

    /// Whether the engine is recording right now.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.mode == Mode::Record
    }

    fn trigger_recording(&mut self, shape: &str, now: u64) -> Vec<Action> {
        if self.mode == Mode::Record
            || !self.recording_enabled
            || !self.dragging_enabled
            || !self.shapes.is_recordable(shape)
        {
            return Vec::new();
        }
        let result = match self.mode {
            Mode::Pause if self.config.record_from_pause => self.start_recording_from_pause(now),
            Mode::Pause => self.start_recording(now, 0),
            Mode::Play if self.config.record_during_playback => {
                let mut actions = Vec::new();
                self.pause_at(now, &mut actions);
                self.start_recording_from_pause(now).map(|more| {
                    actions.extend(more);
                    actions
                })
            }
            _ => Ok(Vec::new()),
        };
        result.unwrap_or_else(|e| {
            warn!(shape, error = %e, "record: press did not start recording");
            Vec::new()
        })
    }

    // --- Playback ---

    /// Play from timepoint `offset`, replacing any pass already running.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidTransition`] while recording.
    pub fn start_playback(&mut self, now: u64, offset: Timepoint) -> Result<Vec<Action>, RotodragError> {
        self.mode.check_transition(Mode::Play)?;
        let mut actions = Vec::new();
        self.player.start(now, offset);
        self.set_mode(Mode::Play, &mut actions);
        Ok(actions)
    }

    /// Resume playback from the pause point.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidTransition`] while recording.
    pub fn start_playback_from_pause(&mut self, now: u64) -> Result<Vec<Action>, RotodragError> {
        self.start_playback(now, self.pause_timepoint)
    }

    /// Stop playback and remember where, for a later resume. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidTransition`] while recording.
    pub fn pause_playback(&mut self, now: u64) -> Result<Vec<Action>, RotodragError> {
        if self.mode == Mode::Record {
            return Err(RotodragError::InvalidTransition { from: self.mode, to: Mode::Pause });
        }
        let mut actions = Vec::new();
        self.pause_at(now, &mut actions);
        Ok(actions)
    }

    /// Stop playback and forget the pause point. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidTransition`] while recording.
    pub fn stop_playback(&mut self) -> Result<Vec<Action>, RotodragError> {
        if self.mode == Mode::Record {
            return Err(RotodragError::InvalidTransition { from: self.mode, to: Mode::Pause });
        }
        let mut actions = Vec::new();
        self.player.stop();
        self.pause_timepoint = 0;
        self.set_mode(Mode::Pause, &mut actions);
        Ok(actions)
    }

    /// Show the frame for `ms` and make it the pause point.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::InvalidMode`] unless paused; nothing changes.
    pub fn seek(&mut self, ms: Timepoint) -> Result<Vec<Action>, RotodragError> {
        self.require(Mode::Pause, "seek")?;
        let mut actions = Vec::new();
        if let Some((_, snapshot)) = self.timeline.snapshot_at(ms) {
            apply_snapshot(&mut self.shapes, snapshot, &mut actions);
        }
        self.pause_timepoint = ms;
        Ok(actions)
    }

    /// Stop whatever is running and return to the start.
    pub fn reset(&mut self, now: u64) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.mode == Mode::Record {
            self.timeout_deadline = None;
        }
        self.pause_at(now, &mut actions);
        match self.seek(0) {
            Ok(more) => actions.extend(more),
            Err(e) => warn!(error = %e, "reset: seek to start failed"),
        }
        actions
    }

    /// Advance the engine to wall clock `now`.
    ///
    /// Fires the recording timeout once its deadline has passed. While
    /// playing, shows the frame for the current playback time; once playback
    /// runs past the last frame it pauses on that frame and, when configured,
    /// resumes recording from there.
    pub fn tick(&mut self, now: u64) -> Vec<Action> {
        let mut actions = Vec::new();

        if self.timeout_deadline.is_some_and(|deadline| now >= deadline) {
            self.timeout_deadline = None;
            actions.push(Action::RecordingTimeout);
        }

        if self.mode != Mode::Play {
            return actions;
        }
        let Some(virtual_now) = self.player.advance(now) else {
            return actions;
        };

        if let Some((_, snapshot)) = self.timeline.snapshot_at(virtual_now) {
            apply_snapshot(&mut self.shapes, snapshot, &mut actions);
        }

        if self.timeline.last_timepoint().is_none_or(|last| virtual_now > last) {
            self.pause_at(now, &mut actions);
            if let Some(snapshot) = self.timeline.fetch(self.timeline.record_end_time()) {
                apply_snapshot(&mut self.shapes, snapshot, &mut actions);
            }
            debug!(virtual_now, record_end = self.timeline.record_end_time(), "playback: reached end");
            if self.config.record_from_playback_end {
                match self.start_recording_from_pause(now) {
                    Ok(more) => actions.extend(more),
                    Err(e) => warn!(error = %e, "playback: could not resume recording at end"),
                }
            }
        }

        actions
    }

    // --- Queries ---

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn pause_timepoint(&self) -> Timepoint {
        self.pause_timepoint
    }

    #[must_use]
    pub fn record_end_time(&self) -> Timepoint {
        self.timeline.record_end_time()
    }

    /// Best estimate of the current position within the recording.
    #[must_use]
    pub fn elapsed_time(&self, now: u64) -> Timepoint {
        match self.mode {
            Mode::Record => self.record_offset.saturating_add(now.saturating_sub(self.record_started_at)),
            Mode::Play => self.player.time_at(now).unwrap_or(self.player.current()),
            Mode::Pause => self.pause_timepoint,
            Mode::Overdub => 0,
        }
    }

    // --- Persistence ---

    /// The recorded timeline in its JSON export form.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn export_timeline(&self) -> Result<Value, RotodragError> {
        self.timeline.to_json()
    }

    /// The `[start, end]` segment re-based to start at 0.
    #[must_use]
    pub fn trimmed_timeline(&self, start: Timepoint, end: Timepoint) -> Timeline {
        self.timeline.trim(start, end)
    }

    /// Replace the recording from its JSON export form.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::EmptyTimeline`] when nothing usable is offered;
    /// the current recording is kept.
    pub fn load_timeline(&mut self, value: &Value) -> Result<LoadReport, RotodragError> {
        self.timeline.load_json(value)
    }

    // --- Mode plumbing ---

    fn require(&self, mode: Mode, op: &'static str) -> Result<(), RotodragError> {
        if self.mode == mode { Ok(()) } else { Err(RotodragError::InvalidMode { op, mode: self.mode }) }
    }

    /// Stop the player and go to `Pause`, capturing the pause point.
    fn pause_at(&mut self, now: u64, actions: &mut Vec<Action>) {
        self.pause_timepoint = self.elapsed_time(now);
        self.player.stop();
        self.set_mode(Mode::Pause, actions);
    }

    fn set_mode(&mut self, to: Mode, actions: &mut Vec<Action>) {
        let from = self.mode;
        if from == to {
            return;
        }
        self.mode = to;
        debug!(%from, %to, "mode changed");
        actions.push(Action::ModeChanged { from, to });
    }
}

/// Pose every recordable shape named in `snapshot`. Names that are not
/// registered recordable shapes are skipped for this frame.
fn apply_snapshot(shapes: &mut ShapeStore, snapshot: &Snapshot, actions: &mut Vec<Action>) {
    for (name, transform) in snapshot {
        if !shapes.is_recordable(name) {
            debug!(shape = %name, "playback: skipped unknown shape");
            continue;
        }
        shapes.set_transform(name, *transform);
        actions.push(Action::TransformApplied { shape: name.clone(), transform: *transform });
    }
}

// =============================================================
// Browser wrapper
// =============================================================

/// The engine as exported to JavaScript.
///
/// Wraps [`EngineCore`] and turns each returned [`Action`] into a call on a
/// host callback. Times are `Date.now()`-style milliseconds.
#[wasm_bindgen]
pub struct Engine {
    core: EngineCore,
    on_transform: Function,
    on_drag_start: Option<Function>,
    on_mode_change: Option<Function>,
    on_timeout: Option<Function>,
}

#[wasm_bindgen]
impl Engine {
    /// `on_transform(name, transformString)` is called whenever a shape must be redrawn.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, on_transform: Function) -> Result<Engine, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(to_js)?;
        Ok(Self { core: EngineCore::new(config), on_transform, on_drag_start: None, on_mode_change: None, on_timeout: None })
    }

    pub fn add_shape(&mut self, name: &str, transform: &str, config_json: &str, recordable: bool) -> Result<(), JsValue> {
        let transform = Transform::parse(transform).map_err(to_js)?;
        let config = ShapeConfig::from_json(config_json).map_err(to_js)?;
        self.core.add_shape(name, transform, config, recordable).map_err(to_js)
    }

    pub fn set_drag_start_callback(&mut self, callback: Function) {
        self.on_drag_start = Some(callback);
    }

    pub fn set_mode_change_callback(&mut self, callback: Function) {
        self.on_mode_change = Some(callback);
    }

    /// Call `callback` `ms` milliseconds after each recording start.
    pub fn set_recording_timeout(&mut self, callback: Function, ms: f64) {
        self.on_timeout = Some(callback);
        self.core.set_recording_timeout(Some(clock(ms)));
    }

    pub fn enable_dragging(&mut self) {
        self.core.enable_dragging();
    }

    pub fn disable_dragging(&mut self) {
        self.core.disable_dragging();
    }

    pub fn enable_recording(&mut self) {
        self.core.enable_recording();
    }

    pub fn disable_recording(&mut self) {
        let actions = self.core.disable_recording();
        self.dispatch(actions);
    }

    pub fn pointer_down(&mut self, name: &str, x: f64, y: f64, now: f64) {
        let actions = self.core.on_pointer_down(name, Point::new(x, y), clock(now));
        self.dispatch(actions);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, now: f64) {
        let actions = self.core.on_pointer_move(Point::new(x, y), clock(now));
        self.dispatch(actions);
    }

    pub fn pointer_up(&mut self) {
        self.core.on_pointer_up();
    }

    /// First touch only: the host passes the first touch's shape and point.
    pub fn touch_start(&mut self, name: &str, x: f64, y: f64, now: f64) {
        let actions = self.core.on_touch_start(&[Touch::new(name, Point::new(x, y))], clock(now));
        self.dispatch(actions);
    }

    pub fn touch_move(&mut self, name: &str, x: f64, y: f64, now: f64) {
        let actions = self.core.on_touch_move(&[Touch::new(name, Point::new(x, y))], clock(now));
        self.dispatch(actions);
    }

    pub fn touch_end(&mut self) {
        self.core.on_touch_end();
    }

    pub fn tick(&mut self, now: f64) {
        let actions = self.core.tick(clock(now));
        self.dispatch(actions);
    }

    pub fn start_recording(&mut self, now: f64) -> Result<(), JsValue> {
        let actions = self.core.start_recording(clock(now), 0).map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn start_recording_from_pause(&mut self, now: f64) -> Result<(), JsValue> {
        let actions = self.core.start_recording_from_pause(clock(now)).map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn stop_recording(&mut self) -> Result<(), JsValue> {
        let actions = self.core.stop_recording().map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn pause_recording(&mut self, now: f64) -> Result<(), JsValue> {
        let actions = self.core.pause_recording(clock(now)).map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn clear_recording(&mut self, now: f64) {
        let actions = self.core.clear_recording(clock(now));
        self.dispatch(actions);
    }

    pub fn clear_recording_from(&mut self, ms: f64) {
        self.core.clear_recording_from(clock(ms));
    }

    pub fn start_playback(&mut self, now: f64, offset: f64) -> Result<(), JsValue> {
        let actions = self.core.start_playback(clock(now), clock(offset)).map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn start_playback_from_pause(&mut self, now: f64) -> Result<(), JsValue> {
        let actions = self.core.start_playback_from_pause(clock(now)).map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn pause_playback(&mut self, now: f64) -> Result<(), JsValue> {
        let actions = self.core.pause_playback(clock(now)).map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn stop_playback(&mut self) -> Result<(), JsValue> {
        let actions = self.core.stop_playback().map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn seek(&mut self, ms: f64) -> Result<(), JsValue> {
        let actions = self.core.seek(clock(ms)).map_err(to_js)?;
        self.dispatch(actions);
        Ok(())
    }

    pub fn reset(&mut self, now: f64) {
        let actions = self.core.reset(clock(now));
        self.dispatch(actions);
    }

    pub fn mode(&self) -> String {
        self.core.mode().as_str().to_owned()
    }

    pub fn is_recording(&self) -> bool {
        self.core.is_recording()
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_time(&self, now: f64) -> f64 {
        self.core.elapsed_time(clock(now)) as f64
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn record_end_time(&self) -> f64 {
        self.core.record_end_time() as f64
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn playback_interval_ms(&self) -> f64 {
        self.core.player.interval_ms() as f64
    }

    pub fn export_timeline(&self) -> Result<String, JsValue> {
        let value = self.core.export_timeline().map_err(to_js)?;
        serde_json::to_string(&value).map_err(|e| to_js(e.into()))
    }

    pub fn trimmed_timeline(&self, start: f64, end: f64) -> Result<String, JsValue> {
        serde_json::to_string(&self.core.trimmed_timeline(clock(start), clock(end))).map_err(|e| to_js(e.into()))
    }

    /// Returns the number of rejected entries.
    pub fn load_timeline(&mut self, json: &str) -> Result<usize, JsValue> {
        let value: Value = serde_json::from_str(json).map_err(|e| to_js(e.into()))?;
        let report = self.core.load_timeline(&value).map_err(to_js)?;
        Ok(report.rejected.len())
    }
}

impl Engine {
    fn dispatch(&self, actions: Vec<Action>) {
        for action in actions {
            let result = match action {
                Action::TransformApplied { shape, transform } => self.on_transform.call2(
                    &JsValue::NULL,
                    &JsValue::from_str(&shape),
                    &JsValue::from_str(&transform.to_string()),
                ),
                Action::DragStarted { shape } => match &self.on_drag_start {
                    Some(f) => f.call1(&JsValue::NULL, &JsValue::from_str(&shape)),
                    None => Ok(JsValue::UNDEFINED),
                },
                Action::ModeChanged { to, .. } => match &self.on_mode_change {
                    Some(f) => f.call1(&JsValue::NULL, &JsValue::from_str(to.as_str())),
                    None => Ok(JsValue::UNDEFINED),
                },
                Action::RecordingTimeout => match &self.on_timeout {
                    Some(f) => f.call0(&JsValue::NULL),
                    None => Ok(JsValue::UNDEFINED),
                },
            };
            if let Err(e) = result {
                warn!(error = ?e, "host callback threw");
            }
        }
    }
}

fn to_js(e: RotodragError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Host milliseconds to engine milliseconds. Negative or non-finite values become 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clock(ms: f64) -> u64 {
    if ms.is_finite() && ms > 0.0 { ms as u64 } else { 0 }
}
