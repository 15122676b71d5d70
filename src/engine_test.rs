use serde_json::json;

use super::*;
use crate::drag::DragStyle;

// =============================================================
// Helpers
// =============================================================

fn at(x: f64) -> Transform {
    Transform::translate(x, 100.0)
}

fn core_with(config: EngineConfig) -> EngineCore {
    let mut core = EngineCore::new(config);
    core.add_shape("cat", Transform::translate(100.0, 100.0), ShapeConfig::default(), true).unwrap();
    core.add_shape("tree", Transform::translate(0.0, 0.0), ShapeConfig::default(), false).unwrap();
    core.enable_dragging();
    core
}

fn core() -> EngineCore {
    core_with(EngineConfig::default())
}

/// Frames at 0, 100 and 200 with the cat at x = timepoint. The cat is left at x = 200.
fn with_three_frames(core: &mut EngineCore) {
    for t in [0_u32, 100, 200] {
        core.shapes.set_transform("cat", at(f64::from(t)));
        core.record_at(u64::from(t));
    }
}

fn cat_pose(core: &EngineCore) -> Transform {
    core.shape("cat").unwrap().transform
}

fn applied(shape: &str, transform: Transform) -> Action {
    Action::TransformApplied { shape: shape.to_owned(), transform }
}

fn changed(from: Mode, to: Mode) -> Action {
    Action::ModeChanged { from, to }
}

// =============================================================
// Scene
// =============================================================

#[test]
fn new_core_is_paused_with_gates_closed() {
    let core = EngineCore::default();
    assert_eq!(core.mode(), Mode::Pause);
    assert!(!core.dragging_enabled());
    assert!(!core.recording_enabled());
    assert_eq!(core.timeline.sorted_timepoints(), vec![0]);
}

#[test]
fn add_shape_refreshes_origin_frame() {
    let core = core();
    let origin = core.timeline.fetch(0).unwrap();
    assert_eq!(origin.get("cat"), Some(&Transform::translate(100.0, 100.0)));
    assert!(!origin.contains_key("tree"));
}

#[test]
fn add_shape_after_recording_leaves_origin_alone() {
    let mut core = core();
    core.record_at(50);
    core.add_shape("dog", at(5.0), ShapeConfig::default(), true).unwrap();
    assert!(!core.timeline.fetch(0).unwrap().contains_key("dog"));
}

#[test]
fn add_shape_duplicate_is_rejected() {
    let mut core = core();
    let err = core.add_shape("cat", at(0.0), ShapeConfig::default(), true).unwrap_err();
    assert!(matches!(err, RotodragError::DuplicateShape(ref id) if id == "cat"));
}

// =============================================================
// Dragging
// =============================================================

#[test]
fn press_and_move_drags_straight_up() {
    let mut core = core();
    let actions = core.on_pointer_down("cat", Point::new(100.0, 50.0), 0);
    assert_eq!(actions, vec![Action::DragStarted { shape: "cat".into() }]);

    let actions = core.on_pointer_move(Point::new(100.0, 40.0), 10);
    assert_eq!(actions, vec![applied("cat", Transform::translate(100.0, 90.0))]);
    assert_eq!(cat_pose(&core), Transform::translate(100.0, 90.0));
}

#[test]
fn release_ends_the_drag() {
    let mut core = core();
    core.on_pointer_down("cat", Point::new(100.0, 50.0), 0);
    core.on_pointer_up();
    assert_eq!(core.drag.state, InputState::Idle);
    assert!(core.drag.is_empty());
    assert!(core.on_pointer_move(Point::new(0.0, 0.0), 10).is_empty());
}

#[test]
fn disabled_dragging_ignores_input() {
    let mut core = core();
    core.disable_dragging();
    assert!(core.on_pointer_down("cat", Point::new(100.0, 50.0), 0).is_empty());
    assert!(core.drag.is_empty());
    assert_eq!(core.drag.state, InputState::Idle);
}

#[test]
fn dragging_without_recording_writes_no_frames() {
    let mut core = core();
    core.on_pointer_down("cat", Point::new(100.0, 50.0), 0);
    core.on_pointer_move(Point::new(100.0, 40.0), 10);
    assert_eq!(core.timeline.sorted_timepoints(), vec![0]);
    assert_eq!(core.mode(), Mode::Pause);
}

#[test]
fn touch_follows_first_touch_only() {
    let mut core = core();
    let touches = [Touch::new("cat", Point::new(100.0, 50.0)), Touch::new("tree", Point::new(0.0, 0.0))];
    let actions = core.on_touch_start(&touches, 0);
    assert_eq!(actions, vec![Action::DragStarted { shape: "cat".into() }]);
    assert_eq!(core.drag.state, InputState::TouchDragging { shape: "cat".into() });
    assert!(core.drag.session("tree").is_none());

    let actions = core.on_touch_move(&[Touch::new("cat", Point::new(100.0, 40.0))], 5);
    assert_eq!(actions, vec![applied("cat", Transform::translate(100.0, 90.0))]);

    core.on_touch_end();
    assert_eq!(core.drag.state, InputState::Idle);
    assert!(core.drag.is_empty());
}

#[test]
fn second_press_releases_first_gesture() {
    let mut core = core();
    core.on_pointer_down("cat", Point::new(100.0, 50.0), 0);
    let actions = core.on_pointer_down("tree", Point::new(0.0, -10.0), 5);
    assert_eq!(actions, vec![Action::DragStarted { shape: "tree".into() }]);
    assert!(core.drag.session("cat").is_none());
    assert_eq!(core.drag.len(), 1);
    assert_eq!(core.drag.state, InputState::MouseDragging { shape: "tree".into() });

    assert!(core.on_touch_move(&[Touch::new("cat", Point::new(300.0, 300.0))], 10).is_empty());
    assert_eq!(cat_pose(&core), Transform::translate(100.0, 100.0));
}

#[test]
fn touch_start_releases_mouse_gesture() {
    let mut core = core();
    core.on_pointer_down("cat", Point::new(100.0, 50.0), 0);
    core.on_touch_start(&[Touch::new("tree", Point::new(0.0, -10.0))], 5);
    assert!(core.drag.session("cat").is_none());
    assert_eq!(core.drag.state, InputState::TouchDragging { shape: "tree".into() });
    assert!(core.on_pointer_move(Point::new(300.0, 300.0), 10).is_empty());
}

#[test]
fn touch_move_on_other_shape_is_ignored() {
    let mut core = core();
    core.on_touch_start(&[Touch::new("cat", Point::new(100.0, 50.0))], 0);
    assert!(core.on_touch_move(&[Touch::new("tree", Point::new(5.0, 5.0))], 5).is_empty());
    assert_eq!(core.shape("tree").unwrap().transform, Transform::translate(0.0, 0.0));
}

#[test]
fn begin_drag_unknown_shape_is_error() {
    let mut core = core();
    let err = core.begin_drag("ghost", Point::default()).unwrap_err();
    assert!(matches!(err, RotodragError::UnknownShape(ref id) if id == "ghost"));
}

#[test]
fn drag_to_without_session_does_nothing() {
    let mut core = core();
    assert_eq!(core.drag_to("cat", Point::new(5.0, 5.0), 0).unwrap(), Vec::new());
    assert_eq!(cat_pose(&core), Transform::translate(100.0, 100.0));
    assert!(matches!(core.drag_to("ghost", Point::default(), 0), Err(RotodragError::UnknownShape(_))));
}

#[test]
fn end_drag_clears_session_and_state() {
    let mut core = core();
    core.on_pointer_down("cat", Point::new(100.0, 50.0), 0);
    core.end_drag("cat");
    assert!(core.drag.is_empty());
    assert_eq!(core.drag.state, InputState::Idle);
}

#[test]
fn slippery_press_near_center_does_not_move() {
    let mut core = core();
    let config = ShapeConfig { drag_style: DragStyle::Slippery, ..ShapeConfig::default() };
    core.add_shape("wheel", Transform::translate(300.0, 300.0), config, true).unwrap();

    core.on_pointer_down("wheel", Point::new(310.0, 300.0), 0);
    let actions = core.on_pointer_move(Point::new(340.0, 320.0), 5);
    assert_eq!(actions, vec![applied("wheel", Transform::translate(300.0, 300.0))]);
    assert_eq!(core.drag.session("wheel").unwrap().drag_start, Point::new(340.0, 320.0));
}

#[test]
fn rotate_holds_inside_wrapping_forbidden_arc() {
    let mut core = core();
    let config = ShapeConfig {
        drag_style: DragStyle::Rotate,
        rotate_above: 350.0,
        rotate_below: 10.0,
        ..ShapeConfig::default()
    };
    core.add_shape("dial", Transform::IDENTITY, config, false).unwrap();

    core.on_pointer_down("dial", Point::new(0.0, -50.0), 0);
    let (s, c) = 5.0_f64.to_radians().sin_cos();
    let actions = core.on_pointer_move(Point::new(50.0 * s, -50.0 * c), 5);
    assert_eq!(actions, vec![applied("dial", Transform::IDENTITY)]);
}

// =============================================================
// Recording
// =============================================================

#[test]
fn press_on_recordable_starts_recording() {
    let mut core = core();
    core.enable_recording();
    let actions = core.on_pointer_down("cat", Point::new(100.0, 50.0), 1000);
    assert_eq!(actions, vec![Action::DragStarted { shape: "cat".into() }, changed(Mode::Pause, Mode::Record)]);
    assert!(core.is_recording());

    core.on_pointer_move(Point::new(100.0, 40.0), 1040);
    assert_eq!(core.timeline.sorted_timepoints(), vec![0, 40]);
    let frame = core.timeline.fetch(40).unwrap();
    assert_eq!(frame.get("cat"), Some(&Transform::translate(100.0, 90.0)));
    assert!(!frame.contains_key("tree"));

    core.on_pointer_up();
    assert_eq!(core.stop_recording().unwrap(), vec![changed(Mode::Record, Mode::Pause)]);
    assert_eq!(core.record_end_time(), 40);
}

#[test]
fn press_on_non_recordable_does_not_record() {
    let mut core = core();
    core.enable_recording();
    let actions = core.on_pointer_down("tree", Point::new(0.0, -10.0), 1000);
    assert_eq!(actions, vec![Action::DragStarted { shape: "tree".into() }]);
    assert_eq!(core.mode(), Mode::Pause);
}

#[test]
fn start_recording_at_zero_writes_origin() {
    let mut core = core();
    core.shapes.set_transform("cat", at(7.0));
    core.start_recording(500, 0).unwrap();
    assert_eq!(core.timeline.fetch(0).unwrap().get("cat"), Some(&at(7.0)));
    assert_eq!(core.elapsed_time(620), 120);
}

#[test]
fn clear_from_drops_tail() {
    let mut core = core();
    core.record_at(0);
    core.record_at(120);
    core.clear_recording_from(100);
    assert_eq!(core.timeline.sorted_timepoints(), vec![0]);
    assert_eq!(core.record_end_time(), 0);
}

#[test]
fn record_from_pause_continues_at_pause_point() {
    let mut core = core_with(EngineConfig { record_from_pause: true, ..EngineConfig::default() });
    core.enable_recording();
    with_three_frames(&mut core);
    core.seek(150).unwrap();

    let actions = core.on_pointer_down("cat", Point::new(100.0, 50.0), 2000);
    assert_eq!(actions.last(), Some(&changed(Mode::Pause, Mode::Record)));
    assert_eq!(core.timeline.sorted_timepoints(), vec![0, 100]);

    core.on_pointer_move(Point::new(100.0, 40.0), 2010);
    assert_eq!(core.timeline.sorted_timepoints(), vec![0, 100, 160]);
}

#[test]
fn record_during_playback_pauses_and_records() {
    let mut core = core_with(EngineConfig { record_during_playback: true, ..EngineConfig::default() });
    core.enable_recording();
    with_three_frames(&mut core);
    core.start_playback(1000, 0).unwrap();

    let actions = core.on_pointer_down("cat", Point::new(200.0, 50.0), 1080);
    assert_eq!(
        actions,
        vec![
            Action::DragStarted { shape: "cat".into() },
            changed(Mode::Play, Mode::Pause),
            changed(Mode::Pause, Mode::Record),
        ]
    );
    assert_eq!(core.timeline.sorted_timepoints(), vec![0]);
    assert_eq!(core.elapsed_time(1100), 100);
}

#[test]
fn press_during_playback_without_option_keeps_playing() {
    let mut core = core();
    core.enable_recording();
    with_three_frames(&mut core);
    core.start_playback(1000, 0).unwrap();
    core.on_pointer_down("cat", Point::new(200.0, 50.0), 1080);
    assert_eq!(core.mode(), Mode::Play);
    assert_eq!(core.timeline.sorted_timepoints(), vec![0, 100, 200]);
}

#[test]
fn disable_recording_stops_recording() {
    let mut core = core();
    core.enable_recording();
    core.on_pointer_down("cat", Point::new(100.0, 50.0), 0);
    assert_eq!(core.disable_recording(), vec![changed(Mode::Record, Mode::Pause)]);
    core.on_pointer_up();

    core.on_pointer_down("cat", Point::new(100.0, 50.0), 100);
    assert_eq!(core.mode(), Mode::Pause);
    assert!(core.disable_recording().is_empty());
}

#[test]
fn stop_recording_while_playing_is_error() {
    let mut core = core();
    core.start_playback(0, 0).unwrap();
    let err = core.stop_recording().unwrap_err();
    assert!(matches!(err, RotodragError::InvalidTransition { from: Mode::Play, to: Mode::Pause }));
    assert!(matches!(core.pause_recording(0), Err(RotodragError::InvalidTransition { .. })));
    assert!(matches!(core.start_recording(0, 0), Err(RotodragError::InvalidTransition { .. })));
    assert_eq!(core.mode(), Mode::Play);
}

#[test]
fn pause_recording_remembers_position() {
    let mut core = core();
    core.start_recording(1000, 0).unwrap();
    assert_eq!(core.pause_recording(1250).unwrap(), vec![changed(Mode::Record, Mode::Pause)]);
    assert_eq!(core.pause_timepoint(), 250);
    assert_eq!(core.elapsed_time(9999), 250);
}

#[test]
fn clear_recording_keeps_only_start_pose() {
    let mut core = core();
    with_three_frames(&mut core);
    let actions = core.clear_recording(0);
    assert!(actions.contains(&applied("cat", at(0.0))));
    assert_eq!(core.timeline.sorted_timepoints(), vec![0]);
    assert_eq!(core.timeline.fetch(0).unwrap().get("cat"), Some(&at(0.0)));
    assert_eq!(cat_pose(&core), at(0.0));
}

// =============================================================
// Recording timeout
// =============================================================

#[test]
fn recording_timeout_fires_once() {
    let mut core = core_with(EngineConfig { recording_timeout_ms: Some(500), ..EngineConfig::default() });
    core.start_recording(1000, 0).unwrap();
    assert!(core.tick(1499).is_empty());
    assert_eq!(core.tick(1500), vec![Action::RecordingTimeout]);
    assert!(core.tick(1600).is_empty());
}

#[test]
fn stop_recording_disarms_timeout() {
    let mut core = core();
    core.set_recording_timeout(Some(500));
    core.start_recording(1000, 0).unwrap();
    core.stop_recording().unwrap();
    assert!(core.tick(2000).is_empty());
}

#[test]
fn timeout_rearms_on_each_start() {
    let mut core = core();
    core.set_recording_timeout(Some(100));
    core.start_recording(0, 0).unwrap();
    core.stop_recording().unwrap();
    core.start_recording(1000, 0).unwrap();
    assert!(core.tick(1050).is_empty());
    assert_eq!(core.tick(1100), vec![Action::RecordingTimeout]);
}

// =============================================================
// Playback
// =============================================================

#[test]
fn tick_shows_held_frame() {
    let mut core = core();
    with_three_frames(&mut core);
    assert_eq!(core.start_playback(1000, 0).unwrap(), vec![changed(Mode::Pause, Mode::Play)]);
    assert_eq!(core.tick(1160), vec![applied("cat", at(100.0))]);
    assert_eq!(core.mode(), Mode::Play);
    assert_eq!(core.elapsed_time(1170), 170);
}

#[test]
fn playback_past_end_pauses_on_last_frame() {
    let mut core = core();
    with_three_frames(&mut core);
    core.start_playback(1000, 50).unwrap();

    let actions = core.tick(1151);
    assert_eq!(core.mode(), Mode::Pause);
    assert_eq!(actions.last(), Some(&applied("cat", at(200.0))));
    assert!(actions.contains(&changed(Mode::Play, Mode::Pause)));
    assert_eq!(core.pause_timepoint(), 201);
    assert!(!core.player.is_running());
}

#[test]
fn playback_end_resumes_recording_when_configured() {
    let mut core = core_with(EngineConfig { record_from_playback_end: true, ..EngineConfig::default() });
    with_three_frames(&mut core);
    core.start_playback(1000, 150).unwrap();

    let actions = core.tick(1051);
    assert_eq!(actions.last(), Some(&changed(Mode::Pause, Mode::Record)));
    assert_eq!(core.elapsed_time(1061), 211);
}

#[test]
fn playback_from_far_offset_pauses_at_end() {
    let mut core = core();
    with_three_frames(&mut core);
    core.start_playback(0, u64::MAX).unwrap();

    let actions = core.tick(5);
    assert_eq!(core.mode(), Mode::Pause);
    assert_eq!(actions.last(), Some(&applied("cat", at(200.0))));
    assert_eq!(core.pause_timepoint(), u64::MAX);
}

#[test]
fn recording_from_far_offset_saturates() {
    let mut core = core();
    core.start_recording(0, u64::MAX).unwrap();
    assert_eq!(core.elapsed_time(10), u64::MAX);
    core.continue_recording(20);
    assert_eq!(core.record_end_time(), u64::MAX);
}

#[test]
fn ticks_while_paused_do_nothing() {
    let mut core = core();
    with_three_frames(&mut core);
    assert!(core.tick(5000).is_empty());
}

#[test]
fn pause_and_stop_playback_are_idempotent() {
    let mut core = core();
    with_three_frames(&mut core);
    core.start_playback(1000, 0).unwrap();

    assert_eq!(core.pause_playback(1120).unwrap(), vec![changed(Mode::Play, Mode::Pause)]);
    assert_eq!(core.pause_timepoint(), 120);
    assert!(core.pause_playback(1300).unwrap().is_empty());
    assert_eq!(core.pause_timepoint(), 120);

    assert!(core.stop_playback().unwrap().is_empty());
    assert!(core.stop_playback().unwrap().is_empty());
    assert_eq!(core.pause_timepoint(), 0);
}

#[test]
fn resume_continues_from_pause_point() {
    let mut core = core();
    with_three_frames(&mut core);
    core.start_playback(1000, 0).unwrap();
    core.pause_playback(1120).unwrap();
    core.start_playback_from_pause(5000).unwrap();
    assert_eq!(core.elapsed_time(5010), 130);
}

#[test]
fn playback_ops_rejected_while_recording() {
    let mut core = core();
    core.start_recording(0, 0).unwrap();
    assert!(matches!(
        core.start_playback(10, 0),
        Err(RotodragError::InvalidTransition { from: Mode::Record, to: Mode::Play })
    ));
    assert!(core.pause_playback(10).is_err());
    assert!(core.stop_playback().is_err());
    assert!(core.is_recording());
}

#[test]
fn restarting_playback_does_not_change_mode() {
    let mut core = core();
    with_three_frames(&mut core);
    core.start_playback(0, 0).unwrap();
    assert!(core.start_playback(50, 100).unwrap().is_empty());
    assert_eq!(core.elapsed_time(60), 110);
}

#[test]
fn seek_shows_frame_and_sets_pause_point() {
    let mut core = core();
    with_three_frames(&mut core);
    assert_eq!(core.seek(150).unwrap(), vec![applied("cat", at(100.0))]);
    assert_eq!(core.pause_timepoint(), 150);
    assert_eq!(cat_pose(&core), at(100.0));
}

#[test]
fn seek_rejected_unless_paused() {
    let mut core = core();
    with_three_frames(&mut core);
    core.start_playback(0, 0).unwrap();
    let err = core.seek(150).unwrap_err();
    assert!(matches!(err, RotodragError::InvalidMode { op: "seek", mode: Mode::Play }));
    assert_eq!(core.pause_timepoint(), 0);
    assert_eq!(cat_pose(&core), at(200.0));
}

#[test]
fn reset_stops_recording_and_returns_to_start() {
    let mut core = core_with(EngineConfig { recording_timeout_ms: Some(100), ..EngineConfig::default() });
    with_three_frames(&mut core);
    core.start_recording(1000, 300).unwrap();

    let actions = core.reset(1050);
    assert_eq!(actions.first(), Some(&changed(Mode::Record, Mode::Pause)));
    assert_eq!(core.pause_timepoint(), 0);
    assert_eq!(cat_pose(&core), at(0.0));
    assert!(core.tick(5000).is_empty());
}

#[test]
fn snapshot_with_unknown_shape_is_skipped() {
    let mut core = core();
    core.load_timeline(&json!({
        "0": { "cat": "matrix(1, 0, 0, 1, 5, 5)", "ghost": "matrix(1, 0, 0, 1, 9, 9)", "tree": "matrix(1, 0, 0, 1, 9, 9)" },
    }))
    .unwrap();
    assert_eq!(core.seek(0).unwrap(), vec![applied("cat", Transform::translate(5.0, 5.0))]);
    assert_eq!(core.shape("tree").unwrap().transform, Transform::translate(0.0, 0.0));
}

// =============================================================
// Persistence
// =============================================================

#[test]
fn export_import_round_trip() {
    let mut source = core();
    with_three_frames(&mut source);
    let exported = source.export_timeline().unwrap();

    let mut target = core();
    let report = target.load_timeline(&exported).unwrap();
    assert_eq!(report.accepted, 3);
    assert_eq!(target.timeline, source.timeline);
    assert_eq!(target.record_end_time(), 200);
}

#[test]
fn failed_import_keeps_recording() {
    let mut core = core();
    with_three_frames(&mut core);
    assert!(matches!(core.load_timeline(&json!({})), Err(RotodragError::EmptyTimeline)));
    assert_eq!(core.timeline.sorted_timepoints(), vec![0, 100, 200]);
}

#[test]
fn trimmed_timeline_is_rebased() {
    let mut core = core();
    with_three_frames(&mut core);
    let trimmed = core.trimmed_timeline(150, 200);
    assert_eq!(trimmed.sorted_timepoints(), vec![0, 50]);
    assert_eq!(trimmed.fetch(0).unwrap().get("cat"), Some(&at(100.0)));
}

#[test]
fn elapsed_time_per_mode() {
    let mut core = core();
    assert_eq!(core.elapsed_time(123), 0);
    core.start_recording(100, 40).unwrap();
    assert_eq!(core.elapsed_time(150), 90);
    core.stop_recording().unwrap();
    core.start_playback(1000, 10).unwrap();
    assert_eq!(core.elapsed_time(1005), 15);
}
