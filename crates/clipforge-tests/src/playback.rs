//! Integration tests for drag, playback and asset changes.

use clipforge_core::{EngineConfig, MediaAsset};
use clipforge_playback::{
    DragTarget, GovernorState, PlaybackSurface, SimulatedSurface, SurfaceCall, SurfaceError,
    SurfaceEvent, TrackGeometry, TrimEditor,
};
use std::time::{Duration, Instant};

fn editor(duration: f64) -> (TrimEditor<SimulatedSurface>, Instant) {
    let now = Instant::now();
    let mut editor = TrimEditor::new(SimulatedSurface::new(duration), &EngineConfig::default());
    editor.set_track_geometry(TrackGeometry::new(0.0, 1000.0));
    editor.load_asset(MediaAsset::new("a1", "talk.mp4", "videos/talk.mp4"), now);
    let meta = editor.surface().metadata_event();
    editor.handle_event(meta, now);
    editor.surface_mut().take_calls();
    (editor, now)
}

fn play(editor: &mut TrimEditor<SimulatedSurface>, now: Instant) {
    editor.play().expect("play request");
    let resolved = editor.surface_mut().accept_play().expect("pending play");
    editor.handle_event(resolved, now);
}

#[test]
fn drag_pauses_before_first_move() {
    let (mut editor, now) = editor(100.0);

    for target in [DragTarget::RangeStart, DragTarget::RangeEnd, DragTarget::Playhead] {
        play(&mut editor, now);
        editor.surface_mut().take_calls();

        editor.pointer_down(target, 500.0);
        editor.pointer_move(300.0);
        let calls = editor.surface_mut().take_calls();
        assert_eq!(calls.first(), Some(&SurfaceCall::Pause), "{target:?}");
        assert!(!editor.is_playing());
        editor.pointer_up();
    }
}

#[test]
fn end_drag_never_seeks_start_drag_always_does() {
    let (mut editor, _) = editor(100.0);

    editor.pointer_down(DragTarget::RangeEnd, 1000.0);
    for x in [900.0, 800.0, 700.0] {
        editor.pointer_move(x);
    }
    editor.pointer_up();
    assert!(editor.surface().calls().is_empty());
    assert_eq!(editor.snapshot().end(), 70.0);

    editor.pointer_down(DragTarget::RangeStart, 0.0);
    for x in [100.0, 200.0, 300.0] {
        editor.pointer_move(x);
    }
    editor.pointer_up();
    assert_eq!(
        editor.surface_mut().take_calls(),
        vec![
            SurfaceCall::Seek(10.0),
            SurfaceCall::Seek(20.0),
            SurfaceCall::Seek(30.0)
        ]
    );
}

#[test]
fn late_play_resolution_after_asset_change_is_ignored() {
    let (mut editor, now) = editor(60.0);
    editor.play().unwrap();

    editor.load_asset(MediaAsset::new("a2", "other.mp4", "videos/other.mp4"), now);
    let stale = editor.surface_mut().accept_play().unwrap();
    editor.handle_event(stale, now);

    assert_eq!(editor.governor_state(), GovernorState::Idle);
    assert_eq!(editor.surface().calls().last(), Some(&SurfaceCall::Pause));
    assert!(!editor.surface().is_playing());
}

#[test]
fn unresolved_play_never_counts_as_playing() {
    let (mut editor, now) = editor(60.0);
    let ticket = editor.play().unwrap();
    assert_eq!(editor.governor_state(), GovernorState::Starting(ticket));
    assert!(!editor.is_playing());
    // The out-point poll has nothing to enforce.
    assert!(!editor.tick(now + Duration::from_secs(1)));
}

#[test]
fn position_events_clamp_to_range_while_playing() {
    let (mut editor, now) = editor(60.0);
    editor.set_start_text("10").unwrap();
    editor.set_end_text("20").unwrap();
    play(&mut editor, now);

    editor.handle_event(SurfaceEvent::PositionChanged(25.0), now);
    assert_eq!(editor.snapshot().current(), 20.0);

    editor.pause();
    editor.handle_event(SurfaceEvent::PositionChanged(25.0), now);
    assert_eq!(editor.snapshot().current(), 25.0);
}

#[test]
fn ended_at_asset_end_rewinds_to_in_point() {
    let (mut editor, now) = editor(12.0);
    editor.set_start_text("11").unwrap();
    play(&mut editor, now);

    for event in editor.surface_mut().advance(5.0) {
        editor.handle_event(event, now);
    }
    assert!(!editor.is_playing());
    assert_eq!(editor.surface().current_position(), 11.0);
    assert_eq!(editor.snapshot().current(), 11.0);
}

#[test]
fn surface_error_is_dismissible_and_retryable() {
    let (mut editor, now) = editor(30.0);
    play(&mut editor, now);
    editor.handle_event(SurfaceEvent::Error(SurfaceError::from_code(3, "bad frame")), now);
    assert!(!editor.is_playing());
    assert!(matches!(editor.playback_error(), Some(SurfaceError::Decode(_))));

    editor.retry_load(now);
    assert!(editor.playback_error().is_none());
    assert!(!editor.snapshot().is_loaded());
}

#[test]
fn buffer_progress_and_throughput() {
    let (mut editor, now) = editor(100.0);
    let event = editor.surface_mut().buffer_to(40.0);
    editor.handle_event(event, now + Duration::from_secs(4));
    let state = editor.buffer_state();
    assert_eq!(state.buffered_fraction, 0.4);
    assert!(state.throughput_mbps.is_some());
}
