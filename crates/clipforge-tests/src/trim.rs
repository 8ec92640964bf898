//! Integration tests for the trim range, time codec and clip creation.

use clipforge_core::{
    create_clip, format_time, parse_time_string, round_ms, MediaAsset, TrimRange, MIN_CLIP_SECS,
};
use proptest::prelude::*;

fn asset() -> MediaAsset {
    MediaAsset::new("a1", "match.mp4", "videos/match.mp4")
}

#[test]
fn start_clamped_against_end_after_end_drag() {
    let mut range = TrimRange::with_duration(120.5);
    range.set_end(118.0);
    range.set_start(119.0);
    assert_eq!(range.end(), 118.0);
    assert_eq!(range.start(), 117.9);
}

#[test]
fn rejected_clip_leaves_range_untouched() {
    let mut range = TrimRange::with_duration(30.0);
    range.set_start(5.0);
    range.set_end(5.1);
    let before = range;
    assert!(create_clip(None, &range).is_err());
    assert_eq!(range, before);
}

#[test]
fn empty_range_cannot_make_clip() {
    assert!(create_clip(Some(&asset()), &TrimRange::EMPTY).is_err());
}

proptest! {
    #[test]
    fn codec_round_trip(t in 0.0f64..1_000_000.0) {
        let parsed = parse_time_string(&format_time(t)).unwrap();
        prop_assert_eq!(parsed, round_ms(t));
    }

    #[test]
    fn valid_ranges_make_clips(start in 0.0f64..500.0, len in MIN_CLIP_SECS..500.0) {
        let mut range = TrimRange::with_duration(1000.0);
        range.set_end(round_ms(start + len));
        range.set_start(start);
        let clip = create_clip(Some(&asset()), &range).unwrap();
        prop_assert!((clip.end_time() - clip.start_time() - range.clip_length()).abs() < 1e-9);
        prop_assert!(clip.duration() >= MIN_CLIP_SECS);
    }

    #[test]
    fn invariant_holds_for_any_edit_sequence(
        duration in 0.2f64..10_000.0,
        edits in prop::collection::vec((any::<bool>(), -100.0f64..11_000.0), 1..40),
    ) {
        let mut range = TrimRange::with_duration(duration);
        for (is_start, t) in edits {
            if is_start {
                range.set_start(t);
            } else {
                range.set_end(t);
            }
            prop_assert!(range.start() >= 0.0);
            prop_assert!(range.start() <= round_ms(range.end() - MIN_CLIP_SECS));
            prop_assert!(range.end() <= range.duration());
        }
    }
}
