//! Property tests for clip resolution and splitting.

use std::sync::Arc;

use proptest::prelude::*;
use reelsync_timeline_model::{ClipId, MediaSource, Timeline};

/// (track, start, length) placements.
fn placements() -> impl Strategy<Value = Vec<(u32, f64, f64)>> {
    prop::collection::vec((0u32..4, 0.0f64..100.0, 0.5f64..30.0), 1..12)
}

fn build(placements: &[(u32, f64, f64)]) -> (Timeline, Vec<ClipId>) {
    let mut tl = Timeline::default();
    let ids = placements
        .iter()
        .map(|&(track, start, length)| {
            let media = Arc::new(MediaSource::video("/m/p.mp4", length, 30.0, 320, 240));
            tl.add_clip(media, track, start).unwrap()
        })
        .collect();
    (tl, ids)
}

proptest! {
    #[test]
    fn resolve_returns_exactly_containing_clips(
        placements in placements(),
        t in 0.0f64..140.0,
    ) {
        let (tl, _) = build(&placements);
        let active = tl.resolve_active_clips(t);

        for clip in &active {
            prop_assert!(clip.start_time <= t && t < clip.end_time);
        }
        let expected = tl.clips().filter(|c| c.start_time <= t && t < c.end_time).count();
        prop_assert_eq!(active.len(), expected);

        for pair in active.windows(2) {
            prop_assert!(
                (pair[0].track_index, pair[0].id) < (pair[1].track_index, pair[1].id)
            );
        }
    }

    #[test]
    fn split_partitions_clip(
        start in 0.0f64..50.0,
        length in 0.5f64..30.0,
        frac in 0.01f64..0.99,
    ) {
        let (mut tl, ids) = build(&[(0, start, length)]);
        let original = tl.clip(ids[0]).unwrap().clone();
        let at = start + length * frac;
        prop_assume!(original.strictly_contains(at));

        let (left_id, right_id) = tl.split_clip(ids[0], at).unwrap();
        let left = tl.clip(left_id).unwrap();
        let right = tl.clip(right_id).unwrap();

        prop_assert_eq!(left.start_time, original.start_time);
        prop_assert_eq!(left.end_time, right.start_time);
        prop_assert_eq!(right.end_time, original.end_time);
        prop_assert_eq!(left.in_point, original.in_point);
        prop_assert_eq!(left.out_point, right.in_point);
        prop_assert_eq!(right.out_point, original.out_point);
        prop_assert!(Arc::ptr_eq(&left.media, &right.media));

        // Every instant of the original span resolves to exactly one half.
        for probe in [original.start_time, at, (at + original.end_time) / 2.0] {
            prop_assert_eq!(tl.resolve_active_clips(probe).len(), 1);
        }
    }

    #[test]
    fn out_of_range_split_leaves_timeline_untouched(
        start in 0.0f64..50.0,
        length in 0.5f64..30.0,
        offset in 0.0f64..20.0,
    ) {
        let (mut tl, ids) = build(&[(0, start, length)]);
        let version = tl.content_version();
        let before = tl.clip(ids[0]).unwrap().clone();

        prop_assert!(tl.split_clip(ids[0], start + length + offset).is_err());
        prop_assert!(tl.split_clip(ids[0], start - offset).is_err());
        prop_assert_eq!(tl.content_version(), version);
        prop_assert_eq!(tl.clip(ids[0]).unwrap(), &before);
    }
}
