// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests: round-trip, length and sentinel invariants, no-panic decode.

use proptest::prelude::*;
use serde_json::{json, Value};
use turf_file::codec::decode_f32s;
use turf_file::{FloatOrder, FrameCodec, FrameConfig, FrameLayout, ShapeSet};

fn codec(layout: FrameLayout) -> FrameCodec {
    FrameCodec::new(FrameConfig {
        layout,
        float_order: FloatOrder::Little,
        ..FrameConfig::default()
    })
    .expect("valid config")
}

fn entries() -> impl Strategy<Value = Vec<(Vec<f32>, u32, String)>> {
    prop::collection::vec(
        (
            prop::collection::vec(-1.0e6f32..1.0e6f32, 0..8),
            any::<u32>(),
            "[a-z]{0,6}",
        ),
        0..8,
    )
}

fn split_entries(entries: Vec<(Vec<f32>, u32, String)>) -> (Vec<Vec<f32>>, Vec<Value>) {
    entries
        .into_iter()
        .map(|(shape, id, name)| (shape, json!({"id": id, "name": name})))
        .unzip()
}

proptest! {
    #[test]
    fn round_trip_both_layouts(entries in entries()) {
        let (shapes, meta) = split_entries(entries);
        for layout in [FrameLayout::Legacy, FrameLayout::Prefixed] {
            let codec = codec(layout);
            let frame = codec.encode(&shapes, &meta).expect("encode");
            let (back, back_meta): (ShapeSet, Vec<Value>) = codec.decode(&frame).expect("decode");
            prop_assert_eq!(back.len(), shapes.len());
            prop_assert_eq!(&back, &shapes);
            prop_assert_eq!(&back_meta, &meta);
        }
    }

    #[test]
    fn double_precision_input_narrows(coords in prop::collection::vec(-1.0e9f64..1.0e9f64, 0..16)) {
        let codec = codec(FrameLayout::Prefixed);
        let frame = codec.encode(&[coords.clone()], &[json!(null)]).expect("encode");
        let (back, _): (ShapeSet, Vec<Value>) = codec.decode(&frame).expect("decode");
        let narrowed: Vec<f32> = coords.iter().map(|c| *c as f32).collect();
        prop_assert_eq!(&back[0], &narrowed);
    }

    #[test]
    fn float_region_has_one_sentinel_per_shape(entries in entries()) {
        let (shapes, meta) = split_entries(entries);
        let frame = codec(FrameLayout::Legacy).encode(&shapes, &meta).expect("encode");
        let total: usize = shapes.iter().map(|s| s.len() + 1).sum();
        let floats = decode_f32s(&frame[..total * 4], FloatOrder::Little);
        prop_assert_eq!(floats.iter().filter(|f| f.is_nan()).count(), shapes.len());
        let region = serde_json::to_vec(&meta).expect("json");
        prop_assert_eq!(&frame[total * 4..], region.as_slice());
    }

    #[test]
    fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec(FrameLayout::Legacy).decode::<Value>(&bytes);
        let _ = codec(FrameLayout::Prefixed).decode::<Value>(&bytes);
    }

    #[test]
    fn truncated_prefixed_frames_are_rejected(entries in entries(), cut in 1usize..64) {
        let (shapes, meta) = split_entries(entries);
        let codec = codec(FrameLayout::Prefixed);
        let frame = codec.encode(&shapes, &meta).expect("encode");
        let keep = frame.len().saturating_sub(cut);
        prop_assert!(codec.decode::<Value>(&frame[..keep]).is_err());
    }
}
