use super::*;
use crate::stack::{slice::Slice, source::InMemoryStack};

fn gray(values: &[u8]) -> Slice {
    Slice::from_u8(values.len() as u32, 1, values.to_vec()).unwrap()
}

fn single_channel(depth_values: &[&[u8]]) -> (InMemoryStack, StackShape) {
    let layers = depth_values.iter().map(|v| vec![gray(v)]).collect();
    InMemoryStack::from_layers(layers).unwrap()
}

/// Source whose last slice disagrees with the nominal dims.
struct RaggedSource {
    slices: Vec<Slice>,
}

impl StackSource for RaggedSource {
    fn len(&self) -> usize {
        self.slices.len()
    }

    fn dims(&self) -> SliceDims {
        self.slices[0].dims()
    }

    fn slice_at(&self, index: usize) -> HyperblendResult<&Slice> {
        Ok(&self.slices[index])
    }
}

#[test]
fn max_intensity_is_per_pixel_maximum() {
    let (stack, shape) = single_channel(&[&[1, 9, 3], &[4, 2, 8], &[0, 5, 6]]);
    let out = composite(&stack, shape, BlendKind::MaxIntensity).unwrap();
    assert_eq!(out.channel(0).unwrap().data, vec![4.0, 9.0, 8.0]);
}

#[test]
fn max_intensity_ignores_depth_order() {
    let (stack, shape) = InMemoryStack::from_layers(vec![
        vec![gray(&[1, 200]), gray(&[7, 0])],
        vec![gray(&[90, 3]), gray(&[6, 6])],
        vec![gray(&[12, 40]), gray(&[0, 250])],
    ])
    .unwrap();
    let forward = composite(&stack, shape, BlendKind::MaxIntensity).unwrap();
    let reversed = composite(
        &stack.reversed_depths(shape).unwrap(),
        shape,
        BlendKind::MaxIntensity,
    )
    .unwrap();
    assert_eq!(forward, reversed);
    assert_eq!(forward.channel(0).unwrap().data, vec![90.0, 200.0]);
    assert_eq!(forward.channel(1).unwrap().data, vec![7.0, 250.0]);
}

#[test]
fn limited_alpha_single_layer() {
    let (stack, shape) = single_channel(&[&[100]]);
    let out = composite(&stack, shape, BlendKind::limited_alpha()).unwrap();
    assert!((out.get(0, 0, 0).unwrap() - 10.0).abs() < 1e-5);
}

#[test]
fn limited_alpha_blends_near_layer_over_far_layer() {
    // depth 1 is nearest, depth 2 farthest and blended first.
    let (stack, shape) = single_channel(&[&[50], &[100]]);
    let out = composite(&stack, shape, BlendKind::limited_alpha()).unwrap();
    let v = out.get(0, 0, 0).unwrap();
    assert!((v - 11.4286).abs() < 1e-3, "got {v}");
}

#[test]
fn limited_alpha_depends_on_depth_order() {
    let (stack, shape) = single_channel(&[&[50], &[100]]);
    let forward = composite(&stack, shape, BlendKind::limited_alpha()).unwrap();
    let reversed = composite(
        &stack.reversed_depths(shape).unwrap(),
        shape,
        BlendKind::limited_alpha(),
    )
    .unwrap();
    assert_ne!(forward, reversed);
}

#[test]
fn channels_are_blended_independently() {
    let (stack, shape) = InMemoryStack::from_layers(vec![
        vec![gray(&[50]), gray(&[0])],
        vec![gray(&[100]), gray(&[30])],
    ])
    .unwrap();
    let out = composite(&stack, shape, BlendKind::limited_alpha()).unwrap();
    assert!((out.get(0, 0, 0).unwrap() - 11.4286).abs() < 1e-3);
    // far 30 -> 3.0; near 0 keeps 3.0
    assert!((out.get(1, 0, 0).unwrap() - 3.0).abs() < 1e-5);
}

#[test]
fn wrong_slice_count_is_shape_mismatch() {
    let (stack, _) = single_channel(&[&[1], &[2], &[3]]);
    let err = composite(&stack, StackShape::new(2, 2), BlendKind::MaxIntensity).unwrap_err();
    assert!(matches!(err, HyperblendError::ShapeMismatch(_)));
}

#[test]
fn non_uniform_slices_are_shape_mismatch() {
    let source = RaggedSource {
        slices: vec![gray(&[1, 2]), gray(&[3])],
    };
    let mut calls = 0usize;
    let err = composite_with(
        &source,
        StackShape::new(1, 2),
        BlendKind::MaxIntensity,
        &CompositeOpts::default(),
        &mut |_: usize, _: usize| calls += 1,
    )
    .unwrap_err();
    assert!(matches!(err, HyperblendError::ShapeMismatch(_)));
    assert_eq!(calls, 0);
}

#[test]
fn m_of_one_fails_before_any_pixel() {
    let (stack, shape) = single_channel(&[&[1], &[2]]);
    let mut calls = 0usize;
    let err = composite_with(
        &stack,
        shape,
        BlendKind::LimitedAlpha { m: 1.0 },
        &CompositeOpts::default(),
        &mut |_: usize, _: usize| calls += 1,
    )
    .unwrap_err();
    assert!(matches!(err, HyperblendError::InvalidBlendParameter(_)));
    assert_eq!(calls, 0);
}

#[test]
fn negative_float_sample_rejects_the_run() {
    let far = Slice::from_f32(2, 2, vec![0.0, 1.0, 2.0, -0.5]).unwrap();
    let near = Slice::from_f32(2, 2, vec![0.0; 4]).unwrap();
    let (stack, shape) = InMemoryStack::from_layers(vec![vec![near], vec![far]]).unwrap();
    let err = composite(&stack, shape, BlendKind::MaxIntensity).unwrap_err();
    match err {
        HyperblendError::NegativeSample {
            channel,
            depth,
            x,
            y,
            value,
        } => {
            assert_eq!((channel, depth, x, y), (0, 2, 1, 1));
            assert_eq!(value, -0.5);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nan_sample_rejects_the_run() {
    let (stack, shape) =
        InMemoryStack::from_layers(vec![vec![Slice::from_f32(1, 1, vec![f32::NAN]).unwrap()]])
            .unwrap();
    let err = composite(&stack, shape, BlendKind::MaxIntensity).unwrap_err();
    assert!(matches!(err, HyperblendError::NegativeSample { .. }));
}

#[test]
fn zero_depths_yield_zeroed_channels() {
    let stack = InMemoryStack::with_dims(SliceDims::new(3, 2), vec![]).unwrap();
    let mut calls = 0usize;
    let out = composite_with(
        &stack,
        StackShape::new(2, 0),
        BlendKind::limited_alpha(),
        &CompositeOpts::default(),
        &mut |_: usize, _: usize| calls += 1,
    )
    .unwrap();
    assert_eq!(out.channel_count(), 2);
    assert!(
        out.channels()
            .iter()
            .all(|c| c.data.len() == 6 && c.data.iter().all(|&v| v == 0.0))
    );
    assert_eq!(calls, 0);
}

#[test]
fn zero_channels_yield_empty_result() {
    let stack = InMemoryStack::default();
    let out = composite(&stack, StackShape::new(0, 5), BlendKind::MaxIntensity).unwrap();
    assert!(out.is_empty());
}

#[test]
fn progress_is_reported_once_per_depth() {
    let (stack, shape) = single_channel(&[&[1], &[2], &[3], &[4], &[5]]);
    let mut seen = Vec::new();
    composite_with(
        &stack,
        shape,
        BlendKind::MaxIntensity,
        &CompositeOpts::default(),
        &mut |c: usize, t: usize| seen.push((c, t)),
    )
    .unwrap();
    assert_eq!(seen, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
}

struct FailingSink {
    calls: usize,
}

impl ProgressSink for FailingSink {
    fn report(&mut self, _completed: usize, _total: usize) -> HyperblendResult<()> {
        self.calls += 1;
        Err(HyperblendError::validation("sink offline"))
    }
}

#[test]
fn failing_progress_sink_does_not_abort() {
    let (stack, shape) = single_channel(&[&[1], &[7]]);
    let mut sink = FailingSink { calls: 0 };
    let out = composite_with(
        &stack,
        shape,
        BlendKind::MaxIntensity,
        &CompositeOpts::default(),
        &mut sink,
    )
    .unwrap();
    assert_eq!(out.get(0, 0, 0), Some(7.0));
    assert_eq!(sink.calls, 2);
}

#[test]
fn cancellation_is_checked_between_depths() {
    let (stack, shape) = single_channel(&[&[1], &[2], &[3]]);
    let flag = Arc::new(AtomicBool::new(false));
    let opts = CompositeOpts {
        cancel: Some(flag.clone()),
        ..CompositeOpts::default()
    };
    let mut sink = |completed: usize, _: usize| {
        if completed == 2 {
            flag.store(true, Ordering::Relaxed);
        }
    };
    let err = composite_with(&stack, shape, BlendKind::MaxIntensity, &opts, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        HyperblendError::Cancelled {
            completed: 2,
            total: 3
        }
    ));
}

#[test]
fn parallel_matches_sequential() {
    let w = 17u32;
    let h = 5u32;
    let mut layers = Vec::new();
    for d in 0..4u32 {
        let mut channels = Vec::new();
        for c in 0..3u32 {
            let data = (0..w * h)
                .map(|i| ((i * 7 + d * 31 + c * 13) % 251) as u16 * 3)
                .collect();
            channels.push(Slice::from_u16(w, h, data).unwrap());
        }
        layers.push(channels);
    }
    let (stack, shape) = InMemoryStack::from_layers(layers).unwrap();

    for blend in [
        BlendKind::MaxIntensity,
        BlendKind::limited_alpha(),
        BlendKind::simple_alpha_fog(),
    ] {
        let seq = composite(&stack, shape, blend).unwrap();
        let par = composite_with(
            &stack,
            shape,
            blend,
            &CompositeOpts {
                parallel: true,
                threads: Some(3),
                cancel: None,
            },
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(seq, par, "{}", blend.name());
    }
}

#[test]
fn zero_threads_is_rejected_in_parallel_mode() {
    let (stack, shape) = single_channel(&[&[1]]);
    let err = composite_with(
        &stack,
        shape,
        BlendKind::MaxIntensity,
        &CompositeOpts {
            parallel: true,
            threads: Some(0),
            cancel: None,
        },
        &mut NoProgress,
    )
    .unwrap_err();
    assert!(matches!(err, HyperblendError::Validation(_)));
}

#[test]
fn runs_do_not_share_state() {
    let (stack, shape) = single_channel(&[&[50], &[100]]);
    let a = composite(&stack, shape, BlendKind::limited_alpha()).unwrap();
    let b = composite(&stack, shape, BlendKind::limited_alpha()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn simple_alpha_fog_never_produces_nan() {
    let far = Slice::from_f32(2, 1, vec![1.0e22, 3.0e38]).unwrap();
    let near = Slice::from_f32(2, 1, vec![0.0, 1.0e22]).unwrap();
    let (stack, shape) = InMemoryStack::from_layers(vec![vec![near], vec![far]]).unwrap();
    let out = composite(&stack, shape, BlendKind::simple_alpha_fog()).unwrap();
    let data = &out.channel(0).unwrap().data;
    assert!(data.iter().all(|v| !v.is_nan()), "{data:?}");
    assert_eq!(data[0], 1.0e22);
}
