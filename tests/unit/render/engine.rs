use super::*;
use crate::animation::anim::Anim;
use crate::animation::curve::ValueCurve;
use crate::composite::params::OPACITY;
use crate::foundation::error::ParamScope;
use crate::render::sink::InMemorySink;
use crate::timeline::window::{Layer, TimeWindow};

fn engine(total_frames: u64) -> Engine {
    let fade = ValueCurve::interpolate(&[0, 30], &[0.0, 1.0]).unwrap().clamp();
    let root = TimeWindow::new("root")
        .duration(300)
        .layer(Layer::new("bg").z_index(-1))
        .child(
            TimeWindow::new("w1")
                .span(0, 150)
                .layer(Layer::new("a").param(OPACITY, Anim::Curve(fade.clone()))),
        )
        .child(
            TimeWindow::new("w2")
                .span(150, 150)
                .layer(Layer::new("b").param(OPACITY, Anim::Curve(fade))),
        );
    let tree = SequenceTree::new(root).unwrap();
    Engine::new(tree, EngineConfig::new(Fps::default(), total_frames).unwrap()).unwrap()
}

fn range(start: u64, end: u64) -> FrameRange {
    FrameRange::new(FrameIndex(start), FrameIndex(end)).unwrap()
}

#[test]
fn default_config_matches_a_thirty_second_timeline() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.fps, Fps::new(30, 1).unwrap());
    assert_eq!(cfg.total_frames, 900);
    assert_eq!(cfg.range(), range(0, 900));
    assert!(EngineConfig::new(Fps::default(), 0).is_err());
}

#[test]
fn render_frame_reports_active_layers() {
    let e = engine(300);
    let f = e.render_frame(FrameIndex(160)).unwrap();
    let ids: Vec<&str> = f.layers.iter().map(|l| l.layer_id.as_str()).collect();
    assert_eq!(ids, vec!["bg", "b"]);
    assert_eq!(f.layers[1].local_frame, 10);
}

#[test]
fn frames_past_total_frames_follow_the_tree() {
    // Bounded root [0, 300): the tree, not total_frames, decides emptiness.
    let e = engine(200);
    assert_eq!(e.render_frame(FrameIndex(250)).unwrap().layers.len(), 2);
    assert_eq!(e.render_frame(FrameIndex(299)).unwrap().layers.len(), 2);
    assert!(e.render_frame(FrameIndex(300)).unwrap().layers.is_empty());
    assert!(e.render_frame(FrameIndex(u64::MAX)).unwrap().layers.is_empty());

    let root = TimeWindow::new("forever").layer(Layer::new("sky"));
    let tree = SequenceTree::new(root).unwrap();
    let e = Engine::new(tree, EngineConfig::new(Fps::default(), 900).unwrap()).unwrap();
    let f = e.render_frame(FrameIndex(950)).unwrap();
    assert_eq!(e.tree().active_windows(FrameIndex(950)).len(), 1);
    assert_eq!(f.layers.len(), 1);
    assert_eq!(f.layers[0].layer_id, "sky");
    assert_eq!(f.layers[0].local_frame, 950);
}

#[test]
fn sampling_failures_name_the_global_frame() {
    // Extends past f64::MAX from local frame 2 onward.
    let runaway = ValueCurve::interpolate(&[0, 1], &[0.0, f64::MAX]).unwrap();
    let root = TimeWindow::new("root").duration(300).child(
        TimeWindow::new("late")
            .span(100, 50)
            .layer(Layer::new("drift").param("x", Anim::Curve(runaway))),
    );
    let tree = SequenceTree::new(root).unwrap();
    let e = Engine::new(tree, EngineConfig::default()).unwrap();
    assert!(e.render_frame(FrameIndex(101)).is_ok());

    let err = e.render_frame(FrameIndex(103)).unwrap_err();
    let site = err.sample_site().unwrap();
    assert_eq!(site.scope, ParamScope::Layer);
    assert_eq!(site.owner, "drift");
    assert_eq!(site.parameter, "x");
    assert_eq!(site.local_frame, 3);
    assert_eq!(site.global_frame, Some(FrameIndex(103)));

    let err = e
        .render_frames(range(95, 110), &RenderThreading::default())
        .unwrap_err();
    assert_eq!(
        err.sample_site().and_then(|s| s.global_frame),
        Some(FrameIndex(102))
    );
}

#[test]
fn empty_ranges_are_rejected() {
    let e = engine(300);
    let err = e
        .render_frames(range(5, 5), &RenderThreading::default())
        .unwrap_err();
    assert!(matches!(err, FramewiseError::Validation(_)));
}

#[test]
fn zero_threads_are_rejected() {
    let e = engine(300);
    let threading = RenderThreading {
        parallel: true,
        threads: Some(0),
        ..RenderThreading::default()
    };
    assert!(e.render_frames(range(0, 4), &threading).is_err());
}

#[test]
fn parallel_matches_sequential() {
    let e = engine(300);
    let seq = e
        .render_frames(range(0, 300), &RenderThreading::default())
        .unwrap();
    let par = e
        .render_frames(
            range(0, 300),
            &RenderThreading {
                parallel: true,
                chunk_size: 7,
                threads: Some(3),
            },
        )
        .unwrap();
    assert_eq!(seq, par);
    assert!(seq.windows(2).all(|w| w[0].frame < w[1].frame));
}

#[test]
fn stats_count_frames_chunks_and_layers() {
    let e = engine(300);
    let threading = RenderThreading {
        chunk_size: 50,
        ..RenderThreading::default()
    };
    // The root ends at 300: ten frames with two layers, then ten empty ones.
    let (frames, stats) = e.render_frames_with_stats(range(290, 310), &threading).unwrap();
    assert_eq!(frames.len(), 20);
    assert_eq!(stats.frames_total, 20);
    assert_eq!(stats.chunks, 1);
    assert_eq!(stats.frames_empty, 10);
    assert_eq!(stats.layers_total, 20);

    let zero_chunk = RenderThreading {
        chunk_size: 0,
        ..RenderThreading::default()
    };
    let (_, stats) = e.render_frames_with_stats(range(0, 3), &zero_chunk).unwrap();
    assert_eq!(stats.chunks, 3);
}

#[test]
fn render_to_sink_streams_in_order() {
    let e = engine(300);
    let mut sink = InMemorySink::new();
    let threading = RenderThreading {
        parallel: true,
        chunk_size: 16,
        threads: Some(2),
    };
    let stats = e.render_to_sink(range(140, 170), &threading, &mut sink).unwrap();
    assert!(sink.is_ended());
    assert_eq!(stats.frames_total, 30);
    let frames: Vec<u64> = sink.frames.iter().map(|f| f.frame.0).collect();
    assert_eq!(frames, (140..170).collect::<Vec<_>>());
    assert_eq!(sink.config().unwrap().range, range(140, 170));
}

#[test]
fn engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();
    assert_send_sync::<SequenceTree>();
}
