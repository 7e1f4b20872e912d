//! Framewise evaluates frame-indexed animation scenes deterministically.
//!
//! For any global frame it resolves which nested time windows are active, samples every
//! layer's parameter curves and springs at the window-local frame, and composes the
//! results into one draw-ordered [`FrameState`]:
//!
//! - Load a [`Scene`] from JSON or build one with [`TimeWindow`] and [`Layer`]
//! - Create an [`Engine`]
//! - Evaluate single frames or stream a range into a [`FrameSink`]
#![forbid(unsafe_code)]

/// Curves, springs, easing and time-remap expressions.
pub mod animation;
/// Draw-order reduction of active windows into resolved layers.
pub mod composite;
mod foundation;
/// Frame evaluation engine and frame sinks.
pub mod render;
/// Scene loading.
pub mod scene;
/// Time windows and the sequence tree.
pub mod timeline;

pub use crate::foundation::color::Color;
pub use crate::foundation::core::{
    Affine, Fps, FrameIndex, FrameRange, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{FramewiseError, FramewiseResult, ParamScope, SampleSite};

pub use crate::animation::anim::{Anim, Expr, LoopMode, SampleCtx};
pub use crate::animation::curve::{Extrapolate, Keyframe, ValueCurve};
pub use crate::animation::ease::Ease;
pub use crate::animation::spring::{Spring, SpringConfig};
pub use crate::composite::compositor::{Compositor, ResolvedLayer, WorldClip};
pub use crate::composite::transform::Transform2D;
pub use crate::render::engine::{Engine, EngineConfig, FrameState, RenderStats, RenderThreading};
pub use crate::render::sink::{FrameSink, InMemorySink, JsonLinesSink, SinkConfig};
pub use crate::scene::{Scene, SceneDef};
pub use crate::timeline::tree::{ActiveWindow, GlobalSpan, SequenceTree, WindowIdx, WindowNode};
pub use crate::timeline::window::{Layer, ParamMap, SequenceMode, TimeWindow};
