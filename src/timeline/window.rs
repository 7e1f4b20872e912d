use crate::animation::anim::Anim;
use crate::foundation::color::Color;
use crate::foundation::core::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named parameter tracks. Ordered so evaluation and serialization are stable.
pub type ParamMap = BTreeMap<String, Anim>;

/// How a window positions its children in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceMode {
    /// Each child's `start` is relative to the window's own local frame 0.
    #[default]
    Parallel,
    /// Children are laid back to back; a child's `start` is an offset after the
    /// previous sibling ends.
    Series,
}

/// A drawable unit owned by exactly one window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layer {
    pub id: String,
    #[serde(default, alias = "zIndex")]
    pub z_index: i32,
    #[serde(default)]
    pub color: Color,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: ParamMap,
}

impl Layer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            z_index: 0,
            color: Color::default(),
            parameters: ParamMap::new(),
        }
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn param(mut self, name: impl Into<String>, anim: impl Into<Anim>) -> Self {
        self.parameters.insert(name.into(), anim.into());
        self
    }
}

/// A time-offset container of layers and nested windows.
///
/// Active at parent-local frame `p` iff `start <= p < start + duration`; its local
/// frame is then `p - start`. `duration: None` is unbounded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeWindow {
    pub id: String,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub mode: SequenceMode,
    #[serde(default, alias = "zIndex")]
    pub z_index: i32,
    /// Group parameters applied to everything inside the window.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: ParamMap,
    /// Clip rectangle in window-local space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<Rect>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub children: Vec<TimeWindow>,
}

impl TimeWindow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start: 0,
            duration: None,
            mode: SequenceMode::Parallel,
            z_index: 0,
            params: ParamMap::new(),
            clip: None,
            layers: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    pub fn duration(mut self, frames: u64) -> Self {
        self.duration = Some(frames);
        self
    }

    /// Shorthand for `start(start).duration(frames)`.
    pub fn span(self, start: i64, frames: u64) -> Self {
        self.start(start).duration(frames)
    }

    pub fn series(mut self) -> Self {
        self.mode = SequenceMode::Series;
        self
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    pub fn param(mut self, name: impl Into<String>, anim: impl Into<Anim>) -> Self {
        self.params.insert(name.into(), anim.into());
        self
    }

    pub fn clip(mut self, rect: Rect) -> Self {
        self.clip = Some(rect);
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn child(mut self, window: TimeWindow) -> Self {
        self.children.push(window);
        self
    }

    /// Whether parent-local frame `p` falls in `[start, start + duration)`.
    pub fn contains(&self, parent_local: i64) -> bool {
        span_contains(self.start, self.duration, parent_local)
    }
}

pub(crate) fn span_contains(start: i64, duration: Option<u64>, p: i64) -> bool {
    let offset = i128::from(p) - i128::from(start);
    if offset < 0 {
        return false;
    }
    match duration {
        None => true,
        Some(d) => offset < i128::from(d),
    }
}
