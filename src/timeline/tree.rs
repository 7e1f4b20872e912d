use crate::foundation::core::{FrameIndex, Rect};
use crate::foundation::error::{FramewiseError, FramewiseResult};
use crate::timeline::window::{Layer, ParamMap, SequenceMode, TimeWindow, span_contains};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowIdx(pub u32);

impl WindowIdx {
    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A window after construction: start resolved against its parent's sequence mode.
#[derive(Debug, Clone)]
pub struct WindowNode {
    pub id: String,
    pub start: i64, // in parent-local frames
    pub duration: Option<u64>,
    pub z_index: i32,
    pub params: ParamMap,
    pub clip: Option<Rect>,
    pub layers: Vec<Layer>,
    pub children: Vec<WindowIdx>, // declaration order
    pub parent: Option<WindowIdx>,
    pub depth: u32,
}

/// One window that is active at the queried frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub window: WindowIdx,
    pub local_frame: i64,
    pub parent: Option<WindowIdx>,
    pub depth: u32,
}

/// A window's own range in global frames, ignoring ancestor clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalSpan {
    pub start: i64,
    pub end: Option<i64>, // exclusive; None = unbounded
}

/// Immutable arena of nested time windows, root first.
#[derive(Debug, Clone)]
pub struct SequenceTree {
    nodes: Vec<WindowNode>,
    by_id: HashMap<String, WindowIdx>,
}

impl SequenceTree {
    #[tracing::instrument(skip(root), fields(root = %root.id))]
    pub fn new(root: TimeWindow) -> FramewiseResult<Self> {
        let mut builder = Builder::default();
        builder.push(root, 0, None, 0)?;

        let layers: usize = builder.nodes.iter().map(|n| n.layers.len()).sum();
        let max_depth = builder.nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        tracing::debug!(
            windows = builder.nodes.len(),
            layers,
            max_depth,
            "sequence tree built"
        );

        Ok(Self {
            nodes: builder.nodes,
            by_id: builder.by_id,
        })
    }

    pub fn root(&self) -> WindowIdx {
        WindowIdx(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn window(&self, idx: WindowIdx) -> Option<&WindowNode> {
        self.nodes.get(idx.as_usize())
    }

    pub fn window_by_id(&self, id: &str) -> Option<WindowIdx> {
        self.by_id.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WindowIdx, &WindowNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (WindowIdx(i as u32), n))
    }

    pub fn global_range(&self, idx: WindowIdx) -> Option<GlobalSpan> {
        let mut node = self.window(idx)?;
        let own_duration = node.duration;
        let mut start = i128::from(node.start);
        while let Some(p) = node.parent {
            node = self.window(p)?;
            start += i128::from(node.start);
        }
        let clamp = |v: i128| v.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
        Some(GlobalSpan {
            start: clamp(start),
            end: own_duration.map(|d| clamp(start + i128::from(d))),
        })
    }

    /// Active windows at `global`, parents before children, siblings in declaration order.
    ///
    /// A window whose parent is inactive is never visited, so children are clipped to
    /// their parent's active range.
    pub fn active_windows(&self, global: FrameIndex) -> Vec<ActiveWindow> {
        let mut out = Vec::new();
        let root = &self.nodes[0];
        let g = global.as_i64();
        if !span_contains(root.start, root.duration, g) {
            return out;
        }

        let mut stack: Vec<(WindowIdx, i64)> = Vec::with_capacity(16);
        stack.push((self.root(), g.saturating_sub(root.start)));
        while let Some((idx, local)) = stack.pop() {
            let node = &self.nodes[idx.as_usize()];
            out.push(ActiveWindow {
                window: idx,
                local_frame: local,
                parent: node.parent,
                depth: node.depth,
            });
            // Reverse push keeps declaration order on pop.
            for &c in node.children.iter().rev() {
                let child = &self.nodes[c.as_usize()];
                if span_contains(child.start, child.duration, local) {
                    stack.push((c, local.saturating_sub(child.start)));
                }
            }
        }
        out
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<WindowNode>,
    by_id: HashMap<String, WindowIdx>,
    layer_ids: HashSet<String>,
}

impl Builder {
    fn push(
        &mut self,
        w: TimeWindow,
        offset: i64,
        parent: Option<WindowIdx>,
        depth: u32,
    ) -> FramewiseResult<WindowIdx> {
        self.check_window(&w)?;

        let idx = WindowIdx(u32::try_from(self.nodes.len()).map_err(|_| {
            FramewiseError::validation("sequence tree has too many windows")
        })?);
        self.by_id.insert(w.id.clone(), idx);

        let start = w.start.checked_add(offset).ok_or_else(|| {
            FramewiseError::validation(format!("window \"{}\" start overflows", w.id))
        })?;
        self.nodes.push(WindowNode {
            id: w.id,
            start,
            duration: w.duration,
            z_index: w.z_index,
            params: w.params,
            clip: w.clip,
            layers: w.layers,
            children: Vec::with_capacity(w.children.len()),
            parent,
            depth,
        });

        let count = w.children.len();
        let mut cursor: i64 = 0;
        for (i, child) in w.children.into_iter().enumerate() {
            let child_offset = match w.mode {
                SequenceMode::Parallel => 0,
                SequenceMode::Series => cursor,
            };
            if w.mode == SequenceMode::Series {
                match child.duration {
                    Some(d) => {
                        let end = i128::from(cursor) + i128::from(child.start) + i128::from(d);
                        cursor = i64::try_from(end).map_err(|_| {
                            FramewiseError::validation(format!(
                                "series child \"{}\" ends beyond the frame range",
                                child.id
                            ))
                        })?;
                    }
                    None if i + 1 < count => {
                        return Err(FramewiseError::validation(format!(
                            "series child \"{}\" must have a duration unless it is last",
                            child.id
                        )));
                    }
                    None => {}
                }
            }
            let c = self.push(child, child_offset, Some(idx), depth + 1)?;
            self.nodes[idx.as_usize()].children.push(c);
        }
        Ok(idx)
    }

    fn check_window(&mut self, w: &TimeWindow) -> FramewiseResult<()> {
        if w.id.is_empty() {
            return Err(FramewiseError::validation("window id must be non-empty"));
        }
        if self.by_id.contains_key(&w.id) {
            return Err(FramewiseError::validation(format!(
                "duplicate window id \"{}\"",
                w.id
            )));
        }
        if w.duration == Some(0) {
            return Err(FramewiseError::validation(format!(
                "window \"{}\" duration must be > 0 (omit it for unbounded)",
                w.id
            )));
        }
        check_params(&w.params, || format!("window \"{}\"", w.id))?;

        for layer in &w.layers {
            if layer.id.is_empty() {
                return Err(FramewiseError::validation(format!(
                    "layer in window \"{}\" has an empty id",
                    w.id
                )));
            }
            if !self.layer_ids.insert(layer.id.clone()) {
                return Err(FramewiseError::validation(format!(
                    "duplicate layer id \"{}\"",
                    layer.id
                )));
            }
            check_params(&layer.parameters, || format!("layer \"{}\"", layer.id))?;
        }
        Ok(())
    }
}

fn check_params(params: &ParamMap, owner: impl Fn() -> String) -> FramewiseResult<()> {
    for (name, anim) in params {
        if name.is_empty() {
            return Err(FramewiseError::validation(format!(
                "{} has a parameter with an empty name",
                owner()
            )));
        }
        anim.validate().map_err(|e| {
            FramewiseError::validation(format!("{} parameter \"{name}\": {e}", owner()))
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/tree.rs"]
mod tests;
