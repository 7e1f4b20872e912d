use crate::animation::anim::SampleCtx;
use crate::composite::params::resolve;
use crate::composite::transform::{compose, compose_opacity};
use crate::foundation::color::Color;
use crate::foundation::core::{Affine, Fps, Rect};
use crate::foundation::error::{FramewiseError, FramewiseResult, ParamScope};
use crate::timeline::tree::{ActiveWindow, SequenceTree, WindowIdx, WindowNode};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// A window clip rectangle together with the world transform it lives under.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldClip {
    pub transform: Affine,
    pub rect: Rect,
}

pub type ClipStack = SmallVec<[WorldClip; 2]>;

/// Final visual state of one layer at one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLayer {
    pub layer_id: String,
    pub window_id: String,
    pub local_frame: i64,
    pub z_index: i32,
    pub transform: Affine,
    pub opacity: f64,
    pub color: Color,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub clips: ClipStack, // outermost first
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, f64>,
}

/// Reduces the active windows of a frame into a flat, draw-ordered layer list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    /// Painter order over the tree: within a window, its layers and active child
    /// windows are stably sorted by `z_index`, layers ahead of windows at equal z.
    /// Later entries draw above earlier ones.
    pub fn composite(
        tree: &SequenceTree,
        active: &[ActiveWindow],
        fps: Fps,
    ) -> FramewiseResult<Vec<ResolvedLayer>> {
        if active.is_empty() {
            return Ok(Vec::new());
        }

        let mut local_of: Vec<Option<i64>> = vec![None; tree.len()];
        for a in active {
            let slot = local_of
                .get_mut(a.window.0 as usize)
                .ok_or_else(|| not_in_tree(a.window))?;
            *slot = Some(a.local_frame);
        }

        enum Work {
            Window {
                idx: WindowIdx,
                parent_world: Affine,
                parent_opacity: f64,
                clips: ClipStack,
            },
            Layer {
                window: WindowIdx,
                layer: usize,
                local_frame: i64,
                world: Affine,
                opacity: f64,
                clips: ClipStack,
            },
        }

        enum Item {
            Layer(usize),
            Window(WindowIdx),
        }

        let mut out = Vec::new();
        let mut stack: Vec<Work> = Vec::with_capacity(32);
        stack.push(Work::Window {
            idx: tree.root(),
            parent_world: Affine::IDENTITY,
            parent_opacity: 1.0,
            clips: ClipStack::new(),
        });

        while let Some(w) = stack.pop() {
            match w {
                Work::Window {
                    idx,
                    parent_world,
                    parent_opacity,
                    mut clips,
                } => {
                    let node = window(tree, idx)?;
                    let Some(local_frame) = local_of[idx.0 as usize] else {
                        continue;
                    };
                    let ctx = SampleCtx::new(local_frame, fps);
                    let group = resolve(&node.params, ParamScope::Window, &node.id, ctx)?;
                    let world = compose(parent_world, group.transform.to_affine());
                    let opacity = compose_opacity(parent_opacity, group.opacity);
                    if let Some(rect) = node.clip {
                        clips.push(WorldClip {
                            transform: world,
                            rect,
                        });
                    }

                    let mut items: Vec<(i32, Item)> = node
                        .layers
                        .iter()
                        .enumerate()
                        .map(|(i, l)| (l.z_index, Item::Layer(i)))
                        .collect();
                    for &c in &node.children {
                        if local_of[c.0 as usize].is_some() {
                            items.push((window(tree, c)?.z_index, Item::Window(c)));
                        }
                    }
                    items.sort_by_key(|(z, _)| *z);

                    // Pushed in reverse so the lowest z pops first.
                    for (_, item) in items.into_iter().rev() {
                        stack.push(match item {
                            Item::Layer(layer) => Work::Layer {
                                window: idx,
                                layer,
                                local_frame,
                                world,
                                opacity,
                                clips: clips.clone(),
                            },
                            Item::Window(c) => Work::Window {
                                idx: c,
                                parent_world: world,
                                parent_opacity: opacity,
                                clips: clips.clone(),
                            },
                        });
                    }
                }
                Work::Layer {
                    window: widx,
                    layer,
                    local_frame,
                    world,
                    opacity,
                    clips,
                } => {
                    let node = window(tree, widx)?;
                    let l = &node.layers[layer];
                    let ctx = SampleCtx::new(local_frame, fps);
                    let p = resolve(&l.parameters, ParamScope::Layer, &l.id, ctx)?;
                    out.push(ResolvedLayer {
                        layer_id: l.id.clone(),
                        window_id: node.id.clone(),
                        local_frame,
                        z_index: l.z_index,
                        transform: compose(world, p.transform.to_affine()),
                        opacity: compose_opacity(opacity, p.opacity),
                        color: p.color.apply(l.color),
                        clips,
                        attributes: p.attributes,
                    });
                }
            }
        }

        Ok(out)
    }
}

fn window(tree: &SequenceTree, idx: WindowIdx) -> FramewiseResult<&WindowNode> {
    tree.window(idx).ok_or_else(|| not_in_tree(idx))
}

fn not_in_tree(idx: WindowIdx) -> FramewiseError {
    FramewiseError::evaluation(format!("window {idx:?} is not in the tree"))
}

#[cfg(test)]
#[path = "../../tests/unit/composite/compositor.rs"]
mod tests;
