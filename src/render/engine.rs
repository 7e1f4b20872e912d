use crate::composite::compositor::{Compositor, ResolvedLayer};
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{FramewiseError, FramewiseResult};
use crate::render::sink::{FrameSink, SinkConfig};
use crate::scene::Scene;
use crate::timeline::tree::SequenceTree;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Timeline-wide settings supplied from outside the scene graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub fps: Fps,
    pub total_frames: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            total_frames: 900,
        }
    }
}

impl EngineConfig {
    pub fn new(fps: Fps, total_frames: u64) -> FramewiseResult<Self> {
        let cfg = Self { fps, total_frames };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FramewiseResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        if self.total_frames == 0 {
            return Err(FramewiseError::validation("total_frames must be > 0"));
        }
        Ok(())
    }

    /// `[0, total_frames)`.
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.total_frames),
        }
    }
}

/// Every active layer at one global frame, in draw order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameState {
    pub frame: FrameIndex,
    pub layers: Vec<ResolvedLayer>,
}

#[derive(Clone, Debug)]
/// Threading and chunking controls for multi-frame evaluation.
pub struct RenderThreading {
    /// Enable parallel evaluation when `true`.
    pub parallel: bool,
    /// Chunk size in frames for batched scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Aggregated evaluation counters.
pub struct RenderStats {
    /// Frames evaluated.
    pub frames_total: u64,
    /// Frames whose layer list was empty.
    pub frames_empty: u64,
    /// Resolved layers across all frames.
    pub layers_total: u64,
    /// Scheduling chunks processed.
    pub chunks: u64,
}

impl RenderStats {
    fn record(&mut self, frames: &[FrameState]) {
        self.chunks += 1;
        for f in frames {
            self.frames_total += 1;
            self.layers_total += f.layers.len() as u64;
            if f.layers.is_empty() {
                self.frames_empty += 1;
            }
        }
    }
}

/// Evaluates frames of one immutable scene. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    tree: SequenceTree,
}

impl Engine {
    pub fn new(tree: SequenceTree, config: EngineConfig) -> FramewiseResult<Self> {
        config.validate()?;
        Ok(Self { config, tree })
    }

    /// Uses the scene's own config when it has one, the default otherwise.
    pub fn from_scene(scene: Scene) -> FramewiseResult<Self> {
        let (tree, config) = scene.into_parts();
        Self::new(tree, config.unwrap_or_default())
    }

    pub fn with_config(mut self, config: EngineConfig) -> FramewiseResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> &SequenceTree {
        &self.tree
    }

    /// Layers of whatever windows are active at `frame`. `total_frames` only bounds the
    /// default batch range, so frames past it still report any window that covers them.
    #[tracing::instrument(level = "trace", skip(self), fields(frame = frame.0))]
    pub fn render_frame(&self, frame: FrameIndex) -> FramewiseResult<FrameState> {
        let active = self.tree.active_windows(frame);
        let layers = Compositor::composite(&self.tree, &active, self.config.fps)
            .map_err(|e| e.at_global_frame(frame))?;
        Ok(FrameState { frame, layers })
    }

    /// Evaluate a frame range (inclusive start, exclusive end), returned in index order.
    pub fn render_frames(
        &self,
        range: FrameRange,
        threading: &RenderThreading,
    ) -> FramewiseResult<Vec<FrameState>> {
        self.render_frames_with_stats(range, threading)
            .map(|(frames, _)| frames)
    }

    #[tracing::instrument(skip(self, threading), fields(start = range.start.0, end = range.end.0, parallel = threading.parallel))]
    pub fn render_frames_with_stats(
        &self,
        range: FrameRange,
        threading: &RenderThreading,
    ) -> FramewiseResult<(Vec<FrameState>, RenderStats)> {
        let mut out = Vec::with_capacity(range.len_frames().min(4096) as usize);
        let stats = self.for_each_chunk(range, threading, |frames| {
            out.extend(frames);
            Ok(())
        })?;
        Ok((out, stats))
    }

    /// Stream a frame range into `sink` in strictly increasing frame order.
    #[tracing::instrument(skip(self, threading, sink), fields(start = range.start.0, end = range.end.0))]
    pub fn render_to_sink(
        &self,
        range: FrameRange,
        threading: &RenderThreading,
        sink: &mut dyn FrameSink,
    ) -> FramewiseResult<RenderStats> {
        sink.begin(SinkConfig {
            fps: self.config.fps,
            range,
        })?;
        let stats = self.for_each_chunk(range, threading, |frames| {
            for f in &frames {
                sink.push_frame(f)?;
            }
            Ok(())
        })?;
        sink.end()?;
        Ok(stats)
    }

    fn for_each_chunk(
        &self,
        range: FrameRange,
        threading: &RenderThreading,
        mut consume: impl FnMut(Vec<FrameState>) -> FramewiseResult<()>,
    ) -> FramewiseResult<RenderStats> {
        if range.is_empty() {
            return Err(FramewiseError::validation("render range must be non-empty"));
        }

        let mut stats = RenderStats::default();
        let chunk_size = normalized_chunk_size(threading.chunk_size);
        let pool = if threading.parallel {
            Some(build_thread_pool(threading.threads)?)
        } else {
            None
        };

        let mut chunk_start = range.start.0;
        while chunk_start < range.end.0 {
            let chunk_end = chunk_start.saturating_add(chunk_size).min(range.end.0);
            tracing::debug!(chunk_start, chunk_end, "evaluating chunk");

            let frames = match &pool {
                Some(pool) => pool.install(|| {
                    (chunk_start..chunk_end)
                        .into_par_iter()
                        .map(|f| self.render_frame(FrameIndex(f)))
                        .collect::<FramewiseResult<Vec<_>>>()
                })?,
                None => (chunk_start..chunk_end)
                    .map(|f| self.render_frame(FrameIndex(f)))
                    .collect::<FramewiseResult<Vec<_>>>()?,
            };

            stats.record(&frames);
            consume(frames)?;
            chunk_start = chunk_end;
        }
        Ok(stats)
    }
}

fn build_thread_pool(threads: Option<usize>) -> FramewiseResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FramewiseError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FramewiseError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
