use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{FramewiseError, FramewiseResult};
use crate::render::engine::FrameState;
use std::io::Write;

/// Configuration provided to a [`FrameSink`] at the start of a range render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    pub fps: Fps,
    pub range: FrameRange,
}

/// Sink contract for consuming evaluated frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order within the
/// requested range.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> FramewiseResult<()>;
    fn push_frame(&mut self, frame: &FrameState) -> FramewiseResult<()>;
    fn end(&mut self) -> FramewiseResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    ended: bool,
    /// Frames in timeline order.
    pub frames: Vec<FrameState>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> FramewiseResult<()> {
        self.cfg = Some(cfg);
        self.ended = false;
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameState) -> FramewiseResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> FramewiseResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Writes one JSON object per frame, newline separated.
pub struct JsonLinesSink<W: Write> {
    out: W,
    last: Option<FrameIndex>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn begin(&mut self, _cfg: SinkConfig) -> FramewiseResult<()> {
        self.last = None;
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameState) -> FramewiseResult<()> {
        if let Some(prev) = self.last
            && frame.frame <= prev
        {
            return Err(FramewiseError::evaluation(format!(
                "frame {} pushed after frame {}",
                frame.frame.0, prev.0
            )));
        }
        serde_json::to_writer(&mut self.out, frame)
            .map_err(|e| FramewiseError::serde(format!("write frame {}: {e}", frame.frame.0)))?;
        self.out
            .write_all(b"\n")
            .map_err(|e| FramewiseError::Other(e.into()))?;
        self.last = Some(frame.frame);
        Ok(())
    }

    fn end(&mut self) -> FramewiseResult<()> {
        self.out.flush().map_err(|e| FramewiseError::Other(e.into()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sink.rs"]
mod tests;
