use crate::foundation::core::FrameIndex;
use std::fmt;

pub type FramewiseResult<T> = Result<T, FramewiseError>;

/// Kind of timeline node a parameter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamScope {
    Window,
    Layer,
}

impl fmt::Display for ParamScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Window => "window",
            Self::Layer => "layer",
        })
    }
}

/// Pinpoints a parameter that failed to sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleSite {
    pub scope: ParamScope,
    /// Id of the window or layer that owns the parameter.
    pub owner: String,
    pub parameter: String,
    /// Frame the parameter was sampled at, in its window's local time.
    pub local_frame: i64,
    /// Filled in by the engine; `None` when sampling ran outside a frame render.
    pub global_frame: Option<FrameIndex>,
}

impl SampleSite {
    pub fn new(
        scope: ParamScope,
        owner: impl Into<String>,
        parameter: impl Into<String>,
        local_frame: i64,
    ) -> Self {
        Self {
            scope,
            owner: owner.into(),
            parameter: parameter.into(),
            local_frame,
            global_frame: None,
        }
    }
}

impl fmt::Display for SampleSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" parameter \"{}\" at local frame {}",
            self.scope, self.owner, self.parameter, self.local_frame
        )?;
        if let Some(g) = self.global_frame {
            write!(f, " (global frame {})", g.0)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FramewiseError {
    /// Malformed scene, window tree or engine configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A curve, spring or expression that cannot be built.
    #[error("animation error: {0}")]
    Animation(String),

    /// Frame evaluation failed outside any single parameter.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A window or layer parameter produced no usable value.
    #[error("evaluation error: {site}: {reason}")]
    Sample {
        site: Box<SampleSite>,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramewiseError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn sample(site: SampleSite, reason: impl Into<String>) -> Self {
        Self::Sample {
            site: Box::new(site),
            reason: reason.into(),
        }
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Where sampling failed, for [`FramewiseError::Sample`] errors.
    pub fn sample_site(&self) -> Option<&SampleSite> {
        match self {
            Self::Sample { site, .. } => Some(site.as_ref()),
            _ => None,
        }
    }

    /// Stamp the global frame onto a sampling failure. Other errors pass through.
    pub(crate) fn at_global_frame(mut self, frame: FrameIndex) -> Self {
        if let Self::Sample { site, .. } = &mut self {
            site.global_frame = Some(frame);
        }
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
