use crate::animation::curve::ValueCurve;
use crate::animation::spring::Spring;
use crate::foundation::core::Fps;
use crate::foundation::error::{FramewiseError, FramewiseResult};
use serde::{Deserialize, Serialize};

/// Everything a sample depends on. Passed explicitly, never read from ambient state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleCtx {
    pub frame: i64, // window-local frame
    pub fps: Fps,
}

impl SampleCtx {
    pub fn new(frame: i64, fps: Fps) -> Self {
        Self { frame, fps }
    }

    pub fn with_frame(mut self, frame: i64) -> Self {
        self.frame = frame;
        self
    }
}

/// A scalar parameter track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnimDef", into = "AnimDef")]
pub enum Anim {
    Constant(f64),
    Curve(ValueCurve),
    Spring(Spring),
    Expr(Expr),
}

impl Anim {
    pub fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    pub fn sample(&self, ctx: SampleCtx) -> FramewiseResult<f64> {
        match self {
            Self::Constant(v) => Ok(*v),
            Self::Curve(curve) => Ok(curve.evaluate(ctx.frame)),
            Self::Spring(spring) => Ok(spring.evaluate(ctx.frame, ctx.fps)),
            Self::Expr(expr) => expr.sample(ctx),
        }
    }

    pub fn validate(&self) -> FramewiseResult<()> {
        match self {
            Self::Constant(v) => {
                if v.is_finite() {
                    Ok(())
                } else {
                    Err(FramewiseError::animation(format!(
                        "constant value must be finite, got {v}"
                    )))
                }
            }
            // Curves and springs are validated when they are built.
            Self::Curve(_) => Ok(()),
            Self::Spring(spring) => spring.validate(),
            Self::Expr(expr) => expr.validate(),
        }
    }
}

impl From<f64> for Anim {
    fn from(v: f64) -> Self {
        Self::Constant(v)
    }
}

impl From<ValueCurve> for Anim {
    fn from(v: ValueCurve) -> Self {
        Self::Curve(v)
    }
}

impl From<Spring> for Anim {
    fn from(v: Spring) -> Self {
        Self::Spring(v)
    }
}

/// Time-remap and blend combinators over the local frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Delay {
        inner: Box<Anim>,
        by: i64,
    },
    Speed {
        inner: Box<Anim>,
        factor: f64,
    }, // factor>0
    Reverse {
        inner: Box<Anim>,
        duration: u64,
    }, // duration in frames
    Loop {
        inner: Box<Anim>,
        period: u64,
        mode: LoopMode,
    },
    Mix {
        a: Box<Anim>,
        b: Box<Anim>,
        t: Box<Anim>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    #[default]
    Repeat,
    PingPong,
}

impl Expr {
    pub fn validate(&self) -> FramewiseResult<()> {
        match self {
            Self::Delay { inner, by: _ } => inner.validate(),
            Self::Speed { inner, factor } => {
                if !factor.is_finite() || *factor <= 0.0 {
                    return Err(FramewiseError::animation("speed factor must be > 0"));
                }
                inner.validate()
            }
            Self::Reverse { inner, duration } => {
                if *duration == 0 {
                    return Err(FramewiseError::animation("reverse duration must be > 0"));
                }
                inner.validate()
            }
            Self::Loop {
                inner,
                period,
                mode: _,
            } => {
                if *period == 0 {
                    return Err(FramewiseError::animation("loop period must be > 0"));
                }
                inner.validate()
            }
            Self::Mix { a, b, t } => {
                a.validate()?;
                b.validate()?;
                t.validate()
            }
        }
    }

    pub fn sample(&self, ctx: SampleCtx) -> FramewiseResult<f64> {
        let f = ctx.frame;
        match self {
            Self::Delay { inner, by } => inner.sample(ctx.with_frame(f.saturating_sub(*by))),
            Self::Speed { inner, factor } => {
                if *factor <= 0.0 {
                    return Err(FramewiseError::animation("speed factor must be > 0"));
                }
                let mapped = ((f as f64) * factor).floor() as i64;
                inner.sample(ctx.with_frame(mapped))
            }
            Self::Reverse { inner, duration } => {
                if *duration == 0 {
                    return Err(FramewiseError::animation("reverse duration must be > 0"));
                }
                let max = i64::try_from(duration - 1).unwrap_or(i64::MAX);
                inner.sample(ctx.with_frame(max - f.clamp(0, max)))
            }
            Self::Loop {
                inner,
                period,
                mode,
            } => {
                if *period == 0 {
                    return Err(FramewiseError::animation("loop period must be > 0"));
                }
                let period = i64::try_from(*period).unwrap_or(i64::MAX);
                let mapped = match mode {
                    LoopMode::Repeat => f.rem_euclid(period),
                    LoopMode::PingPong => {
                        if period == 1 {
                            0
                        } else {
                            let cycle = (period - 1).saturating_mul(2);
                            let pos = f.rem_euclid(cycle);
                            if pos < period { pos } else { cycle - pos }
                        }
                    }
                };
                inner.sample(ctx.with_frame(mapped))
            }
            Self::Mix { a, b, t } => {
                let tt = t.sample(ctx)?;
                if !tt.is_finite() {
                    return Err(FramewiseError::evaluation(format!(
                        "mix weight at frame {f} is not finite"
                    )));
                }
                let tt = tt.clamp(0.0, 1.0);
                let av = a.sample(ctx)?;
                let bv = b.sample(ctx)?;
                Ok(av + (bv - av) * tt)
            }
        }
    }
}

// ----------------------------
// Boundary (serde) structures
// ----------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AnimDef {
    /// JSON shorthand: a bare number is a constant.
    Constant(f64),
    Tagged(AnimTaggedDef),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AnimTaggedDef {
    Curve(ValueCurve),
    Spring(Spring),
    Delay {
        inner: Box<Anim>,
        by: i64,
    },
    Speed {
        inner: Box<Anim>,
        factor: f64,
    },
    Reverse {
        inner: Box<Anim>,
        duration: u64,
    },
    Loop {
        inner: Box<Anim>,
        period: u64,
        #[serde(default)]
        mode: LoopMode,
    },
    Mix {
        a: Box<Anim>,
        b: Box<Anim>,
        t: Box<Anim>,
    },
}

impl TryFrom<AnimDef> for Anim {
    type Error = FramewiseError;

    fn try_from(def: AnimDef) -> Result<Self, Self::Error> {
        let anim = match def {
            AnimDef::Constant(v) => Anim::Constant(v),
            AnimDef::Tagged(tagged) => match tagged {
                AnimTaggedDef::Curve(c) => Anim::Curve(c),
                AnimTaggedDef::Spring(s) => Anim::Spring(s),
                AnimTaggedDef::Delay { inner, by } => Anim::Expr(Expr::Delay { inner, by }),
                AnimTaggedDef::Speed { inner, factor } => Anim::Expr(Expr::Speed { inner, factor }),
                AnimTaggedDef::Reverse { inner, duration } => {
                    Anim::Expr(Expr::Reverse { inner, duration })
                }
                AnimTaggedDef::Loop {
                    inner,
                    period,
                    mode,
                } => Anim::Expr(Expr::Loop {
                    inner,
                    period,
                    mode,
                }),
                AnimTaggedDef::Mix { a, b, t } => Anim::Expr(Expr::Mix { a, b, t }),
            },
        };
        anim.validate()?;
        Ok(anim)
    }
}

impl From<Anim> for AnimDef {
    fn from(anim: Anim) -> Self {
        match anim {
            Anim::Constant(v) => AnimDef::Constant(v),
            Anim::Curve(c) => AnimDef::Tagged(AnimTaggedDef::Curve(c)),
            Anim::Spring(s) => AnimDef::Tagged(AnimTaggedDef::Spring(s)),
            Anim::Expr(expr) => AnimDef::Tagged(match expr {
                Expr::Delay { inner, by } => AnimTaggedDef::Delay { inner, by },
                Expr::Speed { inner, factor } => AnimTaggedDef::Speed { inner, factor },
                Expr::Reverse { inner, duration } => AnimTaggedDef::Reverse { inner, duration },
                Expr::Loop {
                    inner,
                    period,
                    mode,
                } => AnimTaggedDef::Loop {
                    inner,
                    period,
                    mode,
                },
                Expr::Mix { a, b, t } => AnimTaggedDef::Mix { a, b, t },
            }),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
