use crate::foundation::error::{FramewiseError, FramewiseResult};
use serde::{Deserialize, Serialize};

/// Monotonic easing `[0, 1] -> [0, 1]` applied to the normalized position within a segment.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Ease {
    #[default]
    Linear,
    /// Holds the segment start value until the next key.
    Hold,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Hold => {
                if t < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::EaseIn => cubic_bezier_ease(t, 0.42, 0.0, 1.0, 1.0),
            Self::EaseOut => cubic_bezier_ease(t, 0.0, 0.0, 0.58, 1.0),
            Self::EaseInOut => cubic_bezier_ease(t, 0.42, 0.0, 0.58, 1.0),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier_ease(t, x1, y1, x2, y2),
        }
    }

    /// Control points must lie in the unit square so the mapping stays within `[0, 1]`.
    pub fn validate(self) -> FramewiseResult<()> {
        if let Self::CubicBezier { x1, y1, x2, y2 } = self {
            let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
            if !(unit(x1) && unit(y1) && unit(x2) && unit(y2)) {
                return Err(FramewiseError::animation(format!(
                    "cubic_bezier control points must be within [0, 1], got ({x1}, {y1}, {x2}, {y2})"
                )));
            }
        }
        Ok(())
    }
}

fn cubic_bezier_ease(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    // Solve bx(u) = x for u, then return by(u).
    fn sample_curve(a1: f64, a2: f64, t: f64) -> f64 {
        let omt = 1.0 - t;
        3.0 * omt * omt * t * a1 + 3.0 * omt * t * t * a2 + t * t * t
    }
    fn sample_curve_derivative(a1: f64, a2: f64, t: f64) -> f64 {
        let omt = 1.0 - t;
        3.0 * omt * omt * a1 + 6.0 * omt * t * (a2 - a1) + 3.0 * t * t * (1.0 - a2)
    }

    // Newton-Raphson first; bisection over the whole interval if it fails to converge.
    // Both use fixed iteration counts so the result is deterministic.
    let mut t = x;
    let mut converged = false;
    for _ in 0..8 {
        let x_t = sample_curve(x1, x2, t) - x;
        if x_t.abs() < 1e-9 {
            converged = true;
            break;
        }
        let d = sample_curve_derivative(x1, x2, t);
        if d.abs() < 1e-7 {
            break;
        }
        t = (t - x_t / d).clamp(0.0, 1.0);
    }

    if !converged {
        let mut lo = 0.0;
        let mut hi = 1.0;
        for _ in 0..48 {
            t = 0.5 * (lo + hi);
            if sample_curve(x1, x2, t) < x {
                lo = t;
            } else {
                hi = t;
            }
        }
        t = 0.5 * (lo + hi);
    }

    sample_curve(y1, y2, t).clamp(0.0, 1.0)
}

impl Serialize for Ease {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Bezier {
            cubic_bezier: [f64; 4],
        }

        let name = match *self {
            Self::Linear => "linear",
            Self::Hold => "hold",
            Self::InQuad => "in_quad",
            Self::OutQuad => "out_quad",
            Self::InOutQuad => "in_out_quad",
            Self::InCubic => "in_cubic",
            Self::OutCubic => "out_cubic",
            Self::InOutCubic => "in_out_cubic",
            Self::EaseIn => "ease_in",
            Self::EaseOut => "ease_out",
            Self::EaseInOut => "ease_in_out",
            Self::CubicBezier { x1, y1, x2, y2 } => {
                return Bezier {
                    cubic_bezier: [x1, y1, x2, y2],
                }
                .serialize(serializer);
            }
        };
        serializer.serialize_str(name)
    }
}

impl<'de> Deserialize<'de> for Ease {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            CubicBezier { cubic_bezier: [f64; 4] },
        }

        let ease = match Repr::deserialize(deserializer)? {
            Repr::Str(s) => match s.as_str() {
                "linear" => Self::Linear,
                "hold" => Self::Hold,
                "in_quad" => Self::InQuad,
                "out_quad" => Self::OutQuad,
                "in_out_quad" => Self::InOutQuad,
                "in_cubic" => Self::InCubic,
                "out_cubic" => Self::OutCubic,
                "in_out_cubic" => Self::InOutCubic,
                "ease_in" => Self::EaseIn,
                "ease_out" => Self::EaseOut,
                "ease_in_out" => Self::EaseInOut,
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "unknown ease \"{other}\""
                    )));
                }
            },
            Repr::CubicBezier {
                cubic_bezier: [x1, y1, x2, y2],
            } => Self::CubicBezier { x1, y1, x2, y2 },
        };
        ease.validate().map_err(serde::de::Error::custom)?;
        Ok(ease)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
