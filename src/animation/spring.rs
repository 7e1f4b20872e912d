use crate::foundation::core::Fps;
use crate::foundation::error::{FramewiseError, FramewiseResult};
use serde::{Deserialize, Serialize};

/// Distance from `to` under which a spring counts as settled by default.
pub const DEFAULT_SETTLE_THRESHOLD: f64 = 0.005;

const SETTLE_SCAN_LIMIT: i64 = 100_000;
const CRITICAL_TOLERANCE: f64 = 1e-6;

/// Physical parameters of a damped spring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpringConfig {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
    /// When set, the value stops at `to` the first time it would pass it.
    pub overshoot_clamping: bool,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            stiffness: 100.0,
            damping: 10.0,
            overshoot_clamping: false,
        }
    }
}

impl SpringConfig {
    pub fn new(mass: f64, stiffness: f64, damping: f64) -> FramewiseResult<Self> {
        let cfg = Self {
            mass,
            stiffness,
            damping,
            overshoot_clamping: false,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn gentle() -> Self {
        Self::preset(120.0, 14.0)
    }

    pub fn wobbly() -> Self {
        Self::preset(180.0, 12.0)
    }

    pub fn stiff() -> Self {
        Self::preset(210.0, 20.0)
    }

    pub fn molasses() -> Self {
        Self::preset(280.0, 120.0)
    }

    fn preset(stiffness: f64, damping: f64) -> Self {
        Self {
            stiffness,
            damping,
            ..Self::default()
        }
    }

    pub fn with_overshoot_clamping(mut self, on: bool) -> Self {
        self.overshoot_clamping = on;
        self
    }

    /// `c / (2·sqrt(m·k))`; infinite for a spring with no stiffness.
    pub fn damping_ratio(&self) -> f64 {
        if self.stiffness == 0.0 {
            return f64::INFINITY;
        }
        self.damping / (2.0 * (self.mass * self.stiffness).sqrt())
    }

    pub fn is_underdamped(&self) -> bool {
        self.damping_ratio() < 1.0 - CRITICAL_TOLERANCE
    }

    pub fn is_critically_damped(&self) -> bool {
        (self.damping_ratio() - 1.0).abs() < CRITICAL_TOLERANCE
    }

    pub fn is_overdamped(&self) -> bool {
        self.damping_ratio() > 1.0 + CRITICAL_TOLERANCE
    }

    pub fn validate(&self) -> FramewiseResult<()> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(FramewiseError::animation(format!(
                "spring mass must be finite and > 0, got {}",
                self.mass
            )));
        }
        if !self.stiffness.is_finite() || self.stiffness < 0.0 {
            return Err(FramewiseError::animation(format!(
                "spring stiffness must be finite and >= 0, got {}",
                self.stiffness
            )));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(FramewiseError::animation(format!(
                "spring damping must be finite and >= 0, got {}",
                self.damping
            )));
        }
        Ok(())
    }
}

/// A damped spring from `from` to `to`, sampled in closed form at any frame.
///
/// The spring is released at relative frame `delay`. Earlier frames report `from`
/// with zero velocity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpringDef", into = "SpringDef")]
pub struct Spring {
    from: f64,
    to: f64,
    initial_velocity: f64,
    config: SpringConfig,
    delay: i64,
}

impl Spring {
    pub fn new(from: f64, to: f64, config: SpringConfig) -> FramewiseResult<Self> {
        let spring = Self {
            from,
            to,
            initial_velocity: 0.0,
            config,
            delay: 0,
        };
        spring.validate()?;
        Ok(spring)
    }

    /// Initial velocity in units per second.
    pub fn with_initial_velocity(mut self, velocity: f64) -> FramewiseResult<Self> {
        self.initial_velocity = velocity;
        self.validate()?;
        Ok(self)
    }

    pub fn with_delay(mut self, frames: i64) -> Self {
        self.delay = frames;
        self
    }

    pub fn from(&self) -> f64 {
        self.from
    }

    pub fn to(&self) -> f64 {
        self.to
    }

    pub fn initial_velocity(&self) -> f64 {
        self.initial_velocity
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    pub fn delay(&self) -> i64 {
        self.delay
    }

    pub fn validate(&self) -> FramewiseResult<()> {
        self.config.validate()?;
        for (name, v) in [
            ("from", self.from),
            ("to", self.to),
            ("initial_velocity", self.initial_velocity),
        ] {
            if !v.is_finite() {
                return Err(FramewiseError::animation(format!(
                    "spring {name} must be finite, got {v}"
                )));
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, relative_frame: i64, fps: Fps) -> f64 {
        self.state(relative_frame, fps).0
    }

    /// Velocity in units per second.
    pub fn velocity(&self, relative_frame: i64, fps: Fps) -> f64 {
        self.state(relative_frame, fps).1
    }

    /// A follow-up spring that starts at this spring's value and velocity at `at_frame`
    /// and heads for `new_to`, sharing the same relative frame axis.
    pub fn chain(&self, at_frame: i64, fps: Fps, new_to: f64) -> FramewiseResult<Spring> {
        let (value, velocity) = self.state(at_frame, fps);
        let next = Self {
            from: value,
            to: new_to,
            initial_velocity: velocity,
            config: self.config,
            delay: at_frame,
        };
        next.validate()?;
        Ok(next)
    }

    /// First relative frame from which the value stays within `threshold` of `to`.
    ///
    /// Scans a bounded number of frames after the release; `None` if the spring is
    /// still moving outside `threshold` at the end of the scan.
    pub fn settle_frame(&self, fps: Fps, threshold: f64) -> Option<i64> {
        let threshold = threshold.abs();
        let start = self.delay;
        let end = start.saturating_add(SETTLE_SCAN_LIMIT);
        let mut settled_since = None;
        let mut f = start;
        while f <= end {
            let x = self.evaluate(f, fps);
            if (x - self.to).abs() <= threshold {
                settled_since.get_or_insert(f);
            } else {
                settled_since = None;
            }
            if f == end {
                break;
            }
            f += 1;
        }
        settled_since
    }

    fn state(&self, relative_frame: i64, fps: Fps) -> (f64, f64) {
        let rel = relative_frame.saturating_sub(self.delay);
        if rel <= 0 {
            let v = if rel == 0 { self.initial_velocity } else { 0.0 };
            return (self.from, v);
        }
        let t = fps.frames_to_secs(rel);
        if self.config.overshoot_clamping
            && let Some(tc) = self.first_crossing()
            && t >= tc
        {
            return (self.to, 0.0);
        }
        let (dx, v) = self.displacement(t);
        if self.config.overshoot_clamping && dx * (self.from - self.to) < 0.0 {
            return (self.to, 0.0);
        }
        (self.to + dx, v)
    }

    /// Displacement from `to` and velocity at `t` seconds after release.
    fn displacement(&self, t: f64) -> (f64, f64) {
        let SpringConfig {
            mass: m,
            stiffness: k,
            damping: c,
            ..
        } = self.config;
        let d0 = self.from - self.to;
        let v0 = self.initial_velocity;

        if k == 0.0 {
            if c == 0.0 {
                return (d0 + v0 * t, v0);
            }
            let a = c / m;
            let decay = (-a * t).exp();
            return (d0 + v0 / a * (1.0 - decay), v0 * decay);
        }

        let w0 = (k / m).sqrt();
        let zeta = self.config.damping_ratio();

        if (zeta - 1.0).abs() < CRITICAL_TOLERANCE {
            let b = v0 + w0 * d0;
            let env = (-w0 * t).exp();
            return (env * (d0 + b * t), env * (v0 - w0 * b * t));
        }

        if zeta < 1.0 {
            let wd = w0 * (1.0 - zeta * zeta).sqrt();
            let a = d0;
            let b = (v0 + zeta * w0 * d0) / wd;
            let env = (-zeta * w0 * t).exp();
            let (sin, cos) = (wd * t).sin_cos();
            let x = env * (a * cos + b * sin);
            let v = env * ((b * wd - zeta * w0 * a) * cos - (a * wd + zeta * w0 * b) * sin);
            return (x, v);
        }

        let s = w0 * (zeta * zeta - 1.0).sqrt();
        let r1 = -zeta * w0 + s;
        let r2 = -zeta * w0 - s;
        let c1 = (v0 - r2 * d0) / (r1 - r2);
        let c2 = d0 - c1;
        let (e1, e2) = ((r1 * t).exp(), (r2 * t).exp());
        (c1 * e1 + c2 * e2, c1 * r1 * e1 + c2 * r2 * e2)
    }

    /// Seconds after release at which the motion first reaches `to`.
    fn first_crossing(&self) -> Option<f64> {
        let SpringConfig {
            mass: m,
            stiffness: k,
            damping: c,
            ..
        } = self.config;
        let d0 = self.from - self.to;
        let v0 = self.initial_velocity;
        if d0 == 0.0 {
            return Some(0.0);
        }
        let positive = |t: f64| (t.is_finite() && t > 0.0).then_some(t);

        if k == 0.0 {
            if c == 0.0 {
                return if v0 == 0.0 { None } else { positive(-d0 / v0) };
            }
            if v0 == 0.0 {
                return None;
            }
            let a = c / m;
            let q = -d0 * a / v0;
            return if q > 0.0 && q < 1.0 {
                positive(-(1.0 - q).ln() / a)
            } else {
                None
            };
        }

        let w0 = (k / m).sqrt();
        let zeta = self.config.damping_ratio();

        if (zeta - 1.0).abs() < CRITICAL_TOLERANCE {
            let b = v0 + w0 * d0;
            return if b == 0.0 { None } else { positive(-d0 / b) };
        }

        if zeta < 1.0 {
            let wd = w0 * (1.0 - zeta * zeta).sqrt();
            let b = (v0 + zeta * w0 * d0) / wd;
            // a·cos + b·sin = R·cos(θ − φ) vanishes at θ = φ + π/2 + nπ.
            let phi = b.atan2(d0);
            let mut theta = (phi + std::f64::consts::FRAC_PI_2).rem_euclid(std::f64::consts::PI);
            if theta == 0.0 {
                theta = std::f64::consts::PI;
            }
            return positive(theta / wd);
        }

        let s = w0 * (zeta * zeta - 1.0).sqrt();
        let r1 = -zeta * w0 + s;
        let r2 = -zeta * w0 - s;
        let c1 = (v0 - r2 * d0) / (r1 - r2);
        let c2 = d0 - c1;
        if c1 == 0.0 {
            return None;
        }
        let ratio = -c2 / c1;
        if ratio > 1.0 {
            positive(ratio.ln() / (r1 - r2))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpringDef {
    #[serde(default)]
    from: f64,
    #[serde(default = "one")]
    to: f64,
    #[serde(default)]
    initial_velocity: f64,
    #[serde(default)]
    delay: i64,
    #[serde(default = "default_mass")]
    mass: f64,
    #[serde(default = "default_stiffness")]
    stiffness: f64,
    #[serde(default = "default_damping")]
    damping: f64,
    #[serde(default)]
    overshoot_clamping: bool,
}

fn one() -> f64 {
    1.0
}

fn default_mass() -> f64 {
    SpringConfig::default().mass
}

fn default_stiffness() -> f64 {
    SpringConfig::default().stiffness
}

fn default_damping() -> f64 {
    SpringConfig::default().damping
}

impl TryFrom<SpringDef> for Spring {
    type Error = FramewiseError;

    fn try_from(def: SpringDef) -> Result<Self, Self::Error> {
        let config = SpringConfig {
            mass: def.mass,
            stiffness: def.stiffness,
            damping: def.damping,
            overshoot_clamping: def.overshoot_clamping,
        };
        Ok(Spring::new(def.from, def.to, config)?
            .with_initial_velocity(def.initial_velocity)?
            .with_delay(def.delay))
    }
}

impl From<Spring> for SpringDef {
    fn from(s: Spring) -> Self {
        Self {
            from: s.from,
            to: s.to,
            initial_velocity: s.initial_velocity,
            delay: s.delay,
            mass: s.config.mass,
            stiffness: s.config.stiffness,
            damping: s.config.damping,
            overshoot_clamping: s.config.overshoot_clamping,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/spring.rs"]
mod tests;
