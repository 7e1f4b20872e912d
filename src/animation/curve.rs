use crate::animation::ease::Ease;
use crate::foundation::error::{FramewiseError, FramewiseResult};
use serde::{Deserialize, Serialize};

/// What a [`ValueCurve`] returns outside its keyframe range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolate {
    /// Hold the boundary key's value.
    Clamp,
    /// Continue the boundary segment's slope linearly.
    #[default]
    Extend,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub frame: i64,
    pub value: f64,
    pub ease: Ease, // applied toward the next key
}

impl Keyframe {
    pub fn new(frame: i64, value: f64) -> Self {
        Self {
            frame,
            value,
            ease: Ease::Linear,
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

/// Piecewise interpolation over keyframes, evaluated at integer frames.
///
/// Invariants (checked at construction, including deserialization):
/// - at least one key
/// - frames are non-decreasing; a repeated frame is an instantaneous step to the later value
/// - values are finite
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ValueCurveDef", into = "ValueCurveDef")]
pub struct ValueCurve {
    keys: Vec<Keyframe>,
    left: Extrapolate,
    right: Extrapolate,
}

impl ValueCurve {
    pub fn new(keys: Vec<Keyframe>) -> FramewiseResult<Self> {
        validate_keys(&keys)?;
        Ok(Self {
            keys,
            left: Extrapolate::default(),
            right: Extrapolate::default(),
        })
    }

    /// Build a curve from parallel input-frame / output-value ranges.
    pub fn interpolate(input: &[i64], output: &[f64]) -> FramewiseResult<Self> {
        if input.len() != output.len() {
            return Err(FramewiseError::animation(format!(
                "input range has {} frames but output range has {} values",
                input.len(),
                output.len()
            )));
        }
        let keys = input
            .iter()
            .zip(output)
            .map(|(&f, &v)| Keyframe::new(f, v))
            .collect();
        Self::new(keys)
    }

    pub fn extrapolate_left(mut self, policy: Extrapolate) -> Self {
        self.left = policy;
        self
    }

    pub fn extrapolate_right(mut self, policy: Extrapolate) -> Self {
        self.right = policy;
        self
    }

    /// Clamp on both sides.
    pub fn clamp(self) -> Self {
        self.extrapolate_left(Extrapolate::Clamp)
            .extrapolate_right(Extrapolate::Clamp)
    }

    /// Apply `ease` to every segment.
    pub fn ease(mut self, ease: Ease) -> FramewiseResult<Self> {
        ease.validate()?;
        for k in &mut self.keys {
            k.ease = ease;
        }
        Ok(self)
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn left_policy(&self) -> Extrapolate {
        self.left
    }

    pub fn right_policy(&self) -> Extrapolate {
        self.right
    }

    pub fn evaluate(&self, frame: i64) -> f64 {
        let keys = &self.keys;
        let first = &keys[0];
        let last = &keys[keys.len() - 1];

        let idx = keys.partition_point(|k| k.frame <= frame);
        if idx == 0 {
            return match self.left {
                Extrapolate::Clamp => first.value,
                Extrapolate::Extend => {
                    first.value + self.leading_slope() * frame_delta(frame, first.frame)
                }
            };
        }
        if idx >= keys.len() {
            if frame == last.frame {
                return last.value;
            }
            return match self.right {
                Extrapolate::Clamp => last.value,
                Extrapolate::Extend => {
                    last.value + self.trailing_slope() * frame_delta(frame, last.frame)
                }
            };
        }

        // `a` is the last key at or before `frame`, so `a.frame < b.frame` here.
        let a = &keys[idx - 1];
        let b = &keys[idx];
        let t = frame_delta(frame, a.frame) / frame_delta(b.frame, a.frame);
        let te = a.ease.apply(t);
        a.value + (b.value - a.value) * te
    }

    /// Slope of the first segment with non-zero length, or 0 for a single-frame curve.
    fn leading_slope(&self) -> f64 {
        let first_frame = self.keys[0].frame;
        let start = self.keys.partition_point(|k| k.frame <= first_frame);
        if start >= self.keys.len() {
            return 0.0;
        }
        segment_slope(&self.keys[start - 1], &self.keys[start])
    }

    /// Slope of the last segment with non-zero length, or 0 for a single-frame curve.
    fn trailing_slope(&self) -> f64 {
        let last_frame = self.keys[self.keys.len() - 1].frame;
        let end = self.keys.partition_point(|k| k.frame < last_frame);
        if end == 0 {
            return 0.0;
        }
        segment_slope(&self.keys[end - 1], &self.keys[end])
    }
}

fn frame_delta(a: i64, b: i64) -> f64 {
    (i128::from(a) - i128::from(b)) as f64
}

fn segment_slope(a: &Keyframe, b: &Keyframe) -> f64 {
    (b.value - a.value) / frame_delta(b.frame, a.frame)
}

fn validate_keys(keys: &[Keyframe]) -> FramewiseResult<()> {
    if keys.is_empty() {
        return Err(FramewiseError::animation(
            "keyframe set must have at least one key",
        ));
    }
    if let Some(w) = keys.windows(2).find(|w| w[0].frame > w[1].frame) {
        return Err(FramewiseError::animation(format!(
            "keyframe frames must be non-decreasing (frame {} follows {})",
            w[1].frame, w[0].frame
        )));
    }
    for k in keys {
        if !k.value.is_finite() {
            return Err(FramewiseError::animation(format!(
                "keyframe value at frame {} is not finite",
                k.frame
            )));
        }
        k.ease.validate()?;
    }
    Ok(())
}

// ----------------------------
// Boundary (serde) structures
// ----------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ValueCurveDef {
    keyframes: Vec<KeyframeDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ease: Option<Ease>,
    #[serde(default)]
    extrapolate_left: Extrapolate,
    #[serde(default)]
    extrapolate_right: Extrapolate,
}

#[derive(Debug, Clone, Serialize)]
struct KeyframeDef {
    frame: i64,
    value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ease: Option<Ease>,
}

impl<'de> Deserialize<'de> for KeyframeDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Pair(i64, f64),
            Obj {
                frame: i64,
                value: f64,
                #[serde(default)]
                ease: Option<Ease>,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Pair(frame, value) => Ok(Self {
                frame,
                value,
                ease: None,
            }),
            Repr::Obj { frame, value, ease } => Ok(Self { frame, value, ease }),
        }
    }
}

impl TryFrom<ValueCurveDef> for ValueCurve {
    type Error = FramewiseError;

    fn try_from(def: ValueCurveDef) -> Result<Self, Self::Error> {
        let default_ease = def.ease.unwrap_or_default();
        let keys = def
            .keyframes
            .into_iter()
            .map(|k| Keyframe {
                frame: k.frame,
                value: k.value,
                ease: k.ease.unwrap_or(default_ease),
            })
            .collect();
        Ok(Self::new(keys)?
            .extrapolate_left(def.extrapolate_left)
            .extrapolate_right(def.extrapolate_right))
    }
}

impl From<ValueCurve> for ValueCurveDef {
    fn from(curve: ValueCurve) -> Self {
        Self {
            keyframes: curve
                .keys
                .into_iter()
                .map(|k| KeyframeDef {
                    frame: k.frame,
                    value: k.value,
                    ease: (k.ease != Ease::Linear).then_some(k.ease),
                })
                .collect(),
            ease: None,
            extrapolate_left: curve.left,
            extrapolate_right: curve.right,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/curve.rs"]
mod tests;
