//! The parameter vocabulary shared by layers and windows.
//!
//! Recognised names drive the transform, opacity and color of a layer. Every other
//! name is sampled too and passed through as a free numeric attribute.

use crate::animation::anim::SampleCtx;
use crate::composite::transform::Transform2D;
use crate::foundation::color::Color;
use crate::foundation::core::Vec2;
use crate::foundation::error::{FramewiseError, FramewiseResult, ParamScope, SampleSite};
use crate::timeline::window::ParamMap;
use std::collections::BTreeMap;

pub const X: &str = "x";
pub const Y: &str = "y";
pub const SCALE: &str = "scale";
pub const SCALE_X: &str = "scale_x";
pub const SCALE_Y: &str = "scale_y";
pub const ROTATION: &str = "rotation"; // degrees
pub const ANCHOR_X: &str = "anchor_x";
pub const ANCHOR_Y: &str = "anchor_y";
pub const OPACITY: &str = "opacity";
pub const RED: &str = "red";
pub const GREEN: &str = "green";
pub const BLUE: &str = "blue";
pub const ALPHA: &str = "alpha";
pub const HUE: &str = "hue"; // degrees
pub const SATURATION: &str = "saturation";
pub const LIGHTNESS: &str = "lightness";

pub fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        X | Y
            | SCALE
            | SCALE_X
            | SCALE_Y
            | ROTATION
            | ANCHOR_X
            | ANCHOR_Y
            | OPACITY
            | RED
            | GREEN
            | BLUE
            | ALPHA
            | HUE
            | SATURATION
            | LIGHTNESS
    )
}

/// Channel overrides sampled from color parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorOverrides {
    pub red: Option<f64>,
    pub green: Option<f64>,
    pub blue: Option<f64>,
    pub alpha: Option<f64>,
    pub hue: Option<f64>,
    pub saturation: Option<f64>,
    pub lightness: Option<f64>,
}

impl ColorOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// RGB overrides first, then HSL overrides in HSL space, then alpha.
    pub fn apply(&self, base: Color) -> Color {
        let mut c = base;
        if let Some(r) = self.red {
            c.r = r;
        }
        if let Some(g) = self.green {
            c.g = g;
        }
        if let Some(b) = self.blue {
            c.b = b;
        }
        c.r = c.r.clamp(0.0, 1.0);
        c.g = c.g.clamp(0.0, 1.0);
        c.b = c.b.clamp(0.0, 1.0);

        if self.hue.is_some() || self.saturation.is_some() || self.lightness.is_some() {
            let (h, s, l) = c.to_hsl();
            c = Color::hsla(
                self.hue.unwrap_or(h),
                self.saturation.unwrap_or(s),
                self.lightness.unwrap_or(l),
                c.a,
            );
        }
        if let Some(a) = self.alpha {
            c.a = a;
        }
        c.a = c.a.clamp(0.0, 1.0);
        c
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedParams {
    pub transform: Transform2D,
    pub opacity: f64,
    pub color: ColorOverrides,
    pub attributes: BTreeMap<String, f64>,
}

impl Default for ResolvedParams {
    fn default() -> Self {
        Self {
            transform: Transform2D::default(),
            opacity: 1.0,
            color: ColorOverrides::default(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Sample every parameter at `ctx` and fold them into transform, opacity, color
/// overrides and attributes. Failures carry a [`SampleSite`] naming `owner`.
pub fn resolve(
    params: &ParamMap,
    scope: ParamScope,
    owner: &str,
    ctx: SampleCtx,
) -> FramewiseResult<ResolvedParams> {
    let mut out = ResolvedParams::default();
    let mut scale = 1.0;
    let mut scale_x = 1.0;
    let mut scale_y = 1.0;
    let site = |name: &str| SampleSite::new(scope, owner, name, ctx.frame);

    for (name, anim) in params {
        let v = anim
            .sample(ctx)
            .map_err(|e| FramewiseError::sample(site(name), e.to_string()))?;
        if !v.is_finite() {
            return Err(FramewiseError::sample(
                site(name),
                format!("value {v} is not finite"),
            ));
        }
        match name.as_str() {
            X => out.transform.translate.x = v,
            Y => out.transform.translate.y = v,
            SCALE => scale = v,
            SCALE_X => scale_x = v,
            SCALE_Y => scale_y = v,
            ROTATION => out.transform.rotation_rad = v.to_radians(),
            ANCHOR_X => out.transform.anchor.x = v,
            ANCHOR_Y => out.transform.anchor.y = v,
            OPACITY => out.opacity = v.clamp(0.0, 1.0),
            RED => out.color.red = Some(v),
            GREEN => out.color.green = Some(v),
            BLUE => out.color.blue = Some(v),
            ALPHA => out.color.alpha = Some(v),
            HUE => out.color.hue = Some(v),
            SATURATION => out.color.saturation = Some(v),
            LIGHTNESS => out.color.lightness = Some(v),
            _ => {
                out.attributes.insert(name.clone(), v);
            }
        }
    }

    out.transform.scale = Vec2::new(scale * scale_x, scale * scale_y);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/params.rs"]
mod tests;
