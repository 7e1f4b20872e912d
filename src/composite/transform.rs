use crate::foundation::core::{Affine, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub translate: Vec2,
    pub rotation_rad: f64,
    pub scale: Vec2,  // default (1,1)
    pub anchor: Vec2, // pivot in local space
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: Vec2::new(1.0, 1.0),
            anchor: Vec2::ZERO,
        }
    }
}

impl Transform2D {
    pub fn to_affine(self) -> Affine {
        // T(translate) * T(anchor) * R(rot) * S(scale) * T(-anchor)
        Affine::translate(self.translate)
            * Affine::translate(self.anchor)
            * Affine::rotate(self.rotation_rad)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-self.anchor)
    }
}

/// World transform of a child: the parent's transform applied after the child's.
pub fn compose(parent: Affine, local: Affine) -> Affine {
    parent * local
}

pub fn compose_opacity(parent: f64, local: f64) -> f64 {
    (parent * local).clamp(0.0, 1.0)
}
