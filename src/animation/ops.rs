use crate::animation::anim::{Anim, Expr, LoopMode};
use crate::animation::curve::{Keyframe, ValueCurve};
use crate::animation::ease::Ease;
use crate::foundation::error::FramewiseResult;

pub fn delay(inner: Anim, by_frames: i64) -> Anim {
    Anim::Expr(Expr::Delay {
        inner: Box::new(inner),
        by: by_frames,
    })
}

pub fn speed(inner: Anim, factor: f64) -> Anim {
    Anim::Expr(Expr::Speed {
        inner: Box::new(inner),
        factor,
    })
}

pub fn reverse(inner: Anim, duration_frames: u64) -> Anim {
    Anim::Expr(Expr::Reverse {
        inner: Box::new(inner),
        duration: duration_frames,
    })
}

pub fn loop_(inner: Anim, period_frames: u64, mode: LoopMode) -> Anim {
    Anim::Expr(Expr::Loop {
        inner: Box::new(inner),
        period: period_frames,
        mode,
    })
}

pub fn mix(a: Anim, b: Anim, t: Anim) -> Anim {
    Anim::Expr(Expr::Mix {
        a: Box::new(a),
        b: Box::new(b),
        t: Box::new(t),
    })
}

/// Switch from `a` to `b` at `a_len`; `b` sees frame 0 at the switch.
pub fn sequence(a: Anim, a_len: i64, b: Anim) -> FramewiseResult<Anim> {
    let b_local = delay(b, a_len);
    let step = ValueCurve::new(vec![
        Keyframe::new(0, 0.0).with_ease(Ease::Hold),
        Keyframe::new(a_len, 1.0),
    ])?
    .clamp();
    Ok(mix(a, b_local, Anim::Curve(step)))
}

/// One copy of `base` per item, each released `step` frames after the previous one.
pub fn stagger(base: &Anim, count: usize, step: i64) -> Vec<Anim> {
    (0..count)
        .map(|i| {
            let by = i64::try_from(i).unwrap_or(i64::MAX).saturating_mul(step);
            if by == 0 {
                base.clone()
            } else {
                delay(base.clone(), by)
            }
        })
        .collect()
}
