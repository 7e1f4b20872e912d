use super::*;
use crate::animation::ops::{delay, loop_, mix, reverse, speed};
use serde_json::json;

fn ctx(frame: i64) -> SampleCtx {
    SampleCtx::new(frame, Fps::new(30, 1).unwrap())
}

fn ramp(len: i64) -> Anim {
    Anim::Curve(ValueCurve::interpolate(&[0, len], &[0.0, len as f64]).unwrap())
}

#[test]
fn constant_ignores_frame() {
    let a = Anim::constant(4.5);
    assert_eq!(a.sample(ctx(-100)).unwrap(), 4.5);
    assert_eq!(a.sample(ctx(100)).unwrap(), 4.5);
}

#[test]
fn delay_shifts_inner_frame() {
    let a = delay(ramp(10), 3);
    assert_eq!(a.sample(ctx(3)).unwrap(), 0.0);
    assert_eq!(a.sample(ctx(8)).unwrap(), 5.0);
}

#[test]
fn speed_scales_and_floors() {
    let a = speed(ramp(100), 1.5);
    assert_eq!(a.sample(ctx(3)).unwrap(), 4.0);
    assert_eq!(a.sample(ctx(-3)).unwrap(), -5.0);
}

#[test]
fn reverse_maps_frames() {
    let rev = reverse(ramp(9), 10);
    assert_eq!(rev.sample(ctx(0)).unwrap(), 9.0);
    assert_eq!(rev.sample(ctx(9)).unwrap(), 0.0);
    assert_eq!(rev.sample(ctx(20)).unwrap(), 0.0);
    assert_eq!(rev.sample(ctx(-5)).unwrap(), 9.0);
}

#[test]
fn loop_repeat_and_ping_pong() {
    let rep = loop_(ramp(10), 4, LoopMode::Repeat);
    let got: Vec<f64> = (0..9).map(|f| rep.sample(ctx(f)).unwrap()).collect();
    assert_eq!(got, vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
    assert_eq!(rep.sample(ctx(-1)).unwrap(), 3.0);

    let pp = loop_(ramp(10), 4, LoopMode::PingPong);
    let got: Vec<f64> = (0..8).map(|f| pp.sample(ctx(f)).unwrap()).collect();
    assert_eq!(got, vec![0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0, 1.0]);

    let single = loop_(ramp(10), 1, LoopMode::PingPong);
    assert_eq!(single.sample(ctx(7)).unwrap(), 0.0);
}

#[test]
fn mix_clamps_weight() {
    let m = mix(Anim::constant(0.0), Anim::constant(10.0), ramp(4));
    assert_eq!(m.sample(ctx(-2)).unwrap(), 0.0);
    assert_eq!(m.sample(ctx(0)).unwrap(), 0.0);
    assert_eq!(m.sample(ctx(1)).unwrap(), 10.0);
    assert_eq!(m.sample(ctx(3)).unwrap(), 10.0);

    let half = mix(Anim::constant(2.0), Anim::constant(4.0), Anim::constant(0.5));
    assert_eq!(half.sample(ctx(0)).unwrap(), 3.0);
}

#[test]
fn validate_rejects_bad_expressions() {
    assert!(speed(Anim::constant(1.0), 0.0).validate().is_err());
    assert!(speed(Anim::constant(1.0), f64::NAN).validate().is_err());
    assert!(reverse(Anim::constant(1.0), 0).validate().is_err());
    assert!(loop_(Anim::constant(1.0), 0, LoopMode::Repeat).validate().is_err());
    assert!(Anim::constant(f64::INFINITY).validate().is_err());
    assert!(
        mix(
            Anim::constant(0.0),
            Anim::constant(1.0),
            reverse(Anim::constant(1.0), 0)
        )
        .validate()
        .is_err()
    );
    assert!(delay(ramp(5), -4).validate().is_ok());
}

#[test]
fn parses_bare_number_and_tagged_forms() {
    let a: Anim = serde_json::from_value(json!(0.75)).unwrap();
    assert_eq!(a, Anim::Constant(0.75));

    let a: Anim = serde_json::from_value(json!({
        "curve": {"keyframes": [[0, 0.0], [30, 1.0]], "extrapolate_right": "clamp"}
    }))
    .unwrap();
    assert_eq!(a.sample(ctx(45)).unwrap(), 1.0);

    let a: Anim = serde_json::from_value(json!({
        "delay": {"inner": {"spring": {"damping": 12.0}}, "by": 25}
    }))
    .unwrap();
    assert_eq!(a.sample(ctx(25)).unwrap(), 0.0);
    assert!(a.sample(ctx(40)).unwrap() > 0.0);

    let a: Anim = serde_json::from_value(json!({
        "loop": {"inner": {"curve": {"keyframes": [[0, 0.3], [75, 0.6], [150, 0.3]]}}, "period": 150}
    }))
    .unwrap();
    assert!((a.sample(ctx(225)).unwrap() - 0.6).abs() < 1e-12);
}

#[test]
fn deserialize_rejects_invalid_expressions() {
    assert!(
        serde_json::from_value::<Anim>(json!({"speed": {"inner": 1.0, "factor": -2.0}})).is_err()
    );
    assert!(serde_json::from_value::<Anim>(json!({"wiggle": {}})).is_err());
}

#[test]
fn serialize_round_trip_keeps_sampling() {
    let a = mix(
        delay(ramp(30), 5),
        loop_(Anim::constant(2.0), 3, LoopMode::PingPong),
        Anim::constant(0.25),
    );
    let s = serde_json::to_string(&a).unwrap();
    let back: Anim = serde_json::from_str(&s).unwrap();
    assert_eq!(a, back);
}
