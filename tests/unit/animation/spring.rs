use super::*;
use serde_json::json;

fn fps30() -> Fps {
    Fps::new(30, 1).unwrap()
}

fn spring(from: f64, to: f64, cfg: SpringConfig) -> Spring {
    Spring::new(from, to, cfg).unwrap()
}

#[test]
fn starts_at_from_for_every_regime() {
    let configs = [
        SpringConfig::default(),
        SpringConfig::new(1.0, 100.0, 20.0).unwrap(),
        SpringConfig::molasses(),
        SpringConfig::new(2.0, 0.0, 3.0).unwrap(),
        SpringConfig::new(1.0, 0.0, 0.0).unwrap(),
    ];
    for cfg in configs {
        let s = spring(-3.5, 8.0, cfg).with_initial_velocity(4.0).unwrap();
        assert_eq!(s.evaluate(0, fps30()), -3.5, "{cfg:?}");
        assert_eq!(s.evaluate(-10, fps30()), -3.5, "{cfg:?}");
    }
}

#[test]
fn default_spring_converges_to_target() {
    let s = spring(0.0, 1.0, SpringConfig::default());
    assert!((s.evaluate(300, fps30()) - 1.0).abs() < 1e-6);
    // Underdamped: it passes the target at some point.
    assert!((0..60).any(|f| s.evaluate(f, fps30()) > 1.0));
}

#[test]
fn overdamped_without_velocity_is_monotonic_and_never_overshoots() {
    let s = spring(0.0, 1.0, SpringConfig::molasses());
    assert!(s.config().is_overdamped());
    let mut prev = s.evaluate(0, fps30());
    for f in 1..600 {
        let x = s.evaluate(f, fps30());
        assert!(x >= prev, "frame {f}: {x} < {prev}");
        assert!(x <= 1.0, "frame {f}: {x} overshoots");
        prev = x;
    }
}

#[test]
fn critically_damped_never_overshoots() {
    let s = spring(10.0, 0.0, SpringConfig::new(1.0, 100.0, 20.0).unwrap());
    assert!(s.config().is_critically_damped());
    for f in 0..300 {
        assert!(s.evaluate(f, fps30()) >= 0.0);
    }
}

#[test]
fn late_frames_cost_nothing_extra_and_stay_finite() {
    let s = spring(0.0, 1.0, SpringConfig::wobbly());
    let x = s.evaluate(10_000, fps30());
    assert!(x.is_finite());
    assert!((x - 1.0).abs() < 1e-9);
}

#[test]
fn evaluation_is_deterministic() {
    let s = spring(0.2, 0.9, SpringConfig::gentle())
        .with_initial_velocity(-1.5)
        .unwrap();
    for f in 0..120 {
        assert_eq!(
            s.evaluate(f, fps30()).to_bits(),
            s.evaluate(f, fps30()).to_bits()
        );
    }
}

#[test]
fn delay_shifts_the_release() {
    let s = spring(0.0, 1.0, SpringConfig::default());
    let d = s.with_delay(25);
    assert_eq!(d.evaluate(25, fps30()), 0.0);
    assert_eq!(d.evaluate(10, fps30()), 0.0);
    assert_eq!(d.evaluate(40, fps30()), s.evaluate(15, fps30()));
}

#[test]
fn free_motion_without_stiffness() {
    let s = spring(0.0, 5.0, SpringConfig::new(1.0, 0.0, 0.0).unwrap())
        .with_initial_velocity(3.0)
        .unwrap();
    assert!((s.evaluate(30, fps30()) - 3.0).abs() < 1e-9);

    let drag = spring(0.0, 5.0, SpringConfig::new(1.0, 0.0, 2.0).unwrap())
        .with_initial_velocity(4.0)
        .unwrap();
    // Coasts toward v0·m/c.
    assert!((drag.evaluate(3000, fps30()) - 2.0).abs() < 1e-6);
}

#[test]
fn velocity_matches_finite_difference() {
    let s = spring(0.0, 1.0, SpringConfig::default());
    let fps = fps30();
    let f = 12;
    let numeric = (s.evaluate(f + 1, fps) - s.evaluate(f - 1, fps)) / (2.0 / fps.as_f64());
    let analytic = s.velocity(f, fps);
    assert!((numeric - analytic).abs() < 0.05 * analytic.abs().max(1.0));
}

#[test]
fn chain_inherits_value_and_velocity() {
    let fps = fps30();
    let s = spring(0.0, 1.0, SpringConfig::default());
    let next = s.chain(10, fps, 3.0).unwrap();
    assert_eq!(next.from(), s.evaluate(10, fps));
    assert_eq!(next.initial_velocity(), s.velocity(10, fps));
    assert_eq!(next.evaluate(10, fps), s.evaluate(10, fps));
    assert!((next.evaluate(400, fps) - 3.0).abs() < 1e-6);
}

#[test]
fn overshoot_clamping_stops_at_target() {
    let fps = fps30();
    let s = spring(
        0.0,
        1.0,
        SpringConfig::wobbly().with_overshoot_clamping(true),
    );
    for f in 0..120 {
        assert!(s.evaluate(f, fps) <= 1.0);
    }
    assert_eq!(s.evaluate(119, fps), 1.0);

    let falling = spring(
        1.0,
        0.0,
        SpringConfig::default().with_overshoot_clamping(true),
    );
    for f in 0..120 {
        assert!(falling.evaluate(f, fps) >= 0.0);
    }
}

#[test]
fn settle_frame_bounds_the_motion() {
    let fps = fps30();
    let s = spring(0.0, 1.0, SpringConfig::default());
    let settled = s.settle_frame(fps, DEFAULT_SETTLE_THRESHOLD).unwrap();
    assert!(settled > 0);
    for f in settled..settled + 200 {
        assert!((s.evaluate(f, fps) - 1.0).abs() <= DEFAULT_SETTLE_THRESHOLD);
    }
    assert!((s.evaluate(settled - 1, fps) - 1.0).abs() > DEFAULT_SETTLE_THRESHOLD);

    let coasting = spring(0.0, 1.0, SpringConfig::new(1.0, 0.0, 0.0).unwrap())
        .with_initial_velocity(1.0)
        .unwrap();
    assert_eq!(coasting.settle_frame(fps, DEFAULT_SETTLE_THRESHOLD), None);
}

#[test]
fn damping_ratio_classifies_regimes() {
    assert!(SpringConfig::default().is_underdamped());
    assert!(SpringConfig::new(4.0, 25.0, 20.0).unwrap().is_critically_damped());
    assert!(SpringConfig::molasses().is_overdamped());
    assert!((SpringConfig::default().damping_ratio() - 0.5).abs() < 1e-12);
}

#[test]
fn rejects_invalid_parameters() {
    assert!(SpringConfig::new(0.0, 100.0, 10.0).is_err());
    assert!(SpringConfig::new(1.0, -1.0, 10.0).is_err());
    assert!(SpringConfig::new(1.0, 100.0, f64::NAN).is_err());
    assert!(Spring::new(f64::INFINITY, 1.0, SpringConfig::default()).is_err());
    assert!(
        Spring::new(0.0, 1.0, SpringConfig::default())
            .unwrap()
            .with_initial_velocity(f64::NAN)
            .is_err()
    );
}

#[test]
fn parses_with_defaults() {
    let s: Spring = serde_json::from_value(json!({"damping": 12.0, "delay": 25})).unwrap();
    assert_eq!(s.from(), 0.0);
    assert_eq!(s.to(), 1.0);
    assert_eq!(s.delay(), 25);
    assert_eq!(s.config().mass, 1.0);
    assert_eq!(s.config().stiffness, 100.0);
    assert_eq!(s.config().damping, 12.0);

    assert!(serde_json::from_value::<Spring>(json!({"mass": 0.0})).is_err());
    assert!(serde_json::from_value::<Spring>(json!({"tension": 3.0})).is_err());
}

/// Integrates `m·x'' = -k·(x - to) - c·x'` with classic RK4, sampled at whole frames.
fn rk4_reference(s: &Spring, frames: i64, fps: Fps) -> Vec<(f64, f64)> {
    const SUBSTEPS: usize = 200;
    let SpringConfig {
        mass: m,
        stiffness: k,
        damping: c,
        ..
    } = *s.config();
    let accel = |x: f64, v: f64| (-k * (x - s.to()) - c * v) / m;
    let h = fps.frame_duration_secs() / SUBSTEPS as f64;

    let (mut x, mut v) = (s.from(), s.initial_velocity());
    let mut out = vec![(x, v)];
    for _ in 0..frames {
        for _ in 0..SUBSTEPS {
            let (k1x, k1v) = (v, accel(x, v));
            let (k2x, k2v) = (v + 0.5 * h * k1v, accel(x + 0.5 * h * k1x, v + 0.5 * h * k1v));
            let (k3x, k3v) = (v + 0.5 * h * k2v, accel(x + 0.5 * h * k2x, v + 0.5 * h * k2v));
            let (k4x, k4v) = (v + h * k3v, accel(x + h * k3x, v + h * k3v));
            x += h / 6.0 * (k1x + 2.0 * k2x + 2.0 * k3x + k4x);
            v += h / 6.0 * (k1v + 2.0 * k2v + 2.0 * k3v + k4v);
        }
        out.push((x, v));
    }
    out
}

#[test]
fn closed_form_matches_numeric_integration_in_every_regime() {
    let cases = [
        ("underdamped", SpringConfig::new(1.0, 100.0, 10.0).unwrap(), 0.0),
        ("underdamped heavy", SpringConfig::new(2.5, 180.0, 12.0).unwrap(), -6.0),
        ("critical", SpringConfig::new(1.0, 100.0, 20.0).unwrap(), 3.0),
        ("overdamped", SpringConfig::new(1.0, 100.0, 50.0).unwrap(), 0.0),
        ("overdamped kicked", SpringConfig::molasses(), 40.0),
        ("drag only", SpringConfig::new(1.0, 0.0, 4.0).unwrap(), 9.0),
        ("free", SpringConfig::new(1.0, 0.0, 0.0).unwrap(), -2.0),
    ];
    let fps = fps30();
    for (name, cfg, v0) in cases {
        let s = spring(20.0, 120.0, cfg).with_initial_velocity(v0).unwrap();
        let reference = rk4_reference(&s, 90, fps);
        for (frame, &(x, v)) in reference.iter().enumerate() {
            let frame = frame as i64;
            let got_x = s.evaluate(frame, fps);
            let got_v = s.velocity(frame, fps);
            assert!((got_x - x).abs() < 1e-6, "{name} frame {frame}: {got_x} vs {x}");
            assert!((got_v - v).abs() < 1e-5, "{name} frame {frame}: {got_v} vs {v}");
        }
    }
}

#[test]
fn underdamped_period_matches_damped_frequency() {
    // k=100, c=10, m=1: zeta = 0.5, wd = 10·sqrt(0.75) rad/s.
    let s = spring(0.0, 1.0, SpringConfig::new(1.0, 100.0, 10.0).unwrap());
    let fps = Fps::new(1000, 1).unwrap();
    let wd = 10.0 * 0.75f64.sqrt();
    let period_ms = 2.0 * std::f64::consts::PI / wd * 1000.0;

    // Velocity changes sign every half period; the first two velocity zeros after
    // release are one half period apart.
    let zeros: Vec<i64> = (2..2000)
        .filter(|&f| s.velocity(f, fps).signum() != s.velocity(f - 1, fps).signum())
        .take(2)
        .collect();
    assert_eq!(zeros.len(), 2);
    let half_period = (zeros[1] - zeros[0]) as f64;
    assert!((half_period - period_ms / 2.0).abs() <= 1.0, "{half_period} vs {}", period_ms / 2.0);
}
