use super::*;

const CURVES: [InterpolationCurve; 4] = [
    InterpolationCurve::Linear,
    InterpolationCurve::Quadratic,
    InterpolationCurve::Cubic,
    InterpolationCurve::Goniometric,
];

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn every_curve_hits_both_endpoints() {
    for curve in CURVES {
        for (s, e) in [(0.0, 1.0), (-3.5, 12.0), (100.0, 40.0)] {
            assert!(approx(interpolate(curve, 0.0, s, e), s), "{curve:?} start");
            assert!(approx(interpolate(curve, 1.0, s, e), e), "{curve:?} end");
        }
    }
}

#[test]
fn linear_is_affine_including_extrapolation() {
    for p in [-2.0, -0.25, 0.0, 0.3, 1.0, 1.75, 4.0] {
        let v = interpolate(InterpolationCurve::Linear, p, 10.0, 30.0);
        assert_eq!(v, 10.0 + p * (30.0 - 10.0));
    }
}

#[test]
fn cubic_is_symmetric_around_midpoint() {
    let c = InterpolationCurve::Cubic;
    assert!(approx(c.interpolate(0.5, 0.0, 10.0), 5.0));
    let lo = c.interpolate(0.2, 0.0, 1.0);
    let hi = c.interpolate(0.8, 0.0, 1.0);
    assert!(approx(lo + hi, 1.0));
}

#[test]
fn quadratic_and_goniometric_bend_opposite_ways() {
    let q = InterpolationCurve::Quadratic.interpolate(0.5, 0.0, 1.0);
    let g = InterpolationCurve::Goniometric.interpolate(0.5, 0.0, 1.0);
    assert!(approx(q, 0.25));
    assert!(g > 0.5);
}

#[test]
fn vector_interpolation_uses_shared_progress() {
    let v = InterpolationCurve::Linear.interpolate_vec(
        0.25,
        Vec2::new(0.0, 100.0),
        Vec2::new(40.0, 0.0),
    );
    assert_eq!(v, Vec2::new(10.0, 75.0));
}

#[test]
fn frame_progress_handles_single_frame_span() {
    assert_eq!(frame_progress(0, 1), 0.0);
    assert_eq!(frame_progress(2, 5), 0.5);
    assert_eq!(frame_progress(4, 5), 1.0);
}

#[test]
fn reciprocal_progress_rederives_the_endpoint() {
    // 5-frame span; a value of 30 observed at offset 2 on a 10 -> x ramp means x = 50.
    let p = reciprocal_progress(2, 5).unwrap();
    let end = interpolate(InterpolationCurve::Linear, p, 10.0, 30.0);
    assert!(approx(end, 50.0));
    assert!(reciprocal_progress(0, 5).is_none());
    assert!(reciprocal_progress(3, 1).is_none());
}
