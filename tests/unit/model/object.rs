use super::*;

fn obj(column: u32, length: u32) -> LayerObject {
    LayerObject::new(
        ObjectId(1),
        Placement {
            layer: 0,
            column,
            length,
        },
        ResourceId(0),
        Pose::at(10.0, 20.0),
    )
}

#[test]
fn linear_translation_walks_across_span() {
    let mut o = obj(0, 5);
    o.pose = Pose::default();
    o.set_transformation(Transformation::translation(
        Vec2::new(100.0, 0.0),
        InterpolationCurve::Linear,
    ));
    let xs: Vec<f64> = [0, 2, 4]
        .iter()
        .map(|f| o.resolve(FrameIndex(*f)).unwrap().position.x)
        .collect();
    assert_eq!(xs, vec![0.0, 50.0, 100.0]);
}

#[test]
fn resolve_is_none_outside_span() {
    let o = obj(3, 2);
    assert!(o.resolve(FrameIndex(2)).is_none());
    assert!(o.resolve(FrameIndex(3)).is_some());
    assert!(o.resolve(FrameIndex(4)).is_some());
    assert!(o.resolve(FrameIndex(5)).is_none());
}

#[test]
fn translation_and_3d_translation_are_summed() {
    let mut o = obj(0, 3);
    o.set_transformation(Transformation::translation(
        Vec2::new(10.0, 0.0),
        InterpolationCurve::Linear,
    ));
    o.set_transformation(Transformation::translation_3d(
        Vec2::new(4.0, 0.0),
        InterpolationCurve::Linear,
    ));
    let end = o.resolve(FrameIndex(2)).unwrap();
    assert_eq!(end.position, Vec2::new(24.0, 20.0));
}

#[test]
fn single_frame_object_uses_start_pose() {
    let mut o = obj(4, 1);
    o.set_transformation(Transformation::rotate(45.0, InterpolationCurve::Linear));
    let rp = o.resolve(FrameIndex(4)).unwrap();
    assert_eq!(rp.angle_deg, 0.0);
    assert_eq!(rp.position, Vec2::new(10.0, 20.0));
}

#[test]
fn negative_scale_is_clamped_and_degenerate() {
    let mut o = obj(0, 2);
    o.set_transformation(Transformation::scale(
        Vec2::new(-3.0, 0.0),
        InterpolationCurve::Linear,
    ));
    let rp = o.resolve(FrameIndex(1)).unwrap();
    assert_eq!(rp.scale, Vec2::new(0.0, 1.0));
    assert!(rp.is_degenerate());
    assert!(!o.resolve(FrameIndex(0)).unwrap().is_degenerate());
}

#[test]
fn mid_range_position_edit_rederives_endpoint() {
    let mut o = obj(0, 5);
    o.edit_at(FrameIndex(2), FrameEdit::Position(Vec2::new(30.0, 20.0)))
        .unwrap();
    assert_eq!(
        o.transformation(TransformKind::Translation).vector(),
        Vec2::new(40.0, 0.0)
    );
    assert_eq!(
        o.resolve(FrameIndex(2)).unwrap().position,
        Vec2::new(30.0, 20.0)
    );
    assert_eq!(o.pose().position(), Vec2::new(10.0, 20.0));
}

#[test]
fn mid_range_edits_follow_each_curve() {
    let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
    for curve in [
        InterpolationCurve::Linear,
        InterpolationCurve::Quadratic,
        InterpolationCurve::Cubic,
        InterpolationCurve::Goniometric,
    ] {
        for frame in [1, 2, 3, 4] {
            let mut o = obj(0, 5);
            o.set_transformation(Transformation::translation(Vec2::new(7.0, 0.0), curve));
            o.set_transformation(Transformation::rotate(5.0, curve));
            o.set_transformation(Transformation::scale(Vec2::new(0.5, 0.0), curve));

            let f = FrameIndex(frame);
            o.edit_at(f, FrameEdit::Position(Vec2::new(50.0, -4.0)))
                .unwrap();
            o.edit_at(f, FrameEdit::Angle(33.0)).unwrap();
            o.edit_at(f, FrameEdit::Scale(Vec2::new(1.5, 0.25)))
                .unwrap();

            let r = o.resolve(f).unwrap();
            assert!(close(r.position.x, 50.0), "{curve:?} @{frame}: {r:?}");
            assert!(close(r.position.y, -4.0), "{curve:?} @{frame}: {r:?}");
            assert!(close(r.angle_deg, 33.0), "{curve:?} @{frame}: {r:?}");
            assert!(close(r.scale.x, 1.5), "{curve:?} @{frame}: {r:?}");
            assert!(close(r.scale.y, 0.25), "{curve:?} @{frame}: {r:?}");
            assert_eq!(o.transformation(TransformKind::Translation).curve(), curve);
            assert_eq!(o.pose().position(), Vec2::new(10.0, 20.0));
        }
    }
}

#[test]
fn position_edit_keeps_3d_contribution() {
    let mut o = obj(0, 5);
    o.set_transformation(Transformation::translation_3d(
        Vec2::new(8.0, 0.0),
        InterpolationCurve::Linear,
    ));
    o.edit_at(FrameIndex(2), FrameEdit::Position(Vec2::new(30.0, 20.0)))
        .unwrap();
    assert_eq!(
        o.transformation(TransformKind::Translation3D).vector(),
        Vec2::new(8.0, 0.0)
    );
    assert_eq!(
        o.resolve(FrameIndex(2)).unwrap().position,
        Vec2::new(30.0, 20.0)
    );
}

#[test]
fn edit_at_first_frame_moves_initial_pose() {
    let mut o = obj(2, 3);
    o.set_transformation(Transformation::rotate(30.0, InterpolationCurve::Linear));
    o.edit_at(FrameIndex(2), FrameEdit::Angle(10.0)).unwrap();
    assert_eq!(o.pose().angle_deg, 10.0);
    assert_eq!(o.transformation(TransformKind::Rotate).angle(), 30.0);

    o.edit_at(FrameIndex(4), FrameEdit::Scale(Vec2::new(2.0, 0.5)))
        .unwrap();
    assert_eq!(
        o.transformation(TransformKind::Scale).vector(),
        Vec2::new(1.0, -0.5)
    );
}

#[test]
fn edit_outside_span_is_rejected() {
    let mut o = obj(0, 2);
    let before = o.clone();
    assert!(o.edit_at(FrameIndex(5), FrameEdit::Angle(1.0)).is_err());
    assert_eq!(o, before);
}
