use super::*;
use crate::{
    animation::interp::InterpolationCurve,
    foundation::core::Vec2,
    model::transform::Transformation,
};

fn setup() -> (Project, ObjectId) {
    let mut p = Project::new(
        ProjectSettings {
            width: 200,
            height: 100,
            dpi: 100,
            lpi: 40.0,
            frames: 8,
        },
        2,
    )
    .unwrap();
    let r = p.add_image("a.png").unwrap();
    let id = p
        .place_object(
            Placement {
                layer: 1,
                column: 1,
                length: 4,
            },
            r,
            Pose::at(10.0, 20.0),
        )
        .unwrap();
    (p, id)
}

/// Undo must restore `before`, redo must restore `after`, twice in a row.
fn assert_replays(item: &HistoryItem, before: &Project, after: &mut Project) {
    let expected_after = after.clone();
    for _ in 0..2 {
        item.apply_undo(after).unwrap();
        assert_eq!(after, before);
        item.apply_redo(after).unwrap();
        assert_eq!(after, &expected_after);
    }
}

#[test]
fn placement_replays() {
    let (mut p, id) = setup();
    let before = p.clone();
    let to = Placement {
        layer: 0,
        column: 3,
        length: 5,
    };
    let from = p.move_object(id, to).unwrap();
    let item = HistoryItem::Placement {
        object: id,
        before: from,
        after: to,
    };
    assert_replays(&item, &before, &mut p);
}

#[test]
fn pose_and_visibility_replay() {
    let (mut p, id) = setup();
    let before = p.clone();
    let o = p.object_mut(id).unwrap();
    let pose_before = PoseState::of(o);
    o.set_pose(Pose::at(0.0, 0.0));
    o.set_transformation(Transformation::rotate(90.0, InterpolationCurve::Cubic));
    let pose_after = PoseState::of(o);
    o.set_visible(false);

    let item = HistoryItem::Batch(vec![
        HistoryItem::Pose {
            object: id,
            before: pose_before,
            after: pose_after,
        },
        HistoryItem::Visibility {
            object: id,
            before: true,
            after: false,
        },
    ]);
    assert!(!item.is_noop());
    assert_replays(&item, &before, &mut p);
}

#[test]
fn object_add_and_remove_replay() {
    let (mut p, id) = setup();
    let before = p.clone();
    let removed = p.remove_object(id).unwrap();
    let item = HistoryItem::RemoveObject { object: removed };
    assert_replays(&item, &before, &mut p);

    let before = p.clone();
    let r = p.add_image("a.png").unwrap();
    let added = p
        .place_object(
            Placement {
                layer: 0,
                column: 0,
                length: 8,
            },
            r,
            Pose::default(),
        )
        .unwrap();
    let item = HistoryItem::AddObject {
        object: p.object(added).unwrap().clone(),
    };
    // The id counter never goes back, so compare everything but the counter.
    item.apply_undo(&mut p).unwrap();
    assert_eq!(p.layers(), before.layers());
    item.apply_redo(&mut p).unwrap();
    assert_eq!(p.object(added).unwrap().column(), 0);
}

#[test]
fn remove_layer_restores_all_objects_in_order() {
    let (mut p, id) = setup();
    let r = p.add_image("b.png").unwrap();
    let second = p
        .place_object(
            Placement {
                layer: 1,
                column: 5,
                length: 3,
            },
            r,
            Pose::default(),
        )
        .unwrap();
    p.set_layer_depth(1, -1.5).unwrap();
    let before = p.clone();

    let removed: Vec<HistoryItem> = [id, second]
        .into_iter()
        .map(|oid| HistoryItem::RemoveObject {
            object: p.remove_object(oid).unwrap(),
        })
        .collect();
    let layer = p.remove_layer(1).unwrap();
    let item = HistoryItem::RemoveLayer {
        index: 1,
        layer,
        removed,
    };
    assert_replays(&item, &before, &mut p);

    item.apply_undo(&mut p).unwrap();
    let ids: Vec<ObjectId> = p.layer(1).unwrap().objects().iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec![id, second]);
    let mut pinned = Vec::new();
    item.pinned_resources(&mut pinned);
    assert_eq!(pinned.len(), 2);
}

#[test]
fn layer_structure_and_settings_replay() {
    let (mut p, _) = setup();
    let before = p.clone();
    p.insert_layer(0, Layer::new("sky")).unwrap();
    p.move_layer(0, 2).unwrap();
    p.rename_layer(1, "front").unwrap();
    let old = p
        .set_settings(ProjectSettings {
            frames: 12,
            ..*p.settings()
        })
        .unwrap();
    let item = HistoryItem::Batch(vec![
        HistoryItem::AddLayer {
            index: 0,
            layer: Layer::new("sky"),
        },
        HistoryItem::MoveLayer { from: 0, to: 2 },
        HistoryItem::LayerProps {
            layer: 1,
            before: LayerProps {
                name: "Layer 2".into(),
                depth_in: 0.0,
            },
            after: LayerProps {
                name: "front".into(),
                depth_in: 0.0,
            },
        },
        HistoryItem::Settings {
            before: old,
            after: *p.settings(),
        },
    ]);
    assert_replays(&item, &before, &mut p);
}

#[test]
fn noop_detection() {
    let (p, id) = setup();
    let state = PoseState::of(p.object(id).unwrap());
    assert!(
        HistoryItem::Pose {
            object: id,
            before: state.clone(),
            after: state,
        }
        .is_noop()
    );
    assert!(HistoryItem::MoveLayer { from: 1, to: 1 }.is_noop());
    assert!(HistoryItem::Batch(Vec::new()).is_noop());
    assert!(
        !HistoryItem::AddObject {
            object: p.object(id).unwrap().clone()
        }
        .is_noop()
    );
}

#[test]
fn replay_against_missing_object_is_a_history_error() {
    let (mut p, id) = setup();
    let item = HistoryItem::Visibility {
        object: ObjectId(id.0 + 99),
        before: true,
        after: false,
    };
    assert!(matches!(
        item.apply_redo(&mut p),
        Err(LenticularError::History(_))
    ));
}

#[test]
fn failed_batch_leaves_project_untouched() {
    let (mut p, id) = setup();
    let item = HistoryItem::Batch(vec![
        HistoryItem::Visibility {
            object: id,
            before: true,
            after: false,
        },
        HistoryItem::Visibility {
            object: ObjectId(id.0 + 99),
            before: true,
            after: false,
        },
    ]);
    let before = p.clone();
    assert!(item.apply_redo(&mut p).is_err());
    assert_eq!(p, before);
    assert!(item.apply_undo(&mut p).is_err());
    assert_eq!(p, before);
}

#[test]
fn footprint_grows_with_content() {
    let (p, id) = setup();
    let small = HistoryItem::MoveLayer { from: 0, to: 1 };
    let big = HistoryItem::Batch(vec![
        HistoryItem::RemoveObject {
            object: p.object(id).unwrap().clone(),
        },
        small.clone(),
    ]);
    assert!(big.footprint_bytes() > 2 * small.footprint_bytes());
}
