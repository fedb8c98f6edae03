use super::*;
use crate::{
    history::item::{HistoryItem, PoseState},
    model::object::{ObjectId, Placement},
    model::project::ProjectSettings,
    model::transform::Pose,
};

fn setup() -> (Project, ObjectId) {
    let mut p = Project::new(
        ProjectSettings {
            width: 64,
            height: 64,
            dpi: 100,
            lpi: 40.0,
            frames: 6,
        },
        1,
    )
    .unwrap();
    let r = p.add_image("a.png").unwrap();
    let id = p
        .place_object(
            Placement {
                layer: 0,
                column: 0,
                length: 6,
            },
            r,
            Pose::default(),
        )
        .unwrap();
    (p, id)
}

/// Move the object to `x` and return the matching entry.
fn nudge(p: &mut Project, id: ObjectId, x: f64) -> HistoryItem {
    let o = p.object_mut(id).unwrap();
    let before = PoseState::of(o);
    o.set_pose(Pose::at(x, 0.0));
    HistoryItem::Pose {
        object: id,
        before,
        after: PoseState::of(o),
    }
}

#[test]
fn empty_log_undo_and_redo_are_noops() {
    let (mut p, _) = setup();
    let before = p.clone();
    let mut h = History::default();
    assert_eq!(h.pointer(), None);
    assert!(!h.undo(&mut p).unwrap());
    assert!(!h.redo(&mut p).unwrap());
    assert_eq!(p, before);
}

#[test]
fn undo_all_then_redo_all_round_trips() {
    let (mut p, id) = setup();
    let initial = p.clone();
    let mut h = History::default();
    for i in 1..=5 {
        let item = nudge(&mut p, id, f64::from(i) * 3.0);
        h.append(&mut p, item);
    }
    let last = p.clone();
    assert_eq!(h.pointer(), Some(4));

    for _ in 0..5 {
        assert!(h.undo(&mut p).unwrap());
    }
    assert!(!h.undo(&mut p).unwrap());
    assert_eq!(p, initial);
    assert_eq!(h.pointer(), None);

    for _ in 0..5 {
        assert!(h.redo(&mut p).unwrap());
    }
    assert!(!h.redo(&mut p).unwrap());
    assert_eq!(p, last);
}

#[test]
fn append_after_undo_discards_redo_branch() {
    let (mut p, id) = setup();
    let mut h = History::default();
    for x in [1.0, 2.0, 3.0] {
        let item = nudge(&mut p, id, x);
        h.append(&mut p, item);
    }
    h.undo(&mut p).unwrap();
    h.undo(&mut p).unwrap();
    assert_eq!(p.object(id).unwrap().pose().x, 1.0);

    let item = nudge(&mut p, id, 42.0);
    h.append(&mut p, item);
    assert_eq!(h.len(), 2);
    assert!(!h.can_redo());

    h.undo(&mut p).unwrap();
    assert_eq!(p.object(id).unwrap().pose().x, 1.0);
    assert!(h.redo(&mut p).unwrap());
    assert_eq!(p.object(id).unwrap().pose().x, 42.0);
}

#[test]
fn low_ceiling_keeps_the_floor_and_latest_pointer() {
    let (mut p, id) = setup();
    let mut h = History::new(HistoryConfig {
        ceiling_bytes: 1,
        floor: 10,
    });
    for i in 0..20 {
        let item = nudge(&mut p, id, f64::from(i));
        h.append(&mut p, item);
    }
    assert_eq!(h.len(), 10);
    assert_eq!(h.pointer(), Some(9));
    assert!(h.can_undo());

    // The newest entry is still the one at the pointer.
    h.undo(&mut p).unwrap();
    assert_eq!(p.object(id).unwrap().pose().x, 18.0);
}

struct Fixed(u64);

impl MemoryGauge for Fixed {
    fn used_bytes(&self, _entries: &[HistoryItem]) -> u64 {
        self.0
    }
}

#[test]
fn custom_gauge_controls_eviction() {
    let (mut p, id) = setup();
    let config = HistoryConfig {
        ceiling_bytes: 100,
        floor: 3,
    };
    let mut under = History::with_gauge(config, Box::new(Fixed(100)));
    let mut over = History::with_gauge(config, Box::new(Fixed(101)));
    for i in 0..8 {
        let item = nudge(&mut p, id, f64::from(i));
        under.append(&mut p, item.clone());
        over.append(&mut p, item);
    }
    assert_eq!(under.len(), 8);
    assert_eq!(over.len(), 3);
}

#[test]
fn default_config_values() {
    let c = HistoryConfig::default();
    assert_eq!(c.ceiling_bytes, 1000 * 1024 * 1024);
    assert_eq!(c.floor, 10);
    let parsed: HistoryConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(parsed, c);
}

#[test]
fn pruned_entries_release_their_resources() {
    let (mut p, id) = setup();
    let mut h = History::default();

    let gone = p.remove_object(id).unwrap();
    let res = gone.resource();
    h.append(&mut p, HistoryItem::RemoveObject { object: gone });
    // Still pinned by the log.
    assert!(p.resources().contains(res));

    // Undo brings it back, then a fresh edit drops nothing that is live.
    h.undo(&mut p).unwrap();
    let item = nudge(&mut p, id, 5.0);
    h.append(&mut p, item);
    assert!(p.resources().contains(res));

    // Removed for good once the only entry that could restore it leaves the log.
    let gone = p.remove_object(id).unwrap();
    h.append(&mut p, HistoryItem::RemoveObject { object: gone });
    h.clear(&mut p);
    assert!(!p.resources().contains(res));
}

#[test]
fn undone_add_is_released_when_branch_is_pruned() {
    let (mut p, id) = setup();
    let mut h = History::default();
    let r = p.add_image("b.png").unwrap();
    p.remove_object(id).unwrap();
    let added = p
        .place_object(
            Placement {
                layer: 0,
                column: 0,
                length: 2,
            },
            r,
            Pose::default(),
        )
        .unwrap();
    let object = p.object(added).unwrap().clone();
    h.append(&mut p, HistoryItem::AddObject { object });
    h.undo(&mut p).unwrap();
    assert!(p.resources().contains(r));

    h.append(&mut p, HistoryItem::MoveLayer { from: 0, to: 0 });
    assert!(!p.resources().contains(r));
}
