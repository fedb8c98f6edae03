use crate::{
    foundation::core::FrameIndex,
    foundation::error::{LenticularError, LenticularResult},
    history::engine::{History, HistoryConfig},
    history::item::{HistoryItem, LayerProps, PoseState},
    model::layer::Layer,
    model::object::{FrameEdit, LayerObject, ObjectId, Placement},
    model::project::{Project, ProjectSettings, ResourceId},
    model::transform::{Pose, Transformation},
    stereo::disparity::{self, ViewingGeometry},
};

/// What an open gesture is allowed to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureTarget {
    /// Placement, visibility, pose and transformations of one object.
    Object(ObjectId),
    /// Name and depth of one layer.
    Layer(usize),
    Settings,
}

#[derive(Clone, Debug, PartialEq)]
enum Snapshot {
    Object {
        placement: Placement,
        visible: bool,
        pose: PoseState,
    },
    Layer(LayerProps),
    Settings(ProjectSettings),
}

#[derive(Debug)]
struct OpenGesture {
    target: GestureTarget,
    before: Snapshot,
}

/// A project together with its undo history.
///
/// Every mutating method records exactly one history entry, or none when it changes nothing.
/// Continuous edits (drags, slider moves) go through a gesture: [`Document::begin_gesture`],
/// any number of changes to the target through the `*_gesture_*` methods, then
/// [`Document::end_gesture`]. Nothing outside the target can change while a gesture is open.
#[derive(Debug)]
pub struct Document {
    project: Project,
    history: History,
    gesture: Option<OpenGesture>,
}

impl Document {
    pub fn new(project: Project) -> Self {
        Self::with_history(project, HistoryConfig::default())
    }

    pub fn with_history(project: Project, config: HistoryConfig) -> Self {
        Self {
            project,
            history: History::new(config),
            gesture: None,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    fn ensure_idle(&self) -> LenticularResult<()> {
        match &self.gesture {
            Some(g) => Err(LenticularError::history(format!(
                "a gesture on {:?} is still open",
                g.target
            ))),
            None => Ok(()),
        }
    }

    fn record(&mut self, item: HistoryItem) {
        if !item.is_noop() {
            self.history.append(&mut self.project, item);
        }
    }

    fn object_pose(&self, id: ObjectId) -> LenticularResult<PoseState> {
        self.project
            .object(id)
            .map(PoseState::of)
            .ok_or_else(|| LenticularError::validation(format!("no object {id}")))
    }

    fn object_mut(&mut self, id: ObjectId) -> LenticularResult<&mut LayerObject> {
        self.project
            .object_mut(id)
            .ok_or_else(|| LenticularError::validation(format!("no object {id}")))
    }

    /// Register an image source. Resources are not part of the undo log.
    pub fn add_image(&mut self, source: &str) -> LenticularResult<ResourceId> {
        self.project.add_image(source)
    }

    pub fn place_object(
        &mut self,
        placement: Placement,
        resource: ResourceId,
        pose: Pose,
    ) -> LenticularResult<ObjectId> {
        self.ensure_idle()?;
        let id = self.project.place_object(placement, resource, pose)?;
        if let Some(object) = self.project.object(id) {
            let object = object.clone();
            self.record(HistoryItem::AddObject { object });
        }
        Ok(id)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> LenticularResult<()> {
        self.ensure_idle()?;
        let object = self.project.remove_object(id)?;
        self.record(HistoryItem::RemoveObject { object });
        Ok(())
    }

    pub fn move_object(&mut self, id: ObjectId, to: Placement) -> LenticularResult<()> {
        self.ensure_idle()?;
        let before = self.project.move_object(id, to)?;
        self.record(HistoryItem::Placement {
            object: id,
            before,
            after: to,
        });
        Ok(())
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> LenticularResult<()> {
        self.ensure_idle()?;
        let object = self.object_mut(id)?;
        let before = object.visible();
        object.set_visible(visible);
        self.record(HistoryItem::Visibility {
            object: id,
            before,
            after: visible,
        });
        Ok(())
    }

    fn edit_pose(
        &mut self,
        id: ObjectId,
        edit: impl FnOnce(&mut LayerObject) -> LenticularResult<()>,
    ) -> LenticularResult<()> {
        self.ensure_idle()?;
        let before = self.object_pose(id)?;
        edit(self.object_mut(id)?)?;
        let after = self.object_pose(id)?;
        self.record(HistoryItem::Pose {
            object: id,
            before,
            after,
        });
        Ok(())
    }

    pub fn set_pose(&mut self, id: ObjectId, pose: Pose) -> LenticularResult<()> {
        if !pose.is_finite() {
            return Err(LenticularError::validation("pose must be finite"));
        }
        self.edit_pose(id, |o| {
            o.set_pose(pose);
            Ok(())
        })
    }

    pub fn set_transformation(&mut self, id: ObjectId, t: Transformation) -> LenticularResult<()> {
        if !t.is_well_formed() {
            return Err(LenticularError::validation(format!(
                "malformed {:?} transformation",
                t.kind()
            )));
        }
        self.edit_pose(id, |o| {
            o.set_transformation(t);
            Ok(())
        })
    }

    /// Absolute edit of an object while viewing `frame`; see [`LayerObject::edit_at`].
    pub fn edit_at(&mut self, id: ObjectId, frame: FrameIndex, edit: FrameEdit) -> LenticularResult<()> {
        self.edit_pose(id, |o| o.edit_at(frame, edit))
    }

    /// Insert an empty layer at `index`.
    pub fn add_layer(&mut self, index: usize, name: impl Into<String>) -> LenticularResult<()> {
        self.ensure_idle()?;
        let layer = Layer::new(name);
        self.project.insert_layer(index, layer.clone())?;
        self.record(HistoryItem::AddLayer { index, layer });
        Ok(())
    }

    fn remove_layer_item(&mut self, index: usize) -> LenticularResult<HistoryItem> {
        let layer = self
            .project
            .layer(index)
            .ok_or_else(|| LenticularError::validation(format!("layer {index} does not exist")))?;
        if self.project.layer_count() == 1 {
            return Err(LenticularError::validation(
                "a project must keep at least one layer",
            ));
        }
        let ids: Vec<ObjectId> = layer.objects().iter().map(|o| o.id()).collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let object = self.project.remove_object(id)?;
            removed.push(HistoryItem::RemoveObject { object });
        }
        let layer = self.project.remove_layer(index)?;
        Ok(HistoryItem::RemoveLayer {
            index,
            layer,
            removed,
        })
    }

    /// Remove a layer and all its objects as one undoable step.
    pub fn remove_layer(&mut self, index: usize) -> LenticularResult<()> {
        self.ensure_idle()?;
        let item = self.remove_layer_item(index)?;
        self.record(item);
        Ok(())
    }

    pub fn move_layer(&mut self, from: usize, to: usize) -> LenticularResult<()> {
        self.ensure_idle()?;
        self.project.move_layer(from, to)?;
        self.record(HistoryItem::MoveLayer { from, to });
        Ok(())
    }

    fn edit_layer(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut Project) -> LenticularResult<()>,
    ) -> LenticularResult<()> {
        self.ensure_idle()?;
        let before = self
            .project
            .layer(index)
            .map(LayerProps::of)
            .ok_or_else(|| LenticularError::validation(format!("layer {index} does not exist")))?;
        edit(&mut self.project)?;
        let after = self
            .project
            .layer(index)
            .map(LayerProps::of)
            .ok_or_else(|| LenticularError::validation(format!("layer {index} does not exist")))?;
        self.record(HistoryItem::LayerProps {
            layer: index,
            before,
            after,
        });
        Ok(())
    }

    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> LenticularResult<()> {
        let name = name.into();
        self.edit_layer(index, |p| p.rename_layer(index, name).map(drop))
    }

    pub fn set_layer_depth(&mut self, index: usize, depth_in: f64) -> LenticularResult<()> {
        self.edit_layer(index, |p| p.set_layer_depth(index, depth_in).map(drop))
    }

    pub fn set_settings(&mut self, settings: ProjectSettings) -> LenticularResult<()> {
        self.ensure_idle()?;
        let before = self.project.set_settings(settings)?;
        self.record(HistoryItem::Settings {
            before,
            after: settings,
        });
        Ok(())
    }

    /// Grow with empty layers at the bottom or drop trailing layers, as one step.
    pub fn set_layer_count(&mut self, count: usize) -> LenticularResult<()> {
        self.ensure_idle()?;
        if count == 0 {
            return Err(LenticularError::validation("layer count must be > 0"));
        }
        let current = self.project.layer_count();
        let mut items = Vec::new();
        if count > current {
            for index in current..count {
                let layer = Layer::new(format!("Layer {}", index + 1));
                self.project.insert_layer(index, layer.clone())?;
                items.push(HistoryItem::AddLayer { index, layer });
            }
        } else {
            for index in (count..current).rev() {
                items.push(self.remove_layer_item(index)?);
            }
        }
        self.record(HistoryItem::Batch(items));
        Ok(())
    }

    /// Run the disparity generator and record every changed object as one step.
    ///
    /// Returns the number of objects that received a new 3D translation.
    pub fn apply_disparity(&mut self, geometry: &ViewingGeometry) -> LenticularResult<usize> {
        self.ensure_idle()?;
        let updates = disparity::generate(&self.project, geometry)?;
        let n = updates.len();
        let mut items = Vec::with_capacity(n);
        for (id, t) in updates {
            let before = self.object_pose(id)?;
            self.object_mut(id)?.set_transformation(t);
            let after = self.object_pose(id)?;
            items.push(HistoryItem::Pose {
                object: id,
                before,
                after,
            });
        }
        self.record(HistoryItem::Batch(items));
        Ok(n)
    }

    pub fn gesture(&self) -> Option<GestureTarget> {
        self.gesture.as_ref().map(|g| g.target)
    }

    fn snapshot(&self, target: GestureTarget) -> LenticularResult<Snapshot> {
        match target {
            GestureTarget::Object(id) => {
                let o = self
                    .project
                    .object(id)
                    .ok_or_else(|| LenticularError::history(format!("gesture target {id} is gone")))?;
                Ok(Snapshot::Object {
                    placement: o.placement(),
                    visible: o.visible(),
                    pose: PoseState::of(o),
                })
            }
            GestureTarget::Layer(index) => self
                .project
                .layer(index)
                .map(|l| Snapshot::Layer(LayerProps::of(l)))
                .ok_or_else(|| {
                    LenticularError::history(format!("gesture target layer {index} is gone"))
                }),
            GestureTarget::Settings => Ok(Snapshot::Settings(*self.project.settings())),
        }
    }

    /// Open a gesture on `target`. Only one gesture may be open at a time.
    pub fn begin_gesture(&mut self, target: GestureTarget) -> LenticularResult<()> {
        self.ensure_idle()?;
        let before = self.snapshot(target)?;
        self.gesture = Some(OpenGesture { target, before });
        Ok(())
    }

    fn gesture_target(&self) -> LenticularResult<GestureTarget> {
        self.gesture()
            .ok_or_else(|| LenticularError::history("no gesture is open"))
    }

    fn wrong_target(target: GestureTarget) -> LenticularError {
        LenticularError::history(format!("the open gesture is on {target:?}"))
    }

    /// The object an open object gesture is editing.
    ///
    /// Visibility, pose and transformations can change freely; the placement goes through
    /// [`Document::move_gesture_object`] so overlap checks still apply.
    pub fn gesture_object_mut(&mut self) -> LenticularResult<&mut LayerObject> {
        match self.gesture_target()? {
            GestureTarget::Object(id) => self.object_mut(id),
            other => Err(Self::wrong_target(other)),
        }
    }

    pub fn move_gesture_object(&mut self, to: Placement) -> LenticularResult<()> {
        match self.gesture_target()? {
            GestureTarget::Object(id) => self.project.move_object(id, to).map(drop),
            other => Err(Self::wrong_target(other)),
        }
    }

    pub fn rename_gesture_layer(&mut self, name: impl Into<String>) -> LenticularResult<()> {
        match self.gesture_target()? {
            GestureTarget::Layer(index) => self.project.rename_layer(index, name).map(drop),
            other => Err(Self::wrong_target(other)),
        }
    }

    pub fn set_gesture_layer_depth(&mut self, depth_in: f64) -> LenticularResult<()> {
        match self.gesture_target()? {
            GestureTarget::Layer(index) => self.project.set_layer_depth(index, depth_in).map(drop),
            other => Err(Self::wrong_target(other)),
        }
    }

    pub fn set_gesture_settings(&mut self, settings: ProjectSettings) -> LenticularResult<()> {
        match self.gesture_target()? {
            GestureTarget::Settings => self.project.set_settings(settings).map(drop),
            other => Err(Self::wrong_target(other)),
        }
    }

    /// Close the gesture and record it. Returns `false` when nothing changed.
    pub fn end_gesture(&mut self) -> LenticularResult<bool> {
        let gesture = self
            .gesture
            .take()
            .ok_or_else(|| LenticularError::history("no gesture is open"))?;
        let after = self.snapshot(gesture.target)?;
        let mut parts = match (gesture.target, gesture.before, after) {
            (
                GestureTarget::Object(id),
                Snapshot::Object {
                    placement: p0,
                    visible: v0,
                    pose: s0,
                },
                Snapshot::Object {
                    placement: p1,
                    visible: v1,
                    pose: s1,
                },
            ) => vec![
                HistoryItem::Placement {
                    object: id,
                    before: p0,
                    after: p1,
                },
                HistoryItem::Visibility {
                    object: id,
                    before: v0,
                    after: v1,
                },
                HistoryItem::Pose {
                    object: id,
                    before: s0,
                    after: s1,
                },
            ],
            (GestureTarget::Layer(layer), Snapshot::Layer(before), Snapshot::Layer(after)) => {
                vec![HistoryItem::LayerProps {
                    layer,
                    before,
                    after,
                }]
            }
            (GestureTarget::Settings, Snapshot::Settings(before), Snapshot::Settings(after)) => {
                vec![HistoryItem::Settings { before, after }]
            }
            _ => return Err(LenticularError::history("gesture snapshot changed shape")),
        };
        parts.retain(|i| !i.is_noop());
        let item = match parts.len() {
            0 => return Ok(false),
            1 => parts.remove(0),
            _ => HistoryItem::Batch(parts),
        };
        self.history.append(&mut self.project, item);
        Ok(true)
    }

    /// Close the gesture and put the target back the way it was.
    pub fn cancel_gesture(&mut self) -> LenticularResult<()> {
        let gesture = self
            .gesture
            .take()
            .ok_or_else(|| LenticularError::history("no gesture is open"))?;
        match (gesture.target, gesture.before) {
            (
                GestureTarget::Object(id),
                Snapshot::Object {
                    placement,
                    visible,
                    pose,
                },
            ) => {
                if self.project.object(id).map(|o| o.placement()) != Some(placement) {
                    self.project.move_object(id, placement)?;
                }
                let o = self.object_mut(id)?;
                pose.write(o);
                o.set_visible(visible);
            }
            (GestureTarget::Layer(index), Snapshot::Layer(props)) => {
                self.project.rename_layer(index, props.name)?;
                self.project.set_layer_depth(index, props.depth_in)?;
            }
            (GestureTarget::Settings, Snapshot::Settings(settings)) => {
                self.project.set_settings(settings)?;
            }
            _ => return Err(LenticularError::history("gesture snapshot changed shape")),
        }
        Ok(())
    }

    pub fn undo(&mut self) -> LenticularResult<bool> {
        self.ensure_idle()?;
        self.history.undo(&mut self.project)
    }

    pub fn redo(&mut self) -> LenticularResult<bool> {
        self.ensure_idle()?;
        self.history.redo(&mut self.project)
    }
}

#[cfg(test)]
#[path = "../tests/unit/document.rs"]
mod tests;
