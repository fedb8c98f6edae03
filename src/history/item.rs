use crate::{
    foundation::error::{LenticularError, LenticularResult},
    model::layer::Layer,
    model::object::{LayerObject, ObjectId, Placement},
    model::project::{Project, ProjectSettings, ResourceId},
    model::transform::{Pose, TransformSet},
};

/// Everything a pose edit can touch on one object.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseState {
    pub pose: Pose,
    pub transforms: TransformSet,
}

impl PoseState {
    pub fn of(object: &LayerObject) -> Self {
        Self {
            pose: *object.pose(),
            transforms: *object.transforms(),
        }
    }

    pub(crate) fn write(&self, object: &mut LayerObject) {
        object.set_pose(self.pose);
        for t in self.transforms.iter() {
            object.set_transformation(*t);
        }
    }
}

/// Name and depth of a layer, without its objects.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerProps {
    pub name: String,
    pub depth_in: f64,
}

impl LayerProps {
    pub fn of(layer: &Layer) -> Self {
        Self {
            name: layer.name.clone(),
            depth_in: layer.depth_in,
        }
    }
}

/// One reversible edit.
///
/// Each variant keeps the state before and after the edit, so replay never recomputes
/// anything from the current model.
#[derive(Clone, Debug, PartialEq)]
pub enum HistoryItem {
    /// Position on the grid or span length changed.
    Placement {
        object: ObjectId,
        before: Placement,
        after: Placement,
    },
    Visibility {
        object: ObjectId,
        before: bool,
        after: bool,
    },
    /// Initial pose and/or transformations changed.
    Pose {
        object: ObjectId,
        before: PoseState,
        after: PoseState,
    },
    AddObject {
        object: LayerObject,
    },
    RemoveObject {
        object: LayerObject,
    },
    /// An empty layer was inserted at `index`.
    AddLayer {
        index: usize,
        layer: Layer,
    },
    /// A layer went away together with its objects, each recorded as a `RemoveObject`.
    RemoveLayer {
        index: usize,
        layer: Layer,
        removed: Vec<HistoryItem>,
    },
    MoveLayer {
        from: usize,
        to: usize,
    },
    LayerProps {
        layer: usize,
        before: LayerProps,
        after: LayerProps,
    },
    Settings {
        before: ProjectSettings,
        after: ProjectSettings,
    },
    /// Several edits undone and redone as one step. Undo runs back to front.
    Batch(Vec<HistoryItem>),
}

fn object_mut(project: &mut Project, id: ObjectId) -> LenticularResult<&mut LayerObject> {
    project
        .object_mut(id)
        .ok_or_else(|| LenticularError::history(format!("replay target {id} is gone")))
}

fn write_layer_props(project: &mut Project, index: usize, props: &LayerProps) -> LenticularResult<()> {
    project.rename_layer(index, props.name.clone())?;
    project.set_layer_depth(index, props.depth_in)?;
    Ok(())
}

impl HistoryItem {
    /// Restore the state from before the edit.
    ///
    /// Either the whole item is undone or the project is left untouched.
    pub fn apply_undo(&self, project: &mut Project) -> LenticularResult<()> {
        self.atomically(project, Self::undo_in)
    }

    /// Re-apply the edit, all or nothing.
    pub fn apply_redo(&self, project: &mut Project) -> LenticularResult<()> {
        self.atomically(project, Self::redo_in)
    }

    /// Items made of several model steps run against a scratch copy that replaces the project
    /// only once every step succeeded. Single-step items validate before they mutate.
    fn atomically(
        &self,
        project: &mut Project,
        step: fn(&Self, &mut Project) -> LenticularResult<()>,
    ) -> LenticularResult<()> {
        match self {
            Self::RemoveLayer { .. } | Self::Batch(_) | Self::LayerProps { .. } => {
                let mut scratch = project.clone();
                step(self, &mut scratch)?;
                *project = scratch;
                Ok(())
            }
            _ => step(self, project),
        }
    }

    fn undo_in(&self, project: &mut Project) -> LenticularResult<()> {
        match self {
            Self::Placement { object, before, .. } => {
                project.move_object(*object, *before)?;
            }
            Self::Visibility { object, before, .. } => {
                object_mut(project, *object)?.set_visible(*before);
            }
            Self::Pose { object, before, .. } => before.write(object_mut(project, *object)?),
            Self::AddObject { object } => {
                project.remove_object(object.id())?;
            }
            Self::RemoveObject { object } => project.insert_object(object.clone())?,
            Self::AddLayer { index, .. } => {
                project.remove_layer(*index)?;
            }
            Self::RemoveLayer {
                index,
                layer,
                removed,
            } => {
                project.insert_layer(*index, layer.clone())?;
                for item in removed {
                    item.undo_in(project)?;
                }
            }
            Self::MoveLayer { from, to } => project.move_layer(*to, *from)?,
            Self::LayerProps { layer, before, .. } => write_layer_props(project, *layer, before)?,
            Self::Settings { before, .. } => {
                project.set_settings(*before)?;
            }
            Self::Batch(items) => {
                for item in items.iter().rev() {
                    item.undo_in(project)?;
                }
            }
        }
        Ok(())
    }

    fn redo_in(&self, project: &mut Project) -> LenticularResult<()> {
        match self {
            Self::Placement { object, after, .. } => {
                project.move_object(*object, *after)?;
            }
            Self::Visibility { object, after, .. } => {
                object_mut(project, *object)?.set_visible(*after);
            }
            Self::Pose { object, after, .. } => after.write(object_mut(project, *object)?),
            Self::AddObject { object } => project.insert_object(object.clone())?,
            Self::RemoveObject { object } => {
                project.remove_object(object.id())?;
            }
            Self::AddLayer { index, layer } => project.insert_layer(*index, layer.clone())?,
            Self::RemoveLayer { index, removed, .. } => {
                for item in removed {
                    item.redo_in(project)?;
                }
                project.remove_layer(*index)?;
            }
            Self::MoveLayer { from, to } => project.move_layer(*from, *to)?,
            Self::LayerProps { layer, after, .. } => write_layer_props(project, *layer, after)?,
            Self::Settings { after, .. } => {
                project.set_settings(*after)?;
            }
            Self::Batch(items) => {
                for item in items {
                    item.redo_in(project)?;
                }
            }
        }
        Ok(())
    }

    /// `true` when replaying this item cannot change anything.
    pub fn is_noop(&self) -> bool {
        match self {
            Self::Placement { before, after, .. } => before == after,
            Self::Visibility { before, after, .. } => before == after,
            Self::Pose { before, after, .. } => before == after,
            Self::MoveLayer { from, to } => from == to,
            Self::LayerProps { before, after, .. } => before == after,
            Self::Settings { before, after } => before == after,
            Self::Batch(items) => items.iter().all(Self::is_noop),
            Self::AddObject { .. }
            | Self::RemoveObject { .. }
            | Self::AddLayer { .. }
            | Self::RemoveLayer { .. } => false,
        }
    }

    /// Resources whose objects this item can bring back to life.
    pub fn pinned_resources(&self, out: &mut Vec<ResourceId>) {
        match self {
            Self::AddObject { object } | Self::RemoveObject { object } => out.push(object.resource()),
            Self::RemoveLayer { removed, .. } | Self::Batch(removed) => {
                for item in removed {
                    item.pinned_resources(out);
                }
            }
            _ => {}
        }
    }

    pub fn pins_resource(&self, id: ResourceId) -> bool {
        let mut pinned = Vec::new();
        self.pinned_resources(&mut pinned);
        pinned.contains(&id)
    }

    /// Estimated heap and inline size in bytes.
    pub fn footprint_bytes(&self) -> u64 {
        let own = std::mem::size_of::<Self>() as u64;
        let extra = match self {
            Self::AddObject { .. } | Self::RemoveObject { .. } => {
                std::mem::size_of::<LayerObject>() as u64
            }
            Self::AddLayer { layer, .. } => layer.name.len() as u64,
            Self::RemoveLayer { layer, removed, .. } => {
                layer.name.len() as u64 + removed.iter().map(Self::footprint_bytes).sum::<u64>()
            }
            Self::LayerProps { before, after, .. } => (before.name.len() + after.name.len()) as u64,
            Self::Batch(items) => items.iter().map(Self::footprint_bytes).sum(),
            _ => 0,
        };
        own + extra
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/item.rs"]
mod tests;
