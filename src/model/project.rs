use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context as _;

use crate::{
    assets::store::normalize_rel_path,
    foundation::core::FrameRange,
    foundation::error::{LenticularError, LenticularResult},
    model::layer::Layer,
    model::object::{LayerObject, ObjectId, Placement},
    model::transform::Pose,
};

/// Opaque handle to external image data.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ResourceId(pub u64);

/// Where the pixels of a resource come from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceEntry {
    /// Path relative to the project's assets root.
    pub source: String,
}

/// Image sources referenced by layer objects.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResourceTable {
    entries: BTreeMap<ResourceId, ResourceEntry>,
    next_id: u64,
}

impl ResourceTable {
    /// Register `source`, reusing the existing id when the same path is already present.
    pub fn add(&mut self, source: &str) -> LenticularResult<ResourceId> {
        let source = normalize_rel_path(source)?;
        if let Some((id, _)) = self.entries.iter().find(|(_, e)| e.source == source) {
            return Ok(*id);
        }
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, ResourceEntry { source });
        Ok(id)
    }

    pub fn get(&self, id: ResourceId) -> Option<&ResourceEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn remove(&mut self, id: ResourceId) -> Option<ResourceEntry> {
        self.entries.remove(&id)
    }
}

/// Project-wide print and timeline properties.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectSettings {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Print resolution, dots per inch.
    pub dpi: u32,
    /// Lens pitch, lenticules per inch.
    pub lpi: f64,
    /// Number of keyframes.
    pub frames: u32,
}

impl ProjectSettings {
    pub fn validate(&self) -> LenticularResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LenticularError::validation("canvas width/height must be > 0"));
        }
        if self.dpi == 0 {
            return Err(LenticularError::validation("dpi must be > 0"));
        }
        if !self.lpi.is_finite() || self.lpi <= 0.0 {
            return Err(LenticularError::validation("lpi must be finite and > 0"));
        }
        if self.frames == 0 {
            return Err(LenticularError::validation("frame count must be > 0"));
        }
        Ok(())
    }

    /// Canvas width in inches at the print resolution.
    pub fn width_in(&self) -> f64 {
        f64::from(self.width) / f64::from(self.dpi)
    }
}

/// The authoring context: settings, the layer stack, and the resources it references.
///
/// Every component that needs project dimensions, layers, or resources takes this
/// explicitly. Layer 0 is the top of the stack.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    settings: ProjectSettings,
    layers: Vec<Layer>,
    #[serde(default)]
    resources: ResourceTable,
    #[serde(default)]
    next_object_id: u64,
}

impl Project {
    /// New empty project with `layer_count` layers named `Layer 1`, `Layer 2`, ....
    pub fn new(settings: ProjectSettings, layer_count: usize) -> LenticularResult<Self> {
        settings.validate()?;
        if layer_count == 0 {
            return Err(LenticularError::validation("layer count must be > 0"));
        }
        Ok(Self {
            settings,
            layers: (0..layer_count)
                .map(|i| Layer::new(format!("Layer {}", i + 1)))
                .collect(),
            resources: ResourceTable::default(),
            next_object_id: 0,
        })
    }

    /// Parse a project from JSON and check every invariant.
    pub fn from_reader<R: std::io::Read>(r: R) -> LenticularResult<Self> {
        let project: Self = serde_json::from_reader(r)
            .map_err(|e| LenticularError::serde(format!("parse project JSON: {e}")))?;
        project.validate()?;
        Ok(project)
    }

    pub fn from_path(path: impl AsRef<Path>) -> LenticularResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open project JSON '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn to_writer<W: std::io::Write>(&self, w: W) -> LenticularResult<()> {
        serde_json::to_writer_pretty(w, self)
            .map_err(|e| LenticularError::serde(format!("write project JSON: {e}")))
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> LenticularResult<()> {
        let path = path.as_ref();
        let f = File::create(path)
            .with_context(|| format!("create project JSON '{}'", path.display()))?;
        self.to_writer(BufWriter::new(f))
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn frame_count(&self) -> u32 {
        self.settings.frames
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    /// Register an image source relative to the assets root.
    pub fn add_image(&mut self, source: &str) -> LenticularResult<ResourceId> {
        self.resources.add(source)
    }

    /// Every object, top layer first.
    pub fn objects(&self) -> impl Iterator<Item = &LayerObject> {
        self.layers.iter().flat_map(|l| l.objects.iter())
    }

    pub fn object(&self, id: ObjectId) -> Option<&LayerObject> {
        self.layers.iter().find_map(|l| l.get(id))
    }

    /// Mutable access for pose, transformation and visibility edits.
    ///
    /// Placement changes go through [`Project::move_object`] so the overlap invariant holds.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut LayerObject> {
        self.layers.iter_mut().find_map(|l| l.get_mut(id))
    }

    fn object_or_err(&self, id: ObjectId) -> LenticularResult<&LayerObject> {
        self.object(id)
            .ok_or_else(|| LenticularError::validation(format!("no object {id}")))
    }

    /// Check that `placement` fits the grid without overlapping anything but `ignore`.
    pub fn check_placement(
        &self,
        placement: Placement,
        ignore: Option<ObjectId>,
    ) -> LenticularResult<()> {
        let layer = self.layers.get(placement.layer).ok_or_else(|| {
            LenticularError::validation(format!("layer {} does not exist", placement.layer))
        })?;
        if placement.length == 0 {
            return Err(LenticularError::validation("object length must be >= 1"));
        }
        let end = u64::from(placement.column) + u64::from(placement.length);
        if end > u64::from(self.settings.frames) {
            return Err(LenticularError::validation(format!(
                "frames [{}, {}] exceed frame count {}",
                placement.column,
                end - 1,
                self.settings.frames
            )));
        }
        if let Some(other) = layer.first_conflict(placement.range(), ignore) {
            return Err(LenticularError::validation(format!(
                "placement overlaps object {} on layer {}",
                other.id, placement.layer
            )));
        }
        Ok(())
    }

    /// Create a new object. The id comes from the project's monotonic counter.
    pub fn place_object(
        &mut self,
        placement: Placement,
        resource: ResourceId,
        pose: Pose,
    ) -> LenticularResult<ObjectId> {
        self.check_placement(placement, None)?;
        if !self.resources.contains(resource) {
            return Err(LenticularError::validation(format!(
                "unknown resource {}",
                resource.0
            )));
        }
        if !pose.is_finite() {
            return Err(LenticularError::validation("pose must be finite"));
        }
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        self.layers[placement.layer].insert(LayerObject::new(id, placement, resource, pose));
        Ok(id)
    }

    /// Re-insert a previously removed object under its original id.
    pub(crate) fn insert_object(&mut self, object: LayerObject) -> LenticularResult<()> {
        if self.object(object.id).is_some() {
            return Err(LenticularError::validation(format!(
                "object {} already exists",
                object.id
            )));
        }
        self.check_placement(object.placement(), None)?;
        self.next_object_id = self.next_object_id.max(object.id.0 + 1);
        let layer = object.layer;
        self.layers[layer].insert(object);
        Ok(())
    }

    /// Detach an object. Its resource stays registered; see [`Project::purge_resource`].
    pub fn remove_object(&mut self, id: ObjectId) -> LenticularResult<LayerObject> {
        let layer = self.object_or_err(id)?.layer;
        self.layers[layer]
            .take(id)
            .ok_or_else(|| LenticularError::validation(format!("no object {id}")))
    }

    /// Move or resize an object; returns the previous placement.
    pub fn move_object(&mut self, id: ObjectId, to: Placement) -> LenticularResult<Placement> {
        let from = self.object_or_err(id)?.placement();
        self.check_placement(to, Some(id))?;
        if from.layer == to.layer {
            let layer = &mut self.layers[to.layer];
            let mut object = layer
                .take(id)
                .ok_or_else(|| LenticularError::validation(format!("no object {id}")))?;
            object.set_placement(to);
            layer.insert(object);
        } else {
            let mut object = self.layers[from.layer]
                .take(id)
                .ok_or_else(|| LenticularError::validation(format!("no object {id}")))?;
            object.set_placement(to);
            self.layers[to.layer].insert(object);
        }
        Ok(from)
    }

    /// Insert `layer` at `index`, renumbering every layer below it.
    pub fn insert_layer(&mut self, index: usize, layer: Layer) -> LenticularResult<()> {
        if index > self.layers.len() {
            return Err(LenticularError::validation(format!(
                "layer index {index} out of range"
            )));
        }
        if !layer.depth_in.is_finite() {
            return Err(LenticularError::validation("layer depth must be finite"));
        }
        for o in layer.objects() {
            if self.object(o.id).is_some() {
                return Err(LenticularError::validation(format!(
                    "object {} already exists",
                    o.id
                )));
            }
            if o.range().end.0 > self.settings.frames {
                return Err(LenticularError::validation(format!(
                    "object {} exceeds frame count",
                    o.id
                )));
            }
        }
        let max_id = layer.objects().iter().map(|o| o.id.0 + 1).max().unwrap_or(0);
        self.next_object_id = self.next_object_id.max(max_id);
        self.layers.insert(index, layer);
        self.renumber_from(index);
        Ok(())
    }

    /// Remove the layer at `index` together with its objects. The last layer cannot go.
    pub fn remove_layer(&mut self, index: usize) -> LenticularResult<Layer> {
        if index >= self.layers.len() {
            return Err(LenticularError::validation(format!(
                "layer index {index} out of range"
            )));
        }
        if self.layers.len() == 1 {
            return Err(LenticularError::validation(
                "a project must keep at least one layer",
            ));
        }
        let layer = self.layers.remove(index);
        self.renumber_from(index);
        Ok(layer)
    }

    /// Move the layer at `from` so it ends up at index `to`.
    pub fn move_layer(&mut self, from: usize, to: usize) -> LenticularResult<()> {
        let n = self.layers.len();
        if from >= n || to >= n {
            return Err(LenticularError::validation(format!(
                "layer move {from} -> {to} out of range"
            )));
        }
        if from == to {
            return Ok(());
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.renumber_from(from.min(to));
        Ok(())
    }

    pub(crate) fn layer_mut(&mut self, index: usize) -> LenticularResult<&mut Layer> {
        self.layers
            .get_mut(index)
            .ok_or_else(|| LenticularError::validation(format!("layer {index} does not exist")))
    }

    /// Set a layer's depth in inches; returns the previous depth.
    pub fn set_layer_depth(&mut self, index: usize, depth_in: f64) -> LenticularResult<f64> {
        if !depth_in.is_finite() {
            return Err(LenticularError::validation("layer depth must be finite"));
        }
        let layer = self.layer_mut(index)?;
        Ok(std::mem::replace(&mut layer.depth_in, depth_in))
    }

    /// Rename a layer; returns the previous name.
    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> LenticularResult<String> {
        let layer = self.layer_mut(index)?;
        Ok(std::mem::replace(&mut layer.name, name.into()))
    }

    /// Replace the settings; returns the previous ones.
    ///
    /// Rejected when an existing object would extend past the new frame count.
    pub fn set_settings(&mut self, settings: ProjectSettings) -> LenticularResult<ProjectSettings> {
        settings.validate()?;
        if let Some(o) = self
            .objects()
            .find(|o| o.range().end.0 > settings.frames)
        {
            return Err(LenticularError::validation(format!(
                "object {} extends past frame count {}",
                o.id, settings.frames
            )));
        }
        Ok(std::mem::replace(&mut self.settings, settings))
    }

    /// `true` while any live object draws from `id`.
    pub fn references_resource(&self, id: ResourceId) -> bool {
        self.objects().any(|o| o.resource == id)
    }

    /// Drop a resource that no live object references. Returns whether it was removed.
    pub fn purge_resource(&mut self, id: ResourceId) -> bool {
        if self.references_resource(id) {
            return false;
        }
        self.resources.remove(id).is_some()
    }

    /// Check every model invariant.
    pub fn validate(&self) -> LenticularResult<()> {
        self.settings.validate()?;
        if self.layers.is_empty() {
            return Err(LenticularError::validation("layer count must be > 0"));
        }
        let mut seen = std::collections::BTreeSet::new();
        for (index, layer) in self.layers.iter().enumerate() {
            if !layer.depth_in.is_finite() {
                return Err(LenticularError::validation(format!(
                    "layer {index} depth must be finite"
                )));
            }
            let mut prev: Option<FrameRange> = None;
            for o in &layer.objects {
                if o.layer != index {
                    return Err(LenticularError::validation(format!(
                        "object {} points at layer {} but lives on layer {index}",
                        o.id, o.layer
                    )));
                }
                if !seen.insert(o.id) {
                    return Err(LenticularError::validation(format!(
                        "duplicate object id {}",
                        o.id
                    )));
                }
                if o.id.0 >= self.next_object_id {
                    return Err(LenticularError::validation(format!(
                        "object id {} is not below the id counter",
                        o.id
                    )));
                }
                if o.length == 0 || o.range().end.0 > self.settings.frames {
                    return Err(LenticularError::validation(format!(
                        "object {} has an invalid frame range",
                        o.id
                    )));
                }
                if !self.resources.contains(o.resource) {
                    return Err(LenticularError::validation(format!(
                        "object {} references unknown resource {}",
                        o.id, o.resource.0
                    )));
                }
                if !o.pose.is_finite() || !o.transforms.is_consistent() {
                    return Err(LenticularError::validation(format!(
                        "object {} has a malformed pose or transformation",
                        o.id
                    )));
                }
                if let Some(p) = prev
                    && (p.intersects(o.range()) || p.start.0 > o.column)
                {
                    return Err(LenticularError::validation(format!(
                        "object {} overlaps or is out of order on layer {index}",
                        o.id
                    )));
                }
                prev = Some(o.range());
            }
        }
        Ok(())
    }

    fn renumber_from(&mut self, index: usize) {
        for (i, layer) in self.layers.iter_mut().enumerate().skip(index) {
            layer.renumber(i);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/project.rs"]
mod tests;
