use crate::{
    foundation::core::{FrameIndex, FrameRange},
    model::object::{LayerObject, ObjectId},
};

/// A depth-ordered track of non-overlapping object placements.
///
/// Index 0 is the top of the stack. Objects are kept sorted by column.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    pub name: String,
    /// Signed distance from the print plane in inches, positive toward the viewer.
    #[serde(default)]
    pub depth_in: f64,
    #[serde(default)]
    pub(crate) objects: Vec<LayerObject>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depth_in: 0.0,
            objects: Vec::new(),
        }
    }

    pub fn objects(&self) -> &[LayerObject] {
        &self.objects
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&LayerObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut LayerObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Object covering `frame`, if any.
    pub fn object_at(&self, frame: FrameIndex) -> Option<&LayerObject> {
        self.objects.iter().find(|o| o.covers(frame))
    }

    /// First object (other than `ignore`) whose span intersects `range`.
    pub fn first_conflict(&self, range: FrameRange, ignore: Option<ObjectId>) -> Option<&LayerObject> {
        self.objects
            .iter()
            .filter(|o| Some(o.id) != ignore)
            .find(|o| o.range().intersects(range))
    }

    pub(crate) fn insert(&mut self, object: LayerObject) {
        let at = self
            .objects
            .partition_point(|o| (o.column, o.id) < (object.column, object.id));
        self.objects.insert(at, object);
    }

    pub(crate) fn take(&mut self, id: ObjectId) -> Option<LayerObject> {
        let at = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(at))
    }

    pub(crate) fn renumber(&mut self, index: usize) {
        for o in &mut self.objects {
            o.layer = index;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/layer.rs"]
mod tests;
