use crate::{
    animation::interp::{InterpolationCurve, frame_progress, reciprocal_progress},
    foundation::core::{FrameIndex, FrameRange, Vec2},
    foundation::error::{LenticularError, LenticularResult},
    model::project::ResourceId,
    model::transform::{Pose, TransformKind, TransformSet, Transformation},
};

/// Project-unique object identity. Allocated from a monotonic counter and never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an object sits on the timeline grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub layer: usize,
    pub column: u32,
    pub length: u32,
}

impl Placement {
    pub fn range(&self) -> FrameRange {
        FrameRange::from_column(self.column, self.length)
    }
}

/// Effective pose of an object at one frame, after all transformations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedPose {
    /// Top-left of the scaled, unrotated bitmap.
    pub position: Vec2,
    pub angle_deg: f64,
    /// Scale factors, already clamped to `>= 0`.
    pub scale: Vec2,
}

impl ResolvedPose {
    /// A zero scale on either axis makes the object invisible for this frame.
    pub fn is_degenerate(&self) -> bool {
        self.scale.x <= 0.0 || self.scale.y <= 0.0
    }
}

/// An absolute value the user set while looking at a particular frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameEdit {
    /// Desired on-canvas position (top-left), including any 3D contribution.
    Position(Vec2),
    /// Desired rotation in degrees.
    Angle(f64),
    /// Desired scale factors.
    Scale(Vec2),
}

/// One placed image instance spanning `[column, column + length - 1]` on a layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerObject {
    pub(crate) id: ObjectId,
    pub(crate) layer: usize,
    pub(crate) column: u32,
    pub(crate) length: u32,
    pub(crate) visible: bool,
    pub(crate) resource: ResourceId,
    pub(crate) pose: Pose,
    #[serde(default)]
    pub(crate) transforms: TransformSet,
}

impl LayerObject {
    pub(crate) fn new(id: ObjectId, placement: Placement, resource: ResourceId, pose: Pose) -> Self {
        Self {
            id,
            layer: placement.layer,
            column: placement.column,
            length: placement.length,
            visible: true,
            resource,
            pose,
            transforms: TransformSet::default(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Index of the owning layer. Lookup only; membership is held by the layer.
    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn placement(&self) -> Placement {
        Placement {
            layer: self.layer,
            column: self.column,
            length: self.length,
        }
    }

    pub fn range(&self) -> FrameRange {
        FrameRange::from_column(self.column, self.length)
    }

    pub fn covers(&self, frame: FrameIndex) -> bool {
        self.range().contains(frame)
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn transforms(&self) -> &TransformSet {
        &self.transforms
    }

    pub fn transformation(&self, kind: TransformKind) -> &Transformation {
        self.transforms.get(kind)
    }

    pub fn set_transformation(&mut self, t: Transformation) {
        self.transforms.set(t);
    }

    pub(crate) fn set_placement(&mut self, placement: Placement) {
        self.layer = placement.layer;
        self.column = placement.column;
        self.length = placement.length;
    }

    /// Progress of `frame` through this object's span, `None` outside it.
    pub fn progress_at(&self, frame: FrameIndex) -> Option<f64> {
        if !self.covers(frame) {
            return None;
        }
        Some(frame_progress(frame.0 - self.column, self.length))
    }

    /// Pose at `frame`, `None` when the object does not cover it.
    ///
    /// Translation and 3D translation contribute independently and are summed.
    pub fn resolve(&self, frame: FrameIndex) -> Option<ResolvedPose> {
        let p = self.progress_at(frame)?;
        let pose = &self.pose;
        let t = &self.transforms;

        let position = pose.position()
            + t.get(TransformKind::Translation).offset_vec(p)
            + t.get(TransformKind::Translation3D).offset_vec(p);
        let angle_deg = pose.angle_deg + t.get(TransformKind::Rotate).offset_angle(p);
        let raw_scale = pose.scale() + t.get(TransformKind::Scale).offset_vec(p);

        Some(ResolvedPose {
            position,
            angle_deg,
            scale: Vec2::new(raw_scale.x.max(0.0), raw_scale.y.max(0.0)),
        })
    }

    /// Apply an absolute edit made while viewing `frame`.
    ///
    /// At the first frame the initial pose moves and the deltas stay. Anywhere later the
    /// matching transformation's end value is re-derived from the edit with reciprocal
    /// progress, so the object passes through the edited value at `frame`.
    pub fn edit_at(&mut self, frame: FrameIndex, edit: FrameEdit) -> LenticularResult<()> {
        if !self.covers(frame) {
            return Err(LenticularError::validation(format!(
                "object {} does not cover frame {}",
                self.id, frame.0
            )));
        }
        let offset = frame.0 - self.column;
        let p = frame_progress(offset, self.length);
        let edit = match edit {
            // Only the user-authored translation is edited; the 3D part stays as generated.
            FrameEdit::Position(pos) => FrameEdit::Position(
                pos - self
                    .transforms
                    .get(TransformKind::Translation3D)
                    .offset_vec(p),
            ),
            other => other,
        };

        let Some(rp) = reciprocal_progress(offset, self.length) else {
            match edit {
                FrameEdit::Position(pos) => {
                    self.pose.x = pos.x;
                    self.pose.y = pos.y;
                }
                FrameEdit::Angle(a) => self.pose.angle_deg = a,
                FrameEdit::Scale(s) => {
                    self.pose.scale_x = s.x;
                    self.pose.scale_y = s.y;
                }
            }
            return Ok(());
        };

        match edit {
            FrameEdit::Position(target) => {
                let t = *self.transforms.get(TransformKind::Translation);
                let start = self.pose.position();
                let delta = Vec2::new(
                    end_delta(t.curve(), p, rp, start.x, target.x),
                    end_delta(t.curve(), p, rp, start.y, target.y),
                );
                self.transforms.set(t.with_vector(delta));
            }
            FrameEdit::Angle(a) => {
                let t = *self.transforms.get(TransformKind::Rotate);
                let delta = end_delta(t.curve(), p, rp, self.pose.angle_deg, a);
                self.transforms.set(t.with_angle(delta));
            }
            FrameEdit::Scale(s) => {
                let t = *self.transforms.get(TransformKind::Scale);
                let start = self.pose.scale();
                let delta = Vec2::new(
                    end_delta(t.curve(), p, rp, start.x, s.x),
                    end_delta(t.curve(), p, rp, start.y, s.y),
                );
                self.transforms.set(t.with_vector(delta));
            }
        }
        Ok(())
    }
}

/// Delta from `start` to the endpoint such that `curve` passes through `observed` at `p`.
///
/// Linear and quadratic shapes extrapolate through reciprocal progress `rp`; the
/// ease-in-out and sine shapes are not multiplicative, so the observed change is divided by
/// the shaped progress instead. `p` lies in `(0, 1]`, where every shape is positive.
fn end_delta(curve: InterpolationCurve, p: f64, rp: f64, start: f64, observed: f64) -> f64 {
    match curve {
        InterpolationCurve::Linear | InterpolationCurve::Quadratic => {
            curve.interpolate(rp, start, observed) - start
        }
        InterpolationCurve::Cubic | InterpolationCurve::Goniometric => {
            (observed - start) / curve.shape(p)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/object.rs"]
mod tests;
