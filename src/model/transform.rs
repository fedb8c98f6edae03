use crate::{
    animation::interp::InterpolationCurve,
    foundation::core::Vec2,
};

/// The four kinds of delta a layer object carries.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum TransformKind {
    /// User-authored movement.
    Translation,
    /// Movement written by the disparity generator.
    Translation3D,
    /// Rotation in degrees.
    Rotate,
    /// Additive change of the scale factors.
    Scale,
}

impl TransformKind {
    /// All kinds in storage order.
    pub const ALL: [Self; 4] = [
        Self::Translation,
        Self::Translation3D,
        Self::Rotate,
        Self::Scale,
    ];

    fn slot(self) -> usize {
        match self {
            Self::Translation => 0,
            Self::Translation3D => 1,
            Self::Rotate => 2,
            Self::Scale => 3,
        }
    }

    /// `true` for kinds whose delta is an angle rather than a vector.
    pub fn is_angular(self) -> bool {
        matches!(self, Self::Rotate)
    }
}

/// Delta payload of a [`Transformation`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TransformDelta {
    /// `(dx, dy)` for translations and scale.
    Vector(Vec2),
    /// Degrees for rotation.
    Angle(f64),
}

/// A delta applied progressively from an object's first to its last frame.
///
/// This is a value type: edits produce a new value that is assigned back into the owning
/// object's [`TransformSet`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transformation {
    kind: TransformKind,
    delta: TransformDelta,
    curve: InterpolationCurve,
}

impl Transformation {
    /// Zero delta of `kind` with a linear curve.
    pub fn identity(kind: TransformKind) -> Self {
        let delta = if kind.is_angular() {
            TransformDelta::Angle(0.0)
        } else {
            TransformDelta::Vector(Vec2::ZERO)
        };
        Self {
            kind,
            delta,
            curve: InterpolationCurve::Linear,
        }
    }

    pub fn translation(d: Vec2, curve: InterpolationCurve) -> Self {
        Self {
            kind: TransformKind::Translation,
            delta: TransformDelta::Vector(d),
            curve,
        }
    }

    pub fn translation_3d(d: Vec2, curve: InterpolationCurve) -> Self {
        Self {
            kind: TransformKind::Translation3D,
            delta: TransformDelta::Vector(d),
            curve,
        }
    }

    pub fn rotate(angle_deg: f64, curve: InterpolationCurve) -> Self {
        Self {
            kind: TransformKind::Rotate,
            delta: TransformDelta::Angle(angle_deg),
            curve,
        }
    }

    pub fn scale(d: Vec2, curve: InterpolationCurve) -> Self {
        Self {
            kind: TransformKind::Scale,
            delta: TransformDelta::Vector(d),
            curve,
        }
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn curve(&self) -> InterpolationCurve {
        self.curve
    }

    pub fn delta(&self) -> TransformDelta {
        self.delta
    }

    /// Vector delta; zero for rotations.
    pub fn vector(&self) -> Vec2 {
        match self.delta {
            TransformDelta::Vector(v) => v,
            TransformDelta::Angle(_) => Vec2::ZERO,
        }
    }

    /// Angle delta in degrees; zero for vector kinds.
    pub fn angle(&self) -> f64 {
        match self.delta {
            TransformDelta::Angle(a) => a,
            TransformDelta::Vector(_) => 0.0,
        }
    }

    pub fn with_curve(self, curve: InterpolationCurve) -> Self {
        Self { curve, ..self }
    }

    /// Replace the vector delta. Ignored for rotations.
    pub fn with_vector(self, v: Vec2) -> Self {
        match self.delta {
            TransformDelta::Vector(_) => Self {
                delta: TransformDelta::Vector(v),
                ..self
            },
            TransformDelta::Angle(_) => self,
        }
    }

    /// Replace the angle delta. Ignored for vector kinds.
    pub fn with_angle(self, angle_deg: f64) -> Self {
        match self.delta {
            TransformDelta::Angle(_) => Self {
                delta: TransformDelta::Angle(angle_deg),
                ..self
            },
            TransformDelta::Vector(_) => self,
        }
    }

    /// `true` when the payload shape matches the kind and every number is finite.
    pub fn is_well_formed(&self) -> bool {
        match self.delta {
            TransformDelta::Vector(v) => !self.kind.is_angular() && v.x.is_finite() && v.y.is_finite(),
            TransformDelta::Angle(a) => self.kind.is_angular() && a.is_finite(),
        }
    }

    /// Vector offset from the start value after `progress`.
    pub fn offset_vec(&self, progress: f64) -> Vec2 {
        self.curve.interpolate_vec(progress, Vec2::ZERO, self.vector())
    }

    /// Angular offset from the start value after `progress`.
    pub fn offset_angle(&self, progress: f64) -> f64 {
        self.curve.interpolate(progress, 0.0, self.angle())
    }
}

/// One transformation per [`TransformKind`], always fully populated.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformSet {
    items: [Transformation; 4],
}

impl Default for TransformSet {
    fn default() -> Self {
        Self {
            items: TransformKind::ALL.map(Transformation::identity),
        }
    }
}

impl TransformSet {
    pub fn get(&self, kind: TransformKind) -> &Transformation {
        &self.items[kind.slot()]
    }

    /// Store `t` under its own kind, replacing the previous value.
    pub fn set(&mut self, t: Transformation) {
        self.items[t.kind().slot()] = t;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transformation> {
        self.items.iter()
    }

    /// Every slot holds its own kind with a well-formed payload.
    pub fn is_consistent(&self) -> bool {
        TransformKind::ALL
            .iter()
            .all(|k| self.get(*k).kind() == *k && self.get(*k).is_well_formed())
    }
}

/// Initial placement of an object at its first frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pose {
    /// Left edge in canvas pixels.
    pub x: f64,
    /// Top edge in canvas pixels.
    pub y: f64,
    /// Clockwise rotation in degrees.
    pub angle_deg: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle_deg: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl Pose {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn scale(&self) -> Vec2 {
        Vec2::new(self.scale_x, self.scale_y)
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.angle_deg, self.scale_x, self.scale_y]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/transform.rs"]
mod tests;
