use crate::{
    animation::interp::{InterpolationCurve, reciprocal_progress},
    foundation::core::Vec2,
    foundation::error::{LenticularError, LenticularResult},
    model::object::{LayerObject, ObjectId},
    model::project::{Project, ProjectSettings},
    model::transform::{TransformKind, Transformation},
};

/// Average human interocular distance in inches.
pub const EYE_DISTANCE_IN: f64 = 2.5;

/// Physical viewing set-up of a lenticular print.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewingGeometry {
    /// Eye-to-print distance in inches.
    pub view_distance_in: f64,
    /// Full viewing angle of the lens in degrees.
    pub view_angle_deg: f64,
    /// Nearest allowed layer depth (toward the viewer), inches.
    pub foreground_in: f64,
    /// Farthest allowed layer depth (behind the print), inches, `<= 0`.
    pub background_in: f64,
}

impl Default for ViewingGeometry {
    fn default() -> Self {
        Self {
            view_distance_in: 20.0,
            view_angle_deg: 30.0,
            foreground_in: 2.0,
            background_in: -2.0,
        }
    }
}

impl ViewingGeometry {
    pub fn validate(&self) -> LenticularResult<()> {
        if !self.view_distance_in.is_finite() || self.view_distance_in <= 0.0 {
            return Err(LenticularError::validation("view distance must be finite and > 0"));
        }
        if !self.view_angle_deg.is_finite()
            || self.view_angle_deg <= 0.0
            || self.view_angle_deg >= 180.0
        {
            return Err(LenticularError::validation(
                "view angle must be in (0, 180) degrees",
            ));
        }
        if !(self.background_in.is_finite() && self.foreground_in.is_finite()) {
            return Err(LenticularError::validation("depth bounds must be finite"));
        }
        if self.background_in > 0.0 || self.foreground_in < 0.0 {
            return Err(LenticularError::validation(
                "depth bounds must satisfy background <= 0 <= foreground",
            ));
        }
        if self.foreground_in >= self.view_distance_in {
            return Err(LenticularError::validation(
                "foreground must be closer than the viewer",
            ));
        }
        Ok(())
    }

    /// Reject depths outside `[background, foreground]`.
    pub fn validate_depth(&self, depth_in: f64) -> LenticularResult<()> {
        if !depth_in.is_finite() || depth_in < self.background_in || depth_in > self.foreground_in
        {
            return Err(LenticularError::validation(format!(
                "depth {depth_in}in outside [{}, {}]",
                self.background_in, self.foreground_in
            )));
        }
        Ok(())
    }

    /// Width in inches covered by a single frame's viewing zone at the view distance.
    pub fn single_view_zone_width(&self, frames: u32) -> f64 {
        let half = (self.view_angle_deg / 2.0).to_radians();
        2.0 * self.view_distance_in * half.tan() / f64::from(frames)
    }

    /// Number of frames spanned by one eye separation.
    pub fn zone_distance(&self, frames: u32) -> u32 {
        let zd = (EYE_DISTANCE_IN / self.single_view_zone_width(frames)).floor();
        if zd.is_finite() && zd > 0.0 {
            zd.min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }

    /// Horizontal shift in pixels of a point at `x_in` seen by one eye.
    ///
    /// `eye_sign` is `-1` for the left eye and `+1` for the right.
    fn eye_shift(&self, settings: &ProjectSettings, x_in: f64, depth_in: f64, eye_sign: f64) -> f64 {
        let off = x_in - settings.width_in() / 2.0 - eye_sign * EYE_DISTANCE_IN / 2.0;
        (f64::from(settings.dpi) * (off * depth_in) / (self.view_distance_in - depth_in)).round()
    }

    /// Pixel disparity between the right and left eye for a point at `x_in` and `depth_in`.
    pub fn disparity_px(&self, settings: &ProjectSettings, x_in: f64, depth_in: f64) -> f64 {
        self.eye_shift(settings, x_in, depth_in, 1.0) - self.eye_shift(settings, x_in, depth_in, -1.0)
    }
}

/// Compute the 3D translation for one object, `None` when its window degenerates.
///
/// The shift is horizontal: it is derived from the pose's x and written to the x axis of the
/// 3D translation, leaving y at zero.
fn object_disparity(
    geometry: &ViewingGeometry,
    settings: &ProjectSettings,
    zone: u32,
    depth_in: f64,
    object: &LayerObject,
) -> Option<Transformation> {
    if zone <= 1 {
        return None;
    }
    let rp = reciprocal_progress(zone - 1, object.length())?;
    let start = object.pose().x;
    let x_in = start / f64::from(settings.dpi);
    let target = start + geometry.disparity_px(settings, x_in, depth_in);
    let end = InterpolationCurve::Linear.interpolate(rp, start, target);
    let current = *object.transformation(TransformKind::Translation3D);
    Some(current.with_vector(Vec2::new(end - start, 0.0)))
}

/// Compute a fresh 3D translation for every object of `project`.
///
/// Every layer depth is checked first, so a bad depth yields no partial result. Objects whose
/// disparity window degenerates are left out. The returned values replace, not add to, any
/// existing 3D translation.
#[tracing::instrument(skip(project), fields(frames = project.frame_count()))]
pub fn generate(
    project: &Project,
    geometry: &ViewingGeometry,
) -> LenticularResult<Vec<(ObjectId, Transformation)>> {
    geometry.validate()?;
    for (i, layer) in project.layers().iter().enumerate() {
        geometry
            .validate_depth(layer.depth_in)
            .map_err(|e| LenticularError::validation(format!("layer {i}: {e}")))?;
    }

    let settings = project.settings();
    let zone = geometry.zone_distance(settings.frames);
    let mut out = Vec::new();
    for layer in project.layers() {
        for object in layer.objects() {
            match object_disparity(geometry, settings, zone, layer.depth_in, object) {
                Some(t) => out.push((object.id(), t)),
                None => tracing::debug!(object = %object.id(), zone, "disparity window degenerate, skipped"),
            }
        }
    }
    tracing::info!(zone, objects = out.len(), "disparity generated");
    Ok(out)
}

/// Run [`generate`] and write the results into `project`. Returns the number of objects updated.
pub fn apply(project: &mut Project, geometry: &ViewingGeometry) -> LenticularResult<usize> {
    let updates = generate(project, geometry)?;
    let n = updates.len();
    for (id, t) in updates {
        if let Some(object) = project.object_mut(id) {
            object.set_transformation(t);
        }
    }
    Ok(n)
}

#[cfg(test)]
#[path = "../../tests/unit/stereo/disparity.rs"]
mod tests;
