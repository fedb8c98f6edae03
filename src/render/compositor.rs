use crate::{
    foundation::core::{FrameIndex, Vec2},
    foundation::error::{LenticularError, LenticularResult},
    foundation::math::{is_full_turn, rotated_bounds},
    model::object::ObjectId,
    model::project::{Project, ResourceId},
    render::raster::{Rasterizer, ResourceResolver},
};

/// One object draw for a frame, fully resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawStep {
    pub object: ObjectId,
    pub layer: usize,
    pub resource: ResourceId,
    /// Scaled bitmap size before rotation.
    pub size: (u32, u32),
    /// Rotation to apply, `None` when the angle is a whole number of turns.
    pub angle_deg: Option<f64>,
    /// Top-left of the (possibly rotated) bitmap on the canvas.
    pub at: Vec2,
}

/// Draw steps for `frame` in painter's order: bottom layer first, top layer (index 0) last.
///
/// Hidden objects, objects not covering the frame, and objects whose scale collapses to zero
/// are left out.
pub fn plan_frame(
    project: &Project,
    frame: FrameIndex,
    resolver: &dyn ResourceResolver,
) -> LenticularResult<Vec<DrawStep>> {
    if frame.0 >= project.frame_count() {
        return Err(LenticularError::validation(format!(
            "frame {} is out of bounds",
            frame.0
        )));
    }

    let mut steps = Vec::new();
    for (layer_index, layer) in project.layers().iter().enumerate().rev() {
        for object in layer.objects() {
            if !object.visible() {
                continue;
            }
            let Some(pose) = object.resolve(frame) else {
                continue;
            };
            if pose.is_degenerate() {
                tracing::debug!(object = object.id().0, frame = frame.0, "zero scale, skipped");
                continue;
            }

            let info = resolver.resolve(object.resource())?;
            let w = (f64::from(info.width) * pose.scale.x).round();
            let h = (f64::from(info.height) * pose.scale.y).round();
            if w < 1.0 || h < 1.0 {
                tracing::debug!(object = object.id().0, frame = frame.0, "sub-pixel size, skipped");
                continue;
            }
            let size = (w as u32, h as u32);

            let (angle_deg, at) = if is_full_turn(pose.angle_deg) {
                (None, pose.position)
            } else {
                let (rw, rh) = rotated_bounds(size.0, size.1, pose.angle_deg);
                // Rotation is about the bitmap centre, so the enlarged box is re-centred.
                let shift = Vec2::new(
                    (f64::from(size.0) - f64::from(rw)) / 2.0,
                    (f64::from(size.1) - f64::from(rh)) / 2.0,
                );
                (Some(pose.angle_deg), pose.position + shift)
            };

            steps.push(DrawStep {
                object: object.id(),
                layer: layer_index,
                resource: object.resource(),
                size,
                angle_deg,
                at,
            });
        }
    }
    Ok(steps)
}

/// Composite one frame onto a fresh canvas and finalize it.
///
/// The layer stack is a strict sequential fold; returns the number of objects drawn.
#[tracing::instrument(skip(project, resolver, raster), fields(frame = frame.0))]
pub fn compose_frame<R: Rasterizer + ?Sized>(
    project: &Project,
    frame: FrameIndex,
    resolver: &dyn ResourceResolver,
    raster: &mut R,
) -> LenticularResult<usize> {
    let steps = plan_frame(project, frame, resolver)?;
    let settings = project.settings();
    raster.init_canvas(settings.width, settings.height)?;
    for step in &steps {
        raster.load_image(step.resource)?;
        raster.resize(step.size.0, step.size.1)?;
        if let Some(angle) = step.angle_deg {
            raster.rotate(angle)?;
        }
        raster.composite(step.at.x, step.at.y)?;
    }
    raster.finalize()?;
    Ok(steps.len())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
