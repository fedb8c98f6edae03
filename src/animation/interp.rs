use std::f64::consts::FRAC_PI_2;

use crate::foundation::core::Vec2;

/// Curve shaping a transformation's progress from its start value to its end value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InterpolationCurve {
    /// Constant rate.
    #[default]
    Linear,
    /// Accelerating, `p^2`.
    Quadratic,
    /// Ease-in-out, point-symmetric around `p = 0.5`.
    Cubic,
    /// Decelerating quarter sine.
    Goniometric,
}

impl InterpolationCurve {
    /// Map progress through the curve.
    ///
    /// Progress is not clamped: values outside `[0, 1]` extrapolate along the same formula.
    pub fn shape(self, p: f64) -> f64 {
        match self {
            Self::Linear => p,
            Self::Quadratic => p * p,
            Self::Cubic => 4.0 * (p - 0.5).powi(3) + 0.5,
            Self::Goniometric => (p * FRAC_PI_2).sin(),
        }
    }

    /// Interpolate a scalar between `start` and `end`.
    pub fn interpolate(self, progress: f64, start: f64, end: f64) -> f64 {
        start + self.shape(progress) * (end - start)
    }

    /// Interpolate both components of a vector with the same shaped progress.
    pub fn interpolate_vec(self, progress: f64, start: Vec2, end: Vec2) -> Vec2 {
        let k = self.shape(progress);
        start + (end - start) * k
    }
}

/// Free-function form of [`InterpolationCurve::interpolate`].
pub fn interpolate(curve: InterpolationCurve, progress: f64, start: f64, end: f64) -> f64 {
    curve.interpolate(progress, start, end)
}

/// Progress of frame offset `offset` inside a span of `length` frames.
///
/// The first frame is `0`, the last is `1`. A single-frame span always reports `0`.
pub fn frame_progress(offset: u32, length: u32) -> f64 {
    if length <= 1 {
        return 0.0;
    }
    f64::from(offset) / f64::from(length - 1)
}

/// Reciprocal progress `1 / (offset / (length - 1))`.
///
/// Feeding this to [`interpolate`] together with a value observed at `offset` extrapolates
/// the value at the last frame of the span. `None` when the span has a single frame or the
/// offset is the first frame, where no endpoint can be derived.
pub fn reciprocal_progress(offset: u32, length: u32) -> Option<f64> {
    if length <= 1 || offset == 0 {
        return None;
    }
    Some(1.0 / (f64::from(offset) / f64::from(length - 1)))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/interp.rs"]
mod tests;
