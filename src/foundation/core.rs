use crate::foundation::error::{LenticularError, LenticularResult};

pub use kurbo::{Affine, Point, Vec2};

/// Zero-based keyframe index along the project's frame axis.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u32);

/// Half-open frame span `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    pub start: FrameIndex,
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    pub fn new(start: FrameIndex, end: FrameIndex) -> LenticularResult<Self> {
        if start.0 > end.0 {
            return Err(LenticularError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Span covering `length` frames starting at `column`.
    pub fn from_column(column: u32, length: u32) -> Self {
        Self {
            start: FrameIndex(column),
            end: FrameIndex(column.saturating_add(length)),
        }
    }

    pub fn len_frames(self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }

    pub fn intersects(self, other: Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.start.0 < other.end.0 && other.start.0 < self.end.0
    }

    /// Last covered frame, `None` for an empty range.
    pub fn last(self) -> Option<FrameIndex> {
        if self.is_empty() {
            None
        } else {
            Some(FrameIndex(self.end.0 - 1))
        }
    }
}
