use std::path::Path;

use crate::{foundation::error::LenticularResult, model::project::ResourceId};

/// Pixel dimensions of a resource's bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceInfo {
    pub width: u32,
    pub height: u32,
}

/// Looks up bitmap dimensions for a resource.
pub trait ResourceResolver: Sync {
    fn resolve(&self, id: ResourceId) -> LenticularResult<ResourceInfo>;
}

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
            premultiplied: true,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// Stateful drawing surface driven by the compositor, one frame at a time.
///
/// Call order per frame: `init_canvas`, then for each drawn object `load_image`, `resize`,
/// optionally `rotate`, `composite`; finally `finalize` and `export_canvas`. Any error is
/// fatal for the frame.
pub trait Rasterizer {
    /// Start a new transparent canvas, discarding any previous state.
    fn init_canvas(&mut self, width: u32, height: u32) -> LenticularResult<()>;

    /// Make the bitmap of `resource` the current working image.
    fn load_image(&mut self, resource: ResourceId) -> LenticularResult<()>;

    /// Resample the working image to `width`x`height`.
    fn resize(&mut self, width: u32, height: u32) -> LenticularResult<()>;

    /// Rotate the working image clockwise about its centre, growing it to the rotated bounds.
    fn rotate(&mut self, angle_deg: f64) -> LenticularResult<()>;

    /// Draw the working image over the canvas with its top-left at `(x, y)`.
    fn composite(&mut self, x: f64, y: f64) -> LenticularResult<()>;

    /// Close the frame; no more composites until the next `init_canvas`.
    fn finalize(&mut self) -> LenticularResult<()>;

    /// Encode the finalized canvas to `path`. `quality` is `1..=100` and only used by lossy formats.
    fn export_canvas(&mut self, path: &Path, quality: u8) -> LenticularResult<()>;
}
