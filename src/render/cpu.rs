use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context as _;
use image::codecs::jpeg::JpegEncoder;

use crate::{
    assets::decode::unpremultiply_rgba8_in_place,
    assets::store::ImageStore,
    foundation::core::{Affine, Point, Vec2},
    foundation::error::{LenticularError, LenticularResult},
    foundation::math::{mul_div255_u8, rotated_bounds},
    model::project::ResourceId,
    render::composite::over_at,
    render::raster::{FrameRGBA, Rasterizer},
};

/// Working bitmap between `load_image` and `composite`, premultiplied RGBA8.
#[derive(Clone, Debug)]
struct Working {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Reference [`Rasterizer`] drawing into an in-memory premultiplied canvas.
///
/// Pixels come from a shared [`ImageStore`]; each export worker owns its own rasterizer.
#[derive(Debug)]
pub struct CpuRasterizer<'a> {
    store: &'a ImageStore,
    canvas: Option<FrameRGBA>,
    working: Option<Working>,
    finalized: bool,
}

impl<'a> CpuRasterizer<'a> {
    pub fn new(store: &'a ImageStore) -> Self {
        Self {
            store,
            canvas: None,
            working: None,
            finalized: false,
        }
    }

    /// Current canvas, if one was initialized.
    pub fn canvas(&self) -> Option<&FrameRGBA> {
        self.canvas.as_ref()
    }

    fn canvas_open(&mut self) -> LenticularResult<&mut FrameRGBA> {
        if self.finalized {
            return Err(LenticularError::render("canvas is already finalized"));
        }
        self.canvas
            .as_mut()
            .ok_or_else(|| LenticularError::render("canvas is not initialized"))
    }

    fn working_mut(&mut self) -> LenticularResult<&mut Working> {
        self.working
            .as_mut()
            .ok_or_else(|| LenticularError::render("no image loaded"))
    }
}

impl Rasterizer for CpuRasterizer<'_> {
    fn init_canvas(&mut self, width: u32, height: u32) -> LenticularResult<()> {
        if width == 0 || height == 0 {
            return Err(LenticularError::render("canvas width/height must be > 0"));
        }
        self.canvas = Some(FrameRGBA::transparent(width, height));
        self.working = None;
        self.finalized = false;
        Ok(())
    }

    fn load_image(&mut self, resource: ResourceId) -> LenticularResult<()> {
        self.canvas_open()?;
        let img = self
            .store
            .image(resource)
            .ok_or_else(|| LenticularError::render(format!("resource {} is not loaded", resource.0)))?;
        self.working = Some(Working {
            width: img.width,
            height: img.height,
            data: img.rgba8_premul.as_ref().clone(),
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> LenticularResult<()> {
        if width == 0 || height == 0 {
            return Err(LenticularError::render("resize target must be > 0"));
        }
        let w = self.working_mut()?;
        if (w.width, w.height) == (width, height) {
            return Ok(());
        }
        let src = image::RgbaImage::from_raw(w.width, w.height, std::mem::take(&mut w.data))
            .ok_or_else(|| LenticularError::render("working image buffer size mismatch"))?;
        let resized =
            image::imageops::resize(&src, width, height, image::imageops::FilterType::Triangle);
        w.width = width;
        w.height = height;
        w.data = resized.into_raw();
        Ok(())
    }

    fn rotate(&mut self, angle_deg: f64) -> LenticularResult<()> {
        if !angle_deg.is_finite() {
            return Err(LenticularError::render("rotation angle must be finite"));
        }
        let w = self.working_mut()?;
        let (rw, rh) = rotated_bounds(w.width, w.height, angle_deg);
        let src_c = Vec2::new(f64::from(w.width) / 2.0, f64::from(w.height) / 2.0);
        let dst_c = Vec2::new(f64::from(rw) / 2.0, f64::from(rh) / 2.0);
        // dst = T(dst_c) * R * T(-src_c) * src; sample through the inverse.
        let to_src = (Affine::translate(dst_c)
            * Affine::rotate(angle_deg.to_radians())
            * Affine::translate(-src_c))
        .inverse();

        let mut out = vec![0u8; rw as usize * rh as usize * 4];
        for y in 0..rh {
            for x in 0..rw {
                let p = to_src * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let px = sample_bilinear(w, p.x - 0.5, p.y - 0.5);
                let i = (y as usize * rw as usize + x as usize) * 4;
                out[i..i + 4].copy_from_slice(&px);
            }
        }
        w.width = rw;
        w.height = rh;
        w.data = out;
        Ok(())
    }

    fn composite(&mut self, x: f64, y: f64) -> LenticularResult<()> {
        if !x.is_finite() || !y.is_finite() {
            return Err(LenticularError::render("composite position must be finite"));
        }
        let working = self
            .working
            .take()
            .ok_or_else(|| LenticularError::render("no image loaded"))?;
        let canvas = self.canvas_open()?;
        over_at(
            &mut canvas.data,
            (canvas.width, canvas.height),
            &working.data,
            (working.width, working.height),
            (x.round() as i64, y.round() as i64),
        )
    }

    fn finalize(&mut self) -> LenticularResult<()> {
        self.canvas_open()?;
        self.working = None;
        self.finalized = true;
        Ok(())
    }

    fn export_canvas(&mut self, path: &Path, quality: u8) -> LenticularResult<()> {
        if !(1..=100).contains(&quality) {
            return Err(LenticularError::validation("export quality must be in 1..=100"));
        }
        if !self.finalized {
            return Err(LenticularError::render("canvas must be finalized before export"));
        }
        let canvas = self
            .canvas
            .as_ref()
            .ok_or_else(|| LenticularError::render("canvas is not initialized"))?;
        ensure_parent_dir(path)?;

        let format = image::ImageFormat::from_path(path)
            .map_err(|e| LenticularError::render(format!("output format for '{}': {e}", path.display())))?;
        match format {
            image::ImageFormat::Jpeg => {
                let rgb = flatten_over_white(canvas);
                let img = image::RgbImage::from_raw(canvas.width, canvas.height, rgb)
                    .ok_or_else(|| LenticularError::render("canvas buffer size mismatch"))?;
                let file = File::create(path)
                    .with_context(|| format!("create '{}'", path.display()))?;
                let mut out = BufWriter::new(file);
                image::DynamicImage::ImageRgb8(img)
                    .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
                    .map_err(|e| LenticularError::render(format!("encode '{}': {e}", path.display())))?;
            }
            other => {
                let mut straight = canvas.data.clone();
                unpremultiply_rgba8_in_place(&mut straight);
                image::save_buffer_with_format(
                    path,
                    &straight,
                    canvas.width,
                    canvas.height,
                    image::ColorType::Rgba8,
                    other,
                )
                .map_err(|e| LenticularError::render(format!("encode '{}': {e}", path.display())))?;
            }
        }
        Ok(())
    }
}

/// Create the parent directory of `path` if it does not exist yet.
pub(crate) fn ensure_parent_dir(path: &Path) -> LenticularResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn flatten_over_white(canvas: &FrameRGBA) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(canvas.width as usize * canvas.height as usize * 3);
    for px in canvas.data.chunks_exact(4) {
        let inv = 255u16 - u16::from(px[3]);
        for c in &px[..3] {
            rgb.push(c.saturating_add(mul_div255_u8(255, inv)));
        }
    }
    rgb
}

fn sample_bilinear(img: &Working, x: f64, y: f64) -> [u8; 4] {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (ix, iy) = (x0 as i64, y0 as i64);

    let fetch = |px: i64, py: i64| -> [f64; 4] {
        if px < 0 || py < 0 || px >= i64::from(img.width) || py >= i64::from(img.height) {
            return [0.0; 4];
        }
        let i = (py as usize * img.width as usize + px as usize) * 4;
        [
            f64::from(img.data[i]),
            f64::from(img.data[i + 1]),
            f64::from(img.data[i + 2]),
            f64::from(img.data[i + 3]),
        ]
    };

    let a = fetch(ix, iy);
    let b = fetch(ix + 1, iy);
    let c = fetch(ix, iy + 1);
    let d = fetch(ix + 1, iy + 1);
    let mut out = [0u8; 4];
    for k in 0..4 {
        let top = a[k] + (b[k] - a[k]) * fx;
        let bottom = c[k] + (d[k] - c[k]) * fx;
        out[k] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
