use std::path::PathBuf;

use rayon::prelude::*;

use crate::{
    assets::store::ImageStore,
    foundation::core::FrameIndex,
    foundation::error::{LenticularError, LenticularResult},
    model::project::Project,
    render::compositor::compose_frame,
    render::cpu::CpuRasterizer,
    render::raster::{Rasterizer, ResourceResolver},
};

/// Placeholder in [`ExportOpts::pattern`] replaced by the 1-based frame number.
pub const FRAME_PLACEHOLDER: &str = "%i";

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Threading controls for multi-frame export.
pub struct ExportThreading {
    /// Compose frames on a worker pool when `true`.
    #[serde(default)]
    pub parallel: bool,
    /// Optional explicit worker thread count.
    #[serde(default)]
    pub threads: Option<usize>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Options for [`export_frames`].
pub struct ExportOpts {
    /// Output path pattern containing `%i`, e.g. `out/frame_%i.png`.
    pub pattern: String,
    /// Encoder quality in `1..=100`; ignored by lossless formats.
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub threading: ExportThreading,
}

fn default_quality() -> u8 {
    90
}

impl ExportOpts {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            quality: default_quality(),
            threading: ExportThreading::default(),
        }
    }

    pub fn validate(&self) -> LenticularResult<()> {
        if !self.pattern.contains(FRAME_PLACEHOLDER) {
            return Err(LenticularError::validation(format!(
                "export pattern '{}' must contain '{FRAME_PLACEHOLDER}'",
                self.pattern
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(LenticularError::validation("export quality must be in 1..=100"));
        }
        if self.threading.threads == Some(0) {
            return Err(LenticularError::validation(
                "export threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Aggregated export counters.
pub struct ExportStats {
    /// Frames written.
    pub frames_written: u32,
    /// Object draws across all frames.
    pub objects_drawn: u64,
}

/// Output path for `frame` (0-based) under `pattern`.
pub fn frame_output_path(pattern: &str, frame: FrameIndex) -> PathBuf {
    PathBuf::from(pattern.replace(FRAME_PLACEHOLDER, &(u64::from(frame.0) + 1).to_string()))
}

/// Compose and encode every frame of `project`.
///
/// Each frame gets its own canvas; frames are independent and may run on a worker pool, one
/// rasterizer per worker. The first failing frame aborts the run. Files already written are
/// left in place.
#[tracing::instrument(skip(project, resolver, opts, make_raster), fields(frames = project.frame_count()))]
pub fn export_frames<R, F>(
    project: &Project,
    resolver: &dyn ResourceResolver,
    opts: &ExportOpts,
    make_raster: F,
) -> LenticularResult<ExportStats>
where
    R: Rasterizer,
    F: Fn() -> R + Sync + Send,
{
    opts.validate()?;
    let frames = project.frame_count();

    let per_frame: Vec<LenticularResult<usize>> = if opts.threading.parallel {
        let pool = build_thread_pool(opts.threading.threads)?;
        pool.install(|| {
            (0..frames)
                .into_par_iter()
                .map_init(&make_raster, |raster, f| {
                    export_one(project, FrameIndex(f), resolver, opts, raster)
                })
                .collect()
        })
    } else {
        let mut raster = make_raster();
        let mut out = Vec::with_capacity(frames as usize);
        for f in 0..frames {
            let r = export_one(project, FrameIndex(f), resolver, opts, &mut raster);
            let failed = r.is_err();
            out.push(r);
            if failed {
                break;
            }
        }
        out
    };

    let mut stats = ExportStats::default();
    for drawn in per_frame {
        stats.objects_drawn += drawn? as u64;
        stats.frames_written += 1;
    }
    tracing::info!(frames = stats.frames_written, draws = stats.objects_drawn, "export done");
    Ok(stats)
}

/// [`export_frames`] with the built-in [`CpuRasterizer`] reading from `store`.
pub fn export_project(
    project: &Project,
    store: &ImageStore,
    opts: &ExportOpts,
) -> LenticularResult<ExportStats> {
    export_frames(project, store, opts, || CpuRasterizer::new(store))
}

fn export_one<R: Rasterizer>(
    project: &Project,
    frame: FrameIndex,
    resolver: &dyn ResourceResolver,
    opts: &ExportOpts,
    raster: &mut R,
) -> LenticularResult<usize> {
    let drawn = compose_frame(project, frame, resolver, raster)?;
    let path = frame_output_path(&opts.pattern, frame);
    raster.export_canvas(&path, opts.quality)?;
    tracing::debug!(frame = frame.0, path = %path.display(), drawn, "frame written");
    Ok(drawn)
}

fn build_thread_pool(threads: Option<usize>) -> LenticularResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LenticularError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/export.rs"]
mod tests;
