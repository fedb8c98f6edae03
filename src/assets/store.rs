use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::{
    assets::decode::decode_image,
    foundation::error::{LenticularError, LenticularResult},
    model::project::{Project, ResourceId},
    render::raster::{ResourceInfo, ResourceResolver},
};

#[derive(Clone, Debug)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Normalize and validate project-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> LenticularResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(LenticularError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(LenticularError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(LenticularError::validation(
                "asset paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(LenticularError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Decoded pixels for every resource of a project.
///
/// All IO happens in [`ImageStore::prepare`]; rasterizers only read from the store, so one
/// store can be shared by every export worker.
#[derive(Clone, Debug, Default)]
pub struct ImageStore {
    images: BTreeMap<ResourceId, PreparedImage>,
}

impl ImageStore {
    /// Read and decode every resource of `project` relative to `root`.
    #[tracing::instrument(skip(project, root))]
    pub fn prepare(project: &Project, root: impl AsRef<Path>) -> LenticularResult<Self> {
        let root = root.as_ref();
        let mut images = BTreeMap::new();
        for (id, entry) in project.resources().iter() {
            let rel = normalize_rel_path(&entry.source)?;
            let path: PathBuf = root.join(&rel);
            let bytes =
                std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))?;
            let image = decode_image(&bytes)
                .map_err(|e| LenticularError::render(format!("decode '{rel}': {e}")))?;
            tracing::debug!(resource = id.0, width = image.width, height = image.height, "decoded");
            images.insert(id, image);
        }
        Ok(Self { images })
    }

    /// Register already-decoded pixels under `id`.
    pub fn insert(&mut self, id: ResourceId, image: PreparedImage) {
        self.images.insert(id, image);
    }

    pub fn image(&self, id: ResourceId) -> Option<&PreparedImage> {
        self.images.get(&id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ResourceResolver for ImageStore {
    fn resolve(&self, id: ResourceId) -> LenticularResult<ResourceInfo> {
        let img = self
            .image(id)
            .ok_or_else(|| LenticularError::render(format!("resource {} is not loaded", id.0)))?;
        Ok(ResourceInfo {
            width: img.width,
            height: img.height,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
