//! Lenticular print animation authoring.
//!
//! A [`Project`] is a fixed-size canvas with a stack of layers. Each layer holds
//! non-overlapping [`LayerObject`]s, one image spanning a contiguous run of keyframes, posed
//! by an initial [`Pose`] plus one interpolated [`Transformation`] per [`TransformKind`].
//!
//! - Edit through a [`Document`] to get undo/redo via [`History`]
//! - Fake depth with [`generate_disparity`] from a [`ViewingGeometry`]
//! - Rasterize every frame with [`export_frames`] or [`export_project`]
#![forbid(unsafe_code)]

mod assets;
mod document;
mod foundation;

pub(crate) mod animation;
pub(crate) mod history;
pub(crate) mod model;
pub(crate) mod render;
pub(crate) mod stereo;

pub use crate::foundation::core::{Affine, FrameIndex, FrameRange, Point, Vec2};
pub use crate::foundation::error::{LenticularError, LenticularResult};

pub use crate::animation::interp::{
    InterpolationCurve, frame_progress, interpolate, reciprocal_progress,
};
pub use crate::assets::decode::decode_image;
pub use crate::assets::store::{ImageStore, PreparedImage, normalize_rel_path};
pub use crate::document::{Document, GestureTarget};
pub use crate::history::engine::{History, HistoryConfig, LogFootprint, MemoryGauge};
pub use crate::history::item::{HistoryItem, LayerProps, PoseState};
pub use crate::model::layer::Layer;
pub use crate::model::object::{FrameEdit, LayerObject, ObjectId, Placement, ResolvedPose};
pub use crate::model::project::{
    Project, ProjectSettings, ResourceEntry, ResourceId, ResourceTable,
};
pub use crate::model::transform::{
    Pose, TransformDelta, TransformKind, TransformSet, Transformation,
};
pub use crate::render::compositor::{DrawStep, compose_frame, plan_frame};
pub use crate::render::cpu::CpuRasterizer;
pub use crate::render::export::{
    ExportOpts, ExportStats, ExportThreading, FRAME_PLACEHOLDER, export_frames, export_project,
    frame_output_path,
};
pub use crate::render::raster::{FrameRGBA, Rasterizer, ResourceInfo, ResourceResolver};
pub use crate::stereo::disparity::{
    EYE_DISTANCE_IN, ViewingGeometry, apply as apply_disparity, generate as generate_disparity,
};
