//! Error types for the render core.
//!
//! Per-frame failures (allocation, acquire, conversion) are absorbed inside a
//! tick and only logged; these types exist so collaborators can report them
//! and so the few caller-visible failures (double start, bad layout, bad
//! config, mismatched measure inputs) surface as values.

use std::path::PathBuf;

use crate::entities::frame::{ColorModel, FrameFormat, ViewId};

/// Scheduler lifecycle errors (Start/Stop boundaries only).
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("render scheduler is already running")]
    AlreadyRunning,

    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("render thread panicked; renderer state was lost")]
    RenderThreadPanicked,

    #[error("renderer is unavailable (lost by a previous failed run)")]
    RendererLost,
}

/// Invalid view layout supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout lists differ in length: {views} views, {src} source rects, {dst} destination rects")]
    LengthMismatch { views: usize, src: usize, dst: usize },

    #[error("view {0} appears more than once in layout")]
    DuplicateView(ViewId),
}

/// Failure reported by the renderer backend when mapping a display frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("display frame is busy")]
    Busy,

    #[error("render device lost")]
    DeviceLost,

    #[error("renderer backend error: {0}")]
    Backend(String),
}

/// Failure reported by a color converter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("unsupported conversion {from:?} -> {to:?}")]
    Unsupported { from: ColorModel, to: ColorModel },

    #[error("conversion failed: {0}")]
    Failed(String),
}

/// Measures require both inputs in the exact same format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeasureError {
    #[error("input formats differ: {left:?} vs {right:?}")]
    FormatMismatch { left: FrameFormat, right: FrameFormat },
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}
