//! YUVTK - multi-view video render scheduler library
//!
//! Re-exports all modules for use by binary targets.

// Core engine (queue, frame pool, speed, scheduler, events)
pub mod core;

// Data types and collaborator traits
pub mod entities;

// App modules
pub mod cli;
pub mod config;
pub mod error;
pub mod headless;
pub mod measures;

#[cfg(test)]
mod testing;

// Re-export commonly used types from core
pub use core::event_bus::{EventBus, EventEmitter};
pub use core::render_events::SceneRendered;
pub use core::scheduler::{RenderScheduler, SchedulerHandle, SchedulerState};

// Re-export entities
pub use entities::{ColorConverter, ColorModel, Frame, FrameFormat, Plane, Rect, Renderer, Scene, ViewId, ViewLayout};

pub use config::SchedulerConfig;
pub use error::{ConfigError, ConvertError, LayoutError, MeasureError, RenderError, SchedulerError};
