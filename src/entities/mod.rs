//! Data types shared by the engine and its collaborators.
//!
//! `entities` has no dependency on `core`: collaborator traits live here so
//! the scheduler depends on abstractions the host implements.

pub mod frame;
pub mod layout;
pub mod scene;
pub mod traits;

pub use frame::{ColorModel, Frame, FrameFormat, FrameId, FrameInfo, Plane, ViewId};
pub use layout::{LayoutEntry, Rect, ViewLayout};
pub use scene::Scene;
pub use traits::{ColorConverter, Renderer};
