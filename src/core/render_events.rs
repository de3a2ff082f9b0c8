//! Events published by the render scheduler.

use std::sync::Arc;

use crate::entities::Scene;

/// Emitted on every tick once a source scene has been seen, including ticks
/// that skipped the renderer (partial composite, nothing placed).
///
/// `scene` is the last source scene (held until the next one arrives), so
/// ticks without new input repeat the previous scene.
#[derive(Clone, Debug)]
pub struct SceneRendered {
    pub scene: Arc<Scene>,
    pub pts: Option<u32>,
    pub seeking: bool,
    /// The renderer presented a composite this tick; `false` means the
    /// previous presentation is still on screen
    pub rendered: bool,
}
