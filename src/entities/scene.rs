//! Scene: one timestamped batch of frames, one per active view.

use super::frame::Frame;

/// Ordered frames for one composited instant.
///
/// `pts == None` is the invalid timestamp: such scenes are rendered but never
/// contribute to the playback speed estimate.
#[derive(Debug, Default)]
pub struct Scene {
    pub frames: Vec<Frame>,
    pub pts: Option<u32>,
    pub seeking: bool,
}

impl Scene {
    pub fn new(frames: Vec<Frame>, pts: Option<u32>, seeking: bool) -> Self {
        Self { frames, pts, seeking }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
