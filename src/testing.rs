//! Fake collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::entities::{ColorConverter, ColorModel, Frame, FrameFormat, FrameId, Plane, Rect, Renderer, ViewId};
use crate::error::{ConvertError, RenderError};

/// Everything the fake renderer saw, plus knobs to inject failures.
#[derive(Debug, Default)]
pub struct RendererLog {
    pub allocations: Vec<FrameFormat>,
    pub deallocations: Vec<(FrameId, u32, u32)>,
    pub gets: usize,
    pub releases: usize,
    pub renders: Vec<Vec<RenderedFrame>>,

    /// Allocation fails while > 0 (decremented per failed call)
    pub fail_allocations: usize,
    /// Every get_frame fails while set
    pub fail_get: bool,
    /// Display frames use this color model instead of the source's
    pub display_color: Option<ColorModel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedFrame {
    pub frame_id: FrameId,
    pub view_id: Option<ViewId>,
    pub src: Option<Rect>,
    pub dst: Option<Rect>,
    pub width: u32,
    pub height: u32,
    pub first_byte: u8,
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    log: Arc<Mutex<RendererLog>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, RendererLog> {
        self.log.lock().unwrap()
    }
}

impl Renderer for RecordingRenderer {
    fn allocate(&mut self, format: &FrameFormat) -> Option<Frame> {
        let mut log = self.log();
        if log.fail_allocations > 0 {
            log.fail_allocations -= 1;
            return None;
        }
        log.allocations.push(*format);
        let mut fmt = *format;
        if let Some(color) = log.display_color {
            fmt = FrameFormat::new(color, format.width, format.height);
        }
        Some(Frame::new(fmt))
    }

    fn deallocate(&mut self, frame: Frame) {
        self.log().deallocations.push((frame.id(), frame.width(), frame.height()));
    }

    fn get_frame(&mut self, _frame: &mut Frame) -> Result<(), RenderError> {
        let mut log = self.log();
        if log.fail_get {
            return Err(RenderError::Busy);
        }
        log.gets += 1;
        Ok(())
    }

    fn release_frame(&mut self, _frame: &mut Frame) {
        self.log().releases += 1;
    }

    fn render_scene(&mut self, scene: &[&Frame]) {
        let rendered = scene
            .iter()
            .map(|f| RenderedFrame {
                frame_id: f.id(),
                view_id: f.view_id(),
                src: f.info().src_rect,
                dst: f.info().dst_rect,
                width: f.width(),
                height: f.height(),
                first_byte: f.plane(Plane::P0).first().copied().unwrap_or(0),
            })
            .collect();
        self.log().renders.push(rendered);
    }
}

/// Counts conversions; fills destination plane 0 with a marker byte.
#[derive(Clone, Default)]
pub struct RecordingConverter {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
}

pub const CONVERTED_MARKER: u8 = 0xAB;

impl ColorConverter for RecordingConverter {
    fn convert(&self, src: &Frame, dst: &mut Frame) -> Result<(), ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ConvertError::Unsupported {
                from: src.format().color,
                to: dst.format().color,
            });
        }
        dst.fill_plane(Plane::P0, CONVERTED_MARKER);
        Ok(())
    }
}

/// Source frame for `view` filled with `value` on every plane
pub fn source_frame(view: u32, width: u32, height: u32, value: u8) -> Frame {
    let mut frame = Frame::new(FrameFormat::new(ColorModel::I420, width, height)).with_view(ViewId(view));
    for plane in Plane::ALL {
        frame.fill_plane(plane, value);
    }
    frame
}
