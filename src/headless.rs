//! In-memory renderer backend for the headless binary and integration tests.
//!
//! Display frames are plain heap buffers in the requested format, so the
//! scheduler always takes the copy path and the converter is never needed.
//! Counters are shared atomics readable from any thread while the render
//! thread runs.

use log::{debug, trace};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::entities::{ColorConverter, Frame, FrameFormat, Plane, Renderer};
use crate::error::{ConvertError, RenderError};

/// Live counters of a [`HeadlessRenderer`]
#[derive(Debug, Default)]
pub struct RenderCounters {
    pub allocations: AtomicUsize,
    pub deallocations: AtomicUsize,
    pub maps: AtomicUsize,
    pub unmaps: AtomicUsize,
    pub scenes: AtomicUsize,
    pub frames: AtomicUsize,
    /// Bytes of the frames presented (sum of all planes)
    pub bytes: AtomicU64,
}

/// Plain-value copy of [`RenderCounters`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub allocations: usize,
    pub deallocations: usize,
    pub maps: usize,
    pub unmaps: usize,
    pub scenes: usize,
    pub frames: usize,
    pub bytes: u64,
}

impl RenderCounters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            maps: self.maps.load(Ordering::Relaxed),
            unmaps: self.unmaps.load(Ordering::Relaxed),
            scenes: self.scenes.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

impl CounterSnapshot {
    /// Display frames currently allocated
    pub fn live_frames(&self) -> usize {
        self.allocations.saturating_sub(self.deallocations)
    }
}

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    counters: Arc<RenderCounters>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counters (clone before moving the renderer into a scheduler)
    pub fn counters(&self) -> Arc<RenderCounters> {
        Arc::clone(&self.counters)
    }
}

impl Renderer for HeadlessRenderer {
    fn allocate(&mut self, format: &FrameFormat) -> Option<Frame> {
        self.counters.allocations.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Headless: allocate {}x{} {}",
            format.width,
            format.height,
            format.color.name()
        );
        Some(Frame::new(*format))
    }

    fn deallocate(&mut self, frame: Frame) {
        self.counters.deallocations.fetch_add(1, Ordering::Relaxed);
        trace!("Headless: deallocate frame {}", frame.id());
    }

    fn get_frame(&mut self, _frame: &mut Frame) -> Result<(), RenderError> {
        self.counters.maps.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release_frame(&mut self, _frame: &mut Frame) {
        self.counters.unmaps.fetch_add(1, Ordering::Relaxed);
    }

    fn render_scene(&mut self, scene: &[&Frame]) {
        let bytes: usize = scene
            .iter()
            .flat_map(|f| Plane::ALL.map(|p| f.plane(p).len()))
            .sum();
        self.counters.scenes.fetch_add(1, Ordering::Relaxed);
        self.counters.frames.fetch_add(scene.len(), Ordering::Relaxed);
        self.counters.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }
}

/// Converter for backends that always allocate in the source format.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoConversion;

impl ColorConverter for NoConversion {
    fn convert(&self, src: &Frame, dst: &mut Frame) -> Result<(), ConvertError> {
        Err(ConvertError::Unsupported {
            from: src.format().color,
            to: dst.format().color,
        })
    }
}
