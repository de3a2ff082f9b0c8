//! Display frame pool: one renderer-owned buffer per active view.
//!
//! **Why**: Allocating display buffers is expensive (GPU textures, mapped
//! surfaces). Buffers are reused across ticks while a view's resolution is
//! stable and only reallocated when width/height change.
//!
//! **Used by**: RenderLoop (render thread only, no locking)
//!
//! # Reconciliation
//!
//! For each source frame, in order:
//! 1. Take the previous display frame with the same view id (at most once);
//!    later source frames for a view already handled are skipped
//! 2. Resolution changed -> deallocate it, treat as miss
//! 3. Miss -> allocate from renderer; allocation failure skips the view
//! 4. Map (get_frame), copy planes if formats match else convert, unmap
//! 5. Append to output
//!
//! Previous frames left unmatched belong to views that disappeared and are
//! deallocated. Per-frame failures are logged, never returned.

use log::{debug, trace, warn};

use crate::entities::{ColorConverter, Frame, Renderer, ViewId};

/// Counters for one reconciliation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub reused: usize,
    pub allocated: usize,
    /// Deallocated because resolution changed
    pub reallocated: usize,
    /// Deallocated because the view vanished
    pub released: usize,
    pub allocation_failures: usize,
    pub acquire_failures: usize,
    pub conversion_failures: usize,
    /// Extra source frames for a view already handled this pass
    pub duplicates: usize,
    pub copied: usize,
    pub converted: usize,
}

/// Writable mapping of a display frame; unmapped on drop on every path.
struct MappedFrame<'a> {
    renderer: &'a mut dyn Renderer,
    frame: &'a mut Frame,
}

impl<'a> MappedFrame<'a> {
    fn map(renderer: &'a mut dyn Renderer, frame: &'a mut Frame) -> Result<Self, crate::error::RenderError> {
        renderer.get_frame(frame)?;
        Ok(Self { renderer, frame })
    }

    fn frame(&mut self) -> &mut Frame {
        self.frame
    }
}

impl Drop for MappedFrame<'_> {
    fn drop(&mut self) {
        self.renderer.release_frame(self.frame);
    }
}

/// Match `sources` against `previous` display frames and produce the new
/// display list (source order preserved, failed allocations omitted).
pub fn reconcile_frames(
    sources: &[Frame],
    mut previous: Vec<Frame>,
    renderer: &mut dyn Renderer,
    converter: &dyn ColorConverter,
) -> (Vec<Frame>, ReconcileStats) {
    let mut stats = ReconcileStats::default();
    let mut output = Vec::with_capacity(sources.len());
    let mut seen: Vec<ViewId> = Vec::with_capacity(sources.len());

    for source in sources {
        let Some(view_id) = source.view_id() else {
            warn!("Source frame {} has no view id, skipped", source.id());
            continue;
        };
        // One display frame per view: first source frame wins
        if seen.contains(&view_id) {
            warn!("View {}: duplicate source frame {} in scene, skipped", view_id, source.id());
            stats.duplicates += 1;
            continue;
        }
        seen.push(view_id);

        // Take the matching display frame out so it cannot match twice
        let mut matched = previous
            .iter()
            .position(|f| f.view_id() == Some(view_id))
            .map(|idx| previous.swap_remove(idx));

        if let Some(frame) = matched.take_if(|f| !f.format().same_size(source.format())) {
            debug!(
                "View {}: resolution {}x{} -> {}x{}, reallocating",
                view_id,
                frame.width(),
                frame.height(),
                source.width(),
                source.height()
            );
            renderer.deallocate(frame);
            stats.reallocated += 1;
        }

        let mut display = match matched {
            Some(frame) => {
                stats.reused += 1;
                frame
            }
            None => match renderer.allocate(source.format()) {
                Some(mut frame) => {
                    frame.set_view_id(view_id);
                    debug!(
                        "View {}: allocated display frame {} ({}x{} {:?})",
                        view_id,
                        frame.id(),
                        frame.width(),
                        frame.height(),
                        frame.format().color
                    );
                    stats.allocated += 1;
                    frame
                }
                None => {
                    warn!(
                        "View {}: renderer failed to allocate {}x{} {:?}, skipping",
                        view_id,
                        source.width(),
                        source.height(),
                        source.format().color
                    );
                    stats.allocation_failures += 1;
                    continue;
                }
            },
        };

        upload(source, &mut display, renderer, converter, &mut stats);
        output.push(display);
    }

    for frame in previous {
        trace!("View {:?}: gone, releasing display frame {}", frame.view_id(), frame.id());
        renderer.deallocate(frame);
        stats.released += 1;
    }

    (output, stats)
}

/// Write source pixels into display frame under a renderer mapping.
/// Acquire failure leaves the previous (stale) contents in place.
fn upload(
    source: &Frame,
    display: &mut Frame,
    renderer: &mut dyn Renderer,
    converter: &dyn ColorConverter,
    stats: &mut ReconcileStats,
) {
    let view_id = display.view_id();
    let mut mapped = match MappedFrame::map(renderer, display) {
        Ok(mapped) => mapped,
        Err(e) => {
            warn!("View {:?}: get_frame failed ({}), showing stale content", view_id, e);
            stats.acquire_failures += 1;
            return;
        }
    };

    let target = mapped.frame();
    if source.format() == target.format() {
        target.copy_planes_from(source);
        stats.copied += 1;
    } else {
        match converter.convert(source, target) {
            Ok(()) => stats.converted += 1,
            Err(e) => {
                warn!("View {:?}: color conversion failed: {}", view_id, e);
                stats.conversion_failures += 1;
            }
        }
    }
}

/// Display frames owned between ticks (the "last displayed" list).
#[derive(Debug, Default)]
pub struct FramePool {
    frames: Vec<Frame>,
}

impl FramePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile pooled frames against a new source list
    pub fn reconcile(
        &mut self,
        sources: &[Frame],
        renderer: &mut dyn Renderer,
        converter: &dyn ColorConverter,
    ) -> ReconcileStats {
        let previous = std::mem::take(&mut self.frames);
        let (frames, stats) = reconcile_frames(sources, previous, renderer, converter);
        self.frames = frames;
        stats
    }

    /// Deallocate every pooled frame. Returns how many were released.
    pub fn release_all(&mut self, renderer: &mut dyn Renderer) -> usize {
        let n = self.frames.len();
        for frame in self.frames.drain(..) {
            renderer.deallocate(frame);
        }
        n
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ColorModel, Plane, ViewId};
    use crate::testing::{source_frame, RecordingConverter, RecordingRenderer, CONVERTED_MARKER};
    use std::sync::atomic::Ordering;

    fn reconcile(pool: &mut FramePool, sources: &[Frame], renderer: &mut RecordingRenderer) -> ReconcileStats {
        pool.reconcile(sources, renderer, &RecordingConverter::default())
    }

    #[test]
    fn test_reuse_same_resolution() {
        let mut renderer = RecordingRenderer::new();
        let mut pool = FramePool::new();

        reconcile(&mut pool, &[source_frame(1, 64, 64, 1)], &mut renderer);
        let first_id = pool.frames()[0].id();

        let stats = reconcile(&mut pool, &[source_frame(1, 64, 64, 2)], &mut renderer);
        assert_eq!(pool.frames()[0].id(), first_id);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.allocated, 0);

        let log = renderer.log();
        assert_eq!(log.allocations.len(), 1);
        assert!(log.deallocations.is_empty());
        drop(log);

        // Pixel data from the latest source
        assert!(pool.frames()[0].plane(Plane::P0).iter().all(|b| *b == 2));
    }

    #[test]
    fn test_resolution_change_reallocates_once() {
        let mut renderer = RecordingRenderer::new();
        let mut pool = FramePool::new();

        reconcile(&mut pool, &[source_frame(1, 64, 64, 0)], &mut renderer);
        let old_id = pool.frames()[0].id();
        let stats = reconcile(&mut pool, &[source_frame(1, 128, 128, 0)], &mut renderer);

        assert_eq!(stats.reallocated, 1);
        assert_eq!(stats.allocated, 1);
        let log = renderer.log();
        assert_eq!(log.deallocations, vec![(old_id, 64, 64)]);
        assert_eq!(log.allocations.len(), 2);
        assert_eq!((log.allocations[1].width, log.allocations[1].height), (128, 128));
        drop(log);
        assert_eq!(pool.frames()[0].width(), 128);
        assert_eq!(pool.frames()[0].view_id(), Some(ViewId(1)));
    }

    #[test]
    fn test_vanished_view_released() {
        let mut renderer = RecordingRenderer::new();
        let mut pool = FramePool::new();

        reconcile(&mut pool, &[source_frame(1, 8, 8, 0), source_frame(2, 8, 8, 0)], &mut renderer);
        let view2_id = pool.frames()[1].id();

        let stats = reconcile(&mut pool, &[source_frame(1, 8, 8, 0)], &mut renderer);
        assert_eq!(stats.released, 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(renderer.log().deallocations, vec![(view2_id, 8, 8)]);
    }

    #[test]
    fn test_order_follows_sources() {
        let mut renderer = RecordingRenderer::new();
        let mut pool = FramePool::new();

        reconcile(&mut pool, &[source_frame(1, 8, 8, 0), source_frame(2, 8, 8, 0)], &mut renderer);
        reconcile(&mut pool, &[source_frame(2, 8, 8, 0), source_frame(1, 8, 8, 0)], &mut renderer);
        let views: Vec<_> = pool.frames().iter().map(|f| f.view_id()).collect();
        assert_eq!(views, vec![Some(ViewId(2)), Some(ViewId(1))]);
        assert_eq!(renderer.log().allocations.len(), 2);
    }

    #[test]
    fn test_allocation_failure_skips_view() {
        let mut renderer = RecordingRenderer::new();
        renderer.log().fail_allocations = 1;
        let mut pool = FramePool::new();

        let stats = reconcile(&mut pool, &[source_frame(1, 8, 8, 0), source_frame(2, 8, 8, 0)], &mut renderer);
        assert_eq!(stats.allocation_failures, 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.frames()[0].view_id(), Some(ViewId(2)));

        // Retried next pass
        let stats = reconcile(&mut pool, &[source_frame(1, 8, 8, 0), source_frame(2, 8, 8, 0)], &mut renderer);
        assert_eq!(stats.allocated, 1);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_acquire_failure_keeps_stale_frame() {
        let mut renderer = RecordingRenderer::new();
        let mut pool = FramePool::new();
        reconcile(&mut pool, &[source_frame(1, 8, 8, 5)], &mut renderer);

        renderer.log().fail_get = true;
        let stats = reconcile(&mut pool, &[source_frame(1, 8, 8, 9)], &mut renderer);
        assert_eq!(stats.acquire_failures, 1);
        assert_eq!(pool.len(), 1);
        assert!(pool.frames()[0].plane(Plane::P0).iter().all(|b| *b == 5));

        let log = renderer.log();
        assert_eq!(log.gets, log.releases);
    }

    #[test]
    fn test_format_mismatch_converts_and_releases() {
        let mut renderer = RecordingRenderer::new();
        renderer.log().display_color = Some(ColorModel::Bgra32);
        let converter = RecordingConverter::default();
        let mut pool = FramePool::new();

        let stats = pool.reconcile(&[source_frame(1, 4, 4, 0)], &mut renderer, &converter);
        assert_eq!(stats.converted, 1);
        assert_eq!(stats.copied, 0);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool.frames()[0].plane(Plane::P0)[0], CONVERTED_MARKER);

        let failing = RecordingConverter { fail: true, ..Default::default() };
        let stats = pool.reconcile(&[source_frame(1, 4, 4, 0)], &mut renderer, &failing);
        assert_eq!(stats.conversion_failures, 1);
        assert_eq!(pool.len(), 1);

        let log = renderer.log();
        assert_eq!(log.gets, 2);
        assert_eq!(log.releases, 2);
    }

    #[test]
    fn test_empty_sources_is_passthrough() {
        let mut renderer = RecordingRenderer::new();
        let (frames, stats) = reconcile_frames(&[], Vec::new(), &mut renderer, &RecordingConverter::default());
        assert!(frames.is_empty());
        assert_eq!(stats, ReconcileStats::default());
    }

    #[test]
    fn test_duplicate_view_keeps_first_frame() {
        let mut renderer = RecordingRenderer::new();
        let mut pool = FramePool::new();

        let stats = reconcile(&mut pool, &[source_frame(1, 8, 8, 5), source_frame(1, 8, 8, 9)], &mut renderer);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.allocated, 1);
        assert_eq!(pool.len(), 1);
        assert!(pool.frames()[0].plane(Plane::P0).iter().all(|b| *b == 5));

        // Stays at one entry on the next pass
        let stats = reconcile(&mut pool, &[source_frame(1, 8, 8, 0), source_frame(1, 16, 16, 0)], &mut renderer);
        assert_eq!((stats.reused, stats.duplicates), (1, 1));
        assert_eq!(pool.len(), 1);
        assert_eq!(renderer.log().allocations.len(), 1);
    }

    #[test]
    fn test_release_all() {
        let mut renderer = RecordingRenderer::new();
        let mut pool = FramePool::new();
        reconcile(&mut pool, &[source_frame(1, 8, 8, 0), source_frame(2, 8, 8, 0)], &mut renderer);

        assert_eq!(pool.release_all(&mut renderer), 2);
        assert!(pool.is_empty());
        assert_eq!(pool.release_all(&mut renderer), 0);
        assert_eq!(renderer.log().deallocations.len(), 2);
    }
}
