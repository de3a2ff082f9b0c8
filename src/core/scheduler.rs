//! Render scheduler: fixed-cadence tick loop between scene producers and the renderer
//!
//! **Architecture**: Producers (decode/processing threads) hold a cloneable
//! [`SchedulerHandle`] and only touch three shared fields: the scene queue,
//! the view layout and the speed estimate. Everything else (display frame
//! pool, last source/displayed scene) lives in a [`RenderLoop`] owned by the
//! render thread, so it needs no locking.
//!
//! **Used by**: Host application (Start/Stop, layout), decode pipeline
//! (RenderScene), UI (speed ratio, SceneRendered observers).
//!
//! # Tick
//!
//! Every `tick_period` (8 ms default) the render thread:
//! 1. Pops at most one scene; reconciles its frames against the pool and
//!    remembers it as the last source scene
//! 2. Without new input, re-reconciles the last source if the pool was emptied
//!    (reset request), so something stays on screen
//! 3. Attaches layout rects to pooled frames whose view is in the layout
//! 4. Renders only when every layout view has a frame (all-or-nothing)
//! 5. Feeds the speed estimator (pts delta vs wall delta)
//! 6. Emits [`SceneRendered`]
//!
//! # Lifecycle
//!
//! `Idle -> Running -> Stopping -> Stopped -> Running ...`
//!
//! The render thread owns the `RenderLoop` while running and hands it back
//! through its `JoinHandle`; `stop()` releases pooled frames only after the
//! join, so no tick can touch a released frame.

use crossbeam_channel::{select, Receiver, Sender};
use log::{debug, error, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::event_bus::{EventBus, EventEmitter};
use super::frame_pool::{FramePool, ReconcileStats};
use super::render_events::SceneRendered;
use super::scene_queue::SceneQueue;
use super::speed::SpeedEstimator;
use crate::config::SchedulerConfig;
use crate::entities::{ColorConverter, Frame, Rect, Renderer, Scene, ViewId, ViewLayout};
use crate::error::{LayoutError, SchedulerError};

pub const RENDER_THREAD_NAME: &str = "yuvtk-render";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// State touched by both producers and the render thread
#[derive(Debug)]
struct Shared {
    queue: SceneQueue,
    layout: Mutex<Arc<ViewLayout>>,
    speed: SpeedEstimator,
    reset_requested: AtomicBool,
}

impl Shared {
    fn new(config: &SchedulerConfig) -> Self {
        Self {
            queue: SceneQueue::with_capacity(config.max_pending_scenes),
            layout: Mutex::new(Arc::new(ViewLayout::empty())),
            speed: SpeedEstimator::new(config.speed_smoothing, config.speed_max_sample_ms),
            reset_requested: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current layout (cheap Arc clone)
    fn layout(&self) -> Arc<ViewLayout> {
        Arc::clone(&self.layout.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Producer-side handle. Cheap to clone, safe to use from any thread.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
}

impl SchedulerHandle {
    /// Queue a scene for rendering (never blocks the producer)
    pub fn render_scene(&self, frames: Vec<Frame>, pts: Option<u32>, seeking: bool) {
        self.push_scene(Scene::new(frames, pts, seeking));
    }

    pub fn push_scene(&self, scene: Scene) {
        if let Some(dropped) = self.shared.queue.push(scene) {
            debug!("Dropped pending scene pts={:?}", dropped.pts);
        }
    }

    /// Replace the layout from parallel lists. Applies from the next tick.
    pub fn set_layout(&self, view_ids: Vec<ViewId>, src_rects: Vec<Rect>, dst_rects: Vec<Rect>) -> Result<(), LayoutError> {
        let layout = ViewLayout::new(view_ids, src_rects, dst_rects)?;
        self.apply_layout(layout);
        Ok(())
    }

    pub fn apply_layout(&self, layout: ViewLayout) {
        debug!("Layout updated: {} views", layout.len());
        *self.shared.layout.lock().unwrap_or_else(|e| e.into_inner()) = Arc::new(layout);
    }

    pub fn layout(&self) -> Arc<ViewLayout> {
        self.shared.layout()
    }

    pub fn speed_ratio(&self) -> f32 {
        self.shared.speed.get()
    }

    /// Release all display frames on the next tick; they are rebuilt from the
    /// last source scene (e.g. after the render surface was recreated).
    pub fn request_reset(&self) {
        self.shared.reset_requested.store(true, Ordering::Release);
    }

    pub fn pending_scenes(&self) -> usize {
        self.shared.queue.len()
    }
}

/// What happened during one tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// A new scene was popped from the queue
    pub dequeued: bool,
    /// The last source scene was re-reconciled into an empty pool
    pub refreshed: bool,
    /// Layout views covered by a placed frame / views the layout expects
    pub composited: usize,
    pub expected: usize,
    pub rendered: bool,
    pub pts_delta: u32,
    pub wall_delta_ms: u32,
    pub speed_updated: bool,
    pub reconcile: ReconcileStats,
}

/// Render-thread state: collaborators, frame pool, last scenes.
struct RenderLoop {
    shared: Arc<Shared>,
    renderer: Box<dyn Renderer>,
    converter: Box<dyn ColorConverter>,
    emitter: EventEmitter,
    pool: FramePool,
    last_source: Option<Arc<Scene>>,
    last_pts: Option<u32>,
    last_seeking: bool,
    wall_marker: Instant,
}

impl RenderLoop {
    fn new(
        shared: Arc<Shared>,
        renderer: Box<dyn Renderer>,
        converter: Box<dyn ColorConverter>,
        emitter: EventEmitter,
    ) -> Self {
        Self {
            shared,
            renderer,
            converter,
            emitter,
            pool: FramePool::new(),
            last_source: None,
            last_pts: None,
            last_seeking: false,
            wall_marker: Instant::now(),
        }
    }

    fn prepare_start(&mut self, now: Instant) {
        self.last_pts = None;
        self.last_seeking = false;
        self.wall_marker = now;
    }

    fn tick(&mut self) -> TickReport {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport::default();

        if self.shared.reset_requested.swap(false, Ordering::AcqRel) {
            let released = self.pool.release_all(self.renderer.as_mut());
            debug!("Render reset: released {} display frames", released);
        }

        if let Some(scene) = self.shared.queue.pop_oldest() {
            if let (Some(pts), Some(last)) = (scene.pts, self.last_pts) {
                if pts >= last {
                    report.pts_delta = pts - last;
                }
            }
            report.reconcile = self
                .pool
                .reconcile(&scene.frames, self.renderer.as_mut(), self.converter.as_ref());
            report.dequeued = true;
            self.last_pts = scene.pts;
            self.last_seeking = scene.seeking;
            self.last_source = Some(Arc::new(scene));
        } else if self.pool.is_empty() {
            if let Some(source) = self.last_source.as_ref().filter(|s| !s.is_empty()) {
                report.reconcile = self
                    .pool
                    .reconcile(&source.frames, self.renderer.as_mut(), self.converter.as_ref());
                report.refreshed = true;
            }
        }

        // Place frames by layout; views not in the layout stay pooled but off screen
        let layout = self.shared.layout();
        for frame in self.pool.frames_mut() {
            match frame.view_id().and_then(|v| layout.lookup(v)) {
                Some(entry) => frame.set_placement(entry.src, entry.dst),
                None => frame.clear_placement(),
            }
        }
        let composite: Vec<&Frame> = self.pool.frames().iter().filter(|f| f.is_placed()).collect();
        let covered = layout
            .view_ids()
            .filter(|v| composite.iter().any(|f| f.view_id() == Some(*v)))
            .count();
        report.composited = covered;
        report.expected = layout.len();
        let prepared = Instant::now();

        if !composite.is_empty() && covered == layout.len() {
            self.renderer.render_scene(&composite);
            report.rendered = true;
        } else if !composite.is_empty() {
            trace!(
                "Partial composite ({}/{} views), keeping previous presentation",
                covered,
                layout.len()
            );
        }
        let rendered_at = Instant::now();

        let wall_ms = now.saturating_duration_since(self.wall_marker).as_millis();
        report.wall_delta_ms = u32::try_from(wall_ms).unwrap_or(u32::MAX);
        report.speed_updated = self.shared.speed.update(report.pts_delta, report.wall_delta_ms);
        self.wall_marker = now;

        if let Some(scene) = &self.last_source {
            self.emitter.emit(SceneRendered {
                scene: Arc::clone(scene),
                pts: self.last_pts,
                seeking: self.last_seeking,
                rendered: report.rendered,
            });
        }

        trace!(
            "Tick: prepare {:?}, render {:?}",
            prepared.duration_since(started),
            rendered_at.duration_since(prepared)
        );
        report
    }

    /// Release pooled frames and forget last scenes
    fn shutdown(&mut self) -> usize {
        let released = self.pool.release_all(self.renderer.as_mut());
        self.last_source = None;
        self.last_pts = None;
        self.last_seeking = false;
        released
    }
}

fn run_loop(mut render_loop: RenderLoop, period: Duration, stop_rx: Receiver<()>) -> RenderLoop {
    let ticker = crossbeam_channel::tick(period);
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                render_loop.tick();
            }
        }
    }
    render_loop
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<RenderLoop>,
}

/// Owns the render thread and its lifecycle.
///
/// # Example
/// ```ignore
/// let mut scheduler = RenderScheduler::new(renderer, converter, SchedulerConfig::default());
/// let handle = scheduler.handle();
/// handle.set_layout(vec![ViewId(1)], vec![src], vec![dst])?;
/// scheduler.start()?;
/// handle.render_scene(frames, Some(pts), false); // from the decode thread
/// scheduler.stop()?;
/// ```
pub struct RenderScheduler {
    shared: Arc<Shared>,
    events: EventBus,
    config: SchedulerConfig,
    state: SchedulerState,
    parked: Option<RenderLoop>, // loop state while not running
    worker: Option<Worker>,
}

impl RenderScheduler {
    pub fn new<R, C>(renderer: R, converter: C, config: SchedulerConfig) -> Self
    where
        R: Renderer + 'static,
        C: ColorConverter + 'static,
    {
        let shared = Arc::new(Shared::new(&config));
        let events = EventBus::new();
        let parked = RenderLoop::new(
            Arc::clone(&shared),
            Box::new(renderer),
            Box::new(converter),
            events.emitter(),
        );
        Self {
            shared,
            events,
            config,
            state: SchedulerState::Idle,
            parked: Some(parked),
            worker: None,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Subscribe here to receive [`SceneRendered`]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn render_scene(&self, frames: Vec<Frame>, pts: Option<u32>, seeking: bool) {
        self.handle().render_scene(frames, pts, seeking);
    }

    pub fn set_layout(&self, view_ids: Vec<ViewId>, src_rects: Vec<Rect>, dst_rects: Vec<Rect>) -> Result<(), LayoutError> {
        self.handle().set_layout(view_ids, src_rects, dst_rects)
    }

    pub fn speed_ratio(&self) -> f32 {
        self.shared.speed.get()
    }

    /// Spawn the render thread and start ticking.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.state == SchedulerState::Running {
            return Err(SchedulerError::AlreadyRunning);
        }
        let mut render_loop = self.parked.take().ok_or(SchedulerError::RendererLost)?;
        render_loop.prepare_start(Instant::now());

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let period = self.config.tick_period();
        let handle = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || {
                trace!("Render thread started ({:?} period)", period);
                let render_loop = run_loop(render_loop, period, stop_rx);
                trace!("Render thread stopped");
                render_loop
            })?;

        self.worker = Some(Worker { stop_tx, handle });
        self.state = SchedulerState::Running;
        info!("Render scheduler started (tick {} ms)", self.config.tick_period_ms);
        Ok(())
    }

    /// Stop ticking, wait for the in-flight tick, release all display frames
    /// and drop pending scenes. No-op when not running.
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        let Some(worker) = self.worker.take() else {
            trace!("Render scheduler not running, stop ignored");
            return Ok(());
        };
        self.state = SchedulerState::Stopping;

        // Receiver gone means the thread already exited; join below still works
        let _ = worker.stop_tx.send(());
        let result = match worker.handle.join() {
            Ok(mut render_loop) => {
                let released = render_loop.shutdown();
                debug!("Released {} display frames", released);
                self.parked = Some(render_loop);
                Ok(())
            }
            Err(_) => {
                error!("Render thread panicked, renderer state lost");
                Err(SchedulerError::RenderThreadPanicked)
            }
        };

        let dropped = self.shared.queue.clear();
        self.shared.reset_requested.store(false, Ordering::Release);
        self.state = SchedulerState::Stopped;
        info!("Render scheduler stopped ({} pending scenes dropped)", dropped);
        result
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                warn!("Render scheduler stop on drop failed: {}", e);
            }
        }
    }
}
