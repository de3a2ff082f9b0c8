//! Core engine modules - scene queue, frame pool, speed, scheduler, events
//!
//! These modules form the render engine, independent of any display backend.

pub mod event_bus;
pub mod frame_pool;
pub mod render_events;
pub mod scene_queue;
pub mod scheduler;
pub mod speed;

// Re-exports for convenience
pub use event_bus::{Event, EventBus, EventEmitter};
pub use frame_pool::{reconcile_frames, FramePool, ReconcileStats};
pub use render_events::SceneRendered;
pub use scene_queue::SceneQueue;
pub use scheduler::{RenderScheduler, SchedulerHandle, SchedulerState, TickReport};
pub use speed::SpeedEstimator;
