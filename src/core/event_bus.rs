//! Typed notification bus between the render thread and its observers.
//!
//! **Why**: The render thread must never wait on an observer. Callbacks run
//! inline on the emitting thread and must be cheap; observers living on other
//! threads take a bounded channel instead, which drops events when full.
//!
//! **Used by**: RenderLoop (emits [`SceneRendered`](super::render_events::SceneRendered)
//! once per tick), hosts and the headless binary (subscribe).
//!
//! Callbacks of one event type run in subscription order.

use crossbeam_channel::{Receiver, TrySendError};
use log::trace;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Anything that can travel over the bus.
pub trait Event: Any + Send + Sync {}

impl<T: Any + Send + Sync> Event for T {}

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

type HandlerTable = Arc<RwLock<HashMap<TypeId, Vec<Handler>>>>;

/// Subscriber registry. Clones share the same table.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: HandlerTable,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` on the emitting thread for every `E`.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push(handler);
    }

    /// Deliver every `E` into a bounded channel of `capacity` (at least 1).
    pub fn subscribe_channel<E: Event + Clone>(&self, capacity: usize) -> Receiver<E> {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        self.subscribe::<E, _>(move |event| {
            if let Err(TrySendError::Full(_)) = tx.try_send(event.clone()) {
                trace!("Observer channel full, {} dropped", std::any::type_name::<E>());
            }
        });
        rx
    }

    pub fn emit<E: Event>(&self, event: E) {
        dispatch(&self.handlers, &event);
    }

    /// Emit-only handle for the render thread.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

fn dispatch<E: Event>(handlers: &HandlerTable, event: &E) {
    // Clone the list out so handlers may subscribe without deadlocking
    let matching = match handlers
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&TypeId::of::<E>())
    {
        Some(list) => list.clone(),
        None => return,
    };
    for handler in &matching {
        handler(event as &dyn Any);
    }
}

#[derive(Clone)]
pub struct EventEmitter {
    handlers: HandlerTable,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter").finish_non_exhaustive()
    }
}

impl EventEmitter {
    pub fn emit<E: Event>(&self, event: E) {
        dispatch(&self.handlers, &event);
    }
}
