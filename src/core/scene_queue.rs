//! FIFO of scenes between producer threads and the render thread.
//!
//! Strict push order, no coalescing: every pushed scene is rendered once when
//! reached. An optional capacity turns on drop-oldest eviction for hosts that
//! prefer bounded memory over replaying a backlog (off by default).

use log::warn;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::entities::Scene;

#[derive(Debug, Default)]
pub struct SceneQueue {
    scenes: Mutex<VecDeque<Scene>>,
    capacity: Option<usize>,
}

impl SceneQueue {
    /// Unbounded queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue that evicts the oldest scene once `capacity` scenes are pending.
    /// `None` (or 0) keeps it unbounded.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            scenes: Mutex::new(VecDeque::new()),
            capacity: capacity.filter(|c| *c > 0),
        }
    }

    /// Append scene. Never blocks beyond the queue lock.
    ///
    /// Returns the evicted scene when a bounded queue was full.
    pub fn push(&self, scene: Scene) -> Option<Scene> {
        let mut scenes = self.scenes.lock().unwrap_or_else(|e| e.into_inner());
        let evicted = match self.capacity {
            Some(cap) if scenes.len() >= cap => {
                warn!("SceneQueue full ({} scenes), dropping oldest", scenes.len());
                scenes.pop_front()
            }
            _ => None,
        };
        scenes.push_back(scene);
        evicted
    }

    /// Remove and return the earliest pushed scene
    pub fn pop_oldest(&self) -> Option<Scene> {
        self.scenes.lock().unwrap_or_else(|e| e.into_inner()).pop_front()
    }

    /// Drop all pending scenes, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut scenes = self.scenes.lock().unwrap_or_else(|e| e.into_inner());
        let n = scenes.len();
        scenes.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.scenes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn scene(pts: u32) -> Scene {
        Scene::new(Vec::new(), Some(pts), false)
    }

    #[test]
    fn test_fifo_order() {
        let queue = SceneQueue::new();
        for pts in 0..10 {
            assert!(queue.push(scene(pts)).is_none());
        }
        let popped: Vec<_> = std::iter::from_fn(|| queue.pop_oldest()).map(|s| s.pts).collect();
        assert_eq!(popped, (0..10).map(Some).collect::<Vec<_>>());
        assert!(queue.pop_oldest().is_none());
    }

    #[test]
    fn test_concurrent_producers_no_loss_no_dup() {
        let queue = Arc::new(SceneQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|p| {
                let q = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..250 {
                        q.push(scene(p * 1000 + i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut seen: Vec<u32> = std::iter::from_fn(|| queue.pop_oldest())
            .filter_map(|s| s.pts)
            .collect();
        assert_eq!(seen.len(), 1000);

        // Per-producer order is preserved
        for p in 0..4 {
            let mine: Vec<u32> = seen.iter().copied().filter(|v| v / 1000 == p).collect();
            assert!(mine.windows(2).all(|w| w[0] < w[1]));
        }

        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_bounded_drops_oldest() {
        let queue = SceneQueue::with_capacity(Some(2));
        queue.push(scene(1));
        queue.push(scene(2));
        let evicted = queue.push(scene(3));
        assert_eq!(evicted.and_then(|s| s.pts), Some(1));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_oldest().and_then(|s| s.pts), Some(2));
    }

    #[test]
    fn test_clear() {
        let queue = SceneQueue::with_capacity(Some(0));
        assert_eq!(queue.capacity(), None);
        queue.push(scene(1));
        queue.push(scene(2));
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }
}
