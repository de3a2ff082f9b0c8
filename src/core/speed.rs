//! Playback speed estimate: presentation-time advance per wall-clock time.
//!
//! First-order EMA: `ratio += smoothing * (pts_delta / wall_delta - ratio)`.
//! Samples with a zero or oversized delta (pause, seek, stall) are ignored
//! and leave the ratio untouched.
//!
//! Written only by the render thread; read from any thread without locking.

use log::trace;
use std::sync::atomic::{AtomicU32, Ordering};

/// EMA smoothing factor
pub const DEFAULT_SMOOTHING: f32 = 0.1;

/// Largest accepted delta (ms) for either clock
pub const DEFAULT_MAX_SAMPLE_MS: u32 = 1000;

#[derive(Debug)]
pub struct SpeedEstimator {
    ratio_bits: AtomicU32, // f32 bits
    smoothing: f32,
    max_sample: u32,
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING, DEFAULT_MAX_SAMPLE_MS)
    }
}

impl SpeedEstimator {
    pub fn new(smoothing: f32, max_sample: u32) -> Self {
        Self {
            ratio_bits: AtomicU32::new(1.0f32.to_bits()),
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
            max_sample,
        }
    }

    /// Feed one sample. Returns `true` if it was accepted.
    pub fn update(&self, pts_delta: u32, wall_delta: u32) -> bool {
        if pts_delta == 0 || wall_delta == 0 || pts_delta > self.max_sample || wall_delta > self.max_sample {
            return false;
        }
        let old = self.get();
        let sample = pts_delta as f32 / wall_delta as f32;
        let new = old + self.smoothing * (sample - old);
        self.ratio_bits.store(new.to_bits(), Ordering::Release);
        trace!("Speed sample pts={} wall={} -> ratio {:.3}", pts_delta, wall_delta, new);
        true
    }

    /// Current estimate (1.0 = real time)
    pub fn get(&self) -> f32 {
        f32::from_bits(self.ratio_bits.load(Ordering::Acquire))
    }

    pub fn reset(&self) {
        self.ratio_bits.store(1.0f32.to_bits(), Ordering::Release);
    }
}
