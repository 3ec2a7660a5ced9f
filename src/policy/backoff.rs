//! 二进制指数退避

use rand::{Rng, RngCore};

use super::BackoffPolicy;

pub const MAX_BACKOFF: u32 = 8;

/// window = min(2^k, max_window)，在 [1, window] 内均匀抽取。
#[derive(Debug, Clone, Copy)]
pub struct BinaryExponentialBackoff {
    max_window: u32,
}

impl BinaryExponentialBackoff {
    pub fn new(max_window: u32) -> Self {
        Self {
            max_window: max_window.max(1),
        }
    }

    pub fn window(&self, consecutive_collisions: u32) -> u32 {
        1u32.checked_shl(consecutive_collisions)
            .unwrap_or(u32::MAX)
            .min(self.max_window)
    }
}

impl Default for BinaryExponentialBackoff {
    fn default() -> Self {
        Self::new(MAX_BACKOFF)
    }
}

impl BackoffPolicy for BinaryExponentialBackoff {
    fn backoff_slots(&self, consecutive_collisions: u32, rng: &mut dyn RngCore) -> u32 {
        let window = self.window(consecutive_collisions);
        rng.gen_range(1..=window)
    }
}
