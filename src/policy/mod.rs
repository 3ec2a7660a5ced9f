//! 随机策略（退避与到达过程）
//!
//! 策略本身无状态，随机数源由调用方传入，整个仿真只用一个带种子的 RNG，保证可复现。

use rand::RngCore;

mod arrival;
mod backoff;

pub use arrival::PoissonArrivals;
pub use backoff::{BinaryExponentialBackoff, MAX_BACKOFF};

/// 碰撞后的退避策略：返回需要等待的时隙边界数（至少为 1）
pub trait BackoffPolicy: std::fmt::Debug {
    fn backoff_slots(&self, consecutive_collisions: u32, rng: &mut dyn RngCore) -> u32;
}

/// 到达过程：每个时隙为一个站点产生的新帧数
pub trait ArrivalProcess: std::fmt::Debug {
    fn arrivals(&self, rng: &mut dyn RngCore) -> u32;
}
