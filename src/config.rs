//! 仿真配置
//!
//! 所有常量集中在 `SimConfig`，可以从 JSON 文件加载，缺省字段使用参考场景的取值。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::SimTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// 时隙长度（微秒）
    pub slot_us: u64,
    /// 运行时长（微秒）
    pub duration_us: u64,
    /// 帧大小（bit）
    pub frame_bits: u64,
    /// 共享总线带宽（bps）
    pub bus_bandwidth_bps: u64,
    /// 点对点链路带宽（bps）
    pub link_bandwidth_bps: u64,
    /// 端点间距离（米）
    pub segment_length_m: u64,
    /// 信号传播速度（米/秒）
    pub propagation_mps: u64,
    /// 路由重算周期（微秒）
    pub routing_period_us: u64,
    /// 每时隙每站点的平均到达帧数
    pub arrival_mean: f64,
    pub max_backoff: u32,
    pub link_cost_min: u32,
    pub link_cost_max: u32,
    pub seed: u64,
    /// 帧池预分配槽位数
    pub frame_pool: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            slot_us: 50,
            duration_us: 30_000_000,
            frame_bits: 8_000,
            bus_bandwidth_bps: 100_000_000,
            link_bandwidth_bps: 1_000_000_000,
            segment_length_m: 2_000,
            propagation_mps: 200_000_000,
            routing_period_us: 2_000,
            arrival_mean: 0.5,
            max_backoff: 8,
            link_cost_min: 1,
            link_cost_max: 10,
            seed: 0,
            frame_pool: 4_096,
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// 拒绝会让时钟停在原地的参数：任何为零的时隙、帧大小、带宽或往返时延
    /// 都会在当前时刻重复登记唤醒时间。
    pub fn validate(&self) -> Result<(), SimError> {
        let zero = [
            ("slot_us", self.slot_us),
            ("frame_bits", self.frame_bits),
            ("bus_bandwidth_bps", self.bus_bandwidth_bps),
            ("link_bandwidth_bps", self.link_bandwidth_bps),
            ("round trip", self.round_trip().as_micros()),
        ]
        .into_iter()
        .find(|(_, v)| *v == 0);
        if let Some((name, _)) = zero {
            return Err(SimError::InvalidConfig(format!("{name} must be positive")));
        }
        if !(self.arrival_mean.is_finite() && self.arrival_mean >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "arrival_mean must be a finite non-negative number, got {}",
                self.arrival_mean
            )));
        }
        if self.link_cost_min > self.link_cost_max {
            return Err(SimError::InvalidConfig(format!(
                "link cost range {}..={} is empty",
                self.link_cost_min, self.link_cost_max
            )));
        }
        Ok(())
    }

    pub fn slot(&self) -> SimTime {
        SimTime::from_micros(self.slot_us)
    }

    pub fn duration(&self) -> SimTime {
        SimTime::from_micros(self.duration_us)
    }

    pub fn routing_period(&self) -> SimTime {
        SimTime::from_micros(self.routing_period_us)
    }

    /// 往返传播时延：帧到达对端 + ACK 返回
    pub fn round_trip(&self) -> SimTime {
        if self.propagation_mps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let us = 1_000_000u128 * 2 * self.segment_length_m as u128 / self.propagation_mps as u128;
        SimTime(us.min(u64::MAX as u128) as u64)
    }
}
