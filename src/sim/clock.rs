//! 仿真时钟
//!
//! 维护当前时间与待唤醒时间集合。各组件通过 `schedule_after` 登记自己的截止时间，
//! 然后在每个 tick 用 `is_due` 与当前时间做相等比较来决定是否行动。

use std::collections::BTreeSet;

use super::time::SimTime;
use crate::error::SimError;
use tracing::{debug, trace};

/// 虚拟时钟：当前时间、待唤醒时间（最小优先且去重）、时隙与路由更新边界。
#[derive(Debug, Clone)]
pub struct Clock {
    now: SimTime,
    pending: BTreeSet<SimTime>,
    slot_len: SimTime,
    next_slot: SimTime,
    slot_boundary: bool,
    routing_period: Option<SimTime>,
    next_routing: SimTime,
    routing_boundary: bool,
    duration: SimTime,
}

impl Clock {
    /// 创建时钟。t=0 同时是时隙边界和路由边界（没有周期时路由只在 t=0 计算一次），
    /// 并立即登记下一个时隙结束时间。
    pub fn new(slot_len: SimTime, duration: SimTime) -> Self {
        let mut clock = Self {
            now: SimTime::ZERO,
            pending: BTreeSet::new(),
            slot_len,
            next_slot: SimTime::ZERO,
            slot_boundary: true,
            routing_period: None,
            next_routing: SimTime::ZERO,
            routing_boundary: true,
            duration,
        };
        clock.next_slot = clock.schedule_after(slot_len);
        clock
    }

    /// 开启周期性的路由更新边界（t=0 也是一次边界）。
    pub fn with_routing_period(mut self, period: SimTime) -> Self {
        self.routing_period = Some(period);
        self.next_routing = self.schedule_after(period);
        self
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn duration(&self) -> SimTime {
        self.duration
    }

    pub fn slot_len(&self) -> SimTime {
        self.slot_len
    }

    /// 当前 tick 是否落在时隙边界上
    pub fn is_slot_boundary(&self) -> bool {
        self.slot_boundary
    }

    /// 当前 tick 是否落在路由更新边界上
    pub fn is_routing_boundary(&self) -> bool {
        self.routing_boundary
    }

    /// 截止时间是否恰好是现在（相等比较，不做时长运算）
    pub fn is_due(&self, at: SimTime) -> bool {
        self.now == at
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 登记 `now + delta` 为唤醒时间并返回该绝对时间。重复登记同一时间没有额外效果。
    pub fn schedule_after(&mut self, delta: SimTime) -> SimTime {
        let at = self.now.saturating_add(delta);
        if self.pending.insert(at) {
            trace!(now = ?self.now, at = ?at, "登记唤醒时间");
        }
        at
    }

    /// 推进到最早的唤醒时间。
    ///
    /// 返回当前时间是否仍小于配置的运行时长。尚未到达时长时，队列为空或最早的
    /// 唤醒时间不晚于当前时间（零长度的时隙或截止时间）都说明仿真卡住。
    pub fn advance(&mut self) -> Result<bool, SimError> {
        let stalled = SimError::Stalled {
            now: self.now,
            duration: self.duration,
        };
        let Some(next) = self.pending.pop_first() else {
            if self.now >= self.duration {
                return Ok(false);
            }
            return Err(stalled);
        };
        if next <= self.now && self.now < self.duration {
            return Err(stalled);
        }
        self.now = next;

        self.slot_boundary = next == self.next_slot;
        if self.slot_boundary {
            self.next_slot = self.schedule_after(self.slot_len);
        }

        self.routing_boundary = false;
        if let Some(period) = self.routing_period {
            if next == self.next_routing {
                self.routing_boundary = true;
                self.next_routing = self.schedule_after(period);
            }
        }

        if self.routing_boundary {
            debug!(now = ?self.now, "路由更新边界");
        }
        trace!(
            now = ?self.now,
            slot = self.slot_boundary,
            pending = self.pending.len(),
            "时钟推进"
        );
        Ok(self.now < self.duration)
    }
}
