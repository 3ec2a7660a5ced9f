//! 传输介质
//!
//! 共享总线与点对点链路共用同一个 `Medium`，由 `MediumKind` 区分。
//! 竞争检测分两阶段：尝试阶段各端点 `claim`/`release`，所有尝试结束后再统一 `resolve_status`。

use std::collections::BTreeMap;

use super::id::{EndpointId, FrameId, MediumId, RouterId};
use crate::sim::{Clock, SimTime};
use tracing::{debug, trace};

/// 介质类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediumKind {
    /// 共享总线（一个冲突域）
    SharedBus,
    /// 连接两个路由器的点对点链路，带可变代价
    PointToPoint { ends: (RouterId, RouterId), cost: u32 },
}

/// 网络介质
#[derive(Debug)]
pub struct Medium {
    id: MediumId,
    name: String,
    kind: MediumKind,
    endpoints: Vec<EndpointId>,
    /// 正在传播的帧 -> 交付时间
    in_flight: BTreeMap<FrameId, SimTime>,
    transmitters: u32,
    busy: bool,
    collision: bool,
    round_trip: SimTime,
    pub bandwidth_bps: u64,
}

impl Medium {
    pub fn new_bus(id: MediumId, name: impl Into<String>, round_trip: SimTime, bandwidth_bps: u64) -> Self {
        Self::new(id, name, MediumKind::SharedBus, round_trip, bandwidth_bps)
    }

    pub fn new_link(
        id: MediumId,
        name: impl Into<String>,
        ends: (RouterId, RouterId),
        round_trip: SimTime,
        bandwidth_bps: u64,
    ) -> Self {
        let mut link = Self::new(
            id,
            name,
            MediumKind::PointToPoint { ends, cost: 1 },
            round_trip,
            bandwidth_bps,
        );
        link.endpoints = vec![EndpointId::Router(ends.0), EndpointId::Router(ends.1)];
        link
    }

    fn new(id: MediumId, name: impl Into<String>, kind: MediumKind, round_trip: SimTime, bandwidth_bps: u64) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            endpoints: Vec::new(),
            in_flight: BTreeMap::new(),
            transmitters: 0,
            busy: false,
            collision: false,
            round_trip,
            bandwidth_bps,
        }
    }

    pub fn id(&self) -> MediumId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &MediumKind {
        &self.kind
    }

    pub fn is_bus(&self) -> bool {
        matches!(self.kind, MediumKind::SharedBus)
    }

    pub fn is_link(&self) -> bool {
        matches!(self.kind, MediumKind::PointToPoint { .. })
    }

    pub fn endpoints(&self) -> &[EndpointId] {
        &self.endpoints
    }

    pub fn has_endpoint(&self, ep: EndpointId) -> bool {
        self.endpoints.contains(&ep)
    }

    pub(crate) fn attach(&mut self, ep: EndpointId) {
        if !self.endpoints.contains(&ep) {
            self.endpoints.push(ep);
        }
    }

    /// 链路两端的路由器
    pub fn link_ends(&self) -> Option<(RouterId, RouterId)> {
        match self.kind {
            MediumKind::PointToPoint { ends, .. } => Some(ends),
            MediumKind::SharedBus => None,
        }
    }

    /// 链路另一端的路由器
    pub fn peer_of(&self, router: RouterId) -> Option<RouterId> {
        let (a, b) = self.link_ends()?;
        if a == router {
            Some(b)
        } else if b == router {
            Some(a)
        } else {
            None
        }
    }

    pub fn cost(&self) -> Option<u32> {
        match self.kind {
            MediumKind::PointToPoint { cost, .. } => Some(cost),
            MediumKind::SharedBus => None,
        }
    }

    /// 设置链路代价；对总线无效果
    pub fn set_cost(&mut self, new_cost: u32) {
        if let MediumKind::PointToPoint { cost, .. } = &mut self.kind {
            *cost = new_cost;
        }
    }

    pub fn round_trip(&self) -> SimTime {
        self.round_trip
    }

    pub fn transmitters(&self) -> u32 {
        self.transmitters
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn has_collision(&self) -> bool {
        self.collision
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// 载波侦听：总线空闲才允许接入；点对点链路的出口槽位由端点独占，总是允许
    pub fn can_access(&self) -> bool {
        match self.kind {
            MediumKind::SharedBus => !self.busy,
            MediumKind::PointToPoint { .. } => true,
        }
    }

    /// 又一个端点开始占用介质
    pub fn claim(&mut self) {
        self.transmitters += 1;
        trace!(medium = %self.name, transmitters = self.transmitters, "claim");
    }

    /// 一个端点放弃占用（碰撞后）
    pub fn release(&mut self) {
        debug_assert!(self.transmitters > 0, "release without claim on {}", self.name);
        self.transmitters = self.transmitters.saturating_sub(1);
        trace!(medium = %self.name, transmitters = self.transmitters, "release");
    }

    /// 根据发送者计数刷新忙/碰撞标志。
    ///
    /// 仅当计数从 ≤1 跳变到 >1 时返回 true（新碰撞），碰撞持续期间不重复报告。
    pub fn resolve_status(&mut self) -> bool {
        let was_collision = self.collision;
        self.busy = self.transmitters > 0;
        self.collision = self.transmitters > 1;
        let fresh = self.collision && !was_collision;
        if fresh {
            debug!(medium = %self.name, transmitters = self.transmitters, "💥 检测到新碰撞");
        }
        fresh
    }

    /// 帧完成串行发送后进入传播阶段。返回往返时延，调用方据此安排自己的截止时间。
    #[tracing::instrument(skip(self, clock), fields(medium = %self.name, frame = frame.0))]
    pub fn put_on_bus(&mut self, frame: FrameId, clock: &mut Clock) -> SimTime {
        let deliver_at = clock.schedule_after(self.round_trip);
        self.in_flight.insert(frame, deliver_at);
        debug!(deliver_at = ?deliver_at, "帧进入传播阶段");
        self.round_trip
    }

    /// 取出交付时间恰为 `now` 的帧，并为每一帧减少发送者计数。
    ///
    /// 返回的帧由调用方交付给下一跳，并把 ACK 交给上一跳。
    pub fn check_if_frames_done(&mut self, now: SimTime) -> Vec<FrameId> {
        let done: Vec<FrameId> = self
            .in_flight
            .iter()
            .filter(|(_, at)| **at == now)
            .map(|(id, _)| *id)
            .collect();
        for id in &done {
            self.in_flight.remove(id);
            self.transmitters = self.transmitters.saturating_sub(1);
        }
        if !done.is_empty() {
            trace!(medium = %self.name, delivered = done.len(), transmitters = self.transmitters, "传播完成");
        }
        done
    }

    /// 计算发送指定 bit 数所需的时间（向上取整到微秒）
    pub fn tx_time(&self, bits: u64) -> SimTime {
        if self.bandwidth_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let micros = ((bits as u128).saturating_mul(1_000_000u128) + (self.bandwidth_bps as u128 - 1))
            / self.bandwidth_bps as u128;
        SimTime(micros.min(u64::MAX as u128) as u64)
    }
}
