//! 站点（CSMA/CD 端点）
//!
//! 状态：Idle → BackingOff → Transmitting → AwaitingCollisionCheck → AwaitingAck → Idle。
//! 状态不单独存储，而是由出口槽位与退避计数推导出来。

use super::egress::EgressSlot;
use super::endpoint::{Endpoint, TickContext};
use super::id::{EndpointId, FrameId, MediumId, StationId};
use super::medium::Medium;
use crate::error::SimError;
use crate::report::{ReportEventKind, StationSummary};
use tracing::{debug, info, trace};

/// 站点的访问状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationState {
    Idle,
    BackingOff,
    Transmitting,
    AwaitingCollisionCheck,
    AwaitingAck,
}

/// 站点
#[derive(Debug)]
pub struct Station {
    id: StationId,
    name: String,
    media: Vec<(MediumId, bool)>,
    /// 固定目的站点；未设置时取同一介质上的第一个其他站点
    destination: Option<StationId>,
    /// 还没取出帧的待发数量
    backlog: u64,
    /// 碰撞后等待重传的帧（位于发送缓冲的队首）
    retry: Option<FrameId>,
    backoff: u32,
    consecutive_collisions: u32,
    total_collisions: u64,
    sent: u64,
    received: u64,
    in_flight: Option<EgressSlot>,
}

impl Station {
    /// 创建新站点
    pub fn new(id: StationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            media: Vec::new(),
            destination: None,
            backlog: 0,
            retry: None,
            backoff: 0,
            consecutive_collisions: 0,
            total_collisions: 0,
            sent: 0,
            received: 0,
            in_flight: None,
        }
    }

    pub fn station_id(&self) -> StationId {
        self.id
    }

    pub fn set_destination(&mut self, dst: StationId) {
        self.destination = Some(dst);
    }

    pub fn destination(&self) -> Option<StationId> {
        self.destination
    }

    pub fn media(&self) -> impl Iterator<Item = MediumId> + '_ {
        self.media.iter().map(|(id, _)| *id)
    }

    /// 直接向发送缓冲加入帧（拓扑构建或测试用）
    pub fn push_outstanding(&mut self, n: u64) {
        self.backlog = self.backlog.saturating_add(n);
    }

    /// 待发帧数，包含等待重传的帧
    pub fn outstanding(&self) -> u64 {
        self.backlog + u64::from(self.retry.is_some())
    }

    pub fn retry_frame(&self) -> Option<FrameId> {
        self.retry
    }

    pub fn backoff(&self) -> u32 {
        self.backoff
    }

    pub fn consecutive_collisions(&self) -> u32 {
        self.consecutive_collisions
    }

    pub fn total_collisions(&self) -> u64 {
        self.total_collisions
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn in_flight(&self) -> Option<&EgressSlot> {
        self.in_flight.as_ref()
    }

    pub fn state(&self) -> StationState {
        match &self.in_flight {
            None if self.backoff > 0 => StationState::BackingOff,
            None => StationState::Idle,
            Some(slot) if slot.finish_at.is_some() => StationState::Transmitting,
            Some(slot) if slot.collision_check_at.is_some() => StationState::AwaitingCollisionCheck,
            Some(_) => StationState::AwaitingAck,
        }
    }

    pub fn summary(&self) -> StationSummary {
        StationSummary {
            name: self.name.clone(),
            outstanding: self.outstanding(),
            collisions: self.total_collisions,
            sent: self.sent,
            received: self.received,
        }
    }

    /// 选择目的站点：固定目的地，否则为所连介质上的第一个其他站点
    fn choose_destination(&self, media: &[Medium]) -> Result<StationId, SimError> {
        if let Some(dst) = self.destination {
            return Ok(dst);
        }
        self.media
            .iter()
            .flat_map(|(m, _)| media[m.0].endpoints())
            .find_map(|ep| match ep {
                EndpointId::Station(s) if *s != self.id => Some(*s),
                _ => None,
            })
            .ok_or(SimError::NoDestination { station: self.id })
    }

    /// 选择介质和下一跳：目的站点在同一介质上则直达，否则交给所在总线上的路由器
    fn choose_path(&self, dst: StationId, media: &[Medium]) -> Result<(MediumId, EndpointId), SimError> {
        let target = EndpointId::Station(dst);
        if let Some((m, _)) = self.media.iter().find(|(m, _)| media[m.0].has_endpoint(target)) {
            return Ok((*m, target));
        }
        for (m, is_bus) in &self.media {
            if !is_bus {
                continue;
            }
            let gateway = media[m.0]
                .endpoints()
                .iter()
                .find(|ep| matches!(ep, EndpointId::Router(_)));
            if let Some(gw) = gateway {
                return Ok((*m, *gw));
            }
        }
        Err(SimError::NoViablePath {
            from: EndpointId::Station(self.id),
            to: dst,
        })
    }
}

impl Endpoint for Station {
    fn id(&self) -> EndpointId {
        EndpointId::Station(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attach_medium(&mut self, medium: &Medium) -> Result<(), SimError> {
        if medium.is_link() {
            return Err(SimError::InvalidTopology(format!(
                "station {} cannot attach to point-to-point link {}",
                self.name,
                medium.name()
            )));
        }
        if !self.media.iter().any(|(m, _)| *m == medium.id()) {
            self.media.push((medium.id(), medium.is_bus()));
        }
        Ok(())
    }

    fn generate_frames(&mut self, cx: &mut TickContext<'_>) {
        let arrived = cx.arrivals.arrivals(cx.rng);
        if arrived > 0 {
            self.backlog = self.backlog.saturating_add(u64::from(arrived));
            trace!(station = %self.name, arrived, backlog = self.backlog, "新帧到达");
        }
    }

    #[tracing::instrument(skip(self, cx), fields(station = %self.name, now = ?cx.now()))]
    fn on_slot_boundary(&mut self, cx: &mut TickContext<'_>) -> Result<(), SimError> {
        self.backoff = self.backoff.saturating_sub(1);
        if self.backoff > 0 || self.outstanding() == 0 || self.in_flight.is_some() {
            return Ok(());
        }

        let dst = self.choose_destination(cx.media)?;
        let (medium, next_hop) = self.choose_path(dst, cx.media)?;
        if !cx.medium(medium).can_access() {
            trace!(medium = medium.0, "介质忙，等待下一个时隙");
            return Ok(());
        }

        let frame = match self.retry.take() {
            Some(frame) => frame,
            None => {
                self.backlog -= 1;
                let now = cx.now();
                cx.frames.alloc(self.id, dst, cx.frame_bits, now)
            }
        };
        let me = Endpoint::id(self);
        self.in_flight = Some(EgressSlot::begin(cx, me, frame, medium, next_hop, true));
        Ok(())
    }

    fn on_transmission_finish(&mut self, cx: &mut TickContext<'_>) {
        let me = Endpoint::id(self);
        if let Some(slot) = &mut self.in_flight {
            slot.finish_if_due(cx, me);
        }
    }

    fn on_collision_check(&mut self, cx: &mut TickContext<'_>) {
        let collided = self
            .in_flight
            .as_mut()
            .and_then(|slot| slot.check_collision(cx))
            .unwrap_or(false);
        if !collided {
            return;
        }
        let Some(slot) = self.in_flight.take() else {
            return;
        };

        self.consecutive_collisions += 1;
        self.total_collisions += 1;
        self.backoff = cx.backoff.backoff_slots(self.consecutive_collisions, cx.rng);
        slot.abort(cx);
        self.retry = Some(slot.frame);

        debug!(
            station = %self.name,
            frame = slot.frame.0,
            consecutive = self.consecutive_collisions,
            backoff = self.backoff,
            "检测到碰撞，进入退避"
        );
        let me = Endpoint::id(self);
        cx.report(
            Some(slot.frame),
            ReportEventKind::Collision {
                endpoint: me,
                medium: slot.medium,
                backoff_slots: self.backoff,
            },
        );
    }

    fn accept_frame(&mut self, frame: FrameId, _via: MediumId, cx: &mut TickContext<'_>) {
        let now = cx.now();
        let Some(f) = cx.frames.get_mut(frame) else {
            return;
        };
        if f.dst == self.id {
            f.mark_delivered(now);
            self.received += 1;
            info!(station = %self.name, frame = frame.0, "✅ 帧送达目的站点");
        }
    }

    fn accept_acknowledgment(&mut self, frame: FrameId, cx: &mut TickContext<'_>) {
        if self.in_flight.map(|slot| slot.frame) != Some(frame) {
            return;
        }
        self.in_flight = None;
        self.consecutive_collisions = 0;
        self.sent += 1;
        let now = cx.now();
        if let Some(f) = cx.frames.get_mut(frame) {
            f.mark_acked(now);
        }
        debug!(station = %self.name, frame = frame.0, sent = self.sent, "收到 ACK");
    }
}
