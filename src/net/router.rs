//! 路由器
//!
//! 两条互相独立的半双工出口流水线：
//! - 链路流水线：取站点侧入队的帧，按路由表从点对点链路发往下一跳路由器（无竞争、无退避）
//! - 总线流水线：取链路侧入队的帧，以与站点相同的 CSMA/CD 规则在本网段总线上发往目的站点

use std::collections::VecDeque;

use super::egress::EgressSlot;
use super::endpoint::{Endpoint, TickContext};
use super::id::{EndpointId, FrameId, MediumId, RouterId};
use super::medium::Medium;
use super::routing::RoutingTable;
use crate::error::SimError;
use crate::report::ReportEventKind;
use tracing::{debug, trace};

/// 路由器
#[derive(Debug)]
pub struct Router {
    id: RouterId,
    name: String,
    bus: Option<MediumId>,
    links: Vec<MediumId>,
    pub(crate) table: RoutingTable,
    /// 从站点侧（总线）收到、等待走链路的帧
    from_stations: VecDeque<FrameId>,
    /// 从链路收到、等待走总线的帧
    from_links: VecDeque<FrameId>,
    link_slot: Option<EgressSlot>,
    bus_slot: Option<EgressSlot>,
    backoff: u32,
    consecutive_collisions: u32,
    total_collisions: u64,
    forwarded: u64,
}

impl Router {
    /// 创建新路由器
    pub fn new(id: RouterId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bus: None,
            links: Vec::new(),
            table: RoutingTable::default(),
            from_stations: VecDeque::new(),
            from_links: VecDeque::new(),
            link_slot: None,
            bus_slot: None,
            backoff: 0,
            consecutive_collisions: 0,
            total_collisions: 0,
            forwarded: 0,
        }
    }

    pub fn router_id(&self) -> RouterId {
        self.id
    }

    pub fn bus(&self) -> Option<MediumId> {
        self.bus
    }

    pub fn links(&self) -> &[MediumId] {
        &self.links
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn station_queue_len(&self) -> usize {
        self.from_stations.len()
    }

    pub fn link_queue_len(&self) -> usize {
        self.from_links.len()
    }

    pub fn backoff(&self) -> u32 {
        self.backoff
    }

    pub fn total_collisions(&self) -> u64 {
        self.total_collisions
    }

    /// 已完成串行发送（交给介质）的帧数
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    pub fn is_link_busy(&self) -> bool {
        self.link_slot.is_some()
    }

    pub fn is_bus_busy(&self) -> bool {
        self.bus_slot.is_some()
    }

    /// 链路流水线：按路由表把站点侧的帧发往下一跳路由器
    fn send_on_link(&mut self, cx: &mut TickContext<'_>) -> Result<(), SimError> {
        if self.link_slot.is_some() || self.from_stations.is_empty() {
            return Ok(());
        }
        let row = self
            .table
            .default_route()
            .copied()
            .ok_or(SimError::NoRoute { router: self.id })?;
        let Some(frame) = self.from_stations.pop_front() else {
            return Ok(());
        };
        let me = Endpoint::id(self);
        self.link_slot = Some(EgressSlot::begin(
            cx,
            me,
            frame,
            row.link,
            EndpointId::Router(row.next_hop),
            false,
        ));
        Ok(())
    }

    /// 总线流水线：与站点相同的 CSMA/CD 规则
    fn send_on_bus(&mut self, cx: &mut TickContext<'_>) {
        self.backoff = self.backoff.saturating_sub(1);
        if self.backoff > 0 || self.bus_slot.is_some() || self.from_links.is_empty() {
            return;
        }
        let Some(bus) = self.bus else {
            return;
        };
        if !cx.medium(bus).can_access() {
            trace!(router = %self.name, "总线忙，等待下一个时隙");
            return;
        }
        let Some(frame) = self.from_links.pop_front() else {
            return;
        };
        let Some(dst) = cx.frames.get(frame).map(|f| f.dst) else {
            return;
        };
        let me = Endpoint::id(self);
        self.bus_slot = Some(EgressSlot::begin(
            cx,
            me,
            frame,
            bus,
            EndpointId::Station(dst),
            true,
        ));
    }
}

impl Endpoint for Router {
    fn id(&self) -> EndpointId {
        EndpointId::Router(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attach_medium(&mut self, medium: &Medium) -> Result<(), SimError> {
        if medium.is_bus() {
            match self.bus {
                Some(existing) if existing != medium.id() => {
                    return Err(SimError::InvalidTopology(format!(
                        "router {} is already attached to a shared bus",
                        self.name
                    )));
                }
                _ => self.bus = Some(medium.id()),
            }
        } else if !self.links.contains(&medium.id()) {
            self.links.push(medium.id());
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, cx), fields(router = %self.name, now = ?cx.now()))]
    fn on_slot_boundary(&mut self, cx: &mut TickContext<'_>) -> Result<(), SimError> {
        self.send_on_link(cx)?;
        self.send_on_bus(cx);
        Ok(())
    }

    fn on_transmission_finish(&mut self, cx: &mut TickContext<'_>) {
        let me = Endpoint::id(self);
        if let Some(slot) = &mut self.link_slot {
            if slot.finish_if_due(cx, me) {
                self.link_slot = None;
                self.forwarded += 1;
            }
        }
        if let Some(slot) = &mut self.bus_slot {
            if slot.finish_if_due(cx, me) {
                self.bus_slot = None;
                self.forwarded += 1;
                self.consecutive_collisions = 0;
            }
        }
    }

    fn on_collision_check(&mut self, cx: &mut TickContext<'_>) {
        let collided = self
            .bus_slot
            .as_mut()
            .and_then(|slot| slot.check_collision(cx))
            .unwrap_or(false);
        if !collided {
            return;
        }
        let Some(slot) = self.bus_slot.take() else {
            return;
        };

        self.consecutive_collisions += 1;
        self.total_collisions += 1;
        self.backoff = cx.backoff.backoff_slots(self.consecutive_collisions, cx.rng);
        slot.abort(cx);
        self.from_links.push_front(slot.frame);

        debug!(
            router = %self.name,
            frame = slot.frame.0,
            backoff = self.backoff,
            "总线碰撞，帧退回队首"
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

    fn accept_frame(&mut self, frame: FrameId, via: MediumId, cx: &mut TickContext<'_>) {
        if cx.medium(via).is_link() {
            self.from_links.push_back(frame);
            trace!(router = %self.name, frame = frame.0, "从链路收到帧");
            return;
        }
        // 目的站点就在本网段时直接走总线
        let local = cx
            .frames
            .get(frame)
            .zip(self.bus)
            .is_some_and(|(f, bus)| cx.medium(bus).has_endpoint(EndpointId::Station(f.dst)));
        if local {
            self.from_links.push_back(frame);
        } else {
            self.from_stations.push_back(frame);
        }
        trace!(router = %self.name, frame = frame.0, local, "从站点侧收到帧");
    }

    fn accept_acknowledgment(&mut self, _frame: FrameId, _cx: &mut TickContext<'_>) {
        // 转发平面交出帧之后不保留任何状态
    }
}
