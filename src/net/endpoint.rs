//! 端点接口
//!
//! 站点与路由器没有共享状态，只共享同一套 tick 协议，因此用 trait 表达能力集合。

use rand::RngCore;

use super::frame::FramePool;
use super::id::{EndpointId, FrameId, MediumId};
use super::medium::Medium;
use crate::error::SimError;
use crate::policy::{ArrivalProcess, BackoffPolicy};
use crate::report::{EventSink, ReportEvent, ReportEventKind};
use crate::sim::{Clock, SimTime};

/// 一个 tick 内端点可以访问的共享状态
pub struct TickContext<'a> {
    pub clock: &'a mut Clock,
    pub media: &'a mut [Medium],
    pub frames: &'a mut FramePool,
    pub rng: &'a mut dyn RngCore,
    pub backoff: &'a dyn BackoffPolicy,
    pub arrivals: &'a dyn ArrivalProcess,
    pub sink: &'a mut dyn EventSink,
    /// 新帧的大小（bit）
    pub frame_bits: u64,
}

impl TickContext<'_> {
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn medium(&self, id: MediumId) -> &Medium {
        &self.media[id.0]
    }

    pub fn medium_mut(&mut self, id: MediumId) -> &mut Medium {
        &mut self.media[id.0]
    }

    pub fn report(&mut self, frame: Option<FrameId>, kind: ReportEventKind) {
        let t_us = self.clock.now().0;
        self.sink.record(ReportEvent { t_us, frame, kind });
    }
}

/// 端点接口
pub trait Endpoint {
    /// 获取端点标识符
    fn id(&self) -> EndpointId;

    /// 获取端点名称
    fn name(&self) -> &str;

    /// 拓扑注册：连接到一条介质
    fn attach_medium(&mut self, medium: &Medium) -> Result<(), SimError>;

    /// 时隙边界：产生新到达的帧
    fn generate_frames(&mut self, _cx: &mut TickContext<'_>) {}

    /// 时隙边界：尝试开始新的发送
    fn on_slot_boundary(&mut self, cx: &mut TickContext<'_>) -> Result<(), SimError>;

    /// 串行发送截止时间到达时把帧交给介质
    fn on_transmission_finish(&mut self, cx: &mut TickContext<'_>);

    /// 碰撞检查截止时间到达时查询介质的碰撞标志
    fn on_collision_check(&mut self, cx: &mut TickContext<'_>);

    /// 收到一帧（本端点是该帧的下一跳）
    fn accept_frame(&mut self, frame: FrameId, via: MediumId, cx: &mut TickContext<'_>);

    /// 收到 ACK（本端点是该帧的上一跳）
    fn accept_acknowledgment(&mut self, frame: FrameId, cx: &mut TickContext<'_>);
}
