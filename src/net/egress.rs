//! 单槽出口
//!
//! 站点和路由器的每条发送流水线同一时刻最多只发送一帧，
//! 槽位记录这帧以及两个截止时间（串行发送结束、碰撞检查）。

use super::endpoint::TickContext;
use super::id::{EndpointId, FrameId, MediumId};
use crate::report::ReportEventKind;
use crate::sim::SimTime;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EgressSlot {
    pub frame: FrameId,
    pub medium: MediumId,
    pub finish_at: Option<SimTime>,
    pub collision_check_at: Option<SimTime>,
}

impl EgressSlot {
    /// 占用介质并开始发送。
    ///
    /// `detect_collisions` 为 false 时（点对点链路）不安排碰撞检查。
    pub(crate) fn begin(
        cx: &mut TickContext<'_>,
        endpoint: EndpointId,
        frame: FrameId,
        medium: MediumId,
        next_hop: EndpointId,
        detect_collisions: bool,
    ) -> Self {
        let now = cx.now();
        let size_bits = match cx.frames.get_mut(frame) {
            Some(f) => {
                f.set_next_hop(next_hop);
                f.start_tx(now);
                f.size_bits
            }
            None => cx.frame_bits,
        };

        let m = cx.medium_mut(medium);
        let tx_time = m.tx_time(size_bits);
        let round_trip = m.round_trip();
        m.claim();

        let finish_at = cx.clock.schedule_after(tx_time);
        let collision_check_at = detect_collisions.then(|| cx.clock.schedule_after(round_trip));

        debug!(
            ?endpoint,
            frame = frame.0,
            medium = medium.0,
            ?finish_at,
            ?collision_check_at,
            "📤 开始发送"
        );
        cx.report(
            Some(frame),
            ReportEventKind::TxStart {
                endpoint,
                medium,
                next_hop: Some(next_hop),
            },
        );

        Self {
            frame,
            medium,
            finish_at: Some(finish_at),
            collision_check_at,
        }
    }

    /// 串行发送结束：帧进入传播阶段。到期返回 true。
    pub(crate) fn finish_if_due(&mut self, cx: &mut TickContext<'_>, endpoint: EndpointId) -> bool {
        let Some(at) = self.finish_at else {
            return false;
        };
        if !cx.clock.is_due(at) {
            return false;
        }
        self.finish_at = None;

        let now = cx.now();
        let medium = self.medium;
        let frame = self.frame;
        cx.media[medium.0].put_on_bus(frame, cx.clock);
        if let Some(f) = cx.frames.get_mut(frame) {
            f.finish_tx(now);
        }
        cx.report(Some(frame), ReportEventKind::TxFinish { endpoint, medium });
        true
    }

    /// 碰撞检查：到期时返回介质的碰撞标志，否则返回 None。
    pub(crate) fn check_collision(&mut self, cx: &TickContext<'_>) -> Option<bool> {
        let at = self.collision_check_at?;
        if !cx.clock.is_due(at) {
            return None;
        }
        self.collision_check_at = None;
        Some(cx.medium(self.medium).has_collision())
    }

    /// 碰撞后放弃发送：释放介质并记录帧的碰撞
    pub(crate) fn abort(self, cx: &mut TickContext<'_>) {
        cx.medium_mut(self.medium).release();
        if let Some(f) = cx.frames.get_mut(self.frame) {
            f.collide();
        }
    }
}
