//! Reporting hooks for the network.

use super::id::FrameId;
use super::network::Network;
use crate::report::{ReportEvent, ReportEventKind, RunSummary};

impl Network {
    pub(crate) fn report(&mut self, frame: Option<FrameId>, kind: ReportEventKind) {
        self.sink.record(ReportEvent {
            t_us: self.clock.now().0,
            frame,
            kind,
        });
    }

    /// 运行结束后的汇总：总碰撞数与每个站点的积压、碰撞、成功发送数
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ended_at_us: self.clock.now().0,
            total_collisions: self.stats.collisions,
            frames_delivered: self.stats.frames_delivered,
            hop_deliveries: self.stats.hop_deliveries,
            stations: self.stations.iter().map(|s| s.summary()).collect(),
        }
    }
}
