//! 每个 tick 的阶段调度
//!
//! 阶段顺序固定：交付完成 → 发送完成 → 碰撞检测 →（时隙边界）到达与发送尝试 →
//! （路由边界）链路代价随机化与路由重算。碰撞检测必须在本 tick 所有端点的尝试都
//! 登记之后才能观察到最终的发送者计数，所以 `resolve_status` 只在每个阶段末尾统一调用。

use rand::Rng;

use super::endpoint::{Endpoint, TickContext};
use super::id::{EndpointId, FrameId, MediumId, RouterId};
use super::network::{Network, endpoint_mut};
use super::routing::{LinkEdge, shortest_paths};
use crate::error::SimError;
use crate::report::{ReportEventKind, RunSummary};
use tracing::{debug, info, warn};

impl Network {
    /// 运行直到时钟报告到达配置的时长，或遇到致命错误。
    #[tracing::instrument(skip(self), fields(duration = ?self.clock.duration()))]
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        self.config.validate()?;
        info!(
            stations = self.stations.len(),
            routers = self.routers.len(),
            media = self.media.len(),
            "▶️  开始运行仿真"
        );
        loop {
            self.tick()?;
            if !self.advance()? {
                break;
            }
        }
        let summary = self.summary();
        info!(
            final_time = ?self.clock.now(),
            collisions = summary.total_collisions,
            delivered = summary.frames_delivered,
            "✅ 仿真完成"
        );
        Ok(summary)
    }

    /// 在当前时间执行一次完整的阶段序列（不推进时钟）
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.deliver_finished_frames();
        self.finish_transmissions();
        self.detect_collisions();

        if self.clock.is_slot_boundary() {
            self.generate_frames();
            self.start_transmissions()?;
        }

        if self.clock.is_routing_boundary() {
            self.randomize_link_costs();
            self.recompute_routes();
        }
        Ok(())
    }

    /// 推进时钟到下一个唤醒时间
    pub fn advance(&mut self) -> Result<bool, SimError> {
        self.clock.advance()
    }

    /// 阶段 1：介质把传播完成的帧交给下一跳，并把 ACK 交给上一跳
    fn deliver_finished_frames(&mut self) {
        let now = self.clock.now();
        for m in 0..self.media.len() {
            let medium = MediumId(m);
            let done = self.media[m].check_if_frames_done(now);
            for frame in done {
                self.deliver(medium, frame);
            }
        }
        self.resolve_media();
    }

    fn deliver(&mut self, via: MediumId, frame: FrameId) {
        let Some((next, prev, dst)) = self
            .frames
            .get(frame)
            .map(|f| (f.next_hop(), f.prev_hop(), f.dst))
        else {
            warn!(frame = frame.0, "交付了一个不在使用中的帧");
            return;
        };
        let Some(next) = next else {
            warn!(frame = frame.0, "帧没有下一跳");
            return;
        };

        {
            let (stations, routers, mut cx) = self.split();
            if let Some(ep) = endpoint_mut(stations, routers, next) {
                ep.accept_frame(frame, via, &mut cx);
            }
            if let Some(ep) = endpoint_mut(stations, routers, prev) {
                ep.accept_acknowledgment(frame, &mut cx);
            }
            cx.report(
                Some(frame),
                ReportEventKind::Delivery {
                    medium: via,
                    from: prev,
                    to: next,
                },
            );
        }

        self.stats.hop_deliveries += 1;
        if next == EndpointId::Station(dst) {
            self.stats.frames_delivered += 1;
        }
        if self.frames.get(frame).is_some_and(|f| f.is_complete()) {
            self.frames.release(frame);
            debug!(frame = frame.0, in_use = self.frames.in_use(), "帧回收");
        }
    }

    /// 阶段 2：串行发送结束的帧进入传播阶段
    fn finish_transmissions(&mut self) {
        self.for_each_endpoint(|ep, cx| ep.on_transmission_finish(cx));
    }

    /// 阶段 3：到期的碰撞检查
    fn detect_collisions(&mut self) {
        self.for_each_endpoint(|ep, cx| ep.on_collision_check(cx));
        self.resolve_media();
    }

    /// 阶段 4a：新帧到达
    fn generate_frames(&mut self) {
        self.for_each_endpoint(|ep, cx| ep.generate_frames(cx));
    }

    /// 阶段 4b：所有端点各自尝试接入，全部登记完之后统一刷新介质状态
    fn start_transmissions(&mut self) -> Result<(), SimError> {
        {
            let (stations, routers, mut cx) = self.split();
            for s in stations.iter_mut() {
                s.on_slot_boundary(&mut cx)?;
            }
            for r in routers.iter_mut() {
                r.on_slot_boundary(&mut cx)?;
            }
        }
        self.resolve_media();
        Ok(())
    }

    /// 阶段 5a：链路代价在 [min, max] 内均匀重抽
    pub fn randomize_link_costs(&mut self) {
        let lo = self.config.link_cost_min.max(1);
        let hi = self.config.link_cost_max.max(lo);
        let mut changed = Vec::new();
        for m in self.media.iter_mut().filter(|m| m.is_link()) {
            let cost = self.rng.gen_range(lo..=hi);
            m.set_cost(cost);
            changed.push((m.id(), cost));
        }
        for (link, cost) in changed {
            debug!(link = link.0, cost, "链路代价更新");
            self.report(None, ReportEventKind::LinkCost { link, cost });
        }
    }

    /// 阶段 5b：为每个路由器重算最短路径并原地覆盖路由表
    pub fn recompute_routes(&mut self) {
        let edges: Vec<LinkEdge> = self
            .media
            .iter()
            .filter_map(|m| {
                let (a, b) = m.link_ends()?;
                Some(LinkEdge {
                    link: m.id(),
                    a,
                    b,
                    cost: m.cost()?,
                })
            })
            .collect();

        for r in 0..self.routers.len() {
            let source = RouterId(r);
            let tree = shortest_paths(source, self.routers.len(), &edges);
            for router in &tree.settled {
                debug!(
                    from = %self.routers[r].name(),
                    router = %self.routers[router.0].name(),
                    cost = ?tree.cost[router.0],
                    prev = ?tree.prev[router.0],
                    link = ?tree.via[router.0],
                    "最短路径树"
                );
            }
            let Some(row) = tree.first_hop() else {
                warn!(router = %self.routers[r].name(), "没有离开本网段的路由");
                continue;
            };
            self.routers[r].table.set(row);
            info!(
                router = %self.routers[r].name(),
                next_hop = %self.routers[row.next_hop.0].name(),
                link = %self.media[row.link.0].name(),
                cost = row.cost,
                "🧭 路由表更新"
            );
            self.report(
                None,
                ReportEventKind::RouteSnapshot {
                    router: source,
                    next_hop: row.next_hop,
                    link: row.link,
                    cost: row.cost,
                },
            );
        }
        self.stats.route_updates += 1;
    }

    /// 刷新所有介质的忙/碰撞标志；总线上新出现的碰撞计入统计并上报
    fn resolve_media(&mut self) {
        let mut fresh = Vec::new();
        for m in self.media.iter_mut() {
            if m.resolve_status() && m.is_bus() {
                fresh.push((m.id(), m.transmitters()));
            }
        }
        for (medium, transmitters) in fresh {
            self.stats.collisions += 1;
            self.report(
                None,
                ReportEventKind::CollisionDetected {
                    medium,
                    transmitters,
                },
            );
        }
    }

    fn for_each_endpoint(&mut self, mut f: impl FnMut(&mut dyn Endpoint, &mut TickContext<'_>)) {
        let (stations, routers, mut cx) = self.split();
        for s in stations.iter_mut() {
            f(s, &mut cx);
        }
        for r in routers.iter_mut() {
            f(r, &mut cx);
        }
    }
}
