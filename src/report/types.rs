use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::net::{EndpointId, FrameId, MediumId, RouterId};

/// 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEventKind {
    /// 端点开始在介质上发送一帧
    TxStart {
        endpoint: EndpointId,
        medium: MediumId,
        next_hop: Option<EndpointId>,
    },
    /// 串行发送完成，帧进入传播阶段
    TxFinish { endpoint: EndpointId, medium: MediumId },
    /// 帧到达下一跳，同时 ACK 回到上一跳
    Delivery {
        medium: MediumId,
        from: EndpointId,
        to: EndpointId,
    },
    /// 介质上出现新的碰撞（发送者计数从 ≤1 变为 >1）
    CollisionDetected { medium: MediumId, transmitters: u32 },
    /// 端点检测到自己的帧发生碰撞，并进入退避
    Collision {
        endpoint: EndpointId,
        medium: MediumId,
        backoff_slots: u32,
    },
    /// 链路代价重新随机化
    LinkCost { link: MediumId, cost: u32 },
    /// 路由表快照
    RouteSnapshot {
        router: RouterId,
        next_hop: RouterId,
        link: MediumId,
        cost: u32,
    },
}

/// 一条上报事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvent {
    /// 仿真时间（微秒，和 `SimTime.0` 同口径）
    pub t_us: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameId>,
    #[serde(flatten)]
    pub kind: ReportEventKind,
}

/// 事件接收器
pub trait EventSink {
    fn record(&mut self, ev: ReportEvent);
}

/// 把事件写进 tracing 日志（默认接收器）
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, ev: ReportEvent) {
        debug!(t_us = ev.t_us, frame = ?ev.frame, kind = ?ev.kind, "report");
    }
}

/// 一个简单的事件收集器（存内存）。克隆出来的句柄共享同一份事件列表。
#[derive(Debug, Clone, Default)]
pub struct ReportLog {
    events: Rc<RefCell<Vec<ReportEvent>>>,
}

impl ReportLog {
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// 统计满足条件的事件数
    pub fn count(&self, pred: impl Fn(&ReportEventKind) -> bool) -> usize {
        self.events.borrow().iter().filter(|ev| pred(&ev.kind)).count()
    }
}

impl EventSink for ReportLog {
    fn record(&mut self, ev: ReportEvent) {
        self.events.borrow_mut().push(ev);
    }
}

/// 单个站点的运行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSummary {
    pub name: String,
    /// 仍在等待发送的帧数（含等待重传的帧）
    pub outstanding: u64,
    pub collisions: u64,
    /// 收到 ACK 的帧数
    pub sent: u64,
    pub received: u64,
}

/// 一次运行结束后的汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ended_at_us: u64,
    pub total_collisions: u64,
    /// 交付到最终目的站点的帧数
    pub frames_delivered: u64,
    /// 逐跳交付次数（经过路由器的帧每跳计一次）
    pub hop_deliveries: u64,
    pub stations: Vec<StationSummary>,
}
