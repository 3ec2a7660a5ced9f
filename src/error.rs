//! 错误类型
//!
//! 碰撞不是错误：它是协议内的预期事件，只会上报给事件接收器。

use std::path::PathBuf;

use thiserror::Error;

use crate::net::{EndpointId, MediumId, RouterId, StationId};
use crate::sim::SimTime;

/// 仿真运行中的致命错误，由运行驱动器终止整个仿真。
#[derive(Debug, Error)]
pub enum SimError {
    /// 站点在所连介质上找不到任何可达的目的站点
    #[error("station {station:?} has no viable destination")]
    NoDestination { station: StationId },

    /// 找不到通往目的站点的介质
    #[error("no viable path from {from:?} to {to:?}")]
    NoViablePath { from: EndpointId, to: StationId },

    /// 路由器的路由表为空，无法把帧送离本网段
    #[error("router {router:?} has no route off its segment")]
    NoRoute { router: RouterId },

    /// 没有待处理事件但仍未到达运行时长
    #[error("simulation stalled at {now:?}: nothing scheduled before {duration:?}")]
    Stalled { now: SimTime, duration: SimTime },

    /// 拓扑注册阶段的缺陷
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// 配置中的参数会让时钟无法前进或帧无法发出
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// 未注册的介质
    #[error("unknown medium {0:?}")]
    UnknownMedium(MediumId),

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置解析或报告序列化失败
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
