//! 标识符类型
//!
//! 定义站点、路由器、介质和帧的唯一标识符。

use serde::{Deserialize, Serialize};

/// 站点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationId(pub usize);

/// 路由器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouterId(pub usize);

/// 介质（总线或点对点链路）标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MediumId(pub usize);

/// 帧标识符，同时也是帧池中的槽位下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameId(pub usize);

/// 端点：站点或路由器
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointId {
    Station(StationId),
    Router(RouterId),
}

impl From<StationId> for EndpointId {
    fn from(id: StationId) -> Self {
        EndpointId::Station(id)
    }
}

impl From<RouterId> for EndpointId {
    fn from(id: RouterId) -> Self {
        EndpointId::Router(id)
    }
}
