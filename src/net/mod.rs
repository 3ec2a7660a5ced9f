//! 网络模拟模块
//!
//! 此模块包含竞争网络的核心组件：帧、介质、站点、路由器、路由算法与每个 tick 的调度。

// 子模块声明
mod egress;
mod endpoint;
mod frame;
mod id;
mod medium;
mod network;
mod network_report;
mod network_tick;
mod router;
mod routing;
mod station;
mod stats;

// 重新导出公共接口
pub use egress::EgressSlot;
pub use endpoint::{Endpoint, TickContext};
pub use frame::{Frame, FrameFlags, FramePool, FrameTiming};
pub use id::{EndpointId, FrameId, MediumId, RouterId, StationId};
pub use medium::{Medium, MediumKind};
pub use network::Network;
pub use router::Router;
pub use routing::{LinkEdge, RouteRow, RouteScope, RoutingTable, ShortestPathTree, shortest_paths};
pub use station::{Station, StationState};
pub use stats::Stats;
