//! 双网段拓扑构建

use crate::error::SimError;
use crate::net::{EndpointId, MediumId, Network, RouterId, StationId};

/// 双网段拓扑配置选项
#[derive(Debug, Clone)]
pub struct TwoSegmentOpts {
    /// 每个网段上的站点数
    pub stations_per_segment: usize,
    /// 两个网关路由器之间的并行链路数
    pub parallel_links: usize,
}

impl Default for TwoSegmentOpts {
    fn default() -> Self {
        Self {
            stations_per_segment: 2,
            parallel_links: 2,
        }
    }
}

/// 构建结果
#[derive(Debug, Clone)]
pub struct TwoSegment {
    pub buses: [MediumId; 2],
    pub routers: [RouterId; 2],
    pub links: Vec<MediumId>,
    pub segments: [Vec<StationId>; 2],
}

/// 构建双网段拓扑
///
/// 拓扑结构：
/// a0..ak, r0 <-> busA        b0..bk, r1 <-> busB
///                 r0 ==(link0..linkN)== r1
///
/// 网段 A 的第 i 个站点发往网段 B 的第 i 个站点，反之亦然，所有流量都要经过路由器。
pub fn build_two_segment(net: &mut Network, opts: &TwoSegmentOpts) -> Result<TwoSegment, SimError> {
    let seg_a: Vec<StationId> = (0..opts.stations_per_segment)
        .map(|i| net.add_station(format!("a{i}")))
        .collect();
    let seg_b: Vec<StationId> = (0..opts.stations_per_segment)
        .map(|i| net.add_station(format!("b{i}")))
        .collect();
    let r0 = net.add_router("r0");
    let r1 = net.add_router("r1");

    let endpoints = |stations: &[StationId], router: RouterId| -> Vec<EndpointId> {
        stations
            .iter()
            .map(|s| EndpointId::Station(*s))
            .chain(std::iter::once(EndpointId::Router(router)))
            .collect()
    };
    let bus_a = net.add_bus("busA", &endpoints(&seg_a, r0))?;
    let bus_b = net.add_bus("busB", &endpoints(&seg_b, r1))?;

    let links = (0..opts.parallel_links.max(1))
        .map(|i| net.add_link(format!("link{i}"), r0, r1))
        .collect::<Result<Vec<_>, _>>()?;

    for (a, b) in seg_a.iter().zip(&seg_b) {
        net.set_destination(*a, *b)?;
        net.set_destination(*b, *a)?;
    }

    Ok(TwoSegment {
        buses: [bus_a, bus_b],
        routers: [r0, r1],
        links,
        segments: [seg_a, seg_b],
    })
}
