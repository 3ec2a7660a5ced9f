//! 单总线拓扑构建

use crate::error::SimError;
use crate::net::{EndpointId, MediumId, Network, StationId};

/// 单总线拓扑配置选项
#[derive(Debug, Clone)]
pub struct SingleBusOpts {
    pub stations: usize,
}

impl Default for SingleBusOpts {
    fn default() -> Self {
        Self { stations: 2 }
    }
}

/// 构建单总线拓扑
///
/// 拓扑结构：n0, n1, ... 全部挂在 bus0 上，每个站点默认发往总线上第一个其他站点。
/// 返回：(总线, 站点列表)
pub fn build_single_bus(net: &mut Network, opts: &SingleBusOpts) -> Result<(MediumId, Vec<StationId>), SimError> {
    let stations: Vec<StationId> = (0..opts.stations)
        .map(|i| net.add_station(format!("n{i}")))
        .collect();
    let endpoints: Vec<EndpointId> = stations.iter().map(|s| EndpointId::Station(*s)).collect();
    let bus = net.add_bus("bus0", &endpoints)?;
    Ok((bus, stations))
}
