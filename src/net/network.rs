//! 网络拓扑管理
//!
//! 定义网络拓扑结构：站点、路由器、介质的注册，以及各组件共享的时钟、帧池和随机数源。

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::endpoint::{Endpoint, TickContext};
use super::frame::FramePool;
use super::id::{EndpointId, MediumId, RouterId, StationId};
use super::medium::Medium;
use super::router::Router;
use super::station::Station;
use super::stats::Stats;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::policy::{ArrivalProcess, BackoffPolicy, BinaryExponentialBackoff, PoissonArrivals};
use crate::report::{EventSink, TracingSink};
use crate::sim::{Clock, SimTime};
use tracing::debug;

/// 网络拓扑与仿真状态
pub struct Network {
    pub(crate) config: SimConfig,
    pub(crate) clock: Clock,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) frames: FramePool,
    pub(crate) media: Vec<Medium>,
    pub(crate) stations: Vec<Station>,
    pub(crate) routers: Vec<Router>,
    pub(crate) backoff: Box<dyn BackoffPolicy>,
    pub(crate) arrivals: Box<dyn ArrivalProcess>,
    pub(crate) sink: Box<dyn EventSink>,
    pub stats: Stats,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Network {
    pub fn new(config: SimConfig) -> Self {
        let mut clock = Clock::new(config.slot(), config.duration());
        if config.routing_period_us > 0 {
            clock = clock.with_routing_period(config.routing_period());
        }
        Self {
            clock,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            frames: FramePool::with_capacity(config.frame_pool),
            media: Vec::new(),
            stations: Vec::new(),
            routers: Vec::new(),
            backoff: Box::new(BinaryExponentialBackoff::new(config.max_backoff)),
            arrivals: Box::new(PoissonArrivals::new(config.arrival_mean)),
            sink: Box::new(TracingSink),
            stats: Stats::default(),
            config,
        }
    }

    /// 替换事件接收器
    pub fn set_sink(&mut self, sink: impl EventSink + 'static) {
        self.sink = Box::new(sink);
    }

    pub fn set_backoff_policy(&mut self, policy: impl BackoffPolicy + 'static) {
        self.backoff = Box::new(policy);
    }

    pub fn set_arrival_process(&mut self, process: impl ArrivalProcess + 'static) {
        self.arrivals = Box::new(process);
    }

    /// 添加站点
    pub fn add_station(&mut self, name: impl Into<String>) -> StationId {
        let id = StationId(self.stations.len());
        self.stations.push(Station::new(id, name));
        id
    }

    /// 添加路由器
    pub fn add_router(&mut self, name: impl Into<String>) -> RouterId {
        let id = RouterId(self.routers.len());
        self.routers.push(Router::new(id, name));
        id
    }

    /// 添加共享总线并连接给定的端点
    pub fn add_bus(&mut self, name: impl Into<String>, endpoints: &[EndpointId]) -> Result<MediumId, SimError> {
        let id = MediumId(self.media.len());
        self.media.push(Medium::new_bus(
            id,
            name,
            self.config.round_trip(),
            self.config.bus_bandwidth_bps,
        ));
        for ep in endpoints {
            self.attach(id, *ep)?;
        }
        Ok(id)
    }

    /// 添加连接两个路由器的点对点链路
    pub fn add_link(&mut self, name: impl Into<String>, a: RouterId, b: RouterId) -> Result<MediumId, SimError> {
        let name = name.into();
        if a == b {
            return Err(SimError::InvalidTopology(format!("link {name} joins {a:?} to itself")));
        }
        for r in [a, b] {
            if r.0 >= self.routers.len() {
                return Err(SimError::InvalidTopology(format!("link {name} references unknown {r:?}")));
            }
        }
        let id = MediumId(self.media.len());
        let link = Medium::new_link(
            id,
            name,
            (a, b),
            self.config.round_trip(),
            self.config.link_bandwidth_bps,
        );
        self.routers[a.0].attach_medium(&link)?;
        self.routers[b.0].attach_medium(&link)?;
        self.media.push(link);
        Ok(id)
    }

    /// 把端点连接到已有介质
    pub fn attach(&mut self, medium: MediumId, ep: EndpointId) -> Result<(), SimError> {
        let m = self.media.get_mut(medium.0).ok_or(SimError::UnknownMedium(medium))?;
        if m.is_link() {
            return Err(SimError::InvalidTopology(format!(
                "{} is a point-to-point link; use add_link",
                m.name()
            )));
        }
        match ep {
            EndpointId::Station(s) => self
                .stations
                .get_mut(s.0)
                .ok_or_else(|| SimError::InvalidTopology(format!("unknown {s:?}")))?
                .attach_medium(m)?,
            EndpointId::Router(r) => self
                .routers
                .get_mut(r.0)
                .ok_or_else(|| SimError::InvalidTopology(format!("unknown {r:?}")))?
                .attach_medium(m)?,
        }
        m.attach(ep);
        debug!(medium = %m.name(), endpoint = ?ep, "连接端点");
        Ok(())
    }

    /// 固定站点的目的地
    pub fn set_destination(&mut self, station: StationId, dst: StationId) -> Result<(), SimError> {
        if dst.0 >= self.stations.len() || dst == station {
            return Err(SimError::InvalidTopology(format!(
                "invalid destination {dst:?} for {station:?}"
            )));
        }
        self.stations
            .get_mut(station.0)
            .ok_or_else(|| SimError::InvalidTopology(format!("unknown {station:?}")))?
            .set_destination(dst);
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn frames(&self) -> &FramePool {
        &self.frames
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    pub fn media(&self) -> &[Medium] {
        &self.media
    }

    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[id.0]
    }

    pub fn station_mut(&mut self, id: StationId) -> &mut Station {
        &mut self.stations[id.0]
    }

    pub fn router(&self, id: RouterId) -> &Router {
        &self.routers[id.0]
    }

    pub fn medium(&self, id: MediumId) -> &Medium {
        &self.media[id.0]
    }

    pub fn medium_mut(&mut self, id: MediumId) -> &mut Medium {
        &mut self.media[id.0]
    }

    /// 拆出端点列表与 tick 上下文，避免 &mut self 与 &mut 端点的重叠借用。
    pub(crate) fn split(&mut self) -> (&mut [Station], &mut [Router], TickContext<'_>) {
        let Network {
            config,
            clock,
            rng,
            frames,
            media,
            stations,
            routers,
            backoff,
            arrivals,
            sink,
            ..
        } = self;
        let cx = TickContext {
            clock,
            media: media.as_mut_slice(),
            frames,
            rng,
            backoff: &**backoff,
            arrivals: &**arrivals,
            sink: sink.as_mut(),
            frame_bits: config.frame_bits,
        };
        (stations.as_mut_slice(), routers.as_mut_slice(), cx)
    }
}

/// 按标识符取出端点
pub(crate) fn endpoint_mut<'a>(
    stations: &'a mut [Station],
    routers: &'a mut [Router],
    id: EndpointId,
) -> Option<&'a mut dyn Endpoint> {
    match id {
        EndpointId::Station(s) => stations.get_mut(s.0).map(|s| s as &mut dyn Endpoint),
        EndpointId::Router(r) => routers.get_mut(r.0).map(|r| r as &mut dyn Endpoint),
    }
}
