//! 最短路径路由
//!
//! 路由器为顶点、点对点链路为边、链路代价为边权。以贪心方式扩展前沿：
//! 每次取出未访问且暂定代价最小的路由器，松弛其邻居并记录到达邻居所用的链路。
//!
//! 参考拓扑中每个路由器只需要“离开本网段”的那条路径，因此只把第一个被确定的
//! 非源路由器写入通配路由行；树的其余部分仅用于诊断日志。
//! 代价相同的候选按注册顺序取第一个（下标最小者）。

use super::id::{MediumId, RouterId};

/// 路由行的目的范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteScope {
    /// 通配：所有离开本网段的流量
    All,
}

/// 路由表中的一行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRow {
    pub scope: RouteScope,
    pub next_hop: RouterId,
    pub link: MediumId,
    pub cost: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    rows: Vec<RouteRow>,
}

impl RoutingTable {
    /// 原地覆盖同一范围的行，没有则追加
    pub fn set(&mut self, row: RouteRow) {
        match self.rows.iter_mut().find(|r| r.scope == row.scope) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    /// 通配路由
    pub fn default_route(&self) -> Option<&RouteRow> {
        self.rows.iter().find(|r| r.scope == RouteScope::All)
    }

    pub fn rows(&self) -> &[RouteRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 图中的一条无向边（点对点链路）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkEdge {
    pub link: MediumId,
    pub a: RouterId,
    pub b: RouterId,
    pub cost: u32,
}

/// 单源最短路径树
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPathTree {
    pub source: RouterId,
    /// 按确定顺序排列的路由器（第一个总是源）
    pub settled: Vec<RouterId>,
    /// 下标为路由器编号；不可达为 None
    pub cost: Vec<Option<u32>>,
    pub prev: Vec<Option<RouterId>>,
    pub via: Vec<Option<MediumId>>,
}

impl ShortestPathTree {
    /// 第一个被确定的非源路由器对应的路由行
    pub fn first_hop(&self) -> Option<RouteRow> {
        let r = *self.settled.iter().find(|r| **r != self.source)?;
        Some(RouteRow {
            scope: RouteScope::All,
            next_hop: r,
            link: self.via[r.0]?,
            cost: self.cost[r.0]?,
        })
    }
}

/// 计算 `source` 出发的最短路径树。`router_count` 为路由器总数（编号 0..router_count）。
pub fn shortest_paths(source: RouterId, router_count: usize, edges: &[LinkEdge]) -> ShortestPathTree {
    let mut cost: Vec<Option<u32>> = vec![None; router_count];
    let mut prev: Vec<Option<RouterId>> = vec![None; router_count];
    let mut via: Vec<Option<MediumId>> = vec![None; router_count];
    let mut visited = vec![false; router_count];
    let mut settled = Vec::with_capacity(router_count);

    if source.0 < router_count {
        cost[source.0] = Some(0);
    }

    loop {
        // 严格小于：代价相同时保留下标最小者
        let mut closest: Option<(usize, u32)> = None;
        for (idx, c) in cost.iter().enumerate() {
            if visited[idx] {
                continue;
            }
            if let Some(c) = *c {
                if closest.is_none_or(|(_, best)| c < best) {
                    closest = Some((idx, c));
                }
            }
        }
        let Some((u, du)) = closest else {
            break;
        };
        visited[u] = true;
        settled.push(RouterId(u));

        for e in edges {
            let v = if e.a.0 == u {
                e.b
            } else if e.b.0 == u {
                e.a
            } else {
                continue;
            };
            if v.0 >= router_count || visited[v.0] {
                continue;
            }
            let candidate = du.saturating_add(e.cost);
            if cost[v.0].is_none_or(|cv| candidate < cv) {
                cost[v.0] = Some(candidate);
                prev[v.0] = Some(RouterId(u));
                via[v.0] = Some(e.link);
            }
        }
    }

    ShortestPathTree {
        source,
        settled,
        cost,
        prev,
        via,
    }
}
