//! 统计信息
//!
//! 定义网络仿真统计数据结构。

/// 网络统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    /// 共享总线上新碰撞的次数（每次跳变计一次）
    pub collisions: u64,
    /// 逐跳交付次数
    pub hop_deliveries: u64,
    /// 交付到最终目的站点的帧数
    pub frames_delivered: u64,
    /// 路由表重算次数
    pub route_updates: u64,
}
