//! 仿真核心模块
//!
//! 此模块包含离散事件仿真的时间基础：仿真时间与虚拟时钟。

// 子模块声明
mod clock;
mod time;

// 重新导出公共接口
pub use clock::Clock;
pub use time::SimTime;
