//! 事件上报
//!
//! 仿真核心只产生结构化事件，不负责格式化或持久化：
//! - `EventSink`：由外部实现的接收器
//! - `ReportLog`：存内存的收集器，仿真结束后可写成 JSON
//! - `TracingSink`：默认接收器，把事件写进 tracing 日志

mod types;

pub use types::{EventSink, ReportEvent, ReportEventKind, ReportLog, RunSummary, StationSummary, TracingSink};
