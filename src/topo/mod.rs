//! 参考拓扑构建
//!
//! 拓扑构建只通过 `Network` 的注册接口完成，必须在运行开始之前调用。

pub mod single_bus;
pub mod two_segment;
