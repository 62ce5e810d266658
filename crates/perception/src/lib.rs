//! # `zhijue-perception` - 感知层探测器实现
//!
//! 本 crate 实现 `zhijue-core` 定义的 `Detector` 端口：
//! - `AnomalyDetector`：A 股异动探测器，内含涨跌停潮、大单、自选股异动、
//!   放量四条独立子规则
//! - `DetectorRegistry`：探测器注册表，按 `accepts` 分发事件并对合并后的
//!   信号流应用全局置信度下限
//!
//! 探测全程为纯函数：无 I/O、无共享可变状态，信号的持久化与传输由下游负责。

pub mod anomaly;
pub mod registry;

pub use anomaly::{AnomalyConfig, AnomalyDetector};
pub use registry::DetectorRegistry;
