//! # `zhijue-core` - 感知层领域核心
//!
//! 本 crate 定义市场感知层（Perception Layer）的领域模型与端口契约：
//! 原始市场事件（`RawMarketEvent`）、统一信号（`UnifiedSignal`）以及
//! 探测器端口（`Detector`）。
//!
//! ## 架构职责
//! - 定义上游采集层产出的事件实体及其构造契约
//! - 定义下游聚合/通知层消费的信号实体及其序列化契约
//! - 定义探测器的多态接口，由 `zhijue-perception` 中的具体探测器实现
//!
//! 本 crate 不包含任何 I/O：探测是纯函数，持久化与事件总线由外部协作方负责。

pub mod detect;
pub mod event;
pub mod signal;
