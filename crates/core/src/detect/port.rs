use crate::event::{EventType, RawMarketEvent};
use crate::signal::UnifiedSignal;

/// # Summary
/// 探测器端口契约，由各具体探测器（异动、资金流、关键词、技术面）实现。
///
/// # Invariants
/// - `detect` 是 `(事件, 配置)` 的纯函数：无 I/O、无共享可变状态、无阻塞。
/// - 配置在构造时固定，探测期间只读，因此同一实例可在多线程间并发调用。
/// - 载荷字段缺失或类型不符绝不导致 panic 或错误，对应子规则降级为不产出信号。
pub trait Detector: Send + Sync {
    /// # Summary
    /// 探测器的稳定唯一名称，作为产出信号的 `source` 字段。
    ///
    /// # Returns
    /// 静态名称字符串。
    fn name(&self) -> &'static str;

    /// # Summary
    /// 本探测器愿意处理的事件类型集合。
    ///
    /// # Logic
    /// 仅供注册表做粗粒度分发使用，`detect` 内部不强制校验。
    ///
    /// # Returns
    /// 事件类型切片。
    fn accepts(&self) -> &[EventType];

    /// # Summary
    /// 对单个事件运行全部内部子规则，产出零或多条统一信号。
    ///
    /// # Logic
    /// 1. 按事件类型路由到匹配的子规则（一个事件可命中多条）。
    /// 2. 拼接各子规则结果并应用探测器级置信度下限。
    ///
    /// # Arguments
    /// * `event`: 只读的原始市场事件。
    ///
    /// # Returns
    /// 信号列表，可能为空；返回后所有权归调用方。
    fn detect(&self, event: &RawMarketEvent) -> Vec<UnifiedSignal>;
}
