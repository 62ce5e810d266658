use tracing::{debug, info};
use zhijue_core::detect::Detector;
use zhijue_core::event::RawMarketEvent;
use zhijue_core::signal::UnifiedSignal;

/// # Summary
/// 探测器注册表：持有一组探测器 trait 对象，按 `accepts` 分发事件。
///
/// # Invariants
/// - 注册完成后不再变更，分发过程只读，可多线程并发调用 `dispatch`。
/// - 注册表级 `min_confidence` 作用于合并后的信号流，与各探测器
///   内部的过滤相互独立（两者默认均为 0.0，即不过滤）。
pub struct DetectorRegistry {
    // 已注册的探测器集合
    detectors: Vec<Box<dyn Detector>>,
    // 注册表级置信度下限
    min_confidence: f64,
}

impl DetectorRegistry {
    /// # Summary
    /// 创建空注册表，置信度下限为 0.0（不过滤）。
    ///
    /// # Returns
    /// 注册表实例。
    pub fn new() -> Self {
        Self::with_min_confidence(0.0)
    }

    /// # Summary
    /// 创建带全局置信度下限的空注册表。
    ///
    /// # Arguments
    /// * `min_confidence`: 应用于合并信号流的置信度下限。
    ///
    /// # Returns
    /// 注册表实例。
    pub fn with_min_confidence(min_confidence: f64) -> Self {
        Self {
            detectors: Vec::new(),
            min_confidence,
        }
    }

    /// # Summary
    /// 注册一个探测器。
    ///
    /// # Arguments
    /// * `detector`: 实现 `Detector` 端口的 trait 对象。
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        info!(detector = detector.name(), "detector registered");
        self.detectors.push(detector);
    }

    /// # Summary
    /// 当前注册的探测器数量。
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// # Summary
    /// 注册表是否为空。
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// # Summary
    /// 将事件分发给所有接受该事件类型的探测器。
    ///
    /// # Logic
    /// 1. 遍历注册表，跳过 `accepts` 不含该事件类型的探测器。
    /// 2. 逐一运行 `detect` 并拼接结果。
    /// 3. 对合并后的信号流应用注册表级置信度下限。
    ///
    /// # Arguments
    /// * `event`: 只读的原始市场事件。
    ///
    /// # Returns
    /// 过滤后的信号列表，所有权归调用方。
    pub fn dispatch(&self, event: &RawMarketEvent) -> Vec<UnifiedSignal> {
        let mut merged = Vec::new();
        for detector in &self.detectors {
            if !detector.accepts().contains(&event.event_type) {
                continue;
            }
            let signals = detector.detect(event);
            debug!(
                detector = detector.name(),
                event_type = %event.event_type,
                count = signals.len(),
                "detector ran"
            );
            merged.extend(signals);
        }
        merged.retain(|s| s.confidence >= self.min_confidence);
        merged
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
