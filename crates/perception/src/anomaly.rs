use serde_json::{Map, Value, json};
use std::collections::HashSet;
use tracing::debug;
use zhijue_core::detect::Detector;
use zhijue_core::event::{EventType, RawMarketEvent};
use zhijue_core::signal::{Direction, MARKET_WIDE_ASSET, Market, SignalType, UnifiedSignal};

// 探测器稳定名称，作为产出信号的 source 字段
const DETECTOR_NAME: &str = "anomaly";

// 大单规则的标的哨兵：该规则始终针对具体标的，与全市场哨兵 "MARKET" 区分
const UNKNOWN_ASSET: &str = "UNKNOWN";

// 注册表分发用的事件类型集合
const ACCEPTED: [EventType; 4] = [
    EventType::Anomaly,
    EventType::PriceUpdate,
    EventType::LimitEvent,
    EventType::BoardChange,
];

/// # Summary
/// 异动探测器配置，覆盖四条子规则的阈值与打分曲线参数。
///
/// # Invariants
/// - 配置在探测器构造时一次性确定，探测期间只读。
/// - `watchlist_symbols` 为空集表示不做自选股限制（而非"不匹配任何标的"）。
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    // 触发涨停潮的最小涨停家数
    pub limit_up_count_threshold: f64,
    // 触发跌停潮的最小跌停家数
    pub limit_down_count_threshold: f64,
    // 涨停潮信号的基础强度
    pub limit_up_strength_base: f64,
    // 跌停潮信号的基础强度
    pub limit_down_strength_base: f64,
    // 大单的最小成交金额（货币单位）
    pub large_order_amount_threshold: f64,
    // 大单信号的基础强度
    pub large_order_strength: f64,
    // 大单信号的固定置信度
    pub large_order_confidence: f64,
    // 触发自选股异动的最小绝对涨跌幅（百分比）
    pub watchlist_move_pct_threshold: f64,
    // 自选股集合，空集表示不限制
    pub watchlist_symbols: HashSet<String>,
    // 自选股异动信号的基础强度
    pub watchlist_strength_base: f64,
    // 自选股异动信号的固定置信度
    pub watchlist_confidence: f64,
    // 触发放量的最小 当前量/均量 比值
    pub volume_spike_ratio: f64,
    // 均量窗口长度（仅作说明，均量由上游计算）
    pub volume_avg_period: u64,
    // 放量信号的基础强度
    pub volume_spike_strength_base: f64,
    // 放量信号的固定置信度
    pub volume_spike_confidence: f64,
    // 探测器级置信度下限，低于该值的信号被过滤
    pub min_confidence: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            limit_up_count_threshold: 10.0,
            limit_down_count_threshold: 10.0,
            limit_up_strength_base: 0.6,
            limit_down_strength_base: 0.6,
            large_order_amount_threshold: 5_000_000.0,
            large_order_strength: 0.65,
            large_order_confidence: 0.60,
            watchlist_move_pct_threshold: 5.0,
            watchlist_symbols: HashSet::new(),
            watchlist_strength_base: 0.55,
            watchlist_confidence: 0.65,
            volume_spike_ratio: 3.0,
            volume_avg_period: 20,
            volume_spike_strength_base: 0.60,
            volume_spike_confidence: 0.55,
            min_confidence: 0.0,
        }
    }
}

impl AnomalyConfig {
    /// # Summary
    /// 在默认配置之上合并覆盖项。
    ///
    /// # Logic
    /// 1. 从默认值出发，仅修改覆盖映射中出现的已知键。
    /// 2. 未知键静默忽略，兼容前向配置超集。
    /// 3. 已知键但值类型不符时保持默认值。
    ///
    /// # Arguments
    /// * `overrides`: 选项名到值的覆盖映射。
    ///
    /// # Returns
    /// 合并后的配置。
    pub fn from_overrides(overrides: &Map<String, Value>) -> Self {
        let mut cfg = Self::default();
        for (key, value) in overrides {
            match key.as_str() {
                "limit_up_count_threshold" => set_f64(&mut cfg.limit_up_count_threshold, value),
                "limit_down_count_threshold" => set_f64(&mut cfg.limit_down_count_threshold, value),
                "limit_up_strength_base" => set_f64(&mut cfg.limit_up_strength_base, value),
                "limit_down_strength_base" => set_f64(&mut cfg.limit_down_strength_base, value),
                "large_order_amount_threshold" => {
                    set_f64(&mut cfg.large_order_amount_threshold, value)
                }
                "large_order_strength" => set_f64(&mut cfg.large_order_strength, value),
                "large_order_confidence" => set_f64(&mut cfg.large_order_confidence, value),
                "watchlist_move_pct_threshold" => {
                    set_f64(&mut cfg.watchlist_move_pct_threshold, value)
                }
                "watchlist_symbols" => {
                    if let Some(arr) = value.as_array() {
                        cfg.watchlist_symbols = arr
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect();
                    }
                }
                "watchlist_strength_base" => set_f64(&mut cfg.watchlist_strength_base, value),
                "watchlist_confidence" => set_f64(&mut cfg.watchlist_confidence, value),
                "volume_spike_ratio" => set_f64(&mut cfg.volume_spike_ratio, value),
                "volume_avg_period" => {
                    if let Some(v) = value.as_u64() {
                        cfg.volume_avg_period = v;
                    }
                }
                "volume_spike_strength_base" => set_f64(&mut cfg.volume_spike_strength_base, value),
                "volume_spike_confidence" => set_f64(&mut cfg.volume_spike_confidence, value),
                "min_confidence" => set_f64(&mut cfg.min_confidence, value),
                // 未知键静默忽略
                _ => {}
            }
        }
        cfg
    }
}

/// # Summary
/// 覆盖值可解析为 f64 时写入目标槽位，否则保持原值。
fn set_f64(slot: &mut f64, value: &Value) {
    if let Some(v) = value.as_f64() {
        *slot = v;
    }
}

/// # Summary
/// A 股异动探测器：从单个事件中探测四类相互独立的市场异动。
///
/// # Invariants
/// - 无内部状态：`detect` 仅依赖事件与构造期配置，可多线程并发调用。
/// - 载荷字段缺失时各子规则按默认值降级为不产出信号，绝不报错。
/// - 一个事件可同时命中多条子规则，结果拼接后按 `min_confidence` 过滤。
pub struct AnomalyDetector {
    // 构造期固定的探测配置
    config: AnomalyConfig,
}

impl AnomalyDetector {
    /// # Summary
    /// 以给定配置构造探测器。
    ///
    /// # Arguments
    /// * `config`: 合并完成的探测配置。
    ///
    /// # Returns
    /// 探测器实例。
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// # Summary
    /// 以覆盖映射构造探测器（默认配置 + 覆盖项）。
    ///
    /// # Arguments
    /// * `overrides`: 选项覆盖映射，未知键被忽略。
    ///
    /// # Returns
    /// 探测器实例。
    pub fn from_overrides(overrides: &Map<String, Value>) -> Self {
        Self::new(AnomalyConfig::from_overrides(overrides))
    }

    /// # Summary
    /// 读取当前配置（只读）。
    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    // ── 涨停/跌停潮 ──────────────────────────────────────────────

    /// # Summary
    /// 涨跌停潮子规则。
    ///
    /// # Logic
    /// 1. 读取 limit_up_count / limit_down_count（缺省 0）。
    /// 2. 两侧独立判定：家数达到阈值时按 `ratio = count / max(阈值, 1)`
    ///    计算强度与置信度，涨停潮产出 long/flow，跌停潮产出 short/flow。
    /// 3. 同一事件两侧可同时命中。
    fn detect_limit_wave(&self, event: &RawMarketEvent, market: Market) -> Vec<UnifiedSignal> {
        let mut signals = Vec::new();
        let limit_up_count = event.data_f64("limit_up_count");
        let limit_down_count = event.data_f64("limit_down_count");
        let asset = event.symbol.as_deref().unwrap_or(MARKET_WIDE_ASSET);

        let up_threshold = self.config.limit_up_count_threshold;
        if limit_up_count >= up_threshold {
            // 涨停家数越多信号越强
            let ratio = limit_up_count / up_threshold.max(1.0);
            let strength = (self.config.limit_up_strength_base + 0.1 * (ratio - 1.0)).min(1.0);
            let confidence = (0.65 + 0.05 * (ratio - 1.0)).min(0.95);
            debug!(asset, limit_up_count, up_threshold, "limit-up surge");

            let mut meta = Map::new();
            meta.insert("detector".to_string(), json!("limit_wave"));
            meta.insert("type".to_string(), json!("limit_up_surge"));
            meta.insert("limit_up_count".to_string(), json!(limit_up_count));
            meta.insert("threshold".to_string(), json!(up_threshold));
            signals.push(self.make_signal(
                market,
                asset,
                Direction::Long,
                SignalType::Flow,
                strength,
                confidence,
                event,
                meta,
            ));
        }

        let down_threshold = self.config.limit_down_count_threshold;
        if limit_down_count >= down_threshold {
            let ratio = limit_down_count / down_threshold.max(1.0);
            let strength = (self.config.limit_down_strength_base + 0.1 * (ratio - 1.0)).min(1.0);
            let confidence = (0.65 + 0.05 * (ratio - 1.0)).min(0.95);
            debug!(asset, limit_down_count, down_threshold, "limit-down surge");

            let mut meta = Map::new();
            meta.insert("detector".to_string(), json!("limit_wave"));
            meta.insert("type".to_string(), json!("limit_down_surge"));
            meta.insert("limit_down_count".to_string(), json!(limit_down_count));
            meta.insert("threshold".to_string(), json!(down_threshold));
            signals.push(self.make_signal(
                market,
                asset,
                Direction::Short,
                SignalType::Flow,
                strength,
                confidence,
                event,
                meta,
            ));
        }

        signals
    }

    // ── 大笔买入/卖出 ────────────────────────────────────────────

    /// # Summary
    /// 大单子规则。
    ///
    /// # Logic
    /// 1. 读取 order_amount（缺省 0）与 order_side（大小写不敏感，缺省空串）。
    /// 2. 金额低于阈值不产出；否则强度随金额比值增长，置信度取固定值。
    /// 3. buy → long/large_buy，sell → short/large_sell，
    ///    其余方向视为未知：long/large_order_unknown 且置信度乘 0.8。
    fn detect_large_order(&self, event: &RawMarketEvent, market: Market) -> Vec<UnifiedSignal> {
        let order_amount = event.data_f64("order_amount");
        let order_side = event.data_str("order_side").to_lowercase();
        let asset = event.symbol.as_deref().unwrap_or(UNKNOWN_ASSET);

        let threshold = self.config.large_order_amount_threshold;
        if order_amount < threshold {
            return Vec::new();
        }

        let ratio = order_amount / threshold.max(1.0);
        let strength = (self.config.large_order_strength + 0.05 * (ratio - 1.0)).min(1.0);
        let mut confidence = self.config.large_order_confidence;

        let (direction, order_type) = match order_side.as_str() {
            "buy" => (Direction::Long, "large_buy"),
            "sell" => (Direction::Short, "large_sell"),
            _ => {
                // 方向不明：默认看多并降低置信度
                confidence *= 0.8;
                (Direction::Long, "large_order_unknown")
            }
        };
        debug!(asset, order_amount, side = %order_side, "large order");

        let mut meta = Map::new();
        meta.insert("detector".to_string(), json!("large_order"));
        meta.insert("type".to_string(), json!(order_type));
        meta.insert("order_amount".to_string(), json!(order_amount));
        meta.insert("order_side".to_string(), json!(order_side));
        meta.insert("threshold".to_string(), json!(threshold));
        vec![self.make_signal(
            market,
            asset,
            direction,
            SignalType::Flow,
            strength,
            confidence,
            event,
            meta,
        )]
    }

    // ── 自选股异动 ───────────────────────────────────────────────

    /// # Summary
    /// 自选股异动子规则。
    ///
    /// # Logic
    /// 1. 事件必须携带标的代码，否则不产出。
    /// 2. 配置了非空自选股集合时，标的不在集合内则不产出；空集不做限制。
    /// 3. |change_pct| 达到阈值时产出 technical 信号，方向随涨跌幅符号。
    fn detect_watchlist_move(&self, event: &RawMarketEvent, market: Market) -> Vec<UnifiedSignal> {
        let Some(asset) = event.symbol.as_deref() else {
            return Vec::new();
        };

        let watchlist = &self.config.watchlist_symbols;
        if !watchlist.is_empty() && !watchlist.contains(asset) {
            return Vec::new();
        }

        let change_pct = event.data_f64("change_pct");
        let threshold = self.config.watchlist_move_pct_threshold;
        if change_pct.abs() < threshold {
            return Vec::new();
        }

        let direction = if change_pct > 0.0 {
            Direction::Long
        } else {
            Direction::Short
        };
        // 涨跌幅越大信号越强
        let magnitude = change_pct.abs() / threshold.max(0.01);
        let strength = (self.config.watchlist_strength_base + 0.1 * (magnitude - 1.0)).min(1.0);
        let confidence = self.config.watchlist_confidence;
        debug!(asset, change_pct, threshold, "watchlist move");

        let mut meta = Map::new();
        meta.insert("detector".to_string(), json!("watchlist_move"));
        meta.insert("type".to_string(), json!("watchlist_anomaly"));
        meta.insert("change_pct".to_string(), json!(change_pct));
        meta.insert("threshold".to_string(), json!(threshold));
        meta.insert(
            "on_watchlist".to_string(),
            json!(watchlist.is_empty() || watchlist.contains(asset)),
        );
        vec![self.make_signal(
            market,
            asset,
            direction,
            SignalType::Technical,
            strength,
            confidence,
            event,
            meta,
        )]
    }

    // ── 放量 ─────────────────────────────────────────────────────

    /// # Summary
    /// 放量子规则。
    ///
    /// # Logic
    /// 1. 读取 volume / avg_volume（缺省 0），任一 ≤ 0 不产出（防除零）。
    /// 2. `ratio = volume / avg_volume` 达到阈值时产出 flow 信号，
    ///    方向取自 change_pct 的符号（非负看多）。
    fn detect_volume_spike(&self, event: &RawMarketEvent, market: Market) -> Vec<UnifiedSignal> {
        let current_volume = event.data_f64("volume");
        let avg_volume = event.data_f64("avg_volume");
        let asset = event.symbol.as_deref().unwrap_or(UNKNOWN_ASSET);

        if avg_volume <= 0.0 || current_volume <= 0.0 {
            return Vec::new();
        }

        let ratio = current_volume / avg_volume;
        let spike_threshold = self.config.volume_spike_ratio;
        if ratio < spike_threshold {
            return Vec::new();
        }

        let change_pct = event.data_f64("change_pct");
        let direction = if change_pct >= 0.0 {
            Direction::Long
        } else {
            Direction::Short
        };
        let strength =
            (self.config.volume_spike_strength_base + 0.08 * (ratio - spike_threshold)).min(1.0);
        let confidence = self.config.volume_spike_confidence;
        debug!(asset, ratio, spike_threshold, "volume spike");

        let mut meta = Map::new();
        meta.insert("detector".to_string(), json!("volume_spike"));
        meta.insert("type".to_string(), json!("volume_anomaly"));
        meta.insert(
            "volume_ratio".to_string(),
            json!((ratio * 100.0).round() / 100.0),
        );
        meta.insert("current_volume".to_string(), json!(current_volume));
        meta.insert("avg_volume".to_string(), json!(avg_volume));
        meta.insert("spike_threshold".to_string(), json!(spike_threshold));
        vec![self.make_signal(
            market,
            asset,
            direction,
            SignalType::Flow,
            strength,
            confidence,
            event,
            meta,
        )]
    }

    // ── 信号装配 ─────────────────────────────────────────────────

    /// # Summary
    /// 统一的信号装配出口：截断得分、盖上探测器名称、复制事件时刻。
    #[allow(clippy::too_many_arguments)]
    fn make_signal(
        &self,
        market: Market,
        asset: &str,
        direction: Direction,
        signal_type: SignalType,
        strength: f64,
        confidence: f64,
        event: &RawMarketEvent,
        metadata: Map<String, Value>,
    ) -> UnifiedSignal {
        UnifiedSignal::new(
            market,
            asset,
            direction,
            signal_type,
            strength,
            confidence,
            DETECTOR_NAME,
            event.timestamp,
            metadata,
        )
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}

impl Detector for AnomalyDetector {
    fn name(&self) -> &'static str {
        DETECTOR_NAME
    }

    fn accepts(&self) -> &[EventType] {
        &ACCEPTED
    }

    /// # Summary
    /// 按事件类型路由到匹配的子规则并拼接结果。
    ///
    /// # Logic
    /// 1. limit_event | anomaly → 涨跌停潮。
    /// 2. anomaly | flow → 大单。
    /// 3. price_update | anomaly → 自选股异动。
    /// 4. price_update | anomaly | board_change → 放量。
    /// 5. 过滤掉置信度低于 `min_confidence` 的信号。
    fn detect(&self, event: &RawMarketEvent) -> Vec<UnifiedSignal> {
        let market = Market::from_scope(event.market);
        let mut signals = Vec::new();

        if matches!(
            event.event_type,
            EventType::LimitEvent | EventType::Anomaly
        ) {
            signals.extend(self.detect_limit_wave(event, market));
        }

        if matches!(event.event_type, EventType::Anomaly | EventType::Flow) {
            signals.extend(self.detect_large_order(event, market));
        }

        if matches!(
            event.event_type,
            EventType::PriceUpdate | EventType::Anomaly
        ) {
            signals.extend(self.detect_watchlist_move(event, market));
        }

        if matches!(
            event.event_type,
            EventType::PriceUpdate | EventType::Anomaly | EventType::BoardChange
        ) {
            signals.extend(self.detect_volume_spike(event, market));
        }

        let min_conf = self.config.min_confidence;
        signals.retain(|s| s.confidence >= min_conf);
        signals
    }
}
