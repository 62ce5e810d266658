use crate::event::MarketScope;
use crate::signal::error::SignalError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 全市场信号的标的哨兵值（事件未携带具体标的时使用）。
pub const MARKET_WIDE_ASSET: &str = "MARKET";

/// # Summary
/// 信号所属市场枚举。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    // A 股（含指数、ETF 与港股，沿用统一口径）
    AShare,
    // 美股
    UsStock,
    // 加密货币
    Crypto,
    // 大宗商品
    Commodity,
}

impl Market {
    /// # Summary
    /// 市场范围到信号市场的固定映射。
    ///
    /// # Logic
    /// cn_stock / cn_index / cn_etf / hk_stock 归入 A 股口径，
    /// 其余范围一一对应；未来新增范围时默认回落到 A 股。
    ///
    /// # Arguments
    /// * `scope`: 事件携带的市场范围。
    ///
    /// # Returns
    /// 映射后的信号市场。
    pub fn from_scope(scope: MarketScope) -> Self {
        match scope {
            MarketScope::CnStock
            | MarketScope::CnIndex
            | MarketScope::CnEtf
            | MarketScope::HkStock => Market::AShare,
            MarketScope::UsStock => Market::UsStock,
            MarketScope::Crypto => Market::Crypto,
            MarketScope::Commodity => Market::Commodity,
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Market::AShare => write!(f, "a_share"),
            Market::UsStock => write!(f, "us_stock"),
            Market::Crypto => write!(f, "crypto"),
            Market::Commodity => write!(f, "commodity"),
        }
    }
}

/// # Summary
/// 信号方向枚举。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    // 看多
    Long,
    // 看空
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// # Summary
/// 信号的分析类别枚举（描述信号的分析维度，而非产出它的探测器）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    // 资金流向类
    Flow,
    // 技术面类
    Technical,
    // 新闻/舆情类
    News,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Flow => write!(f, "flow"),
            SignalType::Technical => write!(f, "technical"),
            SignalType::News => write!(f, "news"),
        }
    }
}

/// # Summary
/// 统一信号实体，探测器产出的标准化输出单元。
///
/// # Invariants
/// - `strength` 与 `confidence` 恒在 [0,1] 区间内：构造时截断并保留 4 位小数，
///   永不因越界输入而拒绝。
/// - 信号构造后不可变，所有权在返回后即归调用方（路由层）。
/// - `signal_id` 由关键字段确定性派生，序列化/反序列化往返保持同一身份。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedSignal {
    // 确定性信号标识
    pub signal_id: String,
    // 所属市场
    pub market: Market,
    // 标的代码，全市场信号为 "MARKET"
    pub asset: String,
    // 信号方向
    pub direction: Direction,
    // 分析类别
    pub signal_type: SignalType,
    // 幅度指标 [0,1]（不是概率）
    pub strength: f64,
    // 置信指标 [0,1]
    pub confidence: f64,
    // 产出探测器名称
    pub source: String,
    // 源事件时刻
    pub timestamp: DateTime<Utc>,
    // 溯源元数据：命中的子规则、阈值与实测值、type 标签等
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl UnifiedSignal {
    /// # Summary
    /// 构造一条统一信号。
    ///
    /// # Logic
    /// 1. 将 strength / confidence 截断到 [0,1] 并保留 4 位小数。
    /// 2. 以 `source|market|asset|signal_type|direction|时刻|type标签` 的
    ///    规范串做 blake3 摘要，取前 16 位十六进制作为 `signal_id`。
    ///
    /// # Arguments
    /// * `market`: 所属市场。
    /// * `asset`: 标的代码或 "MARKET" 哨兵。
    /// * `direction`: 信号方向。
    /// * `signal_type`: 分析类别。
    /// * `strength`: 幅度指标（任意实数，内部截断）。
    /// * `confidence`: 置信指标（任意实数，内部截断）。
    /// * `source`: 产出探测器名称。
    /// * `timestamp`: 源事件时刻。
    /// * `metadata`: 溯源元数据。
    ///
    /// # Returns
    /// 不可变的信号实体。
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market: Market,
        asset: impl Into<String>,
        direction: Direction,
        signal_type: SignalType,
        strength: f64,
        confidence: f64,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
        metadata: Map<String, Value>,
    ) -> Self {
        let asset = asset.into();
        let source = source.into();
        let type_tag = metadata.get("type").and_then(Value::as_str).unwrap_or("");
        let canonical = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            source,
            market,
            asset,
            signal_type,
            direction,
            timestamp.to_rfc3339(),
            type_tag,
        );
        let digest = blake3::hash(canonical.as_bytes()).to_hex();
        let signal_id: String = digest.as_str().chars().take(16).collect();

        Self {
            signal_id,
            market,
            asset,
            direction,
            signal_type,
            strength: clamp_score(strength),
            confidence: clamp_score(confidence),
            source,
            timestamp,
            metadata,
        }
    }

    /// # Summary
    /// 序列化为 JSON 对象（枚举字段以 snake_case 字符串承载）。
    ///
    /// # Returns
    /// 成功返回 JSON 值，失败返回 `SignalError::Serialize`。
    pub fn to_json(&self) -> Result<Value, SignalError> {
        serde_json::to_value(self).map_err(|e| SignalError::Serialize(e.to_string()))
    }

    /// # Summary
    /// 从 JSON 对象还原信号。
    ///
    /// # Logic
    /// 保留载荷中的 `signal_id` 原值，不重新派生，保证往返身份一致。
    ///
    /// # Arguments
    /// * `value`: `to_json` 产出的 JSON 对象。
    ///
    /// # Returns
    /// 成功返回信号实体，失败返回 `SignalError::Deserialize`。
    pub fn from_json(value: &Value) -> Result<Self, SignalError> {
        serde_json::from_value(value.clone()).map_err(|e| SignalError::Deserialize(e.to_string()))
    }
}

/// # Summary
/// 将得分截断到 [0,1] 并保留 4 位小数。
fn clamp_score(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    (x.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}
