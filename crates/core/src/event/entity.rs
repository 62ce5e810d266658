use crate::event::error::EventError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// # Summary
/// 事件来源枚举，标识原始行情的上游采集渠道。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    // 新浪行情接口
    Sina,
    // Tushare 数据服务
    Tushare,
    // akshare 数据服务
    Akshare,
    // 手工注入（测试或回放）
    Manual,
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSource::Sina => write!(f, "sina"),
            EventSource::Tushare => write!(f, "tushare"),
            EventSource::Akshare => write!(f, "akshare"),
            EventSource::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for EventSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sina" => Ok(EventSource::Sina),
            "tushare" => Ok(EventSource::Tushare),
            "akshare" => Ok(EventSource::Akshare),
            "manual" => Ok(EventSource::Manual),
            _ => Err(format!("Unknown EventSource: {}", s)),
        }
    }
}

/// # Summary
/// 事件类型枚举，决定事件被路由到哪些探测器及子规则。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // 市场异动（综合类，可能同时命中多条子规则）
    Anomaly,
    // 个股价格更新
    PriceUpdate,
    // 涨停/跌停事件
    LimitEvent,
    // 板块变动
    BoardChange,
    // 资金流事件
    Flow,
    // 新闻/舆情事件
    News,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Anomaly => write!(f, "anomaly"),
            EventType::PriceUpdate => write!(f, "price_update"),
            EventType::LimitEvent => write!(f, "limit_event"),
            EventType::BoardChange => write!(f, "board_change"),
            EventType::Flow => write!(f, "flow"),
            EventType::News => write!(f, "news"),
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anomaly" => Ok(EventType::Anomaly),
            "price_update" => Ok(EventType::PriceUpdate),
            "limit_event" => Ok(EventType::LimitEvent),
            "board_change" => Ok(EventType::BoardChange),
            "flow" => Ok(EventType::Flow),
            "news" => Ok(EventType::News),
            _ => Err(format!("Unknown EventType: {}", s)),
        }
    }
}

/// # Summary
/// 市场范围枚举，标识事件所属的市场板块。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketScope {
    // A 股个股
    CnStock,
    // A 股指数
    CnIndex,
    // A 股 ETF
    CnEtf,
    // 港股
    HkStock,
    // 美股
    UsStock,
    // 加密货币
    Crypto,
    // 大宗商品
    Commodity,
}

impl std::fmt::Display for MarketScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketScope::CnStock => write!(f, "cn_stock"),
            MarketScope::CnIndex => write!(f, "cn_index"),
            MarketScope::CnEtf => write!(f, "cn_etf"),
            MarketScope::HkStock => write!(f, "hk_stock"),
            MarketScope::UsStock => write!(f, "us_stock"),
            MarketScope::Crypto => write!(f, "crypto"),
            MarketScope::Commodity => write!(f, "commodity"),
        }
    }
}

impl FromStr for MarketScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cn_stock" => Ok(MarketScope::CnStock),
            "cn_index" => Ok(MarketScope::CnIndex),
            "cn_etf" => Ok(MarketScope::CnEtf),
            "hk_stock" => Ok(MarketScope::HkStock),
            "us_stock" => Ok(MarketScope::UsStock),
            "crypto" => Ok(MarketScope::Crypto),
            "commodity" => Ok(MarketScope::Commodity),
            _ => Err(format!("Unknown MarketScope: {}", s)),
        }
    }
}

/// # Summary
/// 原始市场事件实体，上游采集层产出的标准化输入单元。
///
/// # Invariants
/// - 事件构造后不可变，探测器按只读引用消费。
/// - `data` 为开放载荷，任何键都不保证存在；消费方必须经由带默认值的
///   类型化读取方法访问，绝不因字段缺失而失败。
/// - `timestamp` 必须携带时区（内部统一为 UTC）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMarketEvent {
    // 上游采集渠道
    pub source: EventSource,
    // 事件类型
    pub event_type: EventType,
    // 市场范围
    pub market: MarketScope,
    // 标的代码，None 表示全市场事件
    pub symbol: Option<String>,
    // 开放载荷，形状取决于事件类型与上游来源
    #[serde(default)]
    pub data: Map<String, Value>,
    // 事件发生时刻 (UTC)
    pub timestamp: DateTime<Utc>,
}

impl RawMarketEvent {
    /// # Summary
    /// 从 JSON 对象构造事件。
    ///
    /// # Logic
    /// 1. 校验载荷为 JSON 对象。
    /// 2. 逐一解析结构性字段 source / event_type / market / timestamp，
    ///    缺失返回 `MissingField`，类型不符返回 `InvalidField`。
    /// 3. `symbol` 与 `data` 为可选字段，缺失时分别取 None 与空映射。
    ///
    /// # Arguments
    /// * `value`: 上游采集层产出的 JSON 载荷。
    ///
    /// # Returns
    /// 成功返回事件实体，结构性契约违规返回 `EventError`。
    pub fn from_json(value: &Value) -> Result<Self, EventError> {
        let obj = value.as_object().ok_or_else(|| EventError::InvalidField {
            field: "event".to_string(),
            reason: "expected a JSON object".to_string(),
        })?;

        let source: EventSource = parse_enum_field(obj, "source")?;
        let event_type: EventType = parse_enum_field(obj, "event_type")?;
        let market: MarketScope = parse_enum_field(obj, "market")?;

        let ts_raw = required_str(obj, "timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(ts_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| EventError::InvalidField {
                field: "timestamp".to_string(),
                reason: e.to_string(),
            })?;

        let symbol = obj
            .get("symbol")
            .and_then(Value::as_str)
            .map(str::to_string);
        let data = obj
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            source,
            event_type,
            market,
            symbol,
            data,
            timestamp,
        })
    }

    /// # Summary
    /// 按键读取载荷中的数值字段。
    ///
    /// # Logic
    /// 键缺失、值为 null 或非数值时一律返回 0.0，整数按无损语义转为 f64。
    ///
    /// # Arguments
    /// * `key`: 载荷键名。
    ///
    /// # Returns
    /// 对应的 f64 值或默认值 0.0。
    pub fn data_f64(&self, key: &str) -> f64 {
        self.data.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// # Summary
    /// 按键读取载荷中的字符串字段。
    ///
    /// # Logic
    /// 键缺失、值为 null 或非字符串时一律返回空串。
    ///
    /// # Arguments
    /// * `key`: 载荷键名。
    ///
    /// # Returns
    /// 对应的字符串切片或默认值 ""。
    pub fn data_str(&self, key: &str) -> &str {
        self.data.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// # Summary
/// 解析必填的字符串字段。
fn required_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a str, EventError> {
    let value = obj
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| EventError::MissingField(field.to_string()))?;
    value.as_str().ok_or_else(|| EventError::InvalidField {
        field: field.to_string(),
        reason: "expected string".to_string(),
    })
}

/// # Summary
/// 解析必填的枚举字段（以 snake_case 字符串承载）。
fn parse_enum_field<T: FromStr<Err = String>>(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<T, EventError> {
    required_str(obj, field)?
        .parse::<T>()
        .map_err(|reason| EventError::InvalidField {
            field: field.to_string(),
            reason,
        })
}
