use thiserror::Error;

/// # Summary
/// 事件域错误枚举，仅覆盖构造期的契约违规。
///
/// # Invariants
/// - 载荷 `data` 中的字段缺失或类型不符永远不是错误，由消费方按默认值降级处理。
/// - 只有事件本身的结构性字段（source / event_type / market / timestamp）非法时才返回本错误。
#[derive(Error, Debug)]
pub enum EventError {
    // 必填结构性字段缺失
    #[error("Missing required field: {0}")]
    MissingField(String),
    // 结构性字段存在但无法解析为预期类型
    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}
