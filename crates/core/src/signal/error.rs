use thiserror::Error;

/// # Summary
/// 信号域错误枚举，覆盖信号与 JSON 表示之间的转换失败。
///
/// # Invariants
/// - 强度/置信度越界不是错误：构造时按 [0,1] 截断，永不拒绝。
#[derive(Error, Debug)]
pub enum SignalError {
    // 信号序列化为 JSON 失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    // 从 JSON 还原信号失败
    #[error("Deserialize error: {0}")]
    Deserialize(String),
}
