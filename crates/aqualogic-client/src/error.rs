//! 客户端错误类型定义

use std::time::Duration;

use aqualogic_protocol::TelemetryField;
use thiserror::Error;

/// 查询错误类型
///
/// 超时是查询方自己的结果，不代表解码管线出了问题，
/// 因此不会出现在诊断日志里。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// 字段在时限内没有就绪
    #[error("Timed out after {timeout:?} waiting for field '{field}'")]
    Timeout {
        field: TelemetryField,
        timeout: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_field() {
        let err = QueryError::Timeout {
            field: TelemetryField::SaltLevel,
            timeout: Duration::from_millis(100),
        };
        let msg = format!("{err}");
        assert!(msg.contains("salt-level"));
        assert!(msg.contains("100ms"));
    }
}
