//! 驱动层错误类型定义

use aqualogic_protocol::ProtocolError;
use aqualogic_serial::LinkError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口链路错误
    #[error("Serial link error: {0}")]
    Link(#[from] LinkError),

    /// 协议错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// IO 线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),
}
