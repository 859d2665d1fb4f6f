//! # AquaLogic Serial Adapter Layer
//!
//! 串口硬件抽象层，提供统一的字节流读取接口。
//!
//! 上层（driver）只依赖 [`LinkAdapter`] trait，不关心字节来自真实串口
//! 还是测试用的脚本化数据源。

use std::time::Duration;
use thiserror::Error;

pub mod port;

pub use port::SerialLinkAdapter;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::MockLinkAdapter;

/// 串口适配层统一错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] LinkDeviceError),
    #[error("Read timeout")]
    Timeout,
    #[error("Link closed")]
    Closed,
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDeviceErrorKind {
    Unknown,
    NotFound,
    NoDevice,
    AccessDenied,
    Busy,
    UnsupportedConfig,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct LinkDeviceError {
    pub kind: LinkDeviceErrorKind,
    pub message: String,
}

impl LinkDeviceError {
    pub fn new(kind: LinkDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 致命错误无法通过重试恢复，IO 循环应当退出
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            LinkDeviceErrorKind::NoDevice
                | LinkDeviceErrorKind::AccessDenied
                | LinkDeviceErrorKind::NotFound
        )
    }
}

impl From<String> for LinkDeviceError {
    fn from(message: String) -> Self {
        Self::new(LinkDeviceErrorKind::Unknown, message)
    }
}

impl From<&str> for LinkDeviceError {
    fn from(message: &str) -> Self {
        Self::new(LinkDeviceErrorKind::Unknown, message)
    }
}

/// 字节流数据源
///
/// 一条链路、一个读取方：字节严格按到达顺序交付，可以逐个也可以成段。
/// 读取方（driver 的 IO 线程）负责把段再拆成字节送入解码器。
pub trait LinkAdapter {
    /// 读取一段字节到 `buf`，返回实际读取的字节数（至少为 1）
    ///
    /// 超时返回 [`LinkError::Timeout`]；对端消失返回 [`LinkError::Closed`]。
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;

    /// 设置后续读取的超时
    fn set_read_timeout(&mut self, _timeout: Duration) {}

    /// 带一次性超时的读取
    fn read_chunk_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, LinkError> {
        self.set_read_timeout(timeout);
        self.read_chunk(buf)
    }
}
