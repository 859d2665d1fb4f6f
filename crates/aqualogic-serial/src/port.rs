//! serialport 后端适配器
//!
//! AquaLogic 主板的 RS-485 总线经电平转换后是普通 TTL 串口：
//! 19200 波特、8 数据位、无校验、1 停止位。

use std::io::Read;
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::info;

use crate::{LinkAdapter, LinkDeviceError, LinkDeviceErrorKind, LinkError};

/// 默认读超时
///
/// 19200 波特下 keep-alive 间隔远小于 100ms，超时只在总线静默时触发。
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// 真实串口适配器
pub struct SerialLinkAdapter {
    port: Box<dyn SerialPort>,
}

impl SerialLinkAdapter {
    /// 打开串口（8N1，给定波特率）
    ///
    /// # 参数
    /// - `device`: 串口设备路径（如 `/dev/ttyAMA0`、`/dev/ttyUSB0`）
    /// - `baud_rate`: 波特率（AquaLogic 总线固定 19200）
    pub fn open(device: &str, baud_rate: u32) -> Result<Self, LinkError> {
        let port = serialport::new(device, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(DEFAULT_READ_TIMEOUT)
            .open()
            .map_err(|e| LinkError::Device(map_serial_error(&e)))?;

        info!("Serial link opened: {} @ {} baud", device, baud_rate);
        Ok(Self { port })
    }
}

impl LinkAdapter for SerialLinkAdapter {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        match self.port.read(buf) {
            // 串口被拔出时部分驱动返回 0 长度读
            Ok(0) => Err(LinkError::Closed),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(LinkError::Timeout),
            Err(e) => Err(LinkError::Io(e)),
        }
    }

    fn set_read_timeout(&mut self, timeout: Duration) {
        let _ = self.port.set_timeout(timeout);
    }
}

/// 把 serialport 错误映射到结构化设备错误
fn map_serial_error(err: &serialport::Error) -> LinkDeviceError {
    let kind = match err.kind {
        serialport::ErrorKind::NoDevice => LinkDeviceErrorKind::NoDevice,
        serialport::ErrorKind::InvalidInput => LinkDeviceErrorKind::UnsupportedConfig,
        serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => LinkDeviceErrorKind::NotFound,
        serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
            LinkDeviceErrorKind::AccessDenied
        },
        serialport::ErrorKind::Io(_) => LinkDeviceErrorKind::Backend,
        serialport::ErrorKind::Unknown => LinkDeviceErrorKind::Unknown,
    };
    LinkDeviceError::new(kind, err.description.clone())
}
