//! Builder 模式实现
//!
//! 提供链式构造 [`Bridge`] 实例的便捷方式。

use std::sync::Arc;
use std::time::Duration;

use aqualogic_protocol::{PacketClassifier, PacketRule};
use aqualogic_serial::{LinkAdapter, SerialLinkAdapter};

use crate::bridge::Bridge;
use crate::error::DriverError;
use crate::hooks::{HookManager, PacketCallback, TracingDiagnostics};
use crate::monitor::LinkMonitor;
use crate::pipeline::PipelineConfig;

/// 默认串口设备
pub const DEFAULT_DEVICE: &str = "/dev/ttyAMA0";

/// AquaLogic 总线固定波特率
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// 设备路径环境变量（显式设置优先于它）
pub const DEVICE_ENV: &str = "AQUALOGIC_DEVICE";

/// Bridge Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use aqualogic_driver::{BridgeBuilder, PipelineConfig};
///
/// // 使用默认配置（AQUALOGIC_DEVICE 或 /dev/ttyAMA0，19200 波特）
/// let bridge = BridgeBuilder::new().build().unwrap();
///
/// // 自定义设备和 Pipeline 配置
/// let bridge = BridgeBuilder::new()
///     .device("/dev/ttyUSB0")
///     .pipeline_config(PipelineConfig {
///         read_timeout_ms: 50,
///         read_buffer_size: 512,
///     })
///     .build()
///     .unwrap();
/// ```
pub struct BridgeBuilder {
    /// 串口设备路径
    device: Option<String>,
    /// 波特率
    baud_rate: Option<u32>,
    /// Pipeline 配置
    pipeline_config: Option<PipelineConfig>,
    /// 遥测规则
    classifier: PacketClassifier,
    /// 诊断钩子
    hooks: HookManager,
    /// 是否挂内置日志钩子（默认挂）
    default_diagnostics: bool,
    /// 链路活性超时
    link_timeout: Option<Duration>,
}

impl BridgeBuilder {
    /// 创建新的 Builder
    pub fn new() -> Self {
        Self {
            device: None,
            baud_rate: None,
            pipeline_config: None,
            classifier: PacketClassifier::new(),
            hooks: HookManager::new(),
            default_diagnostics: true,
            link_timeout: None,
        }
    }

    /// 设置串口设备路径（可选）
    ///
    /// 未设置时先查 `AQUALOGIC_DEVICE` 环境变量，再退回 `/dev/ttyAMA0`。
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// 设置波特率（可选，默认 19200）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }

    /// 设置 Pipeline 配置（可选）
    pub fn pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = Some(config);
        self
    }

    /// 注册一条遥测规则
    pub fn rule(mut self, rule: Arc<dyn PacketRule>) -> Self {
        self.classifier.register(rule);
        self
    }

    /// 添加一个诊断回调
    pub fn callback(mut self, callback: Arc<dyn PacketCallback>) -> Self {
        self.hooks.add_callback(callback);
        self
    }

    /// 关闭内置的 tracing 诊断日志钩子
    pub fn quiet(mut self) -> Self {
        self.default_diagnostics = false;
        self
    }

    /// 设置链路活性超时（可选，默认 2s）
    pub fn link_timeout(mut self, timeout: Duration) -> Self {
        self.link_timeout = Some(timeout);
        self
    }

    /// 打开串口并启动管线
    pub fn build(self) -> Result<Bridge, DriverError> {
        let device = self
            .device
            .clone()
            .or_else(|| std::env::var(DEVICE_ENV).ok())
            .unwrap_or_else(|| DEFAULT_DEVICE.to_string());
        let baud_rate = self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE);

        let link = SerialLinkAdapter::open(&device, baud_rate)?;
        Ok(self.build_with_link(link))
    }

    /// 在调用方给定的链路上启动管线
    ///
    /// 用于自定义适配器（以及 `mock` feature 下的脚本化链路）。
    pub fn build_with_link(mut self, link: impl LinkAdapter + Send + 'static) -> Bridge {
        if self.default_diagnostics {
            self.hooks.add_callback(Arc::new(TracingDiagnostics));
        }
        let monitor = match self.link_timeout {
            Some(timeout) => LinkMonitor::new(timeout),
            None => LinkMonitor::default(),
        };

        Bridge::with_parts(
            link,
            self.pipeline_config.unwrap_or_default(),
            self.classifier,
            self.hooks,
            monitor,
        )
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqualogic_protocol::{ClosureRule, FieldUpdate, TelemetryField, encode_frame};
    use aqualogic_serial::MockLinkAdapter;

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_DEVICE, "/dev/ttyAMA0");
        assert_eq!(DEFAULT_BAUD_RATE, 19200);
    }

    #[test]
    fn test_build_with_link_registers_rules() {
        let (link, tx) = MockLinkAdapter::new();
        let mut bridge = BridgeBuilder::new()
            .quiet()
            .pipeline_config(PipelineConfig {
                read_timeout_ms: 10,
                ..Default::default()
            })
            .rule(Arc::new(ClosureRule::new(
                |payload| payload.len() == 2 && payload[0] == 0x0C,
                |payload| {
                    vec![FieldUpdate::new(
                        TelemetryField::AirTemperature,
                        format!("{} F", payload[1]),
                    )]
                },
            )))
            .build_with_link(link);

        tx.send(encode_frame(&[0x0C, 71]).unwrap()).unwrap();

        let value = bridge
            .context()
            .wait_field(TelemetryField::AirTemperature, Duration::from_secs(2));
        assert_eq!(value.as_deref(), Some("71 F"));

        bridge.shutdown();
    }

    #[test]
    fn test_custom_link_timeout_reaches_monitor() {
        let (link, _tx) = MockLinkAdapter::new();
        let mut bridge = BridgeBuilder::new()
            .quiet()
            .link_timeout(Duration::from_millis(20))
            .pipeline_config(PipelineConfig {
                read_timeout_ms: 10,
                ..Default::default()
            })
            .build_with_link(link);

        // 没有 keep-alive，20ms 后链路判死
        std::thread::sleep(Duration::from_millis(60));
        assert!(!bridge.is_link_alive());

        bridge.shutdown();
    }
}
