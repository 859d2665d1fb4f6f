//! # AquaLogic Driver
//!
//! IO 管线与遥测状态同步层。
//!
//! ## 架构
//!
//! ```text
//! SerialLinkAdapter (aqualogic-serial)
//!     ↓ 字节段，严格到达顺序
//! io_loop（单个 IO 线程）
//!     ↓ FrameDecoder / PacketClassifier (aqualogic-protocol)
//! AutomationContext（唯一共享可变状态）
//!     ↑ 并发只读
//! AutomationObserver (aqualogic-client)
//! ```
//!
//! 解码错误（溢出、帧错误）在管线内部就地恢复并通过诊断钩子上报，
//! 永远不会让 IO 线程退出；只有链路关闭和致命设备错误才会停机。

pub mod bridge;
pub mod builder;
pub mod error;
pub mod hooks;
pub mod metrics;
pub mod monitor;
pub mod pipeline;
pub mod state;

pub use bridge::Bridge;
pub use builder::{BridgeBuilder, DEFAULT_BAUD_RATE, DEFAULT_DEVICE, DEVICE_ENV};
pub use error::DriverError;
pub use hooks::{HookManager, PacketCallback, TracingDiagnostics};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use monitor::{DEFAULT_LINK_TIMEOUT, LinkMonitor};
pub use pipeline::PipelineConfig;
pub use state::{AutomationContext, AutomationState};
