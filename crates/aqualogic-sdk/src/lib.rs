//! # AquaLogic SDK
//!
//! 读取 Hayward AquaLogic / ProLogic 池控制器遥测的统一入口。
//!
//! ## 分层
//!
//! - [`protocol`]: DLE/STX/ETX 帧解码与报文分类（无硬件依赖）
//! - [`serial`]: 串口链路适配层
//! - [`driver`]: IO 线程、共享状态、诊断钩子、链路监控
//! - [`client`]: 只读查询接口
//!
//! ## 快速开始
//!
//! ```no_run
//! use aqualogic_sdk::prelude::*;
//! use std::time::Duration;
//!
//! aqualogic_sdk::init_logging();
//!
//! let bridge = BridgeBuilder::new().device("/dev/ttyUSB0").build().unwrap();
//! let observer = AutomationObserver::new(bridge.context());
//!
//! match observer.field(TelemetryField::PoolTemperature, Duration::from_secs(5)) {
//!     Ok(temp) => println!("pool temp: {temp}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub use aqualogic_client as client;
pub use aqualogic_driver as driver;
pub use aqualogic_protocol as protocol;
pub use aqualogic_serial as serial;

/// 常用类型一站式导入
pub mod prelude {
    pub use aqualogic_client::{AutomationObserver, AutomationSnapshot, QueryError};
    pub use aqualogic_driver::{
        Bridge, BridgeBuilder, DriverError, MetricsSnapshot, PacketCallback, PipelineConfig,
    };
    pub use aqualogic_protocol::{
        ClosureRule, DecodeEvent, FieldUpdate, FrameDecoder, PacketClass, PacketClassifier,
        PacketRule, TelemetryField, encode_frame,
    };
    pub use aqualogic_serial::{LinkAdapter, LinkError};
}

/// 初始化日志（tracing + env-filter）
///
/// 订阅器遵循 `RUST_LOG`，未设置时默认 `info`。同时桥接 `log` 门面，
/// 依赖里用 `log` 宏打的日志也会进入 tracing 输出。重复调用无害。
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_log::LogTracer::init();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
