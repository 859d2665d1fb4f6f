//! Bridge API 模块
//!
//! 提供对外的 [`Bridge`] 结构体，封装底层 IO 线程和状态同步细节。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};

use tracing::warn;

use aqualogic_protocol::PacketClassifier;
use aqualogic_serial::LinkAdapter;

use crate::hooks::{HookManager, TracingDiagnostics};
use crate::metrics::{BridgeMetrics, MetricsSnapshot};
use crate::monitor::LinkMonitor;
use crate::pipeline::{PipelineConfig, PipelineParts, io_loop};
use crate::state::AutomationContext;

/// 池控制器桥接驱动（对外 API）
///
/// 持有解码管线的 IO 线程和共享遥测上下文。Drop 时停止并 join IO 线程。
///
/// # Example
///
/// ```no_run
/// use aqualogic_driver::BridgeBuilder;
/// use aqualogic_protocol::TelemetryField;
/// use std::time::Duration;
///
/// let bridge = BridgeBuilder::new()
///     .device("/dev/ttyUSB0")
///     .build()
///     .unwrap();
///
/// let ctx = bridge.context();
/// if let Some(temp) = ctx.wait_field(TelemetryField::PoolTemperature, Duration::from_secs(5)) {
///     println!("pool temp: {temp}");
/// }
/// ```
pub struct Bridge {
    /// 共享遥测上下文
    ctx: Arc<AutomationContext>,
    /// 性能指标（原子计数器）
    metrics: Arc<BridgeMetrics>,
    /// 链路活性监控
    monitor: Arc<LinkMonitor>,
    /// 运行标志（用于线程生命周期联动）
    is_running: Arc<AtomicBool>,
    /// IO 线程句柄（Drop 时 join）
    io_thread: Option<JoinHandle<()>>,
}

impl Bridge {
    /// 在给定链路上启动管线（默认分类器 + 内置诊断日志钩子）
    ///
    /// 默认分类器只认识 keep-alive，所有其他报文走 Unknown 路径。
    /// 需要注册遥测规则时使用 [`BridgeBuilder`](crate::BridgeBuilder)。
    pub fn new(link: impl LinkAdapter + Send + 'static, config: Option<PipelineConfig>) -> Self {
        let mut hooks = HookManager::new();
        hooks.add_callback(Arc::new(TracingDiagnostics));
        Self::with_parts(
            link,
            config.unwrap_or_default(),
            PacketClassifier::new(),
            hooks,
            LinkMonitor::default(),
        )
    }

    /// 用装配好的部件启动管线（Builder 调用）
    pub(crate) fn with_parts(
        link: impl LinkAdapter + Send + 'static,
        config: PipelineConfig,
        classifier: PacketClassifier,
        hooks: HookManager,
        monitor: LinkMonitor,
    ) -> Self {
        let ctx = Arc::new(AutomationContext::new());
        let metrics = Arc::new(BridgeMetrics::new());
        let monitor = Arc::new(monitor);
        let is_running = Arc::new(AtomicBool::new(true));

        let parts = PipelineParts {
            ctx: ctx.clone(),
            metrics: metrics.clone(),
            monitor: monitor.clone(),
            classifier,
            hooks,
        };
        let running = is_running.clone();
        let io_thread = spawn(move || io_loop(link, parts, running, config));

        Self {
            ctx,
            metrics,
            monitor,
            is_running,
            io_thread: Some(io_thread),
        }
    }

    /// 共享遥测上下文（查询接口从这里构建）
    pub fn context(&self) -> Arc<AutomationContext> {
        self.ctx.clone()
    }

    /// 指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 链路活性监控
    pub fn monitor(&self) -> Arc<LinkMonitor> {
        self.monitor.clone()
    }

    /// 链路是否仍在发 keep-alive
    pub fn is_link_alive(&self) -> bool {
        self.monitor.is_alive()
    }

    /// IO 线程是否仍在运行
    ///
    /// 链路关闭或致命设备错误会让 IO 线程自行退出。
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// 停止 IO 线程并等待其退出
    ///
    /// 幂等；Drop 时自动调用。
    pub fn shutdown(&mut self) {
        self.is_running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.io_thread.take() {
            if handle.join().is_err() {
                warn!("IO thread panicked during shutdown");
            }
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
