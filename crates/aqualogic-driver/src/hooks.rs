//! 诊断钩子系统
//!
//! 本模块提供运行时钩子管理功能，用于在报文解码/分类时触发自定义回调。
//! 钩子只用于诊断（日志、抓包、统计），**绝不参与控制流**：
//! 无论钩子做什么，管线的解码和状态提交行为都不变。
//!
//! # 设计原则
//!
//! - **非阻塞**: 回调在 IO 线程上同步执行，必须立即返回；
//!   需要重活的回调请通过 Channel 转移到别的线程
//! - **keep-alive 静默**: 内置的日志钩子对 keep-alive 不产生任何日志条目，
//!   只有未知报文和丢弃事件才会出现在诊断输出里

use tracing::{debug, warn};

use std::sync::Arc;

/// 报文回调 Trait
///
/// 所有方法都有空的默认实现，按需覆盖。
///
/// # 性能要求
///
/// - 在 IO 线程上同步调用，必须立即返回
/// - 禁止阻塞操作（锁等待、I/O）
/// - 推荐使用 `crossbeam_channel::Sender::try_send` 异步处理
pub trait PacketCallback: Send + Sync {
    /// 每个成功解码的报文（含 keep-alive），载荷已去除 DLE 填充
    fn on_packet(&self, payload: &[u8]) {
        let _ = payload;
    }

    /// 报文被分类为 keep-alive
    fn on_keep_alive(&self) {}

    /// 报文未命中任何遥测规则
    fn on_unknown(&self, payload: &[u8]) {
        let _ = payload;
    }

    /// 载荷溢出，`dropped` 为被丢弃的累积字节
    fn on_overflow(&self, dropped: &[u8]) {
        let _ = dropped;
    }

    /// 帧错误，`dropped` 为被丢弃的累积字节
    fn on_framing_error(&self, dropped: &[u8]) {
        let _ = dropped;
    }
}

/// 钩子管理器
///
/// 管理运行时回调列表，由 IO 线程在解码循环中触发。
/// 回调列表在管线启动前装配完毕，运行期间不再变化，
/// 因此不需要外部同步。
#[derive(Default)]
pub struct HookManager {
    /// 回调列表
    callbacks: Vec<Arc<dyn PacketCallback>>,
}

impl HookManager {
    /// 创建新的钩子管理器
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// 添加回调
    pub fn add_callback(&mut self, callback: Arc<dyn PacketCallback>) {
        self.callbacks.push(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 获取回调数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// 检查是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// 触发 on_packet
    pub fn trigger_packet(&self, payload: &[u8]) {
        for callback in self.callbacks.iter() {
            callback.on_packet(payload);
        }
    }

    /// 触发 on_keep_alive
    pub fn trigger_keep_alive(&self) {
        for callback in self.callbacks.iter() {
            callback.on_keep_alive();
        }
    }

    /// 触发 on_unknown
    pub fn trigger_unknown(&self, payload: &[u8]) {
        for callback in self.callbacks.iter() {
            callback.on_unknown(payload);
        }
    }

    /// 触发 on_overflow
    pub fn trigger_overflow(&self, dropped: &[u8]) {
        for callback in self.callbacks.iter() {
            callback.on_overflow(dropped);
        }
    }

    /// 触发 on_framing_error
    pub fn trigger_framing_error(&self, dropped: &[u8]) {
        for callback in self.callbacks.iter() {
            callback.on_framing_error(dropped);
        }
    }
}

/// 内置诊断日志钩子
///
/// 对应控制台诊断输出：未知报文记 debug，丢弃事件记 warn。
/// keep-alive 与正常解码不产生日志条目。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl PacketCallback for TracingDiagnostics {
    fn on_unknown(&self, payload: &[u8]) {
        debug!("Unknown packet: {}", hex::encode(payload));
    }

    fn on_overflow(&self, dropped: &[u8]) {
        warn!(
            "Max packet size exceeded, dropping {} bytes: {}",
            dropped.len(),
            hex::encode(&dropped[..dropped.len().min(32)])
        );
    }

    fn on_framing_error(&self, dropped: &[u8]) {
        warn!(
            "Framing error, dropping {} bytes: {}",
            dropped.len(),
            hex::encode(dropped)
        );
    }
}
