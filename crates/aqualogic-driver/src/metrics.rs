//! 管线性能指标模块
//!
//! 提供零开销的原子计数器，用于监控串口链路和解码管线的健康状态。
//! 所有计数器都使用原子操作，可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 解码管线实时指标
///
/// # 使用示例
///
/// ```rust
/// use aqualogic_driver::BridgeMetrics;
/// use std::sync::Arc;
/// use std::sync::atomic::Ordering;
///
/// let metrics = Arc::new(BridgeMetrics::default());
///
/// // 在 IO 线程中更新指标
/// metrics.packets_total.fetch_add(1, Ordering::Relaxed);
///
/// // 在主线程中读取快照
/// let snapshot = metrics.snapshot();
/// println!("Total packets: {}", snapshot.packets_total);
/// ```
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// 链路收到的总字节数（含噪声与定界字节）
    pub bytes_total: AtomicU64,

    /// 解码出的总报文数（含 keep-alive）
    pub packets_total: AtomicU64,

    /// keep-alive 报文数
    pub keep_alives: AtomicU64,

    /// 命中遥测规则并提交到状态的字段更新数
    pub telemetry_updates: AtomicU64,

    /// 未命中任何规则的报文数
    pub unknown_packets: AtomicU64,

    /// 载荷溢出次数（超过 MAX_PACKET 重新同步）
    pub overflows: AtomicU64,

    /// 帧错误次数（帧内 DLE 后跟非法字节）
    pub framing_errors: AtomicU64,

    /// 读超时次数（总线静默时的正常现象）
    pub read_timeouts: AtomicU64,
}

impl BridgeMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    ///
    /// 各计数器分别原子读取，彼此之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_total: self.bytes_total.load(Ordering::Relaxed),
            packets_total: self.packets_total.load(Ordering::Relaxed),
            keep_alives: self.keep_alives.load(Ordering::Relaxed),
            telemetry_updates: self.telemetry_updates.load(Ordering::Relaxed),
            unknown_packets: self.unknown_packets.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            framing_errors: self.framing_errors.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器（用于测试）
    pub fn reset(&self) {
        self.bytes_total.store(0, Ordering::Relaxed);
        self.packets_total.store(0, Ordering::Relaxed);
        self.keep_alives.store(0, Ordering::Relaxed);
        self.telemetry_updates.store(0, Ordering::Relaxed);
        self.unknown_packets.store(0, Ordering::Relaxed);
        self.overflows.store(0, Ordering::Relaxed);
        self.framing_errors.store(0, Ordering::Relaxed);
        self.read_timeouts.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变，用于读取）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MetricsSnapshot {
    /// 链路收到的总字节数
    pub bytes_total: u64,
    /// 解码出的总报文数
    pub packets_total: u64,
    /// keep-alive 报文数
    pub keep_alives: u64,
    /// 遥测字段更新数
    pub telemetry_updates: u64,
    /// 未知报文数
    pub unknown_packets: u64,
    /// 溢出次数
    pub overflows: u64,
    /// 帧错误次数
    pub framing_errors: u64,
    /// 读超时次数
    pub read_timeouts: u64,
}
