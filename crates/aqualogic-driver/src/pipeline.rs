//! Pipeline IO 循环模块
//!
//! 负责后台 IO 线程的串口字节接收、帧解码、报文分类和状态提交逻辑。
//!
//! # 顺序保证
//!
//! 一条链路只有一个读取方：字节严格按到达顺序送入解码器，解码与分类
//! 在同一个逻辑线程上同步完成，`feed` 内部没有并发也没有挂起点。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{error, info, trace, warn};

use aqualogic_protocol::{DecodeEvent, FrameDecoder, PacketClass, PacketClassifier};
use aqualogic_serial::{LinkAdapter, LinkError};

use crate::hooks::HookManager;
use crate::metrics::BridgeMetrics;
use crate::monitor::LinkMonitor;
use crate::state::AutomationContext;

/// Pipeline 配置
///
/// 控制 IO 线程的行为。
///
/// # Example
///
/// ```
/// use aqualogic_driver::PipelineConfig;
///
/// // 使用默认配置（100ms 读超时，256 字节读缓冲）
/// let config = PipelineConfig::default();
///
/// // 自定义配置
/// let config = PipelineConfig {
///     read_timeout_ms: 50,
///     read_buffer_size: 512,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 串口读超时（毫秒）
    ///
    /// 超时本身不是错误，只是给停机标志一个检查机会。
    pub read_timeout_ms: u64,
    /// 单次读取的缓冲大小（字节）
    pub read_buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 100,
            read_buffer_size: 256,
        }
    }
}

/// IO 线程共享的管线部件
///
/// 打包传给 [`io_loop`]，避免参数列表过长。
pub(crate) struct PipelineParts {
    pub ctx: Arc<AutomationContext>,
    pub metrics: Arc<BridgeMetrics>,
    pub monitor: Arc<LinkMonitor>,
    pub classifier: PacketClassifier,
    pub hooks: HookManager,
}

/// IO 主循环
///
/// 读取串口字节段 → 逐字节喂解码器 → 分类 → 提交状态/触发钩子。
/// 瞬态错误继续循环，致命设备错误或链路关闭时退出。
pub(crate) fn io_loop(
    mut link: impl LinkAdapter,
    parts: PipelineParts,
    is_running: Arc<AtomicBool>,
    config: PipelineConfig,
) {
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; config.read_buffer_size.max(1)];
    link.set_read_timeout(Duration::from_millis(config.read_timeout_ms));

    info!("IO loop started");

    while is_running.load(Ordering::Relaxed) {
        match link.read_chunk(&mut buf) {
            Ok(n) => {
                parts.metrics.bytes_total.fetch_add(n as u64, Ordering::Relaxed);
                for event in decoder.feed_slice(&buf[..n]) {
                    handle_event(event, &parts);
                }
            },
            Err(LinkError::Timeout) => {
                // 总线静默，回头检查停机标志
                parts.metrics.read_timeouts.fetch_add(1, Ordering::Relaxed);
            },
            Err(LinkError::Closed) => {
                warn!("Serial link closed, stopping IO loop");
                break;
            },
            Err(LinkError::Device(e)) if e.is_fatal() => {
                error!("Fatal link device error: {e}");
                break;
            },
            Err(e) => {
                warn!("Transient link error: {e}");
            },
        }
    }

    is_running.store(false, Ordering::Relaxed);
    info!("IO loop exited");
}

/// 处理一个解码事件
fn handle_event(event: DecodeEvent, parts: &PipelineParts) {
    match event {
        DecodeEvent::Packet(payload) => {
            parts.metrics.packets_total.fetch_add(1, Ordering::Relaxed);
            parts.hooks.trigger_packet(&payload);

            match parts.classifier.classify(&payload) {
                PacketClass::KeepAlive => {
                    parts.metrics.keep_alives.fetch_add(1, Ordering::Relaxed);
                    parts.monitor.register_keep_alive();
                    parts.hooks.trigger_keep_alive();
                },
                PacketClass::Telemetry(updates) => {
                    for update in updates {
                        trace!("Telemetry update: {} = {:?}", update.field, update.value);
                        parts.ctx.update(update.field, update.value);
                        parts
                            .metrics
                            .telemetry_updates
                            .fetch_add(1, Ordering::Relaxed);
                    }
                },
                PacketClass::Unknown(raw) => {
                    parts.metrics.unknown_packets.fetch_add(1, Ordering::Relaxed);
                    parts.hooks.trigger_unknown(&raw);
                },
            }
        },
        DecodeEvent::Overflow(dropped) => {
            parts.metrics.overflows.fetch_add(1, Ordering::Relaxed);
            parts.hooks.trigger_overflow(&dropped);
        },
        DecodeEvent::FramingError(dropped) => {
            parts.metrics.framing_errors.fetch_add(1, Ordering::Relaxed);
            parts.hooks.trigger_framing_error(&dropped);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqualogic_protocol::{ClosureRule, FieldUpdate, KEEP_ALIVE, TelemetryField, encode_frame};

    fn parts_with_temp_rule() -> PipelineParts {
        let mut classifier = PacketClassifier::new();
        classifier.register(std::sync::Arc::new(ClosureRule::new(
            |payload| payload.len() == 2 && payload[0] == 0x0B,
            |payload| {
                vec![FieldUpdate::new(
                    TelemetryField::PoolTemperature,
                    format!("{} F", payload[1]),
                )]
            },
        )));

        PipelineParts {
            ctx: Arc::new(AutomationContext::new()),
            metrics: Arc::new(BridgeMetrics::new()),
            monitor: Arc::new(LinkMonitor::default()),
            classifier,
            hooks: HookManager::new(),
        }
    }

    #[test]
    fn test_packet_event_commits_telemetry() {
        let parts = parts_with_temp_rule();
        handle_event(DecodeEvent::Packet(vec![0x0B, 84]), &parts);

        assert_eq!(
            parts.ctx.try_field(TelemetryField::PoolTemperature).as_deref(),
            Some("84 F")
        );
        let snapshot = parts.metrics.snapshot();
        assert_eq!(snapshot.packets_total, 1);
        assert_eq!(snapshot.telemetry_updates, 1);
        assert_eq!(snapshot.unknown_packets, 0);
    }

    #[test]
    fn test_keep_alive_event_feeds_monitor() {
        let parts = parts_with_temp_rule();
        handle_event(DecodeEvent::Packet(KEEP_ALIVE.to_vec()), &parts);

        let snapshot = parts.metrics.snapshot();
        assert_eq!(snapshot.keep_alives, 1);
        assert_eq!(snapshot.telemetry_updates, 0);
        assert!(parts.monitor.is_alive());
    }

    #[test]
    fn test_unknown_packet_counted_not_committed() {
        let parts = parts_with_temp_rule();
        handle_event(DecodeEvent::Packet(vec![0xDE, 0xAD]), &parts);

        assert_eq!(parts.ctx.try_field(TelemetryField::PoolTemperature), None);
        assert_eq!(parts.metrics.snapshot().unknown_packets, 1);
    }

    #[test]
    fn test_error_events_counted() {
        let parts = parts_with_temp_rule();
        handle_event(DecodeEvent::Overflow(vec![0x00; 8]), &parts);
        handle_event(DecodeEvent::FramingError(vec![0x01]), &parts);

        let snapshot = parts.metrics.snapshot();
        assert_eq!(snapshot.overflows, 1);
        assert_eq!(snapshot.framing_errors, 1);
        assert_eq!(snapshot.packets_total, 0);
    }

    #[test]
    fn test_decode_then_handle_full_wire() {
        // 两帧背靠背：keep-alive + 遥测
        let parts = parts_with_temp_rule();
        let mut decoder = FrameDecoder::new();

        let mut wire = encode_frame(&KEEP_ALIVE).unwrap();
        wire.extend(encode_frame(&[0x0B, 82]).unwrap());

        for event in decoder.feed_slice(&wire) {
            handle_event(event, &parts);
        }

        let snapshot = parts.metrics.snapshot();
        assert_eq!(snapshot.packets_total, 2);
        assert_eq!(snapshot.keep_alives, 1);
        assert_eq!(
            parts.ctx.try_field(TelemetryField::PoolTemperature).as_deref(),
            Some("82 F")
        );
    }
}
