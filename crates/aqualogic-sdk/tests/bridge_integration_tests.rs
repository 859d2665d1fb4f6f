//! 端到端集成测试（mock 链路）
//!
//! 完整路径：脚本化字节源 → 帧解码 → 报文分类 → 状态提交 → 只读查询。
//! 需要 `mock` feature（`cargo test -p aqualogic-sdk --features mock`）。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use aqualogic_sdk::prelude::*;
use aqualogic_sdk::protocol::{KEEP_ALIVE, MAX_PACKET};
use aqualogic_sdk::serial::MockLinkAdapter;

/// 固件 0x0B 帧：`0x0B <华氏温度>` → pool-temp
fn pool_temp_rule() -> Arc<dyn PacketRule> {
    Arc::new(ClosureRule::new(
        |payload| payload.len() == 2 && payload[0] == 0x0B,
        |payload| {
            vec![FieldUpdate::new(
                TelemetryField::PoolTemperature,
                format!("{} F", payload[1]),
            )]
        },
    ))
}

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        read_timeout_ms: 10,
        ..Default::default()
    }
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let limit = Instant::now() + deadline;
    while Instant::now() < limit {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn test_end_to_end_field_query() {
    let (link, tx) = MockLinkAdapter::new();
    let mut bridge = BridgeBuilder::new()
        .quiet()
        .pipeline_config(fast_config())
        .rule(pool_temp_rule())
        .build_with_link(link);
    let observer = AutomationObserver::new(bridge.context());

    // 查询先发起，数据后到：查询方必须阻塞等到值而不是超时
    let query_observer = observer.clone();
    let query = std::thread::spawn(move || {
        query_observer.field(TelemetryField::PoolTemperature, Duration::from_secs(2))
    });

    std::thread::sleep(Duration::from_millis(50));
    tx.send(encode_frame(&[0x0B, 84]).unwrap()).unwrap();

    assert_eq!(query.join().unwrap().unwrap(), "84 F");
    bridge.shutdown();
}

#[test]
fn test_query_timeout_on_silent_bus() {
    let (link, _tx) = MockLinkAdapter::new();
    let mut bridge = BridgeBuilder::new()
        .quiet()
        .pipeline_config(fast_config())
        .build_with_link(link);
    let observer = AutomationObserver::new(bridge.context());

    let start = Instant::now();
    let result = observer.field(TelemetryField::SaltLevel, Duration::from_millis(100));
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(QueryError::Timeout { .. })));
    assert!(elapsed >= Duration::from_millis(90));
    assert!(elapsed < Duration::from_millis(500));
    bridge.shutdown();
}

#[test]
fn test_keep_alive_suppressed_unknown_reported() {
    // 记录诊断回调的触发情况
    #[derive(Default)]
    struct Counting {
        keep_alives: AtomicU64,
        unknown: AtomicU64,
    }
    impl PacketCallback for Counting {
        fn on_keep_alive(&self) {
            self.keep_alives.fetch_add(1, Ordering::Relaxed);
        }
        fn on_unknown(&self, _payload: &[u8]) {
            self.unknown.fetch_add(1, Ordering::Relaxed);
        }
    }

    let counting = Arc::new(Counting::default());
    let (link, tx) = MockLinkAdapter::new();
    let mut bridge = BridgeBuilder::new()
        .quiet()
        .pipeline_config(fast_config())
        .callback(counting.clone())
        .build_with_link(link);

    tx.send(encode_frame(&KEEP_ALIVE).unwrap()).unwrap();
    // 与 keep-alive 相差一个字节的载荷必须走 Unknown 路径
    tx.send(encode_frame(&[0x01, 0x01, 0x00, 0x15]).unwrap()).unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        bridge.metrics().packets_total >= 2
    }));

    let metrics = bridge.metrics();
    assert_eq!(metrics.keep_alives, 1);
    assert_eq!(metrics.unknown_packets, 1);
    assert_eq!(counting.keep_alives.load(Ordering::Relaxed), 1);
    assert_eq!(counting.unknown.load(Ordering::Relaxed), 1);
    assert!(bridge.is_link_alive());
    bridge.shutdown();
}

#[test]
fn test_overflow_recovery_end_to_end() {
    let (link, tx) = MockLinkAdapter::new();
    let mut bridge = BridgeBuilder::new()
        .quiet()
        .pipeline_config(fast_config())
        .rule(pool_temp_rule())
        .build_with_link(link);
    let observer = AutomationObserver::new(bridge.context());

    // 超长未终止帧……
    let mut wire = vec![0x10, 0x02];
    wire.extend(std::iter::repeat(0x41).take(MAX_PACKET + 1));
    tx.send(wire).unwrap();
    // ……紧跟一个完整遥测帧，必须正常解出
    tx.send(encode_frame(&[0x0B, 82]).unwrap()).unwrap();

    let value = observer
        .field(TelemetryField::PoolTemperature, Duration::from_secs(2))
        .unwrap();
    assert_eq!(value, "82 F");

    let metrics = bridge.metrics();
    assert_eq!(metrics.overflows, 1);
    assert_eq!(metrics.packets_total, 1);
    bridge.shutdown();
}

#[test]
fn test_packets_arrive_in_wire_order() {
    let (payload_tx, payload_rx) = crossbeam_channel::unbounded::<Vec<u8>>();

    struct Capture(crossbeam_channel::Sender<Vec<u8>>);
    impl PacketCallback for Capture {
        fn on_packet(&self, payload: &[u8]) {
            let _ = self.0.try_send(payload.to_vec());
        }
    }

    let (link, tx) = MockLinkAdapter::new();
    let mut bridge = BridgeBuilder::new()
        .quiet()
        .pipeline_config(fast_config())
        .callback(Arc::new(Capture(payload_tx)))
        .build_with_link(link);

    // 噪声夹着三帧，字节故意拆成不对齐的段推送
    let mut wire = vec![0xFF, 0x00];
    wire.extend(encode_frame(&[0x01]).unwrap());
    wire.extend(encode_frame(&[0x02, 0x10, 0x03]).unwrap());
    wire.extend([0x55]);
    wire.extend(encode_frame(&[0x03]).unwrap());
    for chunk in wire.chunks(3) {
        tx.send(chunk.to_vec()).unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(payload_rx.recv_timeout(Duration::from_secs(2)).unwrap());
    }
    assert_eq!(seen, vec![vec![0x01], vec![0x02, 0x10, 0x03], vec![0x03]]);
    bridge.shutdown();
}

#[test]
fn test_last_write_wins_across_frames() {
    let (link, tx) = MockLinkAdapter::new();
    let mut bridge = BridgeBuilder::new()
        .quiet()
        .pipeline_config(fast_config())
        .rule(pool_temp_rule())
        .build_with_link(link);
    let observer = AutomationObserver::new(bridge.context());

    tx.send(encode_frame(&[0x0B, 84]).unwrap()).unwrap();
    tx.send(encode_frame(&[0x0B, 85]).unwrap()).unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        bridge.metrics().telemetry_updates >= 2
    }));

    assert_eq!(
        observer.try_field(TelemetryField::PoolTemperature).as_deref(),
        Some("85 F")
    );
    bridge.shutdown();
}

#[test]
fn test_link_dies_without_keep_alives() {
    let (link, tx) = MockLinkAdapter::new();
    let mut bridge = BridgeBuilder::new()
        .quiet()
        .pipeline_config(fast_config())
        .link_timeout(Duration::from_millis(50))
        .build_with_link(link);

    tx.send(encode_frame(&KEEP_ALIVE).unwrap()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        bridge.metrics().keep_alives >= 1
    }));
    assert!(bridge.is_link_alive());

    // 之后总线只剩非 keep-alive 流量，监控器必须判死
    std::thread::sleep(Duration::from_millis(120));
    tx.send(encode_frame(&[0xAA]).unwrap()).unwrap();
    assert!(!bridge.is_link_alive());
    bridge.shutdown();
}
