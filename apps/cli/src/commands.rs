//! 子命令实现
//!
//! 每个命令都是薄薄一层：装配 Bridge，把结果交给 stdout。
//! 查询契约（阻塞到就绪或超时）由 SDK 保证，这里不做轮询。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use aqualogic_sdk::prelude::*;

/// 装配到真实串口的 Bridge
fn open_bridge(device: Option<String>, baud: u32) -> Result<Bridge> {
    let mut builder = BridgeBuilder::new().baud_rate(baud);
    if let Some(device) = device {
        builder = builder.device(device);
    }
    builder.build().context("failed to open serial link")
}

/// `read`：读一个字段，阻塞到就绪或超时
pub fn read(
    device: Option<String>,
    baud: u32,
    field: &str,
    timeout_ms: u64,
    json: bool,
) -> Result<()> {
    let field: TelemetryField = field
        .parse()
        .with_context(|| format!("unknown field '{field}', expected one of: pool-temp, air-temp, salt-level"))?;

    let bridge = open_bridge(device, baud)?;
    let observer = AutomationObserver::new(bridge.context());

    match observer.field(field, Duration::from_millis(timeout_ms)) {
        Ok(value) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "field": field.as_str(), "value": value })
                );
            } else {
                println!("{value}");
            }
            Ok(())
        },
        Err(QueryError::Timeout { .. }) => {
            bail!("field '{field}' not available within {timeout_ms} ms")
        },
    }
}

/// `monitor`：按给定频率打印快照、指标与链路状态
pub fn monitor(device: Option<String>, baud: u32, frequency: u32) -> Result<()> {
    let bridge = open_bridge(device, baud)?;
    let observer = AutomationObserver::new(bridge.context());
    let interval = Duration::from_secs_f64(1.0 / frequency.max(1) as f64);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::Relaxed))
        .context("failed to install Ctrl-C handler")?;

    while running.load(Ordering::Relaxed) {
        let snapshot = observer.snapshot();
        let metrics = bridge.metrics();
        println!(
            "pool={} air={} salt={} | link={} packets={} unknown={} errors={}",
            snapshot.pool_temperature.as_deref().unwrap_or("-"),
            snapshot.air_temperature.as_deref().unwrap_or("-"),
            snapshot.salt_level.as_deref().unwrap_or("-"),
            if bridge.is_link_alive() { "up" } else { "DOWN" },
            metrics.packets_total,
            metrics.unknown_packets,
            metrics.overflows + metrics.framing_errors,
        );
        std::thread::sleep(interval);
    }
    Ok(())
}

/// `dump`：把每个解码出的非 keep-alive 载荷按十六进制打印
pub fn dump(device: Option<String>, baud: u32) -> Result<()> {
    struct HexDump;
    impl PacketCallback for HexDump {
        fn on_unknown(&self, payload: &[u8]) {
            println!("{:02x?}", payload);
        }
        fn on_framing_error(&self, dropped: &[u8]) {
            println!("framing error, dropped {:02x?}", dropped);
        }
        fn on_overflow(&self, dropped: &[u8]) {
            println!("overflow, dropped {} bytes", dropped.len());
        }
    }

    let mut builder = BridgeBuilder::new().baud_rate(baud).callback(Arc::new(HexDump));
    if let Some(device) = device {
        builder = builder.device(device);
    }
    let bridge = builder.build().context("failed to open serial link")?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::Relaxed))
        .context("failed to install Ctrl-C handler")?;

    while running.load(Ordering::Relaxed) && bridge.is_running() {
        std::thread::sleep(Duration::from_millis(100));
    }
    Ok(())
}
