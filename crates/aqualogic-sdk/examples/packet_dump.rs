//! 报文转储示例（mock 链路）
//!
//! 运行：`cargo run -p aqualogic-sdk --example packet_dump --features mock`
//!
//! 演示如何挂一个诊断回调观察解码管线：推送几帧脚本化字节，
//! 把每个解码出的载荷按十六进制打印出来。

use std::sync::Arc;
use std::time::Duration;

use aqualogic_sdk::prelude::*;
use aqualogic_sdk::protocol::KEEP_ALIVE;
use aqualogic_sdk::serial::MockLinkAdapter;

struct HexDump;

impl PacketCallback for HexDump {
    fn on_packet(&self, payload: &[u8]) {
        println!("packet  {:>3} bytes: {:02x?}", payload.len(), payload);
    }

    fn on_framing_error(&self, dropped: &[u8]) {
        println!("framing error, dropped {:02x?}", dropped);
    }
}

fn main() {
    aqualogic_sdk::init_logging();

    let (link, tx) = MockLinkAdapter::new();
    let bridge = BridgeBuilder::new()
        .callback(Arc::new(HexDump))
        .build_with_link(link);

    // keep-alive、一帧含转义字节的载荷、一段会触发帧错误的字节
    tx.send(encode_frame(&KEEP_ALIVE).unwrap()).unwrap();
    tx.send(encode_frame(&[0x0B, 0x10, 0x54]).unwrap()).unwrap();
    tx.send(vec![0x10, 0x02, 0x01, 0x02, 0x10, 0x99]).unwrap();

    std::thread::sleep(Duration::from_millis(300));

    let metrics = bridge.metrics();
    println!(
        "packets={} keep_alives={} framing_errors={}",
        metrics.packets_total, metrics.keep_alives, metrics.framing_errors
    );
}
