//! # AquaLogic CLI
//!
//! 读取池控制器遥测的命令行工具。
//!
//! ```bash
//! # 读一个字段（阻塞到就绪或超时）
//! aqualogic-cli read pool-temp --timeout-ms 5000
//!
//! # 持续监控遥测与链路状态
//! aqualogic-cli monitor --frequency 2
//!
//! # 转储总线上解码出的所有报文（keep-alive 除外）
//! aqualogic-cli dump
//! ```
//!
//! 串口设备按 `--device` → `AQUALOGIC_DEVICE` → `/dev/ttyAMA0` 的顺序解析。

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

/// AquaLogic CLI - 池控制器遥测命令行工具
#[derive(Parser, Debug)]
#[command(name = "aqualogic-cli")]
#[command(about = "Read AquaLogic pool controller telemetry over a serial link", long_about = None)]
#[command(version)]
struct Cli {
    /// 串口设备路径（默认 AQUALOGIC_DEVICE 或 /dev/ttyAMA0）
    #[arg(long, global = true)]
    device: Option<String>,

    /// 波特率（AquaLogic 总线固定 19200）
    #[arg(long, global = true, default_value_t = 19200)]
    baud: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 读取一个遥测字段
    Read {
        /// 字段名（pool-temp / air-temp / salt-level）
        field: String,

        /// 等待字段就绪的时限（毫秒）
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 持续打印遥测快照与链路状态
    Monitor {
        /// 刷新频率（Hz）
        #[arg(short, long, default_value_t = 1)]
        frequency: u32,
    },

    /// 十六进制转储解码出的报文（keep-alive 静默）
    Dump,
}

fn main() -> Result<()> {
    // 日志走 stderr，stdout 留给命令输出
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read {
            field,
            timeout_ms,
            json,
        } => commands::read(cli.device, cli.baud, &field, timeout_ms, json),

        Commands::Monitor { frequency } => commands::monitor(cli.device, cli.baud, frequency),

        Commands::Dump => commands::dump(cli.device, cli.baud),
    }
}
