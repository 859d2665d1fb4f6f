//! # AquaLogic Protocol
//!
//! 池控制器串口总线协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `frame`: DLE/STX/ETX 帧解码与编码（字节级状态机）
//! - `classify`: 报文分类（keep-alive / 遥测 / 未知）
//!
//! ## 帧格式
//!
//! 线上单元为 `DLE STX <填充后的载荷> DLE ETX`，其中 DLE=0x10、STX=0x02、
//! ETX=0x03。载荷中的 0x10 以 `DLE DLE` 转义（DLE-stuffing）。
//! 解码器对任意输入字节序列都是全函数：畸形输入只会触发重新同步，
//! 永远不会中止。

pub mod classify;
pub mod frame;

// 重新导出常用类型
pub use classify::*;
pub use frame::*;

use thiserror::Error;

/// 协议层错误类型
///
/// 注意：解码本身不会产生 `Err`。溢出与帧错误是 [`DecodeEvent`] 的一部分，
/// 属于可恢复的线上状况而不是调用方错误。
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 载荷超过单帧上限，无法编码
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// 未知遥测字段名
    #[error("Unknown telemetry field: {0:?}")]
    UnknownField(String),
}
