//! DLE/STX/ETX 帧解码器
//!
//! 字节级状态机，把串口原始字节流恢复成离散报文。
//!
//! # 设计要点
//!
//! - **全函数**：`feed` 对任意状态下的任意字节都有定义，畸形输入只会
//!   触发重新同步（回到 `Idle`），永远不会 panic 或中止
//! - **有界缓冲**：载荷累积超过 [`MAX_PACKET`] 视为溢出，丢弃并重新同步，
//!   后续完整帧不受影响
//! - **重同步即丢弃**：重新同步前累积的字节作为 [`DecodeEvent::FramingError`]
//!   上报后丢弃，不会被拼接进下一帧
//!
//! # 状态机
//!
//! ```text
//! Idle ──DLE──► GotDle ──STX──► InFrame ──DLE──► InFrameDle
//!   ▲             │DLE(吸收)      │其他(入缓冲)      │DLE → InFrame(解转义 0x10)
//!   │             │其他(误启动)    │                 │ETX → Idle(产出 Packet)
//!   └─────────────┴───────────────┴─────────────────┴其他 → Idle(产出 FramingError)
//! ```

use crate::ProtocolError;

/// 数据链路转义字节，兼作帧定界引导和载荷内转义标记
pub const DLE: u8 = 0x10;
/// 帧起始（start-of-text），总是跟在 DLE 之后
pub const STX: u8 = 0x02;
/// 帧结束（end-of-text），总是跟在 DLE 之后
pub const ETX: u8 = 0x03;

/// 单帧载荷上限（字节）
///
/// 超过该长度仍未见到帧尾，判定为溢出并重新同步。
pub const MAX_PACKET: usize = 1024;

/// 解码器内部状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// 帧外，等待 DLE
    Idle,
    /// 已见引导 DLE，等待 STX
    GotDle,
    /// 帧内，累积载荷
    InFrame,
    /// 帧内已见 DLE，等待 ETX / DLE / 其他
    InFrameDle,
}

/// 解码产物
///
/// `feed` 每次最多产出一个事件。错误事件携带被丢弃的字节，
/// 仅用于诊断上报，解码器本身已经完成恢复。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodeEvent {
    /// 一个完整报文的载荷（已去除 DLE 填充）
    Packet(Vec<u8>),
    /// 载荷超过 [`MAX_PACKET`]，携带被丢弃的累积字节
    Overflow(Vec<u8>),
    /// 帧内 DLE 后跟的既不是 DLE 也不是 ETX，携带被丢弃的累积字节
    FramingError(Vec<u8>),
}

/// 帧解码器
///
/// 持有当前状态和载荷缓冲，由单一生产者按到达顺序逐字节驱动。
/// 状态对外不可见；错误后实例保持可用。
///
/// # Example
///
/// ```
/// use aqualogic_protocol::{DecodeEvent, FrameDecoder, encode_frame};
///
/// let mut decoder = FrameDecoder::new();
/// let wire = encode_frame(&[0x01, 0x10, 0x02]).unwrap();
///
/// let mut events = decoder.feed_slice(&wire);
/// assert_eq!(events.pop(), Some(DecodeEvent::Packet(vec![0x01, 0x10, 0x02])));
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecoderState,
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// 创建新的解码器（初始状态 `Idle`，缓冲为空）
    pub fn new() -> Self {
        Self {
            state: DecoderState::Idle,
            buf: Vec::with_capacity(MAX_PACKET),
        }
    }

    /// 送入一个字节，至多产出一个事件
    ///
    /// 对任意字节值在任意状态下都有定义。事件为 `None` 表示字节已被
    /// 消化（入缓冲、状态迁移或作为噪声丢弃）。
    pub fn feed(&mut self, byte: u8) -> Option<DecodeEvent> {
        match self.state {
            DecoderState::Idle => {
                if byte == DLE {
                    self.state = DecoderState::GotDle;
                }
                // 帧外噪声，丢弃
                None
            },
            DecoderState::GotDle => match byte {
                STX => {
                    self.buf.clear();
                    self.state = DecoderState::InFrame;
                    None
                },
                // 吸收重复的引导 DLE
                DLE => None,
                _ => {
                    // 误启动，重新寻找帧头
                    self.state = DecoderState::Idle;
                    None
                },
            },
            DecoderState::InFrame => {
                if byte == DLE {
                    self.state = DecoderState::InFrameDle;
                    None
                } else {
                    self.push_payload(byte)
                }
            },
            DecoderState::InFrameDle => match byte {
                ETX => {
                    self.state = DecoderState::Idle;
                    Some(DecodeEvent::Packet(std::mem::take(&mut self.buf)))
                },
                DLE => {
                    // DLE DLE 解转义为字面量 0x10
                    self.state = DecoderState::InFrame;
                    self.push_payload(DLE)
                },
                _ => {
                    self.state = DecoderState::Idle;
                    Some(DecodeEvent::FramingError(std::mem::take(&mut self.buf)))
                },
            },
        }
    }

    /// 按到达顺序送入一段字节，返回产出的全部事件
    ///
    /// 等价于逐字节调用 [`feed`](Self::feed)，供批量读取路径使用。
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        for &byte in bytes {
            if let Some(event) = self.feed(byte) {
                events.push(event);
            }
        }
        events
    }

    /// 丢弃当前缓冲并回到 `Idle`
    pub fn reset(&mut self) {
        self.state = DecoderState::Idle;
        self.buf.clear();
    }

    /// 入缓冲并检查溢出
    fn push_payload(&mut self, byte: u8) -> Option<DecodeEvent> {
        self.buf.push(byte);
        if self.buf.len() > MAX_PACKET {
            self.state = DecoderState::Idle;
            Some(DecodeEvent::Overflow(std::mem::take(&mut self.buf)))
        } else {
            None
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// 把载荷编码为完整线上帧（`DLE STX <填充载荷> DLE ETX`）
///
/// 载荷中的每个 0x10 加倍为 `DLE DLE`。与 [`FrameDecoder`] 满足
/// 往返不变式：`decode(encode(P)) == [Packet(P)]`。
///
/// # 错误
///
/// 载荷超过 [`MAX_PACKET`] 时返回 [`ProtocolError::PayloadTooLarge`]，
/// 这样的帧对端解码器无论如何都会丢弃。
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PACKET {
        return Err(ProtocolError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PACKET,
        });
    }

    let mut wire = Vec::with_capacity(payload.len() + 4);
    wire.push(DLE);
    wire.push(STX);
    for &byte in payload {
        wire.push(byte);
        if byte == DLE {
            wire.push(DLE);
        }
    }
    wire.push(DLE);
    wire.push(ETX);
    Ok(wire)
}
