//! 报文分类
//!
//! 解码后的载荷在这里被归类：链路保活、可解析的遥测、或未知报文。
//!
//! # 扩展点
//!
//! 控制器的遥测编码随固件版本变化，协议层只固定 keep-alive 常量，
//! 具体遥测编码通过注册 `(matcher, parser)` 规则接入（[`PacketRule`]），
//! 不需要改动解码器。没有规则命中的载荷归类为 [`PacketClass::Unknown`]，
//! 原样交给诊断观察者。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::ProtocolError;

/// 链路保活载荷（仅载荷，不含帧定界字节）
///
/// 逐字节、定长、保序比较。任何一个字节或长度不同的载荷都不是 keep-alive。
pub const KEEP_ALIVE: [u8; 4] = [0x01, 0x01, 0x00, 0x14];

/// 遥测字段
///
/// 由查询接口按名字读取的具名值。字段集合对应控制器面板上报的读数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TelemetryField {
    /// 泳池水温
    PoolTemperature,
    /// 气温
    AirTemperature,
    /// 盐度
    SaltLevel,
}

impl TelemetryField {
    /// 全部字段（按查询接口暴露的顺序）
    pub const ALL: [TelemetryField; 3] = [
        TelemetryField::PoolTemperature,
        TelemetryField::AirTemperature,
        TelemetryField::SaltLevel,
    ];

    /// 规范字段名（kebab-case，用于 CLI 与日志）
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryField::PoolTemperature => "pool-temp",
            TelemetryField::AirTemperature => "air-temp",
            TelemetryField::SaltLevel => "salt-level",
        }
    }
}

impl fmt::Display for TelemetryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TelemetryField {
    type Err = ProtocolError;

    /// 接受规范名以及历史接口使用过的紧凑写法（`pooltemp` 等）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pool-temp" | "pooltemp" | "pool_temp" => Ok(TelemetryField::PoolTemperature),
            "air-temp" | "airtemp" | "air_temp" => Ok(TelemetryField::AirTemperature),
            "salt-level" | "saltlevel" | "salt_level" => Ok(TelemetryField::SaltLevel),
            other => Err(ProtocolError::UnknownField(other.to_string())),
        }
    }
}

/// 一次遥测解析产出的单个字段更新
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldUpdate {
    /// 目标字段
    pub field: TelemetryField,
    /// 面板显示形式的值（如 `"84 F"`）
    pub value: String,
}

impl FieldUpdate {
    pub fn new(field: TelemetryField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PacketClass {
    /// 链路保活报文，不携带数据，诊断日志中静默
    KeepAlive,
    /// 命中注册规则并解析出字段更新的遥测报文
    Telemetry(Vec<FieldUpdate>),
    /// 未命中任何规则的载荷（原始字节），交给诊断观察者
    Unknown(Vec<u8>),
}

/// 遥测报文规则：matcher + parser 成对出现
///
/// `matches` 判断载荷是否属于本规则负责的编码；`parse` 从命中的载荷中
/// 提取字段更新。两者都只读载荷，不得阻塞。
pub trait PacketRule: Send + Sync {
    /// 载荷是否命中本规则
    fn matches(&self, payload: &[u8]) -> bool;

    /// 从命中的载荷提取字段更新
    ///
    /// 返回空集表示本规则放弃该载荷，分类器会继续尝试后续规则。
    fn parse(&self, payload: &[u8]) -> Vec<FieldUpdate>;
}

/// 闭包形式的 [`PacketRule`] 适配器
///
/// # Example
///
/// ```
/// use aqualogic_protocol::{ClosureRule, FieldUpdate, TelemetryField};
///
/// // 固件 0x0B 帧：0x0B <温度摄氏值>
/// let rule = ClosureRule::new(
///     |payload| payload.len() == 2 && payload[0] == 0x0B,
///     |payload| {
///         vec![FieldUpdate::new(
///             TelemetryField::PoolTemperature,
///             format!("{} F", payload[1]),
///         )]
///     },
/// );
/// ```
pub struct ClosureRule {
    matcher: Box<dyn Fn(&[u8]) -> bool + Send + Sync>,
    parser: Box<dyn Fn(&[u8]) -> Vec<FieldUpdate> + Send + Sync>,
}

impl ClosureRule {
    pub fn new(
        matcher: impl Fn(&[u8]) -> bool + Send + Sync + 'static,
        parser: impl Fn(&[u8]) -> Vec<FieldUpdate> + Send + Sync + 'static,
    ) -> Self {
        Self {
            matcher: Box::new(matcher),
            parser: Box::new(parser),
        }
    }
}

impl PacketRule for ClosureRule {
    fn matches(&self, payload: &[u8]) -> bool {
        (self.matcher)(payload)
    }

    fn parse(&self, payload: &[u8]) -> Vec<FieldUpdate> {
        (self.parser)(payload)
    }
}

/// 报文分类器
///
/// keep-alive 判定内置；遥测编码通过 [`register`](Self::register) 注入。
/// 规则按注册顺序尝试，第一个产出非空更新集的规则胜出。
#[derive(Default)]
pub struct PacketClassifier {
    rules: Vec<Arc<dyn PacketRule>>,
}

impl PacketClassifier {
    /// 创建只认识 keep-alive 的分类器
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// 注册一条遥测规则
    pub fn register(&mut self, rule: Arc<dyn PacketRule>) {
        self.rules.push(rule);
    }

    /// 已注册规则数
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 是否没有注册任何规则
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 对一个解码后的载荷分类
    pub fn classify(&self, payload: &[u8]) -> PacketClass {
        if payload == KEEP_ALIVE {
            return PacketClass::KeepAlive;
        }

        for rule in &self.rules {
            if rule.matches(payload) {
                let updates = rule.parse(payload);
                if !updates.is_empty() {
                    return PacketClass::Telemetry(updates);
                }
            }
        }

        PacketClass::Unknown(payload.to_vec())
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_packet_class_serde_round_trip() {
        let class = PacketClass::Telemetry(vec![FieldUpdate::new(
            TelemetryField::PoolTemperature,
            "84 F",
        )]);

        let json = serde_json::to_string(&class).unwrap();
        let back: PacketClass = serde_json::from_str(&json).unwrap();
        assert_eq!(back, class);
    }
}
