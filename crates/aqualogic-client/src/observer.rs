//! AutomationObserver - 遥测观察器
//!
//! 提供只读的遥测查询接口，与解码管线完全独立，
//! 实现"读写分离"设计模式。
//!
//! # 设计目标
//!
//! - **只读**: 无任何修改状态的能力
//! - **可克隆**: 多个 Observer 可以并发读取
//! - **可阻塞**: `field` 挂在条件变量上等字段就绪，不轮询、不空转
//! - **有界等待**: 阻塞读取必须带超时；便捷方法使用
//!   [`DEFAULT_QUERY_TIMEOUT`]，不提供无界等待
//!
//! # 使用示例
//!
//! ```rust,no_run
//! # use aqualogic_client::AutomationObserver;
//! # use aqualogic_protocol::TelemetryField;
//! # use std::time::Duration;
//! # fn example(observer: AutomationObserver) {
//! // 阻塞读取泳池水温
//! match observer.field(TelemetryField::PoolTemperature, Duration::from_secs(1)) {
//!     Ok(temp) => println!("pool: {temp}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//!
//! // 克隆 Observer 用于另一个线程
//! let observer2 = observer.clone();
//! std::thread::spawn(move || {
//!     let _ = observer2.field_default(TelemetryField::SaltLevel);
//! });
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use aqualogic_driver::AutomationContext;
use aqualogic_protocol::TelemetryField;

use crate::error::QueryError;

/// 便捷方法使用的默认查询超时
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// 遥测快照（不可变，序列化友好）
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AutomationSnapshot {
    /// 泳池水温
    pub pool_temperature: Option<String>,
    /// 气温
    pub air_temperature: Option<String>,
    /// 盐度
    pub salt_level: Option<String>,
    /// 距最后一次更新的毫秒数（从未更新过为 `None`）
    pub age_ms: Option<u64>,
}

/// 遥测观察器（只读接口）
///
/// 可以克隆并在多个线程中并发使用，不影响解码管线。
#[derive(Clone)]
pub struct AutomationObserver {
    /// 共享遥测上下文
    ctx: Arc<AutomationContext>,
}

impl AutomationObserver {
    /// 从共享上下文创建 Observer
    ///
    /// 通常通过 `Bridge::context()` 获得上下文。
    pub fn new(ctx: Arc<AutomationContext>) -> Self {
        Self { ctx }
    }

    /// 阻塞读取一个字段
    ///
    /// 字段已设置时立即返回；否则挂起直到解码管线设置该字段或超时。
    /// 成功时返回唤醒时刻的当前值（与最近一次完成的更新一致）。
    ///
    /// # 错误
    ///
    /// 时限内字段没有就绪时返回 [`QueryError::Timeout`]。
    pub fn field(&self, field: TelemetryField, timeout: Duration) -> Result<String, QueryError> {
        self.ctx
            .wait_field(field, timeout)
            .ok_or(QueryError::Timeout { field, timeout })
    }

    /// 用默认超时（[`DEFAULT_QUERY_TIMEOUT`]）阻塞读取一个字段
    pub fn field_default(&self, field: TelemetryField) -> Result<String, QueryError> {
        self.field(field, DEFAULT_QUERY_TIMEOUT)
    }

    /// 非阻塞读取一个字段
    pub fn try_field(&self, field: TelemetryField) -> Option<String> {
        self.ctx.try_field(field)
    }

    /// 获取完整遥测快照
    pub fn snapshot(&self) -> AutomationSnapshot {
        let state = self.ctx.snapshot();
        AutomationSnapshot {
            pool_temperature: state.pool_temperature,
            air_temperature: state.air_temperature,
            salt_level: state.salt_level,
            age_ms: state.last_update.map(|t| t.elapsed().as_millis() as u64),
        }
    }

    /// 最后一次更新时刻
    ///
    /// 可用于检测遥测流的停滞。
    pub fn last_update(&self) -> Option<Instant> {
        self.ctx.last_update()
    }

    /// 检查遥测是否新鲜（最近更新过）
    ///
    /// 从未更新过时返回 `false`。
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        match self.ctx.last_update() {
            Some(last) => last.elapsed() < max_age,
            None => false,
        }
    }
}
