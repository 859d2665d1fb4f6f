//! 遥测状态结构定义
//!
//! [`AutomationState`] 保存每个遥测字段的最新已知值；[`AutomationContext`]
//! 把它包在 Mutex + Condvar 里，成为整个 SDK 唯一的共享可变资源。
//!
//! # 并发模型
//!
//! - **单写**: 只有解码管线（IO 线程）调用 [`AutomationContext::update`]
//! - **多读**: 任意数量的查询方并发读取；读写互斥到字段集粒度，
//!   读取方永远不会观察到写了一半的字段
//! - **可等待**: 每次 `update` 发出一次唤醒信号，查询方阻塞到字段
//!   就绪或超时为止，不做固定间隔轮询
//!
//! # 初始值
//!
//! 所有字段初始为未设置（`None`），直到总线上出现真实数据。
//! 查询方因此会正确阻塞，而不是拿到一个编造的读数。

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use aqualogic_protocol::TelemetryField;

/// 遥测记录
///
/// 字段一旦从未设置变为已设置，后续更新严格覆盖（last-write-wins），
/// 不做合并。进程内存，不持久化，重启即清空。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationState {
    /// 泳池水温（面板显示形式，如 `"84 F"`）
    pub pool_temperature: Option<String>,
    /// 气温
    pub air_temperature: Option<String>,
    /// 盐度
    pub salt_level: Option<String>,
    /// 最后一次字段更新的时刻
    pub last_update: Option<Instant>,
}

impl AutomationState {
    /// 读取指定字段的当前值
    pub fn get(&self, field: TelemetryField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    fn slot(&self, field: TelemetryField) -> &Option<String> {
        match field {
            TelemetryField::PoolTemperature => &self.pool_temperature,
            TelemetryField::AirTemperature => &self.air_temperature,
            TelemetryField::SaltLevel => &self.salt_level,
        }
    }

    fn slot_mut(&mut self, field: TelemetryField) -> &mut Option<String> {
        match field {
            TelemetryField::PoolTemperature => &mut self.pool_temperature,
            TelemetryField::AirTemperature => &mut self.air_temperature,
            TelemetryField::SaltLevel => &mut self.salt_level,
        }
    }
}

/// 共享遥测上下文（状态 + 唤醒机制）
///
/// 由 [`Bridge`](crate::Bridge) 持有并通过 `Arc` 分发给 IO 线程和
/// 所有观察者。
pub struct AutomationContext {
    state: Mutex<AutomationState>,
    updated: Condvar,
}

impl AutomationContext {
    /// 创建新的上下文（所有字段未设置）
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AutomationState::default()),
            updated: Condvar::new(),
        }
    }

    /// 覆盖一个字段并唤醒所有等待者
    ///
    /// 唯一的写入口，由分类器的遥测路径调用。
    pub fn update(&self, field: TelemetryField, value: impl Into<String>) {
        let mut state = self.state.lock();
        *state.slot_mut(field) = Some(value.into());
        state.last_update = Some(Instant::now());
        drop(state);

        // 等待不同字段的调用方也会被唤醒，它们各自重查条件后继续睡
        self.updated.notify_all();
    }

    /// 非阻塞读取一个字段
    pub fn try_field(&self, field: TelemetryField) -> Option<String> {
        self.state.lock().get(field).map(str::to_owned)
    }

    /// 获取完整状态快照
    pub fn snapshot(&self) -> AutomationState {
        self.state.lock().clone()
    }

    /// 最后一次更新时刻
    pub fn last_update(&self) -> Option<Instant> {
        self.state.lock().last_update
    }

    /// 阻塞等待一个字段就绪
    ///
    /// 字段已设置时立即返回当前值；否则在条件变量上挂起，直到某次
    /// `update` 设置了该字段，或超时。超时返回 `None`，调用方被完整
    /// 唤醒，不会留下悬挂的等待者。
    ///
    /// 返回值是唤醒时刻的当前值：与最近一次完成的 `update` 一致，
    /// 不提供重放或更强的新鲜度保证。
    pub fn wait_field(&self, field: TelemetryField, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(value) = state.get(field) {
                return Some(value.to_owned());
            }
            if self.updated.wait_until(&mut state, deadline).timed_out() {
                // 超时瞬间可能恰好有一次更新完成，最后检查一次
                return state.get(field).map(str::to_owned);
            }
        }
    }
}

impl Default for AutomationContext {
    fn default() -> Self {
        Self::new()
    }
}
