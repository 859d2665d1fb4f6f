//! # AquaLogic Client
//!
//! 面向查询方的只读 API。
//!
//! [`AutomationObserver`] 与写入方（driver 的 IO 线程）完全分离：
//! 它没有任何修改状态的能力，可以克隆后在任意多个线程里并发使用。

pub mod error;
pub mod observer;

pub use error::QueryError;
pub use observer::{AutomationObserver, AutomationSnapshot, DEFAULT_QUERY_TIMEOUT};
