//! 脚本化字节源（`mock` feature）
//!
//! 测试与示例在没有硬件的情况下驱动完整管线：测试侧通过 channel
//! 推送字节段，适配器按推送顺序交付。

use std::collections::VecDeque;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::{LinkAdapter, LinkError};

/// 脚本化串口适配器
///
/// # Example
///
/// ```
/// use aqualogic_serial::{LinkAdapter, MockLinkAdapter};
///
/// let (mut link, tx) = MockLinkAdapter::new();
/// tx.send(vec![0x10, 0x02, 0x42, 0x10, 0x03]).unwrap();
///
/// let mut buf = [0u8; 64];
/// let n = link.read_chunk(&mut buf).unwrap();
/// assert_eq!(&buf[..n], &[0x10, 0x02, 0x42, 0x10, 0x03]);
/// ```
pub struct MockLinkAdapter {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    timeout: Duration,
}

impl MockLinkAdapter {
    /// 创建适配器和对应的推送端
    ///
    /// 推送端全部 drop 后，适配器在耗尽缓冲字节之后返回
    /// [`LinkError::Closed`]。
    pub fn new() -> (Self, Sender<Vec<u8>>) {
        let (tx, rx) = unbounded();
        (
            Self {
                rx,
                pending: VecDeque::new(),
                timeout: Duration::from_millis(100),
            },
            tx,
        )
    }
}

impl LinkAdapter for MockLinkAdapter {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        if self.pending.is_empty() {
            match self.rx.recv_timeout(self.timeout) {
                Ok(chunk) => self.pending.extend(chunk),
                Err(RecvTimeoutError::Timeout) => return Err(LinkError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(LinkError::Closed),
            }
        }

        let n = buf.len().min(self.pending.len());
        for slot in buf.iter_mut().take(n) {
            // n 以 pending 长度为界，pop 不会失败
            *slot = self.pending.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn set_read_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}
