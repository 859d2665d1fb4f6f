//! Link Monitor - Monitors keep-alive packets to detect bus aliveness
//!
//! **Purpose**: Detect if the pool controller is still transmitting (powered
//! on, RS-485 wiring intact). The controller emits a keep-alive packet
//! roughly twice a second whenever the bus is idle, so its absence is the
//! earliest sign of a dead link.
//!
//! **App Start Relative Time Pattern**:
//! - Uses monotonic time anchored to application start
//! - Unaffected by system clock changes (NTP, manual adjustments)
//! - Safe to store in AtomicU64 for lock-free access

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global anchor point for monotonic time
/// Set once on first access, never changes
static APP_START: OnceLock<Instant> = OnceLock::new();

/// Get monotonic time as microseconds since app start
fn get_monotonic_micros() -> u64 {
    let start = APP_START.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// Default tolerance before the link is considered dead
///
/// The controller keep-alive interval is well under a second; two seconds
/// of silence means the bus is gone, not merely busy.
pub const DEFAULT_LINK_TIMEOUT: Duration = Duration::from_secs(2);

/// Link health monitor
///
/// Tracks the time since the last keep-alive packet was decoded.
pub struct LinkMonitor {
    last_keep_alive: AtomicU64,
    timeout: Duration,
}

impl LinkMonitor {
    /// Create a new link monitor
    ///
    /// # Parameters
    /// - `timeout`: Maximum duration without a keep-alive before considering
    ///   the link dead
    ///
    /// # Example
    /// ```
    /// # use aqualogic_driver::LinkMonitor;
    /// # use std::time::Duration;
    /// let monitor = LinkMonitor::new(Duration::from_secs(2));
    /// ```
    pub fn new(timeout: Duration) -> Self {
        // Initialize with current time (app start relative)
        let now = get_monotonic_micros();
        Self {
            last_keep_alive: AtomicU64::new(now),
            timeout,
        }
    }

    /// Check if the link is still alive
    ///
    /// Returns true if a keep-alive was seen within the timeout window
    pub fn is_alive(&self) -> bool {
        let last_us = self.last_keep_alive.load(Ordering::Relaxed);
        let now_us = get_monotonic_micros();

        // Safe subtraction: now_us is always >= last_us (monotonic)
        let elapsed_us = now_us.saturating_sub(last_us);
        let elapsed = Duration::from_micros(elapsed_us);

        elapsed < self.timeout
    }

    /// Register that a keep-alive packet was decoded
    ///
    /// Called by the pipeline after classifying each keep-alive.
    pub fn register_keep_alive(&self) {
        let now = get_monotonic_micros();
        self.last_keep_alive.store(now, Ordering::Relaxed);
    }

    /// Get time since the last keep-alive
    pub fn time_since_last_keep_alive(&self) -> Duration {
        let last_us = self.last_keep_alive.load(Ordering::Relaxed);
        let now_us = get_monotonic_micros();
        Duration::from_micros(now_us.saturating_sub(last_us))
    }
}

impl Default for LinkMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_monotonic_time_always_increases() {
        let t1 = get_monotonic_micros();
        thread::sleep(Duration::from_millis(10));
        let t2 = get_monotonic_micros();

        assert!(t2 > t1, "Monotonic time should always increase");
    }

    #[test]
    fn test_link_monitor_initially_alive() {
        let monitor = LinkMonitor::new(Duration::from_secs(1));
        assert!(monitor.is_alive(), "Link should be alive initially");
    }

    #[test]
    fn test_link_monitor_dead_after_silence() {
        let monitor = LinkMonitor::new(Duration::from_millis(50));

        // Initially alive
        assert!(monitor.is_alive());

        // Wait past the timeout without registering anything
        thread::sleep(Duration::from_millis(100));
        assert!(!monitor.is_alive(), "Link should be dead after silence");
    }

    #[test]
    fn test_keep_alive_revives_link() {
        let monitor = LinkMonitor::new(Duration::from_millis(50));

        thread::sleep(Duration::from_millis(100));
        assert!(!monitor.is_alive());

        monitor.register_keep_alive();
        assert!(monitor.is_alive(), "Keep-alive should revive the link");
    }

    #[test]
    fn test_time_since_last_keep_alive_grows() {
        let monitor = LinkMonitor::new(Duration::from_secs(1));
        monitor.register_keep_alive();

        let t1 = monitor.time_since_last_keep_alive();
        thread::sleep(Duration::from_millis(20));
        let t2 = monitor.time_since_last_keep_alive();

        assert!(t2 > t1);
    }
}
