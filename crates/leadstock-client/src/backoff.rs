//! Reconnect backoff policy.
//!
//! Geometric growth from a short base, capped, with a small jitter so a
//! fleet of clients does not reconnect in lockstep after a server restart.

use std::time::Duration;

/// Backoff schedule for push reconnect attempts.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// First delay in milliseconds.
    pub base_ms: u64,
    /// Growth factor per attempt.
    pub growth: f64,
    /// Hard ceiling in milliseconds.
    pub cap_ms: u64,
    /// Maximum jitter added on top, in milliseconds.
    pub jitter_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_ms: 600,
            growth: 1.8,
            cap_ms: 8_000,
            jitter_ms: 250,
        }
    }
}

impl BackoffPolicy {
    /// Delay before attempt number `retries` (0-based), without jitter.
    pub fn raw_delay_ms(&self, retries: u32) -> u64 {
        let scaled = self.base_ms as f64 * self.growth.powi(retries.min(32) as i32);
        if scaled >= self.cap_ms as f64 {
            self.cap_ms
        } else {
            scaled as u64
        }
    }

    /// Delay before attempt number `retries`, jitter included.
    pub fn delay(&self, retries: u32) -> Duration {
        Duration::from_millis(self.raw_delay_ms(retries) + rand_jitter(self.jitter_ms))
    }
}

/// Cheap jitter source (0..=max_ms), no RNG dependency needed.
fn rand_jitter(max_ms: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    if max_ms == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    nanos as u64 % (max_ms + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_delay_schedule() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.raw_delay_ms(0), 600);
        assert_eq!(policy.raw_delay_ms(1), 1_080);
        assert_eq!(policy.raw_delay_ms(2), 1_944);
        assert_eq!(policy.raw_delay_ms(3), 3_499);
        assert_eq!(policy.raw_delay_ms(4), 6_298);
    }

    #[test]
    fn test_delay_caps_at_ceiling() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.raw_delay_ms(5), 8_000);
        assert_eq!(policy.raw_delay_ms(20), 8_000);
        // Huge retry counts must not overflow.
        assert_eq!(policy.raw_delay_ms(u32::MAX), 8_000);
    }

    #[test]
    fn test_jitter_bound() {
        let policy = BackoffPolicy::default();
        for retries in 0..6 {
            let raw = policy.raw_delay_ms(retries);
            let with_jitter = policy.delay(retries).as_millis() as u64;
            assert!(with_jitter >= raw);
            assert!(with_jitter <= raw + policy.jitter_ms);
        }
    }
}
