use crate::types::{BACKOFF_FACTOR, JITTER_MAX, JITTER_MIN};
use rand::Rng;
use std::time::Duration;

/// Reconnection policy with exponential backoff and jitter.
///
/// `delay = min(base * 1.5^attempts * jitter, max)` with `jitter` drawn from
/// `[0.8, 1.2]`. Once the attempt counter reaches `max_attempts` the policy
/// saturates: every later delay is exactly `max`, and the counter drops to
/// `max_attempts / 2` so it stays bounded over long outages. A successful
/// open resets both.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    saturated: bool,
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            base_delay,
            max_delay,
            max_attempts,
            saturated: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    /// Delay for a given attempt count and jitter factor, before saturation.
    pub fn delay_for(&self, attempts: u32, jitter: f64) -> Duration {
        let jitter = jitter.clamp(JITTER_MIN, JITTER_MAX);
        let max_ms = self.max_delay.as_millis() as f64;
        let raw_ms = self.base_delay.as_millis() as f64
            * BACKOFF_FACTOR.powf(f64::from(attempts))
            * jitter;
        Duration::from_millis(raw_ms.min(max_ms).round() as u64)
    }

    /// Get the next delay duration, drawing jitter from the thread RNG
    pub fn next_delay(&mut self) -> Duration {
        let jitter = rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX);
        self.next_delay_with_jitter(jitter)
    }

    /// Get the next delay duration for an explicit jitter factor
    pub fn next_delay_with_jitter(&mut self, jitter: f64) -> Duration {
        if self.attempts >= self.max_attempts {
            self.saturated = true;
            self.attempts = self.max_attempts / 2;
        }

        if self.saturated {
            self.max_delay
        } else {
            self.delay_for(self.attempts, jitter)
        }
    }

    /// Record that a scheduled retry fired
    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1).min(self.max_attempts);
    }

    /// Reset the policy
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.saturated = false;
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(crate::types::DEFAULT_BASE_DELAY),
            Duration::from_millis(crate::types::DEFAULT_MAX_DELAY),
            crate::types::DEFAULT_MAX_ATTEMPTS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy::new(Duration::from_millis(1000), Duration::from_millis(30000), 10)
    }

    #[test]
    fn test_first_delay_within_jitter_band() {
        let mut policy = policy();
        for _ in 0..200 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_millis(800), "{:?}", delay);
            assert!(delay <= Duration::from_millis(1200), "{:?}", delay);
        }
        assert_eq!(policy.attempts(), 0);
    }

    #[test]
    fn test_delay_grows_by_one_and_a_half() {
        let policy = policy();
        assert_eq!(policy.delay_for(0, 1.0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1, 1.0), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(2, 1.0), Duration::from_millis(2250));
        assert_eq!(policy.delay_for(3, 1.0), Duration::from_millis(3375));
        assert_eq!(policy.delay_for(2, 0.8), Duration::from_millis(1800));
        assert_eq!(policy.delay_for(2, 1.2), Duration::from_millis(2700));
    }

    #[test]
    fn test_delay_never_exceeds_max() {
        let policy = policy();
        for attempts in 0..64 {
            for jitter in [0.0, 0.8, 1.0, 1.2, 5.0] {
                assert!(policy.delay_for(attempts, jitter) <= Duration::from_millis(30000));
            }
        }
    }

    #[test]
    fn test_huge_attempt_counts_stay_at_max() {
        let policy = ReconnectPolicy::new(
            Duration::from_millis(1000),
            Duration::from_millis(30000),
            u32::MAX,
        );
        for attempts in [i32::MAX as u32, i32::MAX as u32 + 1, u32::MAX] {
            assert_eq!(policy.delay_for(attempts, 0.8), Duration::from_millis(30000));
        }
    }

    #[test]
    fn test_saturation_after_max_attempts() {
        let mut policy = policy();
        for _ in 0..10 {
            policy.next_delay_with_jitter(1.0);
            policy.record_attempt();
        }
        assert_eq!(policy.attempts(), 10);

        let delay = policy.next_delay_with_jitter(0.8);
        assert_eq!(delay, Duration::from_millis(30000));
        assert_eq!(policy.attempts(), 5);
        assert!(policy.is_saturated());

        // Keeps retrying at the ceiling, counter stays bounded
        for _ in 0..100 {
            policy.record_attempt();
            assert_eq!(policy.next_delay_with_jitter(0.8), Duration::from_millis(30000));
            assert!(policy.attempts() <= 10);
        }
    }

    #[test]
    fn test_reset() {
        let mut policy = policy();
        for _ in 0..12 {
            policy.record_attempt();
            policy.next_delay_with_jitter(1.0);
        }
        policy.reset();
        assert_eq!(policy.attempts(), 0);
        assert!(!policy.is_saturated());
        assert_eq!(policy.next_delay_with_jitter(1.0), Duration::from_millis(1000));
    }
}
