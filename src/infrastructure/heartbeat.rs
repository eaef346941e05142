use std::time::Duration;
use tokio::time::Instant;

/// Tracks inbound activity and the outstanding health check.
///
/// Every inbound frame counts as proof of life, not only pongs. The manager
/// only pings after `ping_frequency` of silence and only one probe is ever in
/// flight.
#[derive(Debug, Clone)]
pub struct HeartbeatState {
    ping_frequency: Duration,
    health_check_timeout: Duration,
    last_message_at: Option<Instant>,
    pending_health_check: bool,
}

impl HeartbeatState {
    pub fn new(ping_frequency: Duration, health_check_timeout: Duration) -> Self {
        Self {
            ping_frequency,
            health_check_timeout,
            last_message_at: None,
            pending_health_check: false,
        }
    }

    pub fn last_message_at(&self) -> Option<Instant> {
        self.last_message_at
    }

    pub fn is_pending(&self) -> bool {
        self.pending_health_check
    }

    /// Starts tracking a freshly opened connection. Returns the first idle deadline.
    pub fn reset(&mut self, now: Instant) -> Instant {
        self.last_message_at = Some(now);
        self.pending_health_check = false;
        now + self.ping_frequency
    }

    /// Records an inbound frame. Returns the new idle deadline.
    pub fn record_message(&mut self, now: Instant) -> Instant {
        self.reset(now)
    }

    /// Marks a ping as sent. Returns the health-check deadline.
    pub fn probe_sent(&mut self, now: Instant) -> Instant {
        self.pending_health_check = true;
        now + self.health_check_timeout
    }

    /// Forgets all activity (connection gone)
    pub fn clear(&mut self) {
        self.last_message_at = None;
        self.pending_health_check = false;
    }
}

/// The three deadlines the connection manager can have armed.
///
/// At most one of each exists; arming a deadline replaces the previous one,
/// so a stale timer can never fire for a superseded connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub reconnect: Option<Instant>,
    pub idle: Option<Instant>,
    pub health_check: Option<Instant>,
}

impl Timers {
    /// Number of armed deadlines
    pub fn pending(&self) -> usize {
        [self.reconnect, self.idle, self.health_check]
            .iter()
            .filter(|deadline| deadline.is_some())
            .count()
    }

    /// Disarms the heartbeat deadlines, keeping any scheduled reconnect
    pub fn clear_heartbeat(&mut self) {
        self.idle = None;
        self.health_check = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat() -> HeartbeatState {
        HeartbeatState::new(Duration::from_secs(30), Duration::from_secs(5))
    }

    #[test]
    fn test_reset_arms_idle_deadline() {
        let mut hb = heartbeat();
        let now = Instant::now();
        assert_eq!(hb.reset(now), now + Duration::from_secs(30));
        assert_eq!(hb.last_message_at(), Some(now));
        assert!(!hb.is_pending());
    }

    #[test]
    fn test_message_cancels_pending_probe() {
        let mut hb = heartbeat();
        let now = Instant::now();
        hb.reset(now);

        let deadline = hb.probe_sent(now);
        assert_eq!(deadline, now + Duration::from_secs(5));
        assert!(hb.is_pending());

        let later = now + Duration::from_secs(2);
        assert_eq!(hb.record_message(later), later + Duration::from_secs(30));
        assert!(!hb.is_pending());
        assert_eq!(hb.last_message_at(), Some(later));
    }

    #[test]
    fn test_clear() {
        let mut hb = heartbeat();
        hb.reset(Instant::now());
        hb.probe_sent(Instant::now());
        hb.clear();
        assert!(!hb.is_pending());
        assert_eq!(hb.last_message_at(), None);
    }

    #[test]
    fn test_timers_pending_count() {
        let now = Instant::now();
        let mut timers = Timers::default();
        assert_eq!(timers.pending(), 0);

        timers.reconnect = Some(now);
        timers.idle = Some(now);
        timers.health_check = Some(now);
        assert_eq!(timers.pending(), 3);

        timers.clear_heartbeat();
        assert_eq!(timers.pending(), 1);

        timers.clear();
        assert_eq!(timers, Timers::default());
    }
}
