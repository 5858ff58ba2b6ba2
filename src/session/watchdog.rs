//! Liveness timer for the execution host

use std::time::{Duration, Instant};

/// Fires when the host stays silent for longer than `timeout` while a
/// message is expected. Pure bookkeeping: the session checks it when polling.
#[derive(Debug, Clone)]
pub struct Watchdog {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl Watchdog {
    pub fn new(timeout: Duration) -> Self {
        Watchdog {
            timeout,
            deadline: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// (Re)start the window from `now`
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.timeout);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Time left before expiry, `None` when disarmed
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disarmed_never_expires() {
        let dog = Watchdog::new(Duration::from_millis(10));
        let later = Instant::now() + Duration::from_secs(60);
        assert!(!dog.expired(later));
        assert_eq!(dog.remaining(later), None);
    }

    #[test]
    fn test_expires_after_timeout() {
        let mut dog = Watchdog::new(Duration::from_secs(5));
        let start = Instant::now();
        dog.arm(start);
        assert!(!dog.expired(start + Duration::from_secs(4)));
        assert!(dog.expired(start + Duration::from_secs(5)));
        assert_eq!(
            dog.remaining(start + Duration::from_secs(3)),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            dog.remaining(start + Duration::from_secs(9)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_rearm_restarts_window() {
        let mut dog = Watchdog::new(Duration::from_secs(5));
        let start = Instant::now();
        dog.arm(start);
        dog.arm(start + Duration::from_secs(4));
        assert!(!dog.expired(start + Duration::from_secs(6)));
        dog.disarm();
        assert!(!dog.is_armed());
    }
}
