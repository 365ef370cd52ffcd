//! [`SafetyTimer`] – the dead-man deadline of one connection.
//!
//! The timer holds at most one deadline.  [`SafetyTimer::arm`] always
//! replaces the previous deadline, so there is never more than one live timer
//! per connection; [`SafetyTimer::expire`] consumes it.
//!
//! The timer does not sleep by itself.  The owning task waits on
//! [`SafetyTimer::deadline`] (e.g. with `tokio::time::sleep_until`) and
//! calls [`SafetyTimer::expire`] when it wakes.

use std::time::Duration;

use tokio::time::Instant;

/// A single re-armable deadline.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use zerobot_kernel::SafetyTimer;
///
/// let t0 = Instant::now();
/// let mut timer = SafetyTimer::new();
/// timer.arm(t0, Duration::from_millis(500));
/// timer.arm(t0, Duration::from_millis(200)); // replaces, not stacks
///
/// assert_eq!(timer.deadline(), Some(t0 + Duration::from_millis(200)));
/// assert!(!timer.expire(t0 + Duration::from_millis(199)));
/// assert!(timer.expire(t0 + Duration::from_millis(200)));
/// assert!(!timer.is_armed());
/// ```
#[derive(Debug, Default, Clone)]
pub struct SafetyTimer {
    deadline: Option<Instant>,
}

impl SafetyTimer {
    /// Create a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `timeout` after `now`, discarding any previous
    /// deadline.
    pub fn arm(&mut self, now: Instant, timeout: Duration) {
        self.deadline = Some(now + timeout);
    }

    /// Disarm without firing.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// `true` when armed and `now` has reached the deadline.
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    /// Fire the timer if it has expired at `now`.
    ///
    /// Returns `true` exactly once per arming: the timer is disarmed when it
    /// fires.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.is_expired(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_millis(500);

    #[test]
    fn fresh_timer_is_disarmed() {
        let timer = SafetyTimer::new();
        assert!(!timer.is_armed());
        assert!(timer.deadline().is_none());
        assert!(!timer.is_expired(Instant::now()));
    }

    #[test]
    fn rearming_replaces_deadline() {
        let t0 = Instant::now();
        let mut timer = SafetyTimer::new();
        timer.arm(t0, T);
        timer.arm(t0 + Duration::from_millis(300), T);
        // Only the later deadline is live.
        assert_eq!(timer.deadline(), Some(t0 + Duration::from_millis(800)));
        assert!(!timer.is_expired(t0 + T));
        assert!(timer.is_expired(t0 + Duration::from_millis(800)));
    }

    #[test]
    fn expire_fires_once() {
        let t0 = Instant::now();
        let mut timer = SafetyTimer::new();
        timer.arm(t0, T);
        assert!(timer.expire(t0 + T));
        assert!(!timer.expire(t0 + T * 2));
    }

    #[test]
    fn zero_timeout_is_immediately_expired() {
        let t0 = Instant::now();
        let mut timer = SafetyTimer::new();
        timer.arm(t0, Duration::ZERO);
        assert!(timer.is_expired(t0));
    }

    #[test]
    fn disarm_prevents_firing() {
        let t0 = Instant::now();
        let mut timer = SafetyTimer::new();
        timer.arm(t0, T);
        timer.disarm();
        assert!(!timer.expire(t0 + T));
    }
}
