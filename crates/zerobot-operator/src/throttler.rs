//! [`CommandThrottler`] – send/suppress decision and safety window.
//!
//! Every command carries a timeout of twice the refresh interval: one lost
//! refresh is tolerated, two lost refreshes stop the vehicle.  A zero vector
//! is transmitted once and then suppressed until motion resumes.

use std::time::Duration;

use zerobot_types::{Motion, MotionVector, MovementCommand};

/// Refresh cadence used when nothing else is configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Decides which [`MovementCommand`], if any, goes out for a motion vector.
#[derive(Debug, Clone)]
pub struct CommandThrottler {
    refresh_interval: Duration,
    /// True iff the last transmitted command was the zero vector.  Starts
    /// true: an idle session has nothing to stop.
    stopped: bool,
}

impl CommandThrottler {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            stopped: true,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Safety window stamped on every command: `2 × refresh_interval`,
    /// saturating at `u32::MAX` milliseconds.
    pub fn timeout_ms(&self) -> u32 {
        let ms = self.refresh_interval.as_millis().saturating_mul(2);
        u32::try_from(ms).unwrap_or(u32::MAX)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Decide what to transmit for `vector`.
    ///
    /// Returns `None` only when the vector scales to `(0, 0)` and the last
    /// transmitted command was already `(0, 0)`.
    pub fn evaluate(&mut self, vector: MotionVector) -> Option<MovementCommand> {
        let motion = Motion::from_vector(vector);
        if motion.is_stop() && self.stopped {
            return None;
        }
        self.stopped = motion.is_stop();
        Some(MovementCommand::new(self.timeout_ms(), motion))
    }
}

impl Default for CommandThrottler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORWARD: MotionVector = MotionVector { y: 1.0, x: 0.0 };

    #[test]
    fn timeout_is_twice_the_refresh_interval() {
        assert_eq!(CommandThrottler::default().timeout_ms(), 500);
        assert_eq!(CommandThrottler::new(Duration::from_millis(100)).timeout_ms(), 200);
        assert_eq!(
            CommandThrottler::new(Duration::from_secs(u64::MAX / 4)).timeout_ms(),
            u32::MAX
        );
    }

    #[test]
    fn idle_session_sends_nothing() {
        let mut throttler = CommandThrottler::default();
        assert!(throttler.evaluate(MotionVector::ZERO).is_none());
        assert!(throttler.evaluate(MotionVector::ZERO).is_none());
    }

    #[test]
    fn motion_is_sent_every_time() {
        let mut throttler = CommandThrottler::default();
        let expected = MovementCommand::new(500, Motion::new(100, 0).unwrap());
        assert_eq!(throttler.evaluate(FORWARD), Some(expected));
        assert_eq!(throttler.evaluate(FORWARD), Some(expected));
        assert!(!throttler.is_stopped());
    }

    #[test]
    fn zero_is_sent_once_then_suppressed() {
        let mut throttler = CommandThrottler::default();
        throttler.evaluate(FORWARD);
        assert_eq!(
            throttler.evaluate(MotionVector::ZERO),
            Some(MovementCommand::new(500, Motion::STOP))
        );
        assert!(throttler.is_stopped());
        assert!(throttler.evaluate(MotionVector::ZERO).is_none());

        // Motion resumes transmission.
        assert!(throttler.evaluate(FORWARD).is_some());
    }

    #[test]
    fn vector_rounding_to_zero_counts_as_stop() {
        let mut throttler = CommandThrottler::default();
        assert!(throttler.evaluate(MotionVector { y: 0.001, x: 0.0 }).is_none());
    }
}
