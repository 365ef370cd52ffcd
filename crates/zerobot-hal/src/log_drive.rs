//! [`LogDrive`] – a drive that reports its targets instead of moving motors.
//!
//! This is the driver `zerobot serve` runs with when no motor board is
//! attached; a GPIO/PWM driver slots in behind the same trait.

use tracing::info;
use zerobot_types::{Motion, ZeroBotError};

use crate::actuator::DriveActuator;

/// Human-readable description of a target, e.g. `"Moving 100% forwards, 50%
/// right"` or `"Stopped!"`.
pub fn describe_motion(motion: Motion) -> String {
    let mut actions = Vec::with_capacity(2);
    match motion.y() {
        y if y > 0 => actions.push(format!("{y}% forwards")),
        y if y < 0 => actions.push(format!("{}% backwards", -i16::from(y))),
        _ => {}
    }
    match motion.x() {
        x if x > 0 => actions.push(format!("{x}% right")),
        x if x < 0 => actions.push(format!("{}% left", -i16::from(x))),
        _ => {}
    }

    if actions.is_empty() {
        "Stopped!".to_string()
    } else {
        format!("Moving {}", actions.join(", "))
    }
}

/// Drive that logs every applied target through `tracing`.
pub struct LogDrive {
    id: String,
    motion: Motion,
}

impl LogDrive {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            motion: Motion::STOP,
        }
    }
}

impl DriveActuator for LogDrive {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_motion(&mut self, motion: Motion) -> Result<(), ZeroBotError> {
        info!(drive = %self.id, y = motion.y(), x = motion.x(), "{}", describe_motion(motion));
        self.motion = motion;
        Ok(())
    }

    fn motion(&self) -> Motion {
        self.motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(y: i64, x: i64) -> Motion {
        Motion::new(y, x).unwrap()
    }

    #[test]
    fn describes_stop() {
        assert_eq!(describe_motion(Motion::STOP), "Stopped!");
    }

    #[test]
    fn describes_single_axis() {
        assert_eq!(describe_motion(m(100, 0)), "Moving 100% forwards");
        assert_eq!(describe_motion(m(-100, 0)), "Moving 100% backwards");
        assert_eq!(describe_motion(m(0, -100)), "Moving 100% left");
    }

    #[test]
    fn describes_both_axes() {
        assert_eq!(describe_motion(m(100, 50)), "Moving 100% forwards, 50% right");
        assert_eq!(describe_motion(m(-25, -100)), "Moving 25% backwards, 100% left");
    }

    #[test]
    fn log_drive_tracks_target() {
        let mut drive = LogDrive::new("drive_base");
        drive.set_motion(m(0, 100)).unwrap();
        assert_eq!(drive.motion(), m(0, 100));
        drive.stop().unwrap();
        assert!(drive.motion().is_stop());
    }
}
