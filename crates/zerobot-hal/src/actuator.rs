//! Generic `DriveActuator` trait for the vehicle's drive train.
//!
//! Drivers implement this trait and are handed to the kernel's
//! `DriveArbiter`.  Nothing upstream knows whether the motors are real,
//! simulated, or only logged.

use zerobot_types::{Motion, ZeroBotError};

/// A drive train commanded by a forward/back and right/left percentage.
pub trait DriveActuator: Send + Sync {
    /// Stable identifier for this driver, e.g. `"drive_base"`.
    fn id(&self) -> &str;

    /// Drive at `motion`.  `y > 0` is forwards, `x > 0` is right.
    ///
    /// # Errors
    ///
    /// Returns [`ZeroBotError::HardwareFault`] if the command cannot be
    /// applied.
    fn set_motion(&mut self, motion: Motion) -> Result<(), ZeroBotError>;

    /// Bring the drive to rest.  Equivalent to `set_motion(Motion::STOP)`.
    fn stop(&mut self) -> Result<(), ZeroBotError> {
        self.set_motion(Motion::STOP)
    }

    /// The most recently applied target.
    fn motion(&self) -> Motion;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDrive {
        motion: Motion,
        fail: bool,
    }

    impl DriveActuator for MockDrive {
        fn id(&self) -> &str {
            "mock"
        }

        fn set_motion(&mut self, motion: Motion) -> Result<(), ZeroBotError> {
            if self.fail {
                return Err(ZeroBotError::HardwareFault {
                    component: "mock".to_string(),
                    details: "driver offline".to_string(),
                });
            }
            self.motion = motion;
            Ok(())
        }

        fn motion(&self) -> Motion {
            self.motion
        }
    }

    #[test]
    fn default_stop_applies_zero_target() {
        let mut drive = MockDrive {
            motion: Motion::new(100, -40).unwrap(),
            fail: false,
        };
        drive.stop().unwrap();
        assert!(drive.motion().is_stop());
    }

    #[test]
    fn failing_driver_reports_hardware_fault() {
        let mut drive = MockDrive {
            motion: Motion::STOP,
            fail: true,
        };
        let err = drive.set_motion(Motion::new(50, 0).unwrap()).unwrap_err();
        assert!(matches!(err, ZeroBotError::HardwareFault { .. }));
    }
}
