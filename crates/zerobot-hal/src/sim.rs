//! In-process simulated drive for running the stack without motor hardware.
//!
//! [`SimDrive`] always succeeds and appends every applied target to a shared
//! [`DriveHistory`], so a test can keep a handle to the history after the
//! drive itself has been moved into an arbiter.
//!
//! # Example
//!
//! ```rust
//! use zerobot_hal::{DriveActuator, SimDrive};
//! use zerobot_types::Motion;
//!
//! let mut drive = SimDrive::new("drive_base");
//! let history = drive.history();
//!
//! drive.set_motion(Motion::new(100, 0).unwrap()).unwrap();
//! drive.stop().unwrap();
//!
//! assert_eq!(history.snapshot(), vec![Motion::new(100, 0).unwrap(), Motion::STOP]);
//! ```

use std::sync::{Arc, Mutex};

use zerobot_types::{Motion, ZeroBotError};

use crate::actuator::DriveActuator;

/// Shared, append-only record of targets applied to a [`SimDrive`].
#[derive(Clone, Default, Debug)]
pub struct DriveHistory(Arc<Mutex<Vec<Motion>>>);

impl DriveHistory {
    fn push(&self, motion: Motion) {
        if let Ok(mut log) = self.0.lock() {
            log.push(motion);
        }
    }

    /// Copy of every target applied so far, oldest first.
    pub fn snapshot(&self) -> Vec<Motion> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// The most recently applied target, if any.
    pub fn last(&self) -> Option<Motion> {
        self.0.lock().ok().and_then(|log| log.last().copied())
    }

    pub fn len(&self) -> usize {
        self.0.lock().map(|log| log.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A simulated drive train.  Always succeeds.
pub struct SimDrive {
    id: String,
    motion: Motion,
    history: DriveHistory,
}

impl SimDrive {
    /// Create a new simulated drive with the given identifier, at rest.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            motion: Motion::STOP,
            history: DriveHistory::default(),
        }
    }

    /// Handle onto this drive's applied-target history.
    pub fn history(&self) -> DriveHistory {
        self.history.clone()
    }
}

impl DriveActuator for SimDrive {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_motion(&mut self, motion: Motion) -> Result<(), ZeroBotError> {
        self.motion = motion;
        self.history.push(motion);
        Ok(())
    }

    fn motion(&self) -> Motion {
        self.motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_drive_starts_at_rest() {
        let drive = SimDrive::new("drive_base");
        assert_eq!(drive.id(), "drive_base");
        assert!(drive.motion().is_stop());
        assert!(drive.history().is_empty());
    }

    #[test]
    fn history_outlives_the_drive() {
        let history = {
            let mut drive = SimDrive::new("drive_base");
            drive.set_motion(Motion::new(-100, 0).unwrap()).unwrap();
            drive.history()
        };
        assert_eq!(history.len(), 1);
        assert_eq!(history.last(), Some(Motion::new(-100, 0).unwrap()));
    }

    #[test]
    fn stop_is_recorded() {
        let mut drive = SimDrive::new("drive_base");
        drive.set_motion(Motion::new(0, 100).unwrap()).unwrap();
        drive.stop().unwrap();
        assert_eq!(drive.history().last(), Some(Motion::STOP));
        assert!(drive.motion().is_stop());
    }
}
