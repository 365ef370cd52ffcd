//! [`DriveArbiter`] – shared gateway to the single physical drive.
//!
//! Every connection runs its own interpreter, but there is only one set of
//! motors.  The arbiter applies a simple policy:
//!
//! * **Last writer drives.**  Any valid command from any connection claims
//!   the drive and is applied.
//! * **Only the driver can time out the drive.**  A connection's safety stop
//!   (timer expiry or disconnect) is applied only while that connection is
//!   still the one driving.  A stale connection cannot cut off a live one,
//!   and the live one's own timer still bounds the motion.
//! * **Identical targets are not re-applied.**  Refreshes that repeat the
//!   current target never reach the driver.
//!
//! The internal lock guards only the driver call and the owner tag.  It is
//! never held across an `.await` and never covers another connection's
//! interpreter state.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};
use uuid::Uuid;
use zerobot_hal::DriveActuator;
use zerobot_types::{Motion, ZeroBotError};

/// Identifier of one operator connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is plenty to tell connections apart in logs.
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

struct DriveSlot {
    drive: Box<dyn DriveActuator>,
    owner: Option<ConnectionId>,
    applied: Motion,
}

/// Cheaply cloneable handle onto the shared drive.
#[derive(Clone)]
pub struct DriveArbiter {
    slot: Arc<Mutex<DriveSlot>>,
}

impl DriveArbiter {
    /// Wrap `drive`, starting from whatever target it currently holds.
    pub fn new(drive: Box<dyn DriveActuator>) -> Self {
        let applied = drive.motion();
        Self {
            slot: Arc::new(Mutex::new(DriveSlot {
                drive,
                owner: None,
                applied,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, DriveSlot>, ZeroBotError> {
        self.slot.lock().map_err(|_| ZeroBotError::HardwareFault {
            component: "drive_arbiter".to_string(),
            details: "drive lock poisoned".to_string(),
        })
    }

    /// Apply `motion` on behalf of `connection`, which becomes the driver.
    ///
    /// Returns `true` when the driver was actually commanded (the target
    /// changed).
    ///
    /// # Errors
    ///
    /// Propagates the driver's [`ZeroBotError::HardwareFault`].
    pub fn apply(&self, connection: ConnectionId, motion: Motion) -> Result<bool, ZeroBotError> {
        let mut slot = self.lock()?;
        if slot.owner != Some(connection) {
            debug!(connection = %connection, "connection took over the drive");
            slot.owner = Some(connection);
        }
        if slot.applied == motion {
            return Ok(false);
        }
        slot.drive.set_motion(motion)?;
        slot.applied = motion;
        Ok(true)
    }

    /// Safety stop on behalf of `connection`.
    ///
    /// Stops the drive and clears ownership only when `connection` is the
    /// current driver; otherwise does nothing.  Returns `true` when the
    /// driver was actually commanded.
    ///
    /// # Errors
    ///
    /// Propagates the driver's [`ZeroBotError::HardwareFault`].
    pub fn release(&self, connection: ConnectionId) -> Result<bool, ZeroBotError> {
        let mut slot = self.lock()?;
        if slot.owner != Some(connection) {
            return Ok(false);
        }
        slot.owner = None;
        if slot.applied.is_stop() {
            return Ok(false);
        }
        info!(drive = slot.drive.id(), connection = %connection, "safety stop");
        slot.drive.stop()?;
        slot.applied = Motion::STOP;
        Ok(true)
    }

    /// Stop the drive regardless of which connection is driving.
    ///
    /// Used when the server shuts down.
    ///
    /// # Errors
    ///
    /// Propagates the driver's [`ZeroBotError::HardwareFault`].
    pub fn halt(&self) -> Result<bool, ZeroBotError> {
        let mut slot = self.lock()?;
        slot.owner = None;
        if slot.applied.is_stop() {
            return Ok(false);
        }
        info!(drive = slot.drive.id(), "drive halted");
        slot.drive.stop()?;
        slot.applied = Motion::STOP;
        Ok(true)
    }

    /// The target most recently applied to the drive.
    pub fn current(&self) -> Motion {
        self.lock().map(|slot| slot.applied).unwrap_or(Motion::STOP)
    }

    /// The connection currently driving, if any.
    pub fn owner(&self) -> Option<ConnectionId> {
        self.lock().ok().and_then(|slot| slot.owner)
    }
}
