//! `zerobot-hal` – drive abstraction for the vehicle.
//!
//! The interpreter never talks to motor pins directly.  It commands a
//! [`DriveActuator`] with integer-percentage [`Motion`][zerobot_types::Motion]
//! targets and leaves PWM/GPIO translation to whichever driver is plugged in.
//!
//! # Modules
//!
//! - [`actuator`] – the [`DriveActuator`] trait.
//! - [`log_drive`] – [`LogDrive`], a driver that only reports targets through
//!   `tracing`; used when no motor board is attached.
//! - [`sim`] – [`SimDrive`], an in-process driver that records every applied
//!   target for tests.

pub mod actuator;
pub mod log_drive;
pub mod sim;

pub use actuator::DriveActuator;
pub use log_drive::{LogDrive, describe_motion};
pub use sim::{DriveHistory, SimDrive};
