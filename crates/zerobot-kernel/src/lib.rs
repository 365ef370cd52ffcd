//! `zerobot-kernel` – Safety & Arbitration
//!
//! Everything between a decoded wire line and the drive.  It does not decide
//! where to go; it decides whether the vehicle may keep moving.
//!
//! # Modules
//!
//! - [`safety_timer`] – [`SafetyTimer`][safety_timer::SafetyTimer]: a single
//!   re-armable deadline.  Arming replaces, never stacks.
//! - [`interpreter`] – [`CommandInterpreter`][interpreter::CommandInterpreter]:
//!   the per-connection Idle/Active state machine that validates commands
//!   and forces a stop when the safety window lapses.
//! - [`arbiter`] – [`DriveArbiter`][arbiter::DriveArbiter]: the one place
//!   that touches the shared [`DriveActuator`][zerobot_hal::DriveActuator],
//!   deduplicating targets and tracking which connection drives.

pub mod arbiter;
pub mod interpreter;
pub mod safety_timer;

pub use arbiter::{ConnectionId, DriveArbiter};
pub use interpreter::{CommandInterpreter, InterpreterState};
pub use safety_timer::SafetyTimer;
