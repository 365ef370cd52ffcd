//! [`CommandInterpreter`] – per-connection dead-man state machine.
//!
//! # States
//!
//! | State | Meaning |
//! |---|---|
//! | [`InterpreterState::Idle`] | No safety timer armed; the connection has never sent a valid command, or its window lapsed. |
//! | [`InterpreterState::Active`] | Timer armed with the latest `timeout_ms`; the drive follows the latest target.  A zero target is the *stopped* sub-state. |
//!
//! # Transitions
//!
//! * valid command → re-arm the timer from `now` (replacing the previous
//!   deadline), take the new target, go Active.
//! * timer fires → force [`Motion::STOP`], go Idle.
//! * malformed command → rejected with an error; state and deadline are left
//!   untouched, so garbage can never extend the safety window.
//!
//! The interpreter is pure: callers pass `now` in and act on the returned
//! target.  The cockpit drives one interpreter from one task per connection,
//! which makes timer expiry and command handling mutually exclusive.

use tokio::time::Instant;
use tracing::debug;
use zerobot_types::{Command, Motion, ZeroBotError};

use crate::safety_timer::SafetyTimer;

/// Observable state of a [`CommandInterpreter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterState {
    Idle,
    Active { deadline: Instant, target: Motion },
}

/// Validates wire commands and owns one connection's [`SafetyTimer`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use zerobot_kernel::CommandInterpreter;
/// use zerobot_types::Motion;
///
/// let t0 = Instant::now();
/// let mut interp = CommandInterpreter::new();
///
/// let target = interp.receive("move:500:0:100", t0).unwrap();
/// assert_eq!(target, Motion::new(0, 100).unwrap());
///
/// // Garbage is rejected and changes nothing.
/// assert!(interp.receive("move:500:0", t0).is_err());
///
/// // Silence past the window forces a stop.
/// assert_eq!(interp.expire(t0 + Duration::from_millis(500)), Some(Motion::STOP));
/// assert!(interp.is_idle());
/// ```
#[derive(Debug, Default)]
pub struct CommandInterpreter {
    timer: SafetyTimer,
    target: Motion,
}

impl CommandInterpreter {
    /// Create an interpreter in the Idle state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InterpreterState {
        match self.timer.deadline() {
            Some(deadline) => InterpreterState::Active {
                deadline,
                target: self.target,
            },
            None => InterpreterState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.timer.is_armed()
    }

    /// `true` when the drive should currently be at rest, either because
    /// the connection is Idle or because it commanded `(0, 0)`.
    pub fn is_stopped(&self) -> bool {
        self.target.is_stop()
    }

    /// The target the drive should currently follow.
    pub fn target(&self) -> Motion {
        self.target
    }

    /// The instant at which the safety timer fires, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Decode and apply one wire line received at `now`.
    ///
    /// Returns the target the drive must follow.
    ///
    /// # Errors
    ///
    /// Returns the decode error for a malformed line.  The interpreter is
    /// left exactly as it was.
    pub fn receive(&mut self, line: &str, now: Instant) -> Result<Motion, ZeroBotError> {
        let command = Command::parse(line)?;
        Ok(self.apply(command, now))
    }

    /// Apply an already-decoded command received at `now`.
    pub fn apply(&mut self, command: Command, now: Instant) -> Motion {
        match command {
            Command::Move(movement) => {
                self.timer.arm(now, movement.timeout());
                self.target = movement.motion;
                debug!(
                    timeout_ms = movement.timeout_ms,
                    y = movement.motion.y(),
                    x = movement.motion.x(),
                    "safety timer re-armed"
                );
                self.target
            }
        }
    }

    /// Fire the safety timer if its deadline has passed at `now`.
    ///
    /// Returns `Some(Motion::STOP)` when the timer fired (the interpreter is
    /// now Idle) and `None` otherwise.
    pub fn expire(&mut self, now: Instant) -> Option<Motion> {
        if self.timer.expire(now) {
            self.target = Motion::STOP;
            Some(Motion::STOP)
        } else {
            None
        }
    }

    /// Forget this connection's state, returning to Idle without firing.
    pub fn reset(&mut self) {
        self.timer.disarm();
        self.target = Motion::STOP;
    }
}
