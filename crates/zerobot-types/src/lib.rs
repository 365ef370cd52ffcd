//! Shared vocabulary of the ZeroBot workspace: the four driving directions,
//! the derived motion vector, the integer motion target applied to the drive,
//! and the text wire protocol spoken between operator and vehicle.
//!
//! # Wire format
//!
//! Every command is a single line of text.  The only verb today is `move`:
//!
//! ```text
//! move:<timeout_ms>:<y>:<x>
//! ```
//!
//! `timeout_ms` is an unsigned base-10 integer; `y` and `x` are signed
//! base-10 integers in `-100..=100`.
//!
//! ```
//! use zerobot_types::{Command, Motion, MovementCommand};
//!
//! let cmd: Command = "move:500:100:0".parse().unwrap();
//! assert_eq!(
//!     cmd,
//!     Command::Move(MovementCommand::new(500, Motion::new(100, 0).unwrap()))
//! );
//! assert_eq!(cmd.to_string(), "move:500:100:0");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Largest magnitude either motion axis may carry on the wire.
pub const MAX_MAGNITUDE: i8 = 100;

const MOVE_VERB: &str = "move";

// ────────────────────────────────────────────────────────────────────────────
// Directions
// ────────────────────────────────────────────────────────────────────────────

/// One of the four directional inputs an operator can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
}

impl Direction {
    /// Every direction, in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Back,
        Direction::Left,
        Direction::Right,
    ];

    /// Canonical lowercase name, as accepted by [`Direction::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Stable slot of this direction inside a `[_; 4]` table.
    pub fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Back => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = ZeroBotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| ZeroBotError::UnknownDirection(s.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Motion
// ────────────────────────────────────────────────────────────────────────────

/// Net motion computed from the directional strengths.
///
/// `y` is forwards (positive) / backwards (negative) and `x` is right
/// (positive) / left (negative); both lie in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionVector {
    pub y: f32,
    pub x: f32,
}

impl MotionVector {
    pub const ZERO: MotionVector = MotionVector { y: 0.0, x: 0.0 };

    pub fn is_zero(&self) -> bool {
        self.y == 0.0 && self.x == 0.0
    }
}

/// Integer-percentage motion target, the unit the drive is commanded in.
///
/// Both axes are guaranteed to lie in `-100..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Motion {
    y: i8,
    x: i8,
}

impl Motion {
    /// The stopped target `(0, 0)`.
    pub const STOP: Motion = Motion { y: 0, x: 0 };

    /// Build a target from percentages.
    ///
    /// # Errors
    ///
    /// Returns [`ZeroBotError::OutOfRange`] when either axis lies outside
    /// `-100..=100`.
    pub fn new(y: i64, x: i64) -> Result<Self, ZeroBotError> {
        Ok(Self {
            y: checked_axis("y", y)?,
            x: checked_axis("x", x)?,
        })
    }

    /// Scale a [`MotionVector`] to whole percentages, rounding to nearest and
    /// clamping into range.
    pub fn from_vector(vector: MotionVector) -> Self {
        Self {
            y: scale_axis(vector.y),
            x: scale_axis(vector.x),
        }
    }

    pub fn y(&self) -> i8 {
        self.y
    }

    pub fn x(&self) -> i8 {
        self.x
    }

    pub fn is_stop(&self) -> bool {
        *self == Motion::STOP
    }
}

fn checked_axis(field: &'static str, value: i64) -> Result<i8, ZeroBotError> {
    if (-i64::from(MAX_MAGNITUDE)..=i64::from(MAX_MAGNITUDE)).contains(&value) {
        Ok(value as i8)
    } else {
        Err(ZeroBotError::OutOfRange { field, value })
    }
}

fn scale_axis(value: f32) -> i8 {
    if !value.is_finite() {
        return 0;
    }
    let max = f32::from(MAX_MAGNITUDE);
    (value * max).round().clamp(-max, max) as i8
}

// ────────────────────────────────────────────────────────────────────────────
// Wire protocol
// ────────────────────────────────────────────────────────────────────────────

/// A motion target plus the dead-man window after which the receiver must
/// stop on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementCommand {
    pub timeout_ms: u32,
    pub motion: Motion,
}

impl MovementCommand {
    pub fn new(timeout_ms: u32, motion: Motion) -> Self {
        Self { timeout_ms, motion }
    }

    /// The safety window as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

/// Every command the operator can send over the wire.
///
/// New verbs are added as variants; [`Command::parse`] rejects anything it
/// does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `move:<timeout_ms>:<y>:<x>`
    Move(MovementCommand),
}

impl Command {
    /// Decode one wire line.  Surrounding whitespace (e.g. a trailing
    /// newline) is ignored; whitespace inside the line is not.
    ///
    /// # Errors
    ///
    /// * [`ZeroBotError::UnknownVerb`] for a verb other than `move`.
    /// * [`ZeroBotError::MalformedCommand`] for a wrong field count or a
    ///   field that is not a base-10 integer.
    /// * [`ZeroBotError::OutOfRange`] for a negative or oversized timeout, or
    ///   an axis outside `-100..=100`.
    pub fn parse(line: &str) -> Result<Self, ZeroBotError> {
        let line = line.trim();
        let mut fields = line.split(':');
        let verb = fields.next().unwrap_or_default();
        if verb != MOVE_VERB {
            return Err(ZeroBotError::UnknownVerb(verb.to_string()));
        }

        let args: Vec<&str> = fields.collect();
        let [timeout, y, x] = args.as_slice() else {
            return Err(ZeroBotError::MalformedCommand {
                line: line.to_string(),
                reason: format!("expected 3 fields after `move`, got {}", args.len()),
            });
        };

        let timeout = parse_int(line, "timeout_ms", timeout)?;
        let timeout_ms = u32::try_from(timeout).map_err(|_| ZeroBotError::OutOfRange {
            field: "timeout_ms",
            value: timeout,
        })?;
        let motion = Motion::new(parse_int(line, "y", y)?, parse_int(line, "x", x)?)?;

        Ok(Command::Move(MovementCommand::new(timeout_ms, motion)))
    }

    /// Encode as a single wire line (no trailing newline).
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

fn parse_int(line: &str, field: &str, raw: &str) -> Result<i64, ZeroBotError> {
    raw.parse::<i64>().map_err(|_| ZeroBotError::MalformedCommand {
        line: line.to_string(),
        reason: format!("{field} is not an integer: {raw:?}"),
    })
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move(cmd) => write!(
                f,
                "{MOVE_VERB}:{}:{}:{}",
                cmd.timeout_ms,
                cmd.motion.y(),
                cmd.motion.x()
            ),
        }
    }
}

impl FromStr for Command {
    type Err = ZeroBotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

impl From<MovementCommand> for Command {
    fn from(cmd: MovementCommand) -> Self {
        Command::Move(cmd)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type shared by every ZeroBot crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZeroBotError {
    #[error("Malformed command {line:?}: {reason}")]
    MalformedCommand { line: String, reason: String },

    #[error("Unknown command verb: {0:?}")]
    UnknownVerb(String),

    #[error("Value out of range for {field}: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("Unknown direction: {0:?}")]
    UnknownDirection(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Configuration Error: {0}")]
    Config(String),
}

impl ZeroBotError {
    /// `true` for errors produced by [`Command::parse`], i.e. input the
    /// interpreter must ignore.
    pub fn is_malformed_command(&self) -> bool {
        matches!(
            self,
            ZeroBotError::MalformedCommand { .. }
                | ZeroBotError::UnknownVerb(_)
                | ZeroBotError::OutOfRange { .. }
        )
    }
}
