//! [`InputAggregator`] – current strength of each directional input.
//!
//! Keyboard keys and on-screen buttons overlap freely: holding `forward` and
//! `right` together yields a diagonal, holding `left` and `right` cancels
//! out.  The table always holds exactly the four [`Direction`]s.

use zerobot_types::{Direction, MotionVector};

/// Strength table for the four directions, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputAggregator {
    strengths: [f32; 4],
}

impl InputAggregator {
    /// All directions released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strength of `direction`.
    ///
    /// `strength` is clamped to `[0.0, 1.0]`; a non-finite value is ignored.
    /// Returns `true` only when the stored value actually changed, so
    /// re-pressing a held key is not a change.
    pub fn set_direction(&mut self, direction: Direction, strength: f32) -> bool {
        if !strength.is_finite() {
            return false;
        }
        let strength = strength.clamp(0.0, 1.0);
        let slot = &mut self.strengths[direction.index()];
        if *slot == strength {
            return false;
        }
        *slot = strength;
        true
    }

    /// Like [`set_direction`][Self::set_direction] but keyed by name
    /// (`"forward"`, `"back"`, `"left"`, `"right"`).  Unknown names are
    /// ignored and report no change.
    pub fn set_named(&mut self, name: &str, strength: f32) -> bool {
        match name.parse::<Direction>() {
            Ok(direction) => self.set_direction(direction, strength),
            Err(_) => false,
        }
    }

    /// Release every direction.  Returns `true` if anything was held.
    pub fn release_all(&mut self) -> bool {
        let changed = self.strengths.iter().any(|&s| s != 0.0);
        self.strengths = [0.0; 4];
        changed
    }

    pub fn strength(&self, direction: Direction) -> f32 {
        self.strengths[direction.index()]
    }

    /// Directions with a non-zero strength, in [`Direction::ALL`] order.
    pub fn held(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.strength(*d) > 0.0)
            .collect()
    }

    /// Net motion: `y = forward − back`, `x = right − left`.
    ///
    /// Computed from the table on every call.
    pub fn motion_vector(&self) -> MotionVector {
        MotionVector {
            y: self.strength(Direction::Forward) - self.strength(Direction::Back),
            x: self.strength(Direction::Right) - self.strength(Direction::Left),
        }
    }
}
