//! [`OperatorSession`] – the per-session input actor.
//!
//! One Tokio task owns the [`InputAggregator`], the [`CommandThrottler`], and
//! the single refresh deadline.  Its only suspension points are "next input"
//! and "refresh deadline / link state change", so no locking is needed.
//!
//! * **Input change** → evaluate and (maybe) transmit immediately, then move
//!   the refresh deadline to `now + refresh_interval`.  The deadline is a
//!   single value, so moving it replaces the pending refresh.
//! * **Refresh deadline** → evaluate and (maybe) transmit the same vector
//!   again; this keeps the vehicle's safety timer from lapsing while a key is
//!   held.
//! * **Link closed** → the task ends; its pending refresh dies with it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};
use zerobot_types::{Command, Direction};

use crate::aggregator::InputAggregator;
use crate::session::CommandLink;
use crate::throttler::CommandThrottler;

/// Events fed to an [`OperatorSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorInput {
    /// Set a direction to full strength.
    Press(Direction),
    /// Set a direction to zero.
    Release(Direction),
    /// Set a direction to an arbitrary strength in `[0.0, 1.0]`.
    Set { direction: Direction, strength: f32 },
    /// Set a direction by name; unknown names are ignored.
    SetNamed { name: String, strength: f32 },
    /// Release every direction.
    ReleaseAll,
    /// End the session task.
    Shutdown,
}

/// Cloneable sender side of a running [`OperatorSession`].
#[derive(Debug, Clone)]
pub struct OperatorHandle {
    tx: mpsc::UnboundedSender<OperatorInput>,
}

impl OperatorHandle {
    /// Queue `input`.  Returns `false` once the session task has ended.
    pub fn send(&self, input: OperatorInput) -> bool {
        self.tx.send(input).is_ok()
    }

    pub fn press(&self, direction: Direction) -> bool {
        self.send(OperatorInput::Press(direction))
    }

    pub fn release(&self, direction: Direction) -> bool {
        self.send(OperatorInput::Release(direction))
    }

    pub fn release_all(&self) -> bool {
        self.send(OperatorInput::ReleaseAll)
    }

    pub fn shutdown(&self) -> bool {
        self.send(OperatorInput::Shutdown)
    }

    /// `true` once the session task has ended.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Input aggregation and command throttling bound to one [`CommandLink`].
pub struct OperatorSession<L: CommandLink> {
    aggregator: InputAggregator,
    throttler: CommandThrottler,
    link: L,
}

impl<L: CommandLink + 'static> OperatorSession<L> {
    pub fn new(link: L, refresh_interval: Duration) -> Self {
        Self {
            aggregator: InputAggregator::new(),
            throttler: CommandThrottler::new(refresh_interval),
            link,
        }
    }

    /// Spawn the session task on the current runtime.
    pub fn spawn(self) -> (OperatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (OperatorHandle { tx }, task)
    }

    async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<OperatorInput>) {
        let interval = self.throttler.refresh_interval();
        let mut link_state = self.link.watch_state();
        let mut next_refresh = Instant::now() + interval;

        loop {
            if link_state.borrow_and_update().is_closed() {
                info!("link closed, operator session ending");
                break;
            }

            tokio::select! {
                input = inputs.recv() => {
                    let Some(input) = input else { break };
                    if input == OperatorInput::Shutdown {
                        break;
                    }
                    if self.apply_input(input) {
                        debug!(held = ?self.aggregator.held(), "input changed");
                        self.transmit_current();
                        next_refresh = Instant::now() + interval;
                    }
                }
                _ = sleep_until(next_refresh) => {
                    self.transmit_current();
                    next_refresh = Instant::now() + interval;
                }
                changed = link_state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }

    /// Update the aggregator; returns `true` if any strength changed.
    fn apply_input(&mut self, input: OperatorInput) -> bool {
        match input {
            OperatorInput::Press(direction) => self.aggregator.set_direction(direction, 1.0),
            OperatorInput::Release(direction) => self.aggregator.set_direction(direction, 0.0),
            OperatorInput::Set {
                direction,
                strength,
            } => self.aggregator.set_direction(direction, strength),
            OperatorInput::SetNamed { name, strength } => {
                let changed = self.aggregator.set_named(&name, strength);
                if !changed && name.parse::<Direction>().is_err() {
                    debug!(name = %name, "ignoring unknown direction");
                }
                changed
            }
            OperatorInput::ReleaseAll => self.aggregator.release_all(),
            OperatorInput::Shutdown => false,
        }
    }

    fn transmit_current(&mut self) {
        if let Some(movement) = self.throttler.evaluate(self.aggregator.motion_vector()) {
            self.link.transmit(&Command::Move(movement));
        }
    }
}
