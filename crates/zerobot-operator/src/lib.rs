//! `zerobot-operator` – the operator side of the teleop link.
//!
//! Turns press/release events into a bounded-rate stream of `move` commands:
//!
//! ```text
//! press/release ──▶ InputAggregator ──▶ CommandThrottler ──▶ TransportSession ──▶ vehicle
//!                   (direction table)   (send/suppress,      (WebSocket text
//!                                        refresh cadence)     frames)
//! ```
//!
//! # Modules
//!
//! - [`aggregator`] – [`InputAggregator`]: strength of each held direction
//!   and the derived motion vector.
//! - [`throttler`] – [`CommandThrottler`]: decides whether a command goes out
//!   and with which safety window.
//! - [`session`] – [`TransportSession`]: one WebSocket connection with
//!   lifecycle reporting; drops sends while not open.
//! - [`operator`] – [`OperatorSession`]: the single-task actor that owns the
//!   aggregator, the throttler, and the one pending refresh deadline.

pub mod aggregator;
pub mod operator;
pub mod session;
pub mod throttler;

pub use aggregator::InputAggregator;
pub use operator::{OperatorHandle, OperatorInput, OperatorSession};
pub use session::{CommandLink, LinkState, SessionEvent, StatusUpdate, TransportSession};
pub use throttler::{CommandThrottler, DEFAULT_REFRESH_INTERVAL};
