//! `zerobot-cockpit` – the vehicle-side teleop server.
//!
//! Boots a small HTTP + WebSocket server (default port `8555`) that:
//!
//! 1. **Serves** the embedded operator page at every non-WebSocket HTTP
//!    path.  The page speaks the same `move:` protocol with the same
//!    throttling rules as the `zerobot drive` client.
//!
//! 2. **Interprets** every WebSocket connection with its own
//!    [`CommandInterpreter`] on its own task.  Valid commands drive the
//!    shared [`DriveArbiter`]; malformed ones are logged and dropped; a
//!    lapsed safety window or a lost connection stops the drive.
//!
//! The endpoint has no authentication and no encryption.  Expose it only on
//! a trusted network.
//!
//! # Usage
//!
//! ```rust,no_run
//! use zerobot_cockpit::CockpitServer;
//! use zerobot_hal::LogDrive;
//! use zerobot_kernel::DriveArbiter;
//!
//! #[tokio::main]
//! async fn main() {
//!     let arbiter = DriveArbiter::new(Box::new(LogDrive::new("drive_base")));
//!     CockpitServer::new(arbiter)
//!         .run()
//!         .await
//!         .expect("cockpit server failed");
//! }
//! ```
//!
//! [`CommandInterpreter`]: zerobot_kernel::CommandInterpreter
//! [`DriveArbiter`]: zerobot_kernel::DriveArbiter

pub mod server;

pub use server::{CockpitServer, DEFAULT_PORT};
