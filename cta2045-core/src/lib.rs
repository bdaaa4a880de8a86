//! Responder side of the CTA-2045 serial link
//!
//! This crate contains everything between the UART driver and the
//! application that does not depend on specific hardware:
//!
//! - Session configuration (max payload class, serial settings)
//! - Data-driven message dispatch (which reply each frame gets)
//! - Session context owning the assembler and dispatcher
//! - Link queues between the UART interrupt and the worker
//! - The worker loop itself
//!
//! ```text
//!  UART ISR ──on_bytes_received──▶ RX pipe ──▶ worker ──▶ Session
//!                                                          │ assemble
//!                                                          │ dispatch
//!  UART ISR ◀──────fill_wire────── TX pipe ◀──enqueue──────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod dispatch;
pub mod session;
pub mod transport;
pub mod worker;

pub use config::{ConfigError, SessionConfig};
pub use dispatch::{Dispatcher, Handling, Replies, ReplyKind};
pub use session::{Session, SessionStats};
pub use transport::{Link, TransmitError};
