//! Byte transport between the UART and the worker
//!
//! The UART interrupt (or a polling loop) pushes received bytes into the
//! link's inbound queue and drains its outbound queue into the transmit
//! FIFO. The worker is the only consumer of the inbound queue and the only
//! producer of the outbound one.

pub mod link;

pub use link::{Link, TransmitError, PUMP_CHUNK, RX_QUEUE_SIZE, TX_QUEUE_SIZE};
