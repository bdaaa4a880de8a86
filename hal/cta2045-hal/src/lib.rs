//! CTA-2045 Hardware Abstraction Layer
//!
//! The CTA-2045 serial port is the only peripheral the protocol stack
//! touches. This crate defines the traits a chip-specific UART driver
//! implements so the link can be pumped from an interrupt handler or a
//! polling loop without the protocol crates knowing about registers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  cta2045-core (session, worker, link)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cta2045-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!          chip UART driver / ISR glue
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{Uart, UartConfig, UartRx, UartTx};
