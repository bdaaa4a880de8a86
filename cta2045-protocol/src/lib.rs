//! CTA-2045 serial protocol
//!
//! This crate implements the framing layer spoken between a communication
//! module (UCM) and an appliance (SGD) over the CTA-2045 serial port: the
//! checksum, the wire layout of every frame, the opcode tables and the
//! stream assembler that turns arbitrary UART chunks back into frames.
//!
//! # Wire format
//!
//! Link-layer control frames are two bytes and carry no checksum:
//! ```text
//! ┌──────┬──────┐      ┌──────┬────────┐
//! │ 0x06 │ 0x00 │ ACK  │ 0x15 │ REASON │ NAK
//! └──────┴──────┘      └──────┴────────┘
//! ```
//!
//! Every other message uses the full frame, all integers big-endian:
//! ```text
//! ┌───────┬───────┬────────┬─────┬─────┬──────────────┬──────────┐
//! │ TYPE1 │ TYPE2 │ LENGTH │ OP1 │ OP2 │ PAYLOAD      │ CHECKSUM │
//! │ 1B    │ 1B    │ 2B     │ 1B  │ 1B  │ LENGTH - 2 B │ 2B       │
//! └───────┴───────┴────────┴─────┴─────┴──────────────┴──────────┘
//! ```
//!
//! LENGTH counts the opcode pair plus payload. CHECKSUM covers every byte
//! before it.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod assembler;
pub mod checksum;
pub mod frame;
pub mod messages;
pub mod opcodes;
pub mod requests;

pub use assembler::{AssemblerEvent, FrameAssembler, ResyncReason, DEFAULT_ASSEMBLY_CAPACITY};
pub use checksum::checksum;
pub use frame::{Frame, FrameError, LinkFrame, Message, NakReason, MAX_FRAME_SIZE, MAX_LENGTH};
pub use messages::{DeviceInfo, MaxPayload, PayloadError, UtcTimeReply};
pub use opcodes::{BasicOp, DataLinkOp, IntermediateOp, MessageCategory, MessageType};
