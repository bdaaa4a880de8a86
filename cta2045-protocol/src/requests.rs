//! Builders for outgoing frames
//!
//! The responder path only needs ACK/NAK and a handful of replies, but a
//! module that initiates exchanges (or a test harness playing the peer)
//! needs the request side as well.

use crate::frame::{Frame, LinkFrame, Message, NakReason};
use crate::opcodes::{
    MessageType, APP_ACK, GET_UTC_TIME_REQUEST, INFO_REQUEST, MAX_PAYLOAD_REQUEST,
};

/// Link-layer ACK
pub fn ack() -> Frame {
    Frame::Link(LinkFrame::Ack)
}

/// Link-layer NAK
pub fn nak(reason: NakReason) -> Frame {
    Frame::Link(LinkFrame::Nak(reason))
}

/// Basic DR message with no payload
pub fn basic(opcode1: u8, opcode2: u8) -> Frame {
    Message::bare(MessageType::BASIC, opcode1, opcode2).into()
}

/// Application-layer acknowledgement of a Basic `opcode`
pub fn app_ack(opcode: u8) -> Frame {
    basic(APP_ACK, opcode)
}

/// Data-link message with no payload
pub fn datalink(opcode1: u8, opcode2: u8) -> Frame {
    Message::bare(MessageType::DATA_LINK, opcode1, opcode2).into()
}

/// Intermediate DR message with no payload, `opcode` = `OP1 << 8 | OP2`
pub fn intermediate(opcode: u16) -> Frame {
    let [op1, op2] = opcode.to_be_bytes();
    Message::bare(MessageType::INTERMEDIATE, op1, op2).into()
}

/// Ask the peer for its maximum payload class
pub fn max_payload_request() -> Frame {
    datalink(MAX_PAYLOAD_REQUEST, 0x00)
}

/// Ask the peer for its device information
pub fn device_info_request() -> Frame {
    intermediate(INFO_REQUEST)
}

/// Ask the peer for the current UTC time
pub fn utc_time_request() -> Frame {
    intermediate(GET_UTC_TIME_REQUEST)
}
