//! Frame encoding and decoding for the CTA-2045 serial protocol.
//!
//! Two physical shapes exist:
//! - Link-layer control frame (2 bytes): ACK `06 00` or NAK `15 <reason>`
//! - Full frame: TYPE1, TYPE2, LENGTH (u16 BE), OP1, OP2, PAYLOAD,
//!   CHECKSUM (u16 BE over every preceding byte)

use core::fmt;

use heapless::Vec;

use crate::checksum::checksum;
use crate::opcodes::{MessageCategory, MessageType};

/// Size of the TYPE1/TYPE2 header
pub const HEADER_SIZE: usize = 2;

/// Size of the big-endian LENGTH field
pub const LENGTH_SIZE: usize = 2;

/// Size of the big-endian CHECKSUM field
pub const CHECKSUM_SIZE: usize = 2;

/// Header + length + checksum: the smallest possible full frame
pub const ENVELOPE_SIZE: usize = HEADER_SIZE + LENGTH_SIZE + CHECKSUM_SIZE;

/// Offset of the LENGTH field
pub const LENGTH_OFFSET: usize = HEADER_SIZE;

/// Offset of OP1 (start of the length-counted body)
pub const BODY_OFFSET: usize = HEADER_SIZE + LENGTH_SIZE;

/// Size of a link-layer control frame
pub const LINK_FRAME_SIZE: usize = 2;

/// Largest LENGTH value this stack accepts (max payload class 0x07)
pub const MAX_LENGTH: usize = 256;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = ENVELOPE_SIZE + MAX_LENGTH;

/// First byte of a link-layer ACK
pub const LINK_ACK_TYPE1: u8 = 0x06;

/// Second byte of a link-layer ACK
pub const LINK_ACK_TYPE2: u8 = 0x00;

/// First byte of a link-layer NAK; the second byte is the [`NakReason`]
pub const LINK_NAK_TYPE1: u8 = 0x15;

/// Errors that can occur during frame decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Output buffer too small for encoding
    BufferTooSmall,
    /// Opcodes plus payload exceed [`MAX_LENGTH`]
    PayloadTooLarge,
    /// Not enough bytes for the declared frame
    Incomplete,
    /// LENGTH field outside the accepted range
    InvalidLength,
    /// Stored checksum differs from the recomputed one
    InvalidChecksum,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::BufferTooSmall => write!(f, "buffer too small"),
            FrameError::PayloadTooLarge => write!(f, "payload too large"),
            FrameError::Incomplete => write!(f, "incomplete frame"),
            FrameError::InvalidLength => write!(f, "invalid length field"),
            FrameError::InvalidChecksum => write!(f, "checksum mismatch"),
        }
    }
}

impl core::error::Error for FrameError {}

/// Reason code carried in the second byte of a link-layer NAK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NakReason {
    NoReason = 0x00,
    /// Invalid start byte
    InvalidByte = 0x01,
    InvalidLength = 0x02,
    ChecksumError = 0x03,
    Reserved = 0x04,
    MessageTimeout = 0x05,
    UnsupportedMessageType = 0x06,
    RequestNotSupported = 0x07,
}

impl NakReason {
    /// Parse a reason from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(NakReason::NoReason),
            0x01 => Some(NakReason::InvalidByte),
            0x02 => Some(NakReason::InvalidLength),
            0x03 => Some(NakReason::ChecksumError),
            0x04 => Some(NakReason::Reserved),
            0x05 => Some(NakReason::MessageTimeout),
            0x06 => Some(NakReason::UnsupportedMessageType),
            0x07 => Some(NakReason::RequestNotSupported),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Two-byte link-layer control frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkFrame {
    Ack,
    Nak(NakReason),
}

impl LinkFrame {
    /// Recognize a control frame from the first two bytes of `bytes`
    ///
    /// A NAK is only recognized when its reason byte is a known code.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [LINK_ACK_TYPE1, LINK_ACK_TYPE2, ..] => Some(LinkFrame::Ack),
            [LINK_NAK_TYPE1, reason, ..] => NakReason::from_byte(*reason).map(LinkFrame::Nak),
            _ => None,
        }
    }

    /// Wire bytes of this control frame
    pub fn to_bytes(self) -> [u8; LINK_FRAME_SIZE] {
        match self {
            LinkFrame::Ack => [LINK_ACK_TYPE1, LINK_ACK_TYPE2],
            LinkFrame::Nak(reason) => [LINK_NAK_TYPE1, reason.to_byte()],
        }
    }
}

/// A full (length-prefixed, checksummed) frame
///
/// The body is everything the LENGTH field counts: OP1, OP2 and payload.
/// A checksum-valid frame may declare a length below 2, in which case the
/// opcode accessors return `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// TYPE1/TYPE2 header
    pub msg_type: MessageType,
    body: Vec<u8, MAX_LENGTH>,
}

impl Message {
    /// Create a message with an opcode pair and payload
    pub fn new(msg_type: MessageType, opcode1: u8, opcode2: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let mut body: Vec<u8, MAX_LENGTH> = Vec::new();
        body.extend_from_slice(&[opcode1, opcode2])
            .and_then(|_| body.extend_from_slice(payload))
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, body })
    }

    /// Create a message with an opcode pair and no payload
    pub fn bare(msg_type: MessageType, opcode1: u8, opcode2: u8) -> Self {
        let mut body: Vec<u8, MAX_LENGTH> = Vec::new();
        // Two bytes always fit
        let _ = body.extend_from_slice(&[opcode1, opcode2]);
        Self { msg_type, body }
    }

    /// Create a message from the raw length-counted body
    pub fn from_body(msg_type: MessageType, body: &[u8]) -> Result<Self, FrameError> {
        let body = Vec::from_slice(body).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, body })
    }

    /// Category of this message, if the header names a known one
    pub fn category(&self) -> Option<MessageCategory> {
        self.msg_type.category()
    }

    /// Value of the LENGTH field (opcodes plus payload)
    pub fn length(&self) -> u16 {
        self.body.len() as u16
    }

    /// Raw length-counted body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// First opcode byte
    pub fn opcode1(&self) -> Option<u8> {
        self.body.first().copied()
    }

    /// Second opcode byte
    pub fn opcode2(&self) -> Option<u8> {
        self.body.get(1).copied()
    }

    /// Both opcodes as a big-endian pair (`OP1 << 8 | OP2`)
    pub fn opcode_pair(&self) -> Option<u16> {
        match self.body.as_slice() {
            [op1, op2, ..] => Some(u16::from_be_bytes([*op1, *op2])),
            _ => None,
        }
    }

    /// Bytes after the opcode pair
    pub fn payload(&self) -> &[u8] {
        self.body.get(2..).unwrap_or(&[])
    }

    /// Number of bytes this message occupies on the wire
    pub fn encoded_len(&self) -> usize {
        ENVELOPE_SIZE + self.body.len()
    }

    /// Encode this message into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let body_end = BODY_OFFSET + self.body.len();
        buffer[0] = self.msg_type.type1;
        buffer[1] = self.msg_type.type2;
        buffer[LENGTH_OFFSET..BODY_OFFSET].copy_from_slice(&self.length().to_be_bytes());
        buffer[BODY_OFFSET..body_end].copy_from_slice(&self.body);

        let sum = checksum(&buffer[..body_end]);
        buffer[body_end..frame_len].copy_from_slice(&sum.to_be_bytes());

        Ok(frame_len)
    }

    /// Decode one full frame from the start of `bytes`
    ///
    /// Trailing bytes after the frame are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let length = declared_length(bytes).ok_or(FrameError::Incomplete)?;
        if length > MAX_LENGTH {
            return Err(FrameError::InvalidLength);
        }

        let frame_len = ENVELOPE_SIZE + length;
        if bytes.len() < frame_len {
            return Err(FrameError::Incomplete);
        }

        let body_end = BODY_OFFSET + length;
        if checksum(&bytes[..body_end]) != stored_checksum(&bytes[..frame_len]) {
            return Err(FrameError::InvalidChecksum);
        }

        Self::from_body(
            MessageType::new(bytes[0], bytes[1]),
            &bytes[BODY_OFFSET..body_end],
        )
    }
}

/// A parsed or constructed frame of either shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Link(LinkFrame),
    Message(Message),
}

impl Frame {
    /// Link-layer ACK
    pub const fn ack() -> Self {
        Frame::Link(LinkFrame::Ack)
    }

    /// Link-layer NAK with the given reason
    pub const fn nak(reason: NakReason) -> Self {
        Frame::Link(LinkFrame::Nak(reason))
    }

    /// Category of this frame, if known
    pub fn category(&self) -> Option<MessageCategory> {
        match self {
            Frame::Link(LinkFrame::Ack) => Some(MessageCategory::LinkAck),
            Frame::Link(LinkFrame::Nak(_)) => Some(MessageCategory::LinkNak),
            Frame::Message(message) => message.category(),
        }
    }

    /// Number of bytes this frame occupies on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            Frame::Link(_) => LINK_FRAME_SIZE,
            Frame::Message(message) => message.encoded_len(),
        }
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        match self {
            Frame::Link(link) => {
                if buffer.len() < LINK_FRAME_SIZE {
                    return Err(FrameError::BufferTooSmall);
                }
                buffer[..LINK_FRAME_SIZE].copy_from_slice(&link.to_bytes());
                Ok(LINK_FRAME_SIZE)
            }
            Frame::Message(message) => message.encode(buffer),
        }
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }

    /// Decode one frame of either shape from the start of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < LINK_FRAME_SIZE {
            return Err(FrameError::Incomplete);
        }
        if let Some(link) = LinkFrame::parse(bytes) {
            return Ok(Frame::Link(link));
        }
        Message::decode(bytes).map(Frame::Message)
    }
}

impl From<LinkFrame> for Frame {
    fn from(link: LinkFrame) -> Self {
        Frame::Link(link)
    }
}

impl From<Message> for Frame {
    fn from(message: Message) -> Self {
        Frame::Message(message)
    }
}

/// Read the LENGTH field, if enough bytes are present
pub fn declared_length(bytes: &[u8]) -> Option<usize> {
    match bytes.get(LENGTH_OFFSET..BODY_OFFSET)? {
        [high, low] => Some(u16::from_be_bytes([*high, *low]) as usize),
        _ => None,
    }
}

/// Read the trailing CHECKSUM field of a complete frame
pub fn stored_checksum(frame: &[u8]) -> u16 {
    match frame {
        [.., high, low] => u16::from_be_bytes([*high, *low]),
        _ => 0,
    }
}
