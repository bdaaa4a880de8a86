//! Typed payloads carried inside full frames
//!
//! Only the payloads this stack produces or inspects are modeled:
//! - max payload class (data-link negotiation)
//! - UTC time reply (Intermediate `GetUtcTime`)
//! - device information (Intermediate `InfoResponse`)

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::{FrameError, Message};
use crate::opcodes::{MessageType, GET_UTC_TIME_RESPONSE, MAX_PAYLOAD_RESPONSE};

/// Errors decoding a typed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Payload shorter than the fixed layout
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Truncated { expected, actual } => {
                write!(f, "payload truncated: expected {} bytes, got {}", expected, actual)
            }
        }
    }
}

impl core::error::Error for PayloadError {}

/// Maximum payload class announced during data-link negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum MaxPayload {
    Bytes2 = 0x00,
    Bytes4 = 0x01,
    Bytes8 = 0x02,
    Bytes16 = 0x03,
    Bytes32 = 0x04,
    Bytes64 = 0x05,
    Bytes128 = 0x06,
    #[default]
    Bytes256 = 0x07,
    Bytes512 = 0x08,
    Bytes1024 = 0x09,
    Bytes1280 = 0x0A,
    Bytes1500 = 0x0B,
    Bytes2048 = 0x0C,
    Bytes4096 = 0x0D,
}

impl MaxPayload {
    const ALL: [MaxPayload; 14] = [
        MaxPayload::Bytes2,
        MaxPayload::Bytes4,
        MaxPayload::Bytes8,
        MaxPayload::Bytes16,
        MaxPayload::Bytes32,
        MaxPayload::Bytes64,
        MaxPayload::Bytes128,
        MaxPayload::Bytes256,
        MaxPayload::Bytes512,
        MaxPayload::Bytes1024,
        MaxPayload::Bytes1280,
        MaxPayload::Bytes1500,
        MaxPayload::Bytes2048,
        MaxPayload::Bytes4096,
    ];

    /// Parse a class from its wire byte
    pub fn from_class(class: u8) -> Option<Self> {
        Self::ALL.get(class as usize).copied()
    }

    /// Convert to wire byte
    pub fn class(self) -> u8 {
        self as u8
    }

    /// Largest LENGTH value this class allows
    pub fn bytes(self) -> usize {
        match self {
            MaxPayload::Bytes2 => 2,
            MaxPayload::Bytes4 => 4,
            MaxPayload::Bytes8 => 8,
            MaxPayload::Bytes16 => 16,
            MaxPayload::Bytes32 => 32,
            MaxPayload::Bytes64 => 64,
            MaxPayload::Bytes128 => 128,
            MaxPayload::Bytes256 => 256,
            MaxPayload::Bytes512 => 512,
            MaxPayload::Bytes1024 => 1024,
            MaxPayload::Bytes1280 => 1280,
            MaxPayload::Bytes1500 => 1500,
            MaxPayload::Bytes2048 => 2048,
            MaxPayload::Bytes4096 => 4096,
        }
    }

    /// Largest class whose size fits in `bytes`
    pub fn fitting(bytes: usize) -> Option<Self> {
        Self::ALL.iter().rev().find(|class| class.bytes() <= bytes).copied()
    }

    /// Build the data-link max payload response announcing this class
    pub fn to_response(self) -> Message {
        Message::bare(MessageType::DATA_LINK, MAX_PAYLOAD_RESPONSE, self.class())
    }
}

/// Payload of the Intermediate `GetUtcTime` reply
///
/// ```text
/// ┌──────────┬──────────────┬──────────┬─────┐
/// │ RESPONSE │ UTC SECONDS  │ TZ (¼ h) │ DST │
/// │ 1B       │ 4B BE        │ 1B i8    │ 1B  │
/// └──────────┴──────────────┴──────────┴─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UtcTimeReply {
    /// Application response code (0 = success)
    pub response_code: u8,
    /// Seconds since 2000-01-01T00:00:00Z
    pub utc_seconds: u32,
    /// Local time zone offset in quarter hours
    pub tz_offset_quarter_hours: i8,
    /// Daylight saving offset in hours
    pub dst_offset: u8,
}

impl UtcTimeReply {
    /// Encoded payload size
    pub const SIZE: usize = 7;

    /// Encode the payload bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let seconds = self.utc_seconds.to_be_bytes();
        [
            self.response_code,
            seconds[0],
            seconds[1],
            seconds[2],
            seconds[3],
            self.tz_offset_quarter_hours as u8,
            self.dst_offset,
        ]
    }

    /// Decode the payload bytes
    pub fn from_bytes(payload: &[u8]) -> Result<Self, PayloadError> {
        let bytes: &[u8; Self::SIZE] = payload
            .get(..Self::SIZE)
            .and_then(|head| head.try_into().ok())
            .ok_or(PayloadError::Truncated {
                expected: Self::SIZE,
                actual: payload.len(),
            })?;

        Ok(Self {
            response_code: bytes[0],
            utc_seconds: u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
            tz_offset_quarter_hours: bytes[5] as i8,
            dst_offset: bytes[6],
        })
    }

    /// Build the Intermediate reply message carrying this payload
    pub fn to_message(&self) -> Result<Message, FrameError> {
        let [op1, op2] = GET_UTC_TIME_RESPONSE.to_be_bytes();
        Message::new(MessageType::INTERMEDIATE, op1, op2, &self.to_bytes())
    }
}

/// Device information returned in an Intermediate `InfoResponse`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInfo {
    pub response_code: u8,
    /// CTA-2045 version, two ASCII characters
    pub version: [u8; 2],
    pub vendor_id: u16,
    pub device_type: u16,
    pub device_revision: [u8; 2],
    /// Capability bitmap
    pub capability: [u8; 4],
    pub model_number: [u8; 16],
    pub serial_number: [u8; 16],
    /// Two-digit year, 20xx
    pub firmware_year: u8,
    pub firmware_month: u8,
    pub firmware_day: u8,
    pub firmware_major: u8,
    pub firmware_minor: u8,
}

impl DeviceInfo {
    /// Encoded payload size
    pub const SIZE: usize = 51;

    /// Decode from an `InfoResponse` payload (the bytes after OP1/OP2)
    pub fn from_bytes(payload: &[u8]) -> Result<Self, PayloadError> {
        if payload.len() < Self::SIZE {
            return Err(PayloadError::Truncated {
                expected: Self::SIZE,
                actual: payload.len(),
            });
        }

        let mut reader = Reader::new(payload);
        let response_code = reader.u8();
        let version = reader.array();
        let vendor_id = reader.u16();
        let device_type = reader.u16();
        let device_revision = reader.array();
        let capability = reader.array();
        let _reserved = reader.u8();
        let model_number = reader.array();
        let serial_number = reader.array();

        Ok(Self {
            response_code,
            version,
            vendor_id,
            device_type,
            device_revision,
            capability,
            model_number,
            serial_number,
            firmware_year: reader.u8(),
            firmware_month: reader.u8(),
            firmware_day: reader.u8(),
            firmware_major: reader.u8(),
            firmware_minor: reader.u8(),
        })
    }

    /// Model number with NUL/space padding removed
    pub fn model(&self) -> &str {
        ascii_field(&self.model_number)
    }

    /// Serial number with NUL/space padding removed
    pub fn serial(&self) -> &str {
        ascii_field(&self.serial_number)
    }

    /// Full firmware year
    pub fn firmware_full_year(&self) -> u16 {
        2000 + self.firmware_year as u16
    }
}

/// Trim padding from a fixed-width ASCII field; non-UTF-8 yields ""
fn ascii_field(raw: &[u8]) -> &str {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    core::str::from_utf8(&raw[..end]).map_or("", str::trim_end)
}

/// Cursor over a payload whose length has already been checked
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(src) = self.bytes.get(self.pos..self.pos + N) {
            out.copy_from_slice(src);
        }
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        let [byte] = self.array();
        byte
    }

    fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.array())
    }
}
