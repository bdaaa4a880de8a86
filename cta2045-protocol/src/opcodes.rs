//! Message categories and opcode tables
//!
//! The three application-message families share one frame layout and are
//! told apart by their TYPE1/TYPE2 header. Each family has its own closed
//! opcode table; anything outside it maps to the `Invalid` sentinel.
//!
//! - Basic and DataLink are keyed by OP1
//! - Intermediate is keyed by the big-endian pair `OP1 << 8 | OP2`

/// Reply bit set in OP2 of Intermediate responses
pub const OP_CODE2_REPLY: u8 = 0x80;

// Basic opcodes (OP1)
pub const APP_ACK: u8 = 0x03;
pub const APP_NAK: u8 = 0x04;
pub const CUSTOMER_OVERRIDE: u8 = 0x11;
pub const OPER_STATE_REQUEST: u8 = 0x12;
pub const OPER_STATE_RESPONSE: u8 = 0x13;

// Data-link opcodes (OP1)
pub const MAX_PAYLOAD_REQUEST: u8 = 0x18;
pub const MAX_PAYLOAD_RESPONSE: u8 = 0x19;
pub const SEND_NEXT_COMMAND_TO_SLOT: u8 = 0x1A;

// Intermediate opcodes (OP1 << 8 | OP2)
pub const INFO_REQUEST: u16 = 0x0101;
pub const INFO_RESPONSE: u16 = 0x0181;
pub const GET_UTC_TIME_REQUEST: u16 = 0x0200;
pub const GET_UTC_TIME_RESPONSE: u16 = 0x0280;
pub const SET_ENERGY_PRICE_REQUEST: u16 = 0x0300;
pub const SET_ENERGY_PRICE_RESPONSE: u16 = 0x0380;
pub const TEMPERATURE_OFFSET_REQUEST: u16 = 0x0302;
pub const TEMPERATURE_OFFSET_RESPONSE: u16 = 0x0382;
pub const SETPOINT_RESPONSE: u16 = 0x0383;
pub const PRESENT_TEMPERATURE_RESPONSE: u16 = 0x0384;
pub const START_CYCLING_RESPONSE: u16 = 0x0480;
pub const TERMINATE_CYCLING_RESPONSE: u16 = 0x0481;
pub const COMMODITY_REQUEST: u16 = 0x0600;
pub const COMMODITY_RESPONSE: u16 = 0x0680;

/// TYPE1/TYPE2 header of a full frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MessageType {
    pub type1: u8,
    pub type2: u8,
}

impl MessageType {
    /// Basic DR application messages
    pub const BASIC: Self = Self::new(0x08, 0x01);
    /// Intermediate DR application messages
    pub const INTERMEDIATE: Self = Self::new(0x08, 0x02);
    /// Data-link messages (max payload negotiation, slots)
    pub const DATA_LINK: Self = Self::new(0x08, 0x03);

    pub const fn new(type1: u8, type2: u8) -> Self {
        Self { type1, type2 }
    }

    /// Category named by this header, if any
    pub fn category(self) -> Option<MessageCategory> {
        match self {
            Self::BASIC => Some(MessageCategory::Basic),
            Self::DATA_LINK => Some(MessageCategory::DataLink),
            Self::INTERMEDIATE => Some(MessageCategory::Intermediate),
            _ => None,
        }
    }
}

/// Message category, determined by the first two bytes of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageCategory {
    LinkAck,
    LinkNak,
    Basic,
    DataLink,
    Intermediate,
}

/// Declares an opcode enum together with its lookup table
///
/// The table is the single source for both directions of the mapping.
macro_rules! opcode_table {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $code:expr, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
            /// Opcode outside the known set
            Invalid,
        }

        impl $name {
            /// Known opcodes and their operations
            pub const TABLE: &'static [($repr, $name)] = &[ $( ($code, $name::$variant), )* ];

            /// Look up an opcode, returning `Invalid` when unknown
            pub fn from_code(code: $repr) -> Self {
                Self::TABLE
                    .iter()
                    .find(|(known, _)| *known == code)
                    .map_or($name::Invalid, |(_, op)| *op)
            }

            /// Wire opcode of this operation (`None` for `Invalid`)
            pub fn code(self) -> Option<$repr> {
                Self::TABLE
                    .iter()
                    .find(|(_, op)| *op == self)
                    .map(|(code, _)| *code)
            }
        }
    };
}

opcode_table! {
    /// Basic DR operations, keyed by OP1
    pub enum BasicOp: u8 {
        /// Application-layer acknowledgement (OP2 echoes the acknowledged opcode)
        AppAck = APP_ACK,
        /// Application-layer negative acknowledgement (OP2 carries the reason)
        AppNak = APP_NAK,
        CustomerOverride = CUSTOMER_OVERRIDE,
        QueryOperationalState = OPER_STATE_REQUEST,
        OperationalStateResponse = OPER_STATE_RESPONSE,
    }
}

opcode_table! {
    /// Data-link operations, keyed by OP1
    pub enum DataLinkOp: u8 {
        MaxPayloadRequest = MAX_PAYLOAD_REQUEST,
        /// OP2 carries the peer's max payload class
        MaxPayloadResponse = MAX_PAYLOAD_RESPONSE,
        SendNextCommandToSlot = SEND_NEXT_COMMAND_TO_SLOT,
    }
}

opcode_table! {
    /// Intermediate DR operations, keyed by `OP1 << 8 | OP2`
    pub enum IntermediateOp: u16 {
        InfoRequest = INFO_REQUEST,
        InfoResponse = INFO_RESPONSE,
        GetUtcTimeRequest = GET_UTC_TIME_REQUEST,
        GetUtcTimeResponse = GET_UTC_TIME_RESPONSE,
        SetEnergyPriceRequest = SET_ENERGY_PRICE_REQUEST,
        SetEnergyPriceResponse = SET_ENERGY_PRICE_RESPONSE,
        GetSetTemperatureOffsetRequest = TEMPERATURE_OFFSET_REQUEST,
        GetSetTemperatureOffsetResponse = TEMPERATURE_OFFSET_RESPONSE,
        GetSetSetpointResponse = SETPOINT_RESPONSE,
        GetPresentTemperatureResponse = PRESENT_TEMPERATURE_RESPONSE,
        StartCyclingResponse = START_CYCLING_RESPONSE,
        TerminateCyclingResponse = TERMINATE_CYCLING_RESPONSE,
        CommodityRequest = COMMODITY_REQUEST,
        CommodityResponse = COMMODITY_RESPONSE,
    }
}

impl IntermediateOp {
    /// Split into the (OP1, OP2) wire pair
    pub fn opcodes(self) -> Option<(u8, u8)> {
        self.code().map(|code| {
            let [op1, op2] = code.to_be_bytes();
            (op1, op2)
        })
    }

    /// Check if this is the reply half of an exchange
    pub fn is_response(self) -> bool {
        self.opcodes()
            .is_some_and(|(_, op2)| op2 & OP_CODE2_REPLY != 0)
    }
}
