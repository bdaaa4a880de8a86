//! Per-category handling tables
//!
//! One row per known operation. An operation missing from its table falls
//! back to the category's NAK, as does the `Invalid` sentinel.

use cta2045_protocol::{BasicOp, DataLinkOp, IntermediateOp, NakReason};

/// What a received message gets in return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Handling {
    /// Link-layer ACK only
    Ack,
    /// Link-layer ACK followed by a reply frame
    AckThen(ReplyKind),
    /// Like `AckThen`, but only for requests without payload
    ///
    /// A request carrying payload gets NAK `RequestNotSupported`.
    BareRequest(ReplyKind),
    /// Link-layer ACK after logging the decoded payload
    Report(Report),
    /// Link-layer NAK with the given reason
    Nak(NakReason),
}

/// Reply frame sent after the link-layer ACK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyKind {
    /// Basic application ACK echoing the received OP1
    AppAck,
    /// Data-link max payload response with the configured class
    MaxPayload,
    /// Intermediate UTC time reply
    UtcTime,
}

/// Payloads worth logging when they arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    DeviceInfo,
    TemperatureOffset,
}

pub const BASIC_FALLBACK: Handling = Handling::Nak(NakReason::UnsupportedMessageType);
pub const DATA_LINK_FALLBACK: Handling = Handling::Nak(NakReason::RequestNotSupported);
pub const INTERMEDIATE_FALLBACK: Handling = Handling::Nak(NakReason::RequestNotSupported);

/// Answer for frames outside the three message categories
pub const UNKNOWN_HEADER: Handling = Handling::Nak(NakReason::RequestNotSupported);

/// Answer for frames too short to carry an opcode pair
pub const MISSING_OPCODES: Handling = Handling::Nak(NakReason::InvalidLength);

pub const BASIC: &[(BasicOp, Handling)] = &[
    (BasicOp::AppAck, Handling::Ack),
    (BasicOp::AppNak, Handling::Ack),
    (BasicOp::CustomerOverride, Handling::AckThen(ReplyKind::AppAck)),
    (BasicOp::OperationalStateResponse, Handling::Ack),
];

pub const DATA_LINK: &[(DataLinkOp, Handling)] = &[
    (DataLinkOp::MaxPayloadRequest, Handling::AckThen(ReplyKind::MaxPayload)),
    (DataLinkOp::MaxPayloadResponse, Handling::Ack),
];

pub const INTERMEDIATE: &[(IntermediateOp, Handling)] = &[
    (IntermediateOp::InfoResponse, Handling::Report(Report::DeviceInfo)),
    (IntermediateOp::GetUtcTimeRequest, Handling::BareRequest(ReplyKind::UtcTime)),
    (IntermediateOp::GetUtcTimeResponse, Handling::Ack),
    (IntermediateOp::SetEnergyPriceResponse, Handling::Ack),
    (
        IntermediateOp::GetSetTemperatureOffsetResponse,
        Handling::Report(Report::TemperatureOffset),
    ),
    (IntermediateOp::GetSetSetpointResponse, Handling::Ack),
    (IntermediateOp::GetPresentTemperatureResponse, Handling::Ack),
    (IntermediateOp::StartCyclingResponse, Handling::Ack),
    (IntermediateOp::TerminateCyclingResponse, Handling::Ack),
    (IntermediateOp::CommodityResponse, Handling::Ack),
];

/// Find the handling of `op` in `rules`
pub fn lookup<K: Copy + PartialEq>(rules: &[(K, Handling)], op: K, fallback: Handling) -> Handling {
    rules
        .iter()
        .find(|(known, _)| *known == op)
        .map_or(fallback, |(_, handling)| *handling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_hit_and_fallback() {
        assert_eq!(lookup(BASIC, BasicOp::AppAck, BASIC_FALLBACK), Handling::Ack);
        assert_eq!(lookup(BASIC, BasicOp::Invalid, BASIC_FALLBACK), BASIC_FALLBACK);
        assert_eq!(
            lookup(BASIC, BasicOp::QueryOperationalState, BASIC_FALLBACK),
            Handling::Nak(NakReason::UnsupportedMessageType)
        );
    }

    #[test]
    fn test_tables_have_no_duplicate_rows() {
        for (i, (op, _)) in INTERMEDIATE.iter().enumerate() {
            assert!(INTERMEDIATE[i + 1..].iter().all(|(other, _)| other != op));
        }
        for (i, (op, _)) in BASIC.iter().enumerate() {
            assert!(BASIC[i + 1..].iter().all(|(other, _)| other != op));
        }
        for (i, (op, _)) in DATA_LINK.iter().enumerate() {
            assert!(DATA_LINK[i + 1..].iter().all(|(other, _)| other != op));
        }
    }

    #[test]
    fn test_every_response_is_acknowledged() {
        for &(_, op) in IntermediateOp::TABLE {
            if op.is_response() {
                let handling = lookup(INTERMEDIATE, op, INTERMEDIATE_FALLBACK);
                assert!(
                    matches!(handling, Handling::Ack | Handling::Report(_)),
                    "{:?} -> {:?}",
                    op,
                    handling
                );
            }
        }
    }

    #[test]
    fn test_requests_not_served() {
        for op in [
            IntermediateOp::InfoRequest,
            IntermediateOp::SetEnergyPriceRequest,
            IntermediateOp::GetSetTemperatureOffsetRequest,
            IntermediateOp::CommodityRequest,
        ] {
            assert_eq!(
                lookup(INTERMEDIATE, op, INTERMEDIATE_FALLBACK),
                Handling::Nak(NakReason::RequestNotSupported)
            );
        }
        assert_eq!(
            lookup(DATA_LINK, DataLinkOp::SendNextCommandToSlot, DATA_LINK_FALLBACK),
            Handling::Nak(NakReason::RequestNotSupported)
        );
    }
}
