//! Message dispatcher
//!
//! Maps one validated message to the frames sent back. Holds only the
//! configured max payload class, so dispatching the same message twice
//! always produces the same replies.

use heapless::Vec;

use cta2045_protocol::requests;
use cta2045_protocol::{
    BasicOp, DataLinkOp, DeviceInfo, Frame, IntermediateOp, MaxPayload, Message,
    MessageCategory, NakReason, UtcTimeReply,
};

use super::table::{self, Handling, Report, ReplyKind};

/// Most frames a single message is answered with
pub const MAX_REPLIES: usize = 2;

/// Frames to transmit, in order
pub type Replies = Vec<Frame, MAX_REPLIES>;

/// Stateless message dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatcher {
    max_payload: MaxPayload,
}

impl Dispatcher {
    pub fn new(max_payload: MaxPayload) -> Self {
        Self { max_payload }
    }

    /// Class announced in max payload responses
    pub fn max_payload(&self) -> MaxPayload {
        self.max_payload
    }

    /// Look up how `message` is handled
    pub fn classify(&self, message: &Message) -> Handling {
        let Some(category) = message.category() else {
            return table::UNKNOWN_HEADER;
        };
        let (Some(op1), Some(op2)) = (message.opcode1(), message.opcode2()) else {
            return table::MISSING_OPCODES;
        };

        match category {
            MessageCategory::Basic => {
                table::lookup(table::BASIC, BasicOp::from_code(op1), table::BASIC_FALLBACK)
            }
            MessageCategory::DataLink => table::lookup(
                table::DATA_LINK,
                DataLinkOp::from_code(op1),
                table::DATA_LINK_FALLBACK,
            ),
            MessageCategory::Intermediate => table::lookup(
                table::INTERMEDIATE,
                IntermediateOp::from_code(u16::from_be_bytes([op1, op2])),
                table::INTERMEDIATE_FALLBACK,
            ),
            MessageCategory::LinkAck | MessageCategory::LinkNak => table::UNKNOWN_HEADER,
        }
    }

    /// Build the replies for `message`
    ///
    /// Always returns at least one frame.
    pub fn dispatch(&self, message: &Message) -> Replies {
        let handling = self.classify(message);
        debug!(
            "dispatch {:?} opcodes {:?} -> {:?}",
            message.msg_type,
            message.opcode_pair(),
            handling
        );

        match handling {
            Handling::Ack => one(Frame::ack()),
            Handling::AckThen(kind) => two(Frame::ack(), self.reply(kind, message)),
            Handling::BareRequest(kind) if message.payload().is_empty() => {
                two(Frame::ack(), self.reply(kind, message))
            }
            Handling::BareRequest(_) => one(Frame::nak(NakReason::RequestNotSupported)),
            Handling::Report(report) => {
                self.report(report, message);
                one(Frame::ack())
            }
            Handling::Nak(reason) => one(Frame::nak(reason)),
        }
    }

    fn reply(&self, kind: ReplyKind, message: &Message) -> Frame {
        match kind {
            ReplyKind::AppAck => message
                .opcode1()
                .map_or(Frame::nak(NakReason::InvalidLength), requests::app_ack),
            ReplyKind::MaxPayload => Frame::Message(self.max_payload.to_response()),
            ReplyKind::UtcTime => UtcTimeReply::default()
                .to_message()
                .map_or(Frame::nak(NakReason::RequestNotSupported), Frame::Message),
        }
    }

    fn report(&self, report: Report, message: &Message) {
        match report {
            Report::DeviceInfo => match DeviceInfo::from_bytes(message.payload()) {
                Ok(info) => {
                    info!(
                        "device info: vendor {:#x} type {:#x} model {} serial {}",
                        info.vendor_id,
                        info.device_type,
                        info.model(),
                        info.serial()
                    );
                    info!(
                        "firmware {}-{}-{} version {}.{}",
                        info.firmware_full_year(),
                        info.firmware_month,
                        info.firmware_day,
                        info.firmware_major,
                        info.firmware_minor
                    );
                }
                Err(e) => warn!("device info not decoded: {:?}", e),
            },
            Report::TemperatureOffset => match message.payload() {
                [_, offset, units, ..] => {
                    info!("temperature offset {} (units {})", offset, units)
                }
                _ => info!("temperature offset set acknowledged"),
            },
        }
    }
}

fn one(frame: Frame) -> Replies {
    core::iter::once(frame).collect()
}

fn two(first: Frame, second: Frame) -> Replies {
    [first, second].into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cta2045_protocol::MessageType;

    fn message(msg_type: MessageType, op1: u8, op2: u8, payload: &[u8]) -> Message {
        Message::new(msg_type, op1, op2, payload).unwrap()
    }

    fn wire(replies: &Replies) -> std::vec::Vec<std::vec::Vec<u8>> {
        replies
            .iter()
            .map(|frame| frame.encode_to_vec().unwrap().to_vec())
            .collect()
    }

    #[test]
    fn test_app_ack_gets_link_ack() {
        let dispatcher = Dispatcher::default();
        let replies = dispatcher.dispatch(&message(MessageType::BASIC, 0x03, 0x00, &[]));

        assert_eq!(wire(&replies), [std::vec![0x06, 0x00]]);
    }

    #[test]
    fn test_app_nak_and_state_response_get_link_ack() {
        let dispatcher = Dispatcher::default();
        for op1 in [0x04, 0x13] {
            let replies = dispatcher.dispatch(&message(MessageType::BASIC, op1, 0x01, &[]));
            assert_eq!(&replies[..], &[Frame::ack()]);
        }
    }

    #[test]
    fn test_customer_override_gets_ack_then_app_ack() {
        let dispatcher = Dispatcher::default();
        let replies = dispatcher.dispatch(&message(MessageType::BASIC, 0x11, 0x00, &[]));

        assert_eq!(
            wire(&replies),
            [
                std::vec![0x06, 0x00],
                std::vec![0x08, 0x01, 0x00, 0x02, 0x03, 0x11, 0xE3, 0x52],
            ]
        );
    }

    #[test]
    fn test_unknown_basic_opcode() {
        let dispatcher = Dispatcher::default();
        for op1 in [0x01, 0x12, 0xFF] {
            let replies = dispatcher.dispatch(&message(MessageType::BASIC, op1, 0x00, &[]));
            assert_eq!(&replies[..], &[Frame::nak(NakReason::UnsupportedMessageType)]);
        }
    }

    #[test]
    fn test_max_payload_request() {
        let dispatcher = Dispatcher::new(MaxPayload::Bytes128);
        let replies = dispatcher.dispatch(&message(MessageType::DATA_LINK, 0x18, 0x00, &[]));

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], Frame::ack());
        let Frame::Message(response) = &replies[1] else {
            panic!("expected a full frame");
        };
        assert_eq!(response.msg_type, MessageType::DATA_LINK);
        assert_eq!(response.opcode1(), Some(0x19));
        assert_eq!(response.opcode2(), Some(MaxPayload::Bytes128.class()));
    }

    #[test]
    fn test_max_payload_request_default_class_bytes() {
        let replies = Dispatcher::default()
            .dispatch(&message(MessageType::DATA_LINK, 0x18, 0x00, &[]));

        assert_eq!(wire(&replies)[1], [0x08, 0x03, 0x00, 0x02, 0x19, 0x07, 0xA9, 0x7E]);
    }

    #[test]
    fn test_max_payload_response_and_slots() {
        let dispatcher = Dispatcher::default();

        let replies = dispatcher.dispatch(&message(MessageType::DATA_LINK, 0x19, 0x05, &[]));
        assert_eq!(&replies[..], &[Frame::ack()]);

        let replies = dispatcher.dispatch(&message(MessageType::DATA_LINK, 0x1A, 0x00, &[]));
        assert_eq!(&replies[..], &[Frame::nak(NakReason::RequestNotSupported)]);

        let replies = dispatcher.dispatch(&message(MessageType::DATA_LINK, 0x42, 0x00, &[]));
        assert_eq!(&replies[..], &[Frame::nak(NakReason::RequestNotSupported)]);
    }

    #[test]
    fn test_utc_time_request() {
        let dispatcher = Dispatcher::default();
        let replies = dispatcher.dispatch(&message(MessageType::INTERMEDIATE, 0x02, 0x00, &[]));

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], Frame::ack());
        let Frame::Message(reply) = &replies[1] else {
            panic!("expected a full frame");
        };
        assert_eq!(reply.opcode_pair(), Some(0x0280));
        assert_eq!(reply.payload(), &[0u8; UtcTimeReply::SIZE]);
    }

    #[test]
    fn test_utc_time_request_with_payload_is_refused() {
        let dispatcher = Dispatcher::default();
        let replies =
            dispatcher.dispatch(&message(MessageType::INTERMEDIATE, 0x02, 0x00, &[0x01]));

        assert_eq!(&replies[..], &[Frame::nak(NakReason::RequestNotSupported)]);
    }

    #[test]
    fn test_intermediate_responses_get_ack() {
        let dispatcher = Dispatcher::default();
        for opcode in [0x0280u16, 0x0380, 0x0382, 0x0383, 0x0384, 0x0480, 0x0481, 0x0680] {
            let [op1, op2] = opcode.to_be_bytes();
            let replies = dispatcher.dispatch(&message(MessageType::INTERMEDIATE, op1, op2, &[0]));
            assert_eq!(&replies[..], &[Frame::ack()], "opcode {:#06x}", opcode);
        }
    }

    #[test]
    fn test_intermediate_requests_are_refused() {
        let dispatcher = Dispatcher::default();
        for opcode in [0x0101u16, 0x0300, 0x0302, 0x0600, 0x0102, 0xFFFF] {
            let [op1, op2] = opcode.to_be_bytes();
            let replies = dispatcher.dispatch(&message(MessageType::INTERMEDIATE, op1, op2, &[]));
            assert_eq!(
                &replies[..],
                &[Frame::nak(NakReason::RequestNotSupported)],
                "opcode {:#06x}",
                opcode
            );
        }
    }

    #[test]
    fn test_info_response_is_acked_even_when_truncated() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let dispatcher = Dispatcher::default();

        let mut payload = [0u8; DeviceInfo::SIZE];
        payload[3..5].copy_from_slice(&0x0102u16.to_be_bytes());
        payload[14..19].copy_from_slice(b"WH-50");
        let replies =
            dispatcher.dispatch(&message(MessageType::INTERMEDIATE, 0x01, 0x81, &payload));
        assert_eq!(&replies[..], &[Frame::ack()]);

        let replies =
            dispatcher.dispatch(&message(MessageType::INTERMEDIATE, 0x01, 0x81, &payload[..10]));
        assert_eq!(&replies[..], &[Frame::ack()]);
    }

    #[test]
    fn test_temperature_offset_get_and_set_replies() {
        let dispatcher = Dispatcher::default();
        let set = dispatcher.dispatch(&message(MessageType::INTERMEDIATE, 0x03, 0x82, &[]));
        let get = dispatcher.dispatch(&message(MessageType::INTERMEDIATE, 0x03, 0x82, &[0, 5, 1]));

        assert_eq!(&set[..], &[Frame::ack()]);
        assert_eq!(&get[..], &[Frame::ack()]);
    }

    #[test]
    fn test_unknown_header() {
        let dispatcher = Dispatcher::default();
        let replies = dispatcher.dispatch(&message(MessageType::new(0x08, 0x04), 0x03, 0x00, &[]));

        assert_eq!(wire(&replies), [std::vec![0x15, 0x07]]);
    }

    #[test]
    fn test_missing_opcodes() {
        let dispatcher = Dispatcher::default();

        let empty = Message::from_body(MessageType::BASIC, &[]).unwrap();
        assert_eq!(&dispatcher.dispatch(&empty)[..], &[Frame::nak(NakReason::InvalidLength)]);

        let one_opcode = Message::from_body(MessageType::DATA_LINK, &[0x18]).unwrap();
        assert_eq!(
            &dispatcher.dispatch(&one_opcode)[..],
            &[Frame::nak(NakReason::InvalidLength)]
        );
    }

    #[test]
    fn test_dispatch_is_idempotent() {
        let dispatcher = Dispatcher::new(MaxPayload::Bytes64);
        let messages = [
            message(MessageType::BASIC, 0x11, 0x00, &[]),
            message(MessageType::DATA_LINK, 0x18, 0x00, &[]),
            message(MessageType::INTERMEDIATE, 0x02, 0x00, &[]),
            message(MessageType::new(0x01, 0x01), 0x00, 0x00, &[]),
        ];

        for msg in &messages {
            assert_eq!(dispatcher.dispatch(msg), dispatcher.dispatch(msg));
        }
    }
}
