//! Session context
//!
//! One [`Session`] per serial port. It owns the assembler and dispatcher so
//! several ports (or several tests) never share buffer state.

use cta2045_protocol::frame::ENVELOPE_SIZE;
use cta2045_protocol::{
    AssemblerEvent, Frame, FrameAssembler, LinkFrame, MaxPayload, DEFAULT_ASSEMBLY_CAPACITY,
};

use crate::config::SessionConfig;
use crate::dispatch::Dispatcher;
use crate::transport::TransmitError;

/// Counters kept by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionStats {
    /// Full frames handed to the dispatcher
    pub frames_received: u32,
    /// Link-layer ACKs received
    pub link_acks: u32,
    /// Link-layer NAKs received
    pub link_naks: u32,
    /// Single-byte resynchronizations
    pub resyncs: u32,
    /// Bytes discarded by assembler overflow
    pub bytes_lost: u32,
    /// Replies accepted by the transmit path
    pub replies_sent: u32,
    /// Replies the transmit path refused
    pub replies_dropped: u32,
}

/// Assembler, dispatcher and counters for one port
#[derive(Debug, Clone)]
pub struct Session<const C: usize = DEFAULT_ASSEMBLY_CAPACITY> {
    assembler: FrameAssembler<C>,
    dispatcher: Dispatcher,
    stats: SessionStats,
}

impl<const C: usize> Default for Session<C> {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl<const C: usize> Session<C> {
    const CAPACITY_CHECK: () = assert!(
        C >= ENVELOPE_SIZE + 2,
        "assembly buffer must hold the smallest max payload class"
    );

    /// Create a session; the max payload class caps accepted frame lengths
    ///
    /// A class larger than the assembler can hold is lowered to the largest
    /// class that fits, so the announced class always matches the LENGTH
    /// ceiling.
    pub fn new(config: &SessionConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;

        let ceiling = FrameAssembler::<C>::with_max_length(config.max_payload.bytes()).max_length();
        let class = MaxPayload::fitting(ceiling).unwrap_or(MaxPayload::Bytes2);
        if class != config.max_payload {
            warn!(
                "max payload class {:?} lowered to {:?}",
                config.max_payload, class
            );
        }

        Self {
            assembler: FrameAssembler::with_max_length(class.bytes()),
            dispatcher: Dispatcher::new(class),
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Bytes waiting for the rest of their frame
    pub fn buffered(&self) -> usize {
        self.assembler.len()
    }

    /// Feed a received chunk, answering every complete frame
    ///
    /// Each reply is encoded and handed to `transmit` in order. A refused
    /// reply is counted and dropped; processing continues.
    pub fn process<F>(&mut self, chunk: &[u8], mut transmit: F)
    where
        F: FnMut(&[u8]) -> Result<(), TransmitError>,
    {
        let Self {
            assembler,
            dispatcher,
            stats,
        } = self;

        assembler.ingest(chunk, |event| match event {
            AssemblerEvent::Frame(Frame::Link(LinkFrame::Ack)) => {
                info!("link ACK received");
                stats.link_acks = stats.link_acks.saturating_add(1);
            }
            AssemblerEvent::Frame(Frame::Link(LinkFrame::Nak(reason))) => {
                info!("link NAK received: {:?}", reason);
                stats.link_naks = stats.link_naks.saturating_add(1);
            }
            AssemblerEvent::Frame(Frame::Message(message)) => {
                stats.frames_received = stats.frames_received.saturating_add(1);
                for reply in dispatcher.dispatch(&message) {
                    send(stats, &reply, &mut transmit);
                }
            }
            AssemblerEvent::Resync(_) => {
                stats.resyncs = stats.resyncs.saturating_add(1);
            }
            AssemblerEvent::Overflow { discarded } => {
                stats.bytes_lost = stats.bytes_lost.saturating_add(discarded as u32);
            }
        });
    }

    /// Drop any partially assembled frame
    ///
    /// For callers that time out a frame that never completes.
    pub fn reset(&mut self) {
        self.assembler.reset();
    }

    /// Zero the counters
    pub fn clear_stats(&mut self) {
        self.stats = SessionStats::default();
    }
}

fn send<F>(stats: &mut SessionStats, reply: &Frame, transmit: &mut F)
where
    F: FnMut(&[u8]) -> Result<(), TransmitError>,
{
    let result = match reply.encode_to_vec() {
        Ok(bytes) => transmit(&bytes),
        Err(e) => {
            warn!("reply not encoded: {:?}", e);
            stats.replies_dropped = stats.replies_dropped.saturating_add(1);
            return;
        }
    };

    match result {
        Ok(()) => stats.replies_sent = stats.replies_sent.saturating_add(1),
        Err(e) => {
            warn!("reply dropped: {:?}", e);
            stats.replies_dropped = stats.replies_dropped.saturating_add(1);
        }
    }
}
