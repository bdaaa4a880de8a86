//! Stream assembler for incoming frames.
//!
//! UART chunks can split a frame, carry several frames, or start in the
//! middle of one. The assembler keeps a bounded buffer of received bytes
//! and repeatedly inspects its front:
//!
//! 1. A two-byte ACK/NAK is emitted immediately (no checksum exists)
//! 2. Fewer than 6 bytes: wait
//! 3. LENGTH above the accepted maximum: drop one byte (resync)
//! 4. Not all of the declared frame buffered yet: wait
//! 5. Checksum mismatch: drop one byte (resync); match: emit the frame
//!
//! Resynchronization always slides by a single byte because the LENGTH
//! field itself may be the corrupt part.
//!
//! Nothing but the buffered bytes carries over between calls, so feeding a
//! stream in any chunking produces the same events as feeding it whole
//! (as long as the buffer never overflows).

use heapless::Vec;

use crate::checksum::checksum;
use crate::frame::{
    declared_length, stored_checksum, Frame, LinkFrame, Message, BODY_OFFSET, ENVELOPE_SIZE,
    LINK_FRAME_SIZE, MAX_LENGTH,
};
use crate::opcodes::MessageType;

/// Default assembly buffer capacity
pub const DEFAULT_ASSEMBLY_CAPACITY: usize = 512;

/// Why the assembler dropped a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResyncReason {
    /// LENGTH field above the accepted maximum
    InvalidLength { declared: u16 },
    /// Stored checksum differs from the recomputed one
    ChecksumMismatch { computed: u16, received: u16 },
}

/// Output of [`FrameAssembler::ingest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblerEvent {
    /// A complete, validated frame
    Frame(Frame),
    /// One byte was dropped from the front of the buffer
    Resync(ResyncReason),
    /// Oldest bytes were discarded to make room for a new chunk
    Overflow { discarded: usize },
}

/// Bounded buffer that extracts validated frames from a byte stream
///
/// `C` is the buffer capacity and must be at least the 6-byte frame
/// envelope. Frames whose LENGTH would not fit in `C` are rejected.
#[derive(Debug, Clone)]
pub struct FrameAssembler<const C: usize = DEFAULT_ASSEMBLY_CAPACITY> {
    buffer: Vec<u8, C>,
    max_length: usize,
}

impl<const C: usize> Default for FrameAssembler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize> FrameAssembler<C> {
    const CAPACITY_CHECK: () = assert!(
        C >= ENVELOPE_SIZE,
        "assembly buffer must hold at least the frame envelope"
    );

    /// Create an assembler accepting the largest LENGTH that fits
    pub fn new() -> Self {
        Self::with_max_length(MAX_LENGTH)
    }

    /// Create an assembler accepting LENGTH values up to `max_length`
    ///
    /// The limit is clamped to [`MAX_LENGTH`] and to what fits in `C`.
    pub fn with_max_length(max_length: usize) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;

        Self {
            buffer: Vec::new(),
            max_length: max_length.min(MAX_LENGTH).min(C - ENVELOPE_SIZE),
        }
    }

    /// Largest accepted LENGTH value
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Buffer capacity
    pub const fn capacity(&self) -> usize {
        C
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes waiting for the rest of their frame
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop all buffered bytes
    ///
    /// Hook for session-level timeouts: a frame that never completes
    /// otherwise stays buffered indefinitely.
    pub fn reset(&mut self) {
        if !self.buffer.is_empty() {
            debug!("assembler reset, dropping {} byte(s)", self.buffer.len());
        }
        self.buffer.clear();
    }

    /// Feed a received chunk and report every resulting event to `sink`
    ///
    /// A chunk may complete a pending frame and carry further frames, so
    /// any number of events can result. Chunks larger than the buffer are
    /// processed in buffer-sized slices so no received byte is discarded
    /// before it has been inspected.
    pub fn ingest<F>(&mut self, chunk: &[u8], mut sink: F)
    where
        F: FnMut(AssemblerEvent),
    {
        for piece in chunk.chunks(C) {
            self.append(piece, &mut sink);
            while let Some(event) = self.next_event() {
                sink(event);
            }
        }
    }

    /// Append a piece of at most `C` bytes, discarding the oldest bytes if needed
    fn append<F>(&mut self, piece: &[u8], sink: &mut F)
    where
        F: FnMut(AssemblerEvent),
    {
        let free = C - self.buffer.len();
        if piece.len() > free {
            let discarded = piece.len() - free;
            self.consume(discarded);
            warn!("assembler overflow, dropped {} byte(s)", discarded);
            sink(AssemblerEvent::Overflow { discarded });
        }

        // Room was made above and pieces never exceed C
        let _ = self.buffer.extend_from_slice(piece);
    }

    /// Inspect the front of the buffer once
    fn next_event(&mut self) -> Option<AssemblerEvent> {
        if let Some(link) = LinkFrame::parse(&self.buffer) {
            self.consume(LINK_FRAME_SIZE);
            trace!("link frame {:?}", link);
            return Some(AssemblerEvent::Frame(Frame::Link(link)));
        }

        if self.buffer.len() < ENVELOPE_SIZE {
            return None;
        }

        let declared = declared_length(&self.buffer)?;
        if declared > self.max_length {
            self.consume(1);
            warn!("bad length {}, resync by 1 byte", declared);
            return Some(AssemblerEvent::Resync(ResyncReason::InvalidLength {
                declared: declared as u16,
            }));
        }

        let frame_len = ENVELOPE_SIZE + declared;
        if self.buffer.len() < frame_len {
            return None;
        }

        let body_end = BODY_OFFSET + declared;
        let computed = checksum(&self.buffer[..body_end]);
        let received = stored_checksum(&self.buffer[..frame_len]);
        if computed != received {
            self.consume(1);
            warn!(
                "checksum mismatch (calc={:#x} got={:#x}), resync by 1 byte",
                computed,
                received
            );
            return Some(AssemblerEvent::Resync(ResyncReason::ChecksumMismatch {
                computed,
                received,
            }));
        }

        let msg_type = MessageType::new(self.buffer[0], self.buffer[1]);
        match Message::from_body(msg_type, &self.buffer[BODY_OFFSET..body_end]) {
            Ok(message) => {
                self.consume(frame_len);
                trace!("frame {:?}, length {}", msg_type, declared);
                Some(AssemblerEvent::Frame(Frame::Message(message)))
            }
            Err(_) => {
                self.consume(1);
                Some(AssemblerEvent::Resync(ResyncReason::InvalidLength {
                    declared: declared as u16,
                }))
            }
        }
    }

    /// Remove `n` bytes from the front of the buffer
    fn consume(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        self.buffer.copy_within(n.., 0);
        self.buffer.truncate(self.buffer.len() - n);
    }
}
