//! Link queues
//!
//! A [`Link`] is meant to live in a `static` shared between the UART
//! interrupt and the worker task:
//!
//! ```ignore
//! static LINK: Link<CriticalSectionRawMutex> = Link::new();
//! ```
//!
//! Producer-side calls never block and never allocate.

use core::cell::Cell;
use core::fmt;

use cta2045_hal::{UartRx, UartTx};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;

/// Default inbound queue capacity
pub const RX_QUEUE_SIZE: usize = 256;

/// Default outbound queue capacity
pub const TX_QUEUE_SIZE: usize = 512;

/// Bytes moved per UART FIFO access
pub const PUMP_CHUNK: usize = 16;

/// Errors queueing a frame for transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitError {
    /// Outbound queue has no room for the whole frame
    ResourceExhausted,
    /// Port has not been marked ready
    NotReady,
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitError::ResourceExhausted => write!(f, "transmit queue full"),
            TransmitError::NotReady => write!(f, "serial port not ready"),
        }
    }
}

impl core::error::Error for TransmitError {}

/// Bounded inbound and outbound byte queues plus the worker wake signal
///
/// The outbound side has no wake-up; the UART interrupt or a polling loop
/// pulls it with [`Link::fill_wire`] or [`Link::pump_tx`].
pub struct Link<M: RawMutex, const RX: usize = RX_QUEUE_SIZE, const TX: usize = TX_QUEUE_SIZE> {
    rx: Pipe<M, RX>,
    tx: Pipe<M, TX>,
    rx_pending: Signal<M, ()>,
    ready: Mutex<M, Cell<bool>>,
}

impl<M: RawMutex, const RX: usize, const TX: usize> Default for Link<M, RX, TX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const RX: usize, const TX: usize> Link<M, RX, TX> {
    /// Create an empty link, not yet ready to transmit
    pub const fn new() -> Self {
        Self {
            rx: Pipe::new(),
            tx: Pipe::new(),
            rx_pending: Signal::new(),
            ready: Mutex::new(Cell::new(false)),
        }
    }

    // --- producer side (UART interrupt) ---

    /// Queue received bytes and wake the worker
    ///
    /// Returns how many bytes were accepted. Bytes that do not fit are
    /// dropped.
    pub fn on_bytes_received(&self, data: &[u8]) -> usize {
        let accepted = push(&self.rx, data);
        if accepted > 0 {
            self.rx_pending.signal(());
        }
        if accepted < data.len() {
            warn!("rx queue full, dropped {} byte(s)", data.len() - accepted);
        }
        accepted
    }

    /// Take queued outbound bytes for the wire
    pub fn fill_wire(&self, buf: &mut [u8]) -> usize {
        pull(&self.tx, buf)
    }

    /// Mark the serial port as configured (or not)
    pub fn mark_ready(&self, ready: bool) {
        self.ready.lock(|cell| cell.set(ready));
    }

    pub fn is_ready(&self) -> bool {
        self.ready.lock(|cell| cell.get())
    }

    /// Move everything the receive FIFO holds into the inbound queue
    pub fn pump_rx<U: UartRx>(&self, uart: &mut U) -> Result<usize, U::Error> {
        let mut buf = [0u8; PUMP_CHUNK];
        let mut total = 0;
        loop {
            let n = uart.read(&mut buf)?;
            if n == 0 {
                return Ok(total);
            }
            total += self.on_bytes_received(&buf[..n]);
        }
    }

    /// Move queued outbound bytes into the transmit FIFO while it has room
    ///
    /// Calls [`UartTx::idle`] once the outbound queue is empty. Bytes handed
    /// to a write that fails are lost.
    pub fn pump_tx<U: UartTx>(&self, uart: &mut U) -> Result<usize, U::Error> {
        let mut buf = [0u8; PUMP_CHUNK];
        let mut total = 0;
        loop {
            let room = uart.room().min(buf.len());
            if room == 0 {
                return Ok(total);
            }
            let n = self.fill_wire(&mut buf[..room]);
            if n == 0 {
                uart.idle();
                return Ok(total);
            }
            uart.write(&buf[..n])?;
            total += n;
        }
    }

    // --- worker side ---

    /// Queue a whole frame for transmission
    ///
    /// Either every byte is queued or none is.
    pub fn enqueue_for_transmit(&self, frame: &[u8]) -> Result<(), TransmitError> {
        if !self.is_ready() {
            return Err(TransmitError::NotReady);
        }
        if frame.len() > TX - self.tx.len() {
            return Err(TransmitError::ResourceExhausted);
        }

        push(&self.tx, frame);
        Ok(())
    }

    /// Wait until bytes have been received since the last wake-up
    pub async fn wait_for_rx(&self) {
        self.rx_pending.wait().await
    }

    /// Take queued inbound bytes
    pub fn drain_rx(&self, buf: &mut [u8]) -> usize {
        pull(&self.rx, buf)
    }

    /// Bytes waiting in the inbound queue
    pub fn rx_len(&self) -> usize {
        self.rx.len()
    }

    /// Bytes waiting in the outbound queue
    pub fn tx_len(&self) -> usize {
        self.tx.len()
    }
}

/// Write as much of `data` as fits
///
/// A single `try_write` stops at the ring buffer's wrap point.
fn push<M: RawMutex, const N: usize>(pipe: &Pipe<M, N>, data: &[u8]) -> usize {
    let mut written = 0;
    while written < data.len() {
        match pipe.try_write(&data[written..]) {
            Ok(n) if n > 0 => written += n,
            _ => break,
        }
    }
    written
}

/// Read as many bytes as `buf` holds
fn pull<M: RawMutex, const N: usize>(pipe: &Pipe<M, N>, buf: &mut [u8]) -> usize {
    let mut read = 0;
    while read < buf.len() {
        match pipe.try_read(&mut buf[read..]) {
            Ok(n) if n > 0 => read += n,
            _ => break,
        }
    }
    read
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    type TestLink = Link<NoopRawMutex, 32, 16>;

    /// UART double with a scripted receive FIFO and a bounded transmit FIFO
    struct FakeUart {
        incoming: std::vec::Vec<u8>,
        sent: std::vec::Vec<u8>,
        fifo_room: usize,
        idled: bool,
    }

    impl FakeUart {
        fn new(incoming: &[u8], fifo_room: usize) -> Self {
            Self {
                incoming: incoming.to_vec(),
                sent: std::vec::Vec::new(),
                fifo_room,
                idled: false,
            }
        }
    }

    impl UartRx for FakeUart {
        type Error = ();

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            let n = buf.len().min(self.incoming.len());
            buf[..n].copy_from_slice(&self.incoming[..n]);
            self.incoming.drain(..n);
            Ok(n)
        }
    }

    impl UartTx for FakeUart {
        type Error = ();

        fn room(&self) -> usize {
            self.fifo_room - self.sent.len().min(self.fifo_room)
        }

        fn write(&mut self, data: &[u8]) -> Result<(), ()> {
            self.sent.extend_from_slice(data);
            Ok(())
        }

        fn idle(&mut self) {
            self.idled = true;
        }
    }

    #[test]
    fn test_receive_and_drain() {
        let link = TestLink::new();
        assert_eq!(link.on_bytes_received(&[1, 2, 3]), 3);
        assert_eq!(link.rx_len(), 3);

        block_on(link.wait_for_rx());

        let mut buf = [0u8; 8];
        assert_eq!(link.drain_rx(&mut buf), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(link.drain_rx(&mut buf), 0);
    }

    #[test]
    fn test_receive_drops_what_does_not_fit() {
        let link = TestLink::new();
        assert_eq!(link.on_bytes_received(&[0xAA; 40]), 32);
        assert_eq!(link.on_bytes_received(&[0xBB]), 0);
    }

    #[test]
    fn test_drain_across_wrap_point() {
        let link = TestLink::new();
        let mut buf = [0u8; 32];

        link.on_bytes_received(&[0u8; 20]);
        assert_eq!(link.drain_rx(&mut buf[..20]), 20);

        let data: std::vec::Vec<u8> = (0..30).collect();
        assert_eq!(link.on_bytes_received(&data), 30);
        assert_eq!(link.drain_rx(&mut buf), 30);
        assert_eq!(&buf[..30], &data[..]);
    }

    #[test]
    fn test_enqueue_requires_ready() {
        let link = TestLink::new();
        assert_eq!(link.enqueue_for_transmit(&[0x06, 0x00]), Err(TransmitError::NotReady));

        link.mark_ready(true);
        assert_eq!(link.enqueue_for_transmit(&[0x06, 0x00]), Ok(()));

        let mut wire = [0u8; 4];
        assert_eq!(link.fill_wire(&mut wire), 2);
        assert_eq!(&wire[..2], &[0x06, 0x00]);
    }

    #[test]
    fn test_enqueue_is_all_or_nothing() {
        let link = TestLink::new();
        link.mark_ready(true);

        assert_eq!(link.enqueue_for_transmit(&[1; 10]), Ok(()));
        assert_eq!(
            link.enqueue_for_transmit(&[2; 8]),
            Err(TransmitError::ResourceExhausted)
        );
        assert_eq!(link.tx_len(), 10);
        assert_eq!(link.enqueue_for_transmit(&[3; 6]), Ok(()));
        assert_eq!(link.tx_len(), 16);
    }

    #[test]
    fn test_pump_rx_moves_fifo_contents() {
        let link = TestLink::new();
        let mut uart = FakeUart::new(&[9u8; 20], 0);

        assert_eq!(link.pump_rx(&mut uart), Ok(20));
        assert_eq!(link.rx_len(), 20);
        assert!(uart.incoming.is_empty());
    }

    #[test]
    fn test_pump_tx_respects_fifo_room() {
        let link = TestLink::new();
        link.mark_ready(true);
        link.enqueue_for_transmit(&[1, 2, 3, 4, 5, 6]).unwrap();

        let mut uart = FakeUart::new(&[], 4);
        assert_eq!(link.pump_tx(&mut uart), Ok(4));
        assert_eq!(uart.sent, [1, 2, 3, 4]);
        assert!(!uart.idled);
        assert_eq!(link.tx_len(), 2);

        uart.fifo_room = 16;
        assert_eq!(link.pump_tx(&mut uart), Ok(2));
        assert_eq!(uart.sent, [1, 2, 3, 4, 5, 6]);
        assert!(uart.idled);
    }
}
