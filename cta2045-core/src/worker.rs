//! Worker loop
//!
//! The single consumer of a link's inbound queue. Sleeps on the wake
//! signal, then drains the queue in fixed-size chunks, feeding each to the
//! session and queueing the replies.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::session::Session;
use crate::transport::Link;

/// Bytes drained from the inbound queue per step
pub const WORKER_CHUNK: usize = 64;

/// Serve a link forever
pub async fn run<M, const RX: usize, const TX: usize, const C: usize>(
    link: &Link<M, RX, TX>,
    session: &mut Session<C>,
) -> !
where
    M: RawMutex,
{
    info!("worker started");
    loop {
        link.wait_for_rx().await;
        let n = service(link, session);
        trace!("worker processed {} byte(s)", n);
    }
}

/// Process everything currently queued, without waiting
///
/// Returns the number of bytes processed.
pub fn service<M, const RX: usize, const TX: usize, const C: usize>(
    link: &Link<M, RX, TX>,
    session: &mut Session<C>,
) -> usize
where
    M: RawMutex,
{
    let mut chunk = [0u8; WORKER_CHUNK];
    let mut total = 0;
    loop {
        let n = link.drain_rx(&mut chunk);
        if n == 0 {
            return total;
        }
        session.process(&chunk[..n], |bytes| link.enqueue_for_transmit(bytes));
        total += n;
    }
}
