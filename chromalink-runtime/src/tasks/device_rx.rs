//! Device receive task
//!
//! Reads bytes the device sends back (BLE notifications or serial RX) and
//! hands them to the session line parser. End of stream or a read error
//! means the link is gone.
//!
//! Spawn [`channel_rx_task`] after each successful connect; it reads from
//! the receive half of the channel's link.

use embedded_io::Error as _;
use embedded_io_async::Read;

use chromalink_core::link::ChannelKind;
use chromalink_hal::{Connector, DeviceFilter, PortRequest};

use crate::clock::Clock;
use crate::session::Session;
use crate::status::StatusSink;

/// Buffer size for one read
const RX_BUF_SIZE: usize = 64;

/// Device RX task - returns once the stream ends
pub async fn device_rx_task<W, S, K, T, R>(
    session: &Session<W, S, K, T>,
    kind: ChannelKind,
    mut rx: R,
) where
    W: Connector<Selector = DeviceFilter>,
    S: Connector<Selector = PortRequest>,
    K: Clock,
    T: StatusSink,
    R: Read,
{
    info!("{}: device RX task started", kind);

    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(0) => {
                debug!("{}: device stream ended", kind);
                break;
            }
            Ok(n) => {
                trace!("{}: RX {} bytes", kind, n);
                session.on_device_data(kind, &buf[..n]);
            }
            Err(e) => {
                warn!("{}: read error: {:?}", kind, e.kind());
                break;
            }
        }
    }

    session.link_lost(kind).await;
}

/// Run [`device_rx_task`] on the receive half of `kind`'s current link
///
/// Returns at once when the link has no receive half to give (already
/// taken, or the channel is not connected).
pub async fn channel_rx_task<W, S, K, T>(session: &Session<W, S, K, T>, kind: ChannelKind)
where
    W: Connector<Selector = DeviceFilter>,
    S: Connector<Selector = PortRequest>,
    K: Clock,
    T: StatusSink,
{
    match kind {
        ChannelKind::Wireless => match session.dispatcher().wireless().take_rx() {
            Some(rx) => device_rx_task(session, kind, rx).await,
            None => debug!("{}: no receive half", kind),
        },
        ChannelKind::Wired => match session.dispatcher().wired().take_rx() {
            Some(rx) => device_rx_task(session, kind, rx).await,
            None => debug!("{}: no receive half", kind),
        },
    }
}
