//! Outbound message fan-out
//!
//! Encodes a message once and offers the bytes to both channels
//! concurrently. A slow or failing channel never holds up the other.

use embassy_futures::join::join;

use chromalink_core::link::ChannelKind;
use chromalink_hal::Connector;
use chromalink_protocol::{FrameError, HostMessage, LineEnding};

use crate::channel::{SendOutcome, TransportChannel};

/// Per-channel result of one broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Broadcast {
    pub wireless: SendOutcome,
    pub wired: SendOutcome,
}

impl Broadcast {
    /// Number of channels that accepted the bytes
    pub fn delivered(&self) -> usize {
        [self.wireless, self.wired]
            .iter()
            .filter(|o| **o == SendOutcome::Sent)
            .count()
    }
}

/// Owns both transport channels
pub struct Dispatcher<W: Connector, S: Connector> {
    wireless: TransportChannel<W>,
    wired: TransportChannel<S>,
    line_ending: LineEnding,
}

impl<W: Connector, S: Connector> Dispatcher<W, S> {
    pub fn new(wireless: W, wired: S, line_ending: LineEnding) -> Self {
        Self {
            wireless: TransportChannel::new(ChannelKind::Wireless, wireless),
            wired: TransportChannel::new(ChannelKind::Wired, wired),
            line_ending,
        }
    }

    pub fn wireless(&self) -> &TransportChannel<W> {
        &self.wireless
    }

    pub fn wired(&self) -> &TransportChannel<S> {
        &self.wired
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Send `message` to every connected channel
    pub async fn broadcast(&self, message: &HostMessage) -> Result<Broadcast, FrameError> {
        let bytes = message.encode(self.line_ending)?;

        let (wireless, wired) = join(self.wireless.send(&bytes), self.wired.send(&bytes)).await;
        let result = Broadcast { wireless, wired };

        trace!(
            "broadcast {:?}: wireless {:?}, wired {:?}",
            message,
            result.wireless,
            result.wired
        );
        Ok(result)
    }
}
