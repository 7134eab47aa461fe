//! Transport channel
//!
//! Wraps one [`Connector`] with the link state machine and the single
//! outstanding write rule. Everything runs on one executor, so state lives
//! in a `Cell` and the link sits behind a `NoopRawMutex` mutex; holding that
//! mutex is what "a write is in flight" means.
//!
//! Nothing but a write ever waits on the link mutex. Disconnect, link loss
//! and reconnect only `try_lock`; when a write holds the link they park
//! their outcome and the writer applies it as soon as its write returns.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_io::Error as _;
use embedded_io_async::Write;

use chromalink_core::link::{ChannelKind, LinkEvent, LinkState};
use chromalink_hal::{ConnectError, Connector, Link};

/// Receive half of a channel's link
pub type LinkRx<C> = <<C as Connector>::Link as Link>::Rx;

/// What happened to one send request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendOutcome {
    /// Bytes handed to the link
    Sent,
    /// Channel is not connected
    Skipped,
    /// A previous write on this channel is still in flight
    Dropped,
    /// The link reported a write error
    Failed,
}

/// One transport channel (wireless or wired)
pub struct TransportChannel<C: Connector> {
    kind: ChannelKind,
    state: Cell<LinkState>,
    connector: Mutex<NoopRawMutex, C>,
    link: Mutex<NoopRawMutex, Option<C::Link>>,
    /// Link held by an in-flight write must be closed when it returns
    close_pending: Cell<bool>,
    /// New link waiting for an in-flight write on the old one
    incoming: RefCell<Option<C::Link>>,
    rx: RefCell<Option<LinkRx<C>>>,
}

/// A connect request the channel has accepted
///
/// Holds the connector until [`ConnectAttempt::finish`] runs the handshake.
/// Dropping it unfinished (or cancelling `finish`) returns the channel to
/// `Disconnected`.
pub struct ConnectAttempt<'a, C: Connector> {
    channel: &'a TransportChannel<C>,
    connector: MutexGuard<'a, NoopRawMutex, C>,
    settled: bool,
}

impl<C: Connector> TransportChannel<C> {
    pub fn new(kind: ChannelKind, connector: C) -> Self {
        Self {
            kind,
            state: Cell::new(LinkState::Disconnected),
            connector: Mutex::new(connector),
            link: Mutex::new(None),
            close_pending: Cell::new(false),
            incoming: RefCell::new(None),
            rx: RefCell::new(None),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn state(&self) -> LinkState {
        self.state.get()
    }

    fn apply(&self, event: LinkEvent) -> LinkState {
        let next = self.state.get().transition(event);
        self.state.set(next);
        next
    }

    /// Accept a connect request, or `None` if it must be ignored
    ///
    /// Requests are ignored while not `Disconnected`, and while an abandoned
    /// handshake still owns the connector. An accepted attempt moves the
    /// channel to `Connecting`.
    pub fn begin_connect(&self) -> Option<ConnectAttempt<'_, C>> {
        let current = self.state.get();
        if !current.can_connect() {
            debug!("{}: connect ignored while {}", self.kind, current);
            return None;
        }

        let Ok(connector) = self.connector.try_lock() else {
            debug!("{}: connect ignored, previous handshake pending", self.kind);
            return None;
        };

        self.apply(LinkEvent::ConnectRequested);
        info!("{}: connecting", self.kind);
        Some(ConnectAttempt {
            channel: self,
            connector,
            settled: false,
        })
    }

    /// Select a device and open the link
    ///
    /// Returns the resulting state. An ignored request returns the current
    /// state unchanged.
    pub async fn connect(&self, selector: &C::Selector) -> Result<LinkState, ConnectError> {
        match self.begin_connect() {
            Some(attempt) => attempt.finish(selector).await,
            None => Ok(self.state.get()),
        }
    }

    async fn install(&self, mut link: C::Link) -> Result<LinkState, ConnectError> {
        if self.state.get() != LinkState::Connecting {
            // Disconnect arrived while the handshake was running
            link.close().await;
            info!("{}: handshake finished after disconnect, closed", self.kind);
            return Ok(self.state.get());
        }

        let rx = link.take_rx();
        let stale = match self.link.try_lock() {
            Ok(mut slot) => {
                self.close_pending.set(false);
                slot.replace(link)
            }
            Err(_) => {
                // The writer swaps it in when its write returns
                debug!("{}: late write on old link, deferring swap", self.kind);
                *self.incoming.borrow_mut() = Some(link);
                None
            }
        };
        *self.rx.borrow_mut() = rx;
        if let Some(mut stale) = stale {
            stale.close().await;
        }

        let state = self.apply(LinkEvent::ConnectSucceeded);
        info!("{}: connected", self.kind);
        Ok(state)
    }

    /// Take the receive half of the current link
    ///
    /// Available once per successful connect.
    pub fn take_rx(&self) -> Option<LinkRx<C>> {
        self.rx.borrow_mut().take()
    }

    /// Release the link
    ///
    /// The state flips to `Disconnected` at once, so later sends are skipped.
    /// Never waits: if a write is in flight its link is closed when the
    /// write returns. Calling this on a disconnected channel does nothing.
    pub async fn disconnect(&self) {
        let was = self.state.get();
        self.apply(LinkEvent::DisconnectRequested);
        *self.rx.borrow_mut() = None;

        let waiting = self.incoming.borrow_mut().take();
        if let Some(mut link) = waiting {
            link.close().await;
        }
        self.release().await;

        if was != LinkState::Disconnected {
            info!("{}: disconnected", self.kind);
        }
    }

    /// The transport dropped underneath us
    pub async fn link_lost(&self) {
        if self.state.get() != LinkState::Connected {
            return;
        }
        self.apply(LinkEvent::LinkLost);
        *self.rx.borrow_mut() = None;
        warn!("{}: link lost", self.kind);

        let waiting = self.incoming.borrow_mut().take();
        if let Some(mut link) = waiting {
            link.close().await;
        }
        self.release().await;
    }

    /// Close the current link now, or flag it for the in-flight writer
    async fn release(&self) {
        let link = match self.link.try_lock() {
            Ok(mut slot) => {
                self.close_pending.set(false);
                slot.take()
            }
            Err(_) => {
                debug!("{}: write in flight, close deferred", self.kind);
                self.close_pending.set(true);
                None
            }
        };
        if let Some(mut link) = link {
            link.close().await;
        }
    }

    /// Apply a disconnect or reconnect that happened while the slot was held
    async fn settle(&self, slot: &mut Option<C::Link>) {
        let next = self.incoming.borrow_mut().take();
        if self.close_pending.replace(false) || next.is_some() {
            debug!("{}: closing released link", self.kind);
            if let Some(mut old) = slot.take() {
                old.close().await;
            }
        }
        if next.is_some() {
            *slot = next;
        }
    }

    /// Write one encoded frame
    ///
    /// Never queues: if a write is already in flight the frame is dropped.
    /// Write errors are logged and leave the channel connected.
    pub async fn send(&self, bytes: &[u8]) -> SendOutcome {
        if !self.state.get().can_send() {
            return SendOutcome::Skipped;
        }

        let Ok(mut slot) = self.link.try_lock() else {
            trace!("{}: write in flight, dropping frame", self.kind);
            return SendOutcome::Dropped;
        };
        // A cancelled writer may have left a release unapplied
        self.settle(&mut slot).await;
        let Some(link) = slot.as_mut() else {
            return SendOutcome::Skipped;
        };

        let result = link.write_all(bytes).await;
        self.settle(&mut slot).await;

        match result {
            Ok(()) => SendOutcome::Sent,
            Err(e) => {
                warn!("{}: write failed: {:?}", self.kind, e.kind());
                SendOutcome::Failed
            }
        }
    }
}

impl<C: Connector> ConnectAttempt<'_, C> {
    /// Run the handshake and record the link
    pub async fn finish(mut self, selector: &C::Selector) -> Result<LinkState, ConnectError> {
        let result = self.connector.connect(selector).await;
        self.settled = true;
        let channel = self.channel;
        drop(self);

        match result {
            Ok(link) => channel.install(link).await,
            Err(e) => {
                channel.apply(LinkEvent::ConnectFailed);
                warn!("{}: connect failed: {}", channel.kind, e.reason());
                Err(e)
            }
        }
    }
}

impl<C: Connector> Drop for ConnectAttempt<'_, C> {
    fn drop(&mut self) {
        if !self.settled && self.channel.state.get() == LinkState::Connecting {
            self.channel.apply(LinkEvent::ConnectFailed);
            debug!("{}: connect abandoned", self.channel.kind);
        }
    }
}
