//! Events that trigger link state transitions

/// Events that can trigger link state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    // User actions
    /// User asked to connect (device/port picker opened)
    ConnectRequested,
    /// User asked to disconnect
    DisconnectRequested,

    // Transport outcomes
    /// Handshake finished and a writable handle is available
    ConnectSucceeded,
    /// No device chosen, no match, or transport unavailable on this host
    ConnectFailed,
    /// Peripheral or port went away underneath an open link
    LinkLost,
}
