//! Link state machine definition

use core::fmt;

use super::events::LinkEvent;

/// Which transport a channel drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelKind {
    /// UART-over-BLE
    Wireless,
    /// USB/UART serial port
    Wired,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Wireless, ChannelKind::Wired];

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Wireless => "wireless",
            ChannelKind::Wired => "wired",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No handle held
    #[default]
    Disconnected,
    /// Device selection or handshake in progress
    Connecting,
    /// Handle held, writes allowed
    Connected,
}

impl LinkState {
    /// Check if writes may be issued in this state
    pub fn can_send(&self) -> bool {
        matches!(self, LinkState::Connected)
    }

    /// Check if a connect request would be accepted
    pub fn can_connect(&self) -> bool {
        matches!(self, LinkState::Disconnected)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (Disconnected, ConnectRequested) => Connecting,

            (Connecting, ConnectSucceeded) => Connected,
            (Connecting, ConnectFailed) => Disconnected,
            (Connecting, DisconnectRequested) => Disconnected,

            (Connected, DisconnectRequested) => Disconnected,
            (Connected, LinkLost) => Disconnected,

            // Default: stay in current state
            _ => self,
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_flow() {
        let state = LinkState::Disconnected;
        let connecting = state.transition(LinkEvent::ConnectRequested);
        assert_eq!(connecting, LinkState::Connecting);

        let connected = connecting.transition(LinkEvent::ConnectSucceeded);
        assert_eq!(connected, LinkState::Connected);
        assert!(connected.can_send());
    }

    #[test]
    fn test_connect_failure_returns_to_disconnected() {
        let state = LinkState::Connecting.transition(LinkEvent::ConnectFailed);
        assert_eq!(state, LinkState::Disconnected);
        assert!(state.can_connect());
    }

    #[test]
    fn test_disconnect_paths() {
        for event in [LinkEvent::DisconnectRequested, LinkEvent::LinkLost] {
            assert_eq!(
                LinkState::Connected.transition(event),
                LinkState::Disconnected
            );
        }
    }

    #[test]
    fn test_disconnect_idempotent() {
        let state = LinkState::Disconnected.transition(LinkEvent::DisconnectRequested);
        assert_eq!(state, LinkState::Disconnected);
    }

    #[test]
    fn test_no_reconnect_without_request() {
        // A late handshake completion after the user gave up is ignored
        let state = LinkState::Disconnected.transition(LinkEvent::ConnectSucceeded);
        assert_eq!(state, LinkState::Disconnected);
    }

    #[test]
    fn test_connect_ignored_while_connected() {
        let states = [LinkState::Connecting, LinkState::Connected];
        for state in states {
            assert_eq!(state.transition(LinkEvent::ConnectRequested), state);
            assert!(!state.can_connect());
        }
    }

    #[test]
    fn test_only_connected_can_send() {
        assert!(!LinkState::Disconnected.can_send());
        assert!(!LinkState::Connecting.can_send());
        assert!(LinkState::Connected.can_send());
    }
}
