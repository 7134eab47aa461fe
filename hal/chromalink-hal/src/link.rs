//! Uniform channel transport abstractions
//!
//! A [`Connector`] turns a user selection into an open [`Link`]. The link is
//! a plain async byte sink; it knows nothing about frames or throttling.
//! Bytes coming back from the device arrive on a separate receive half
//! taken once from the link, so reads never contend with writes.

use embedded_io_async::{Read, Write};

use crate::ble::BleError;
use crate::serial::SerialError;

/// Reasons a connect attempt can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectError {
    /// User cancelled the picker, or no device matched the filter
    DeviceNotFound,
    /// Host lacks the transport capability (no BLE adapter, no serial API)
    UnsupportedEnvironment,
    /// Device was selected but the handshake did not complete
    HandshakeFailed,
}

impl ConnectError {
    /// User-visible reason string
    pub fn reason(&self) -> &'static str {
        match self {
            ConnectError::DeviceNotFound => "no device selected",
            ConnectError::UnsupportedEnvironment => "transport not supported on this host",
            ConnectError::HandshakeFailed => "device did not complete the handshake",
        }
    }
}

impl From<BleError> for ConnectError {
    fn from(e: BleError) -> Self {
        match e {
            BleError::Unavailable => ConnectError::UnsupportedEnvironment,
            BleError::NotFound => ConnectError::DeviceNotFound,
            BleError::Gatt | BleError::Disconnected => ConnectError::HandshakeFailed,
        }
    }
}

impl From<SerialError> for ConnectError {
    fn from(e: SerialError) -> Self {
        match e {
            SerialError::Unavailable => ConnectError::UnsupportedEnvironment,
            SerialError::NoPortSelected => ConnectError::DeviceNotFound,
            SerialError::OpenFailed | SerialError::Io | SerialError::Closed => {
                ConnectError::HandshakeFailed
            }
        }
    }
}

/// Open, writable connection to the external device
///
/// Writes go through [`embedded_io_async::Write`]. Dropping a link without
/// calling [`Link::close`] leaks the device-side session on some hosts.
pub trait Link: Write {
    /// Receive half: device-to-host bytes, `Ok(0)` once the device is gone
    type Rx: Read;

    /// Hand out the receive half; `None` after the first call
    fn take_rx(&mut self) -> Option<Self::Rx>;

    /// Release the device handle
    ///
    /// Must be safe to call after a failed write.
    async fn close(&mut self);
}

/// Produces links for one transport kind
pub trait Connector {
    /// What the user (or config) picks a device by
    type Selector;
    /// Link handed out on success
    type Link: Link;

    /// Select a device, handshake, and return a writable link
    async fn connect(&mut self, selector: &Self::Selector) -> Result<Self::Link, ConnectError>;
}
