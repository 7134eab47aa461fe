//! Bluetooth Low Energy central-role abstractions
//!
//! Covers just what a UART-over-BLE link needs: pick a peripheral by name
//! prefix, connect, write to one characteristic and subscribe to another.

use core::fmt;

use embedded_io_async::Read;
use heapless::String;

/// Maximum advertised-name prefix length in a [`DeviceFilter`]
pub const MAX_NAME_PREFIX_LEN: usize = 32;

/// Default ATT payload per write (23-byte ATT MTU minus 3 bytes header)
pub const DEFAULT_WRITE_CHUNK: usize = 20;

/// 128-bit GATT UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uuid(u128);

impl Uuid {
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

/// Canonical hyphenated lowercase form
impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff
        )
    }
}

/// Errors reported by a BLE host stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// No adapter, or BLE is not exposed to this process
    Unavailable,
    /// Picker cancelled or no advertising device matched
    NotFound,
    /// GATT connect, discovery or subscription failed
    Gatt,
    /// Peripheral is no longer connected
    Disconnected,
}

impl embedded_io::Error for BleError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            BleError::Unavailable => embedded_io::ErrorKind::Unsupported,
            BleError::NotFound => embedded_io::ErrorKind::NotFound,
            BleError::Gatt => embedded_io::ErrorKind::Other,
            BleError::Disconnected => embedded_io::ErrorKind::NotConnected,
        }
    }
}

/// Discovery filter for the device picker
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceFilter {
    /// Only devices whose advertised name starts with this
    pub name_prefix: String<MAX_NAME_PREFIX_LEN>,
    /// Service the host must be allowed to access after connecting
    pub service: Uuid,
}

impl DeviceFilter {
    /// Build a filter; the prefix is truncated to [`MAX_NAME_PREFIX_LEN`] bytes
    pub fn new(name_prefix: &str, service: Uuid) -> Self {
        let mut prefix = String::new();
        for c in name_prefix.chars() {
            if prefix.push(c).is_err() {
                break;
            }
        }
        Self {
            name_prefix: prefix,
            service,
        }
    }

    /// Check an advertised name against the prefix
    pub fn matches(&self, advertised_name: &str) -> bool {
        advertised_name.starts_with(self.name_prefix.as_str())
    }
}

/// BLE central: discovers peripherals
pub trait GattCentral {
    type Peripheral: GattPeripheral;

    /// Ask the host to pick a peripheral matching `filter`
    ///
    /// Returns `NotFound` if the user cancelled, `Unavailable` if the host
    /// has no usable Bluetooth.
    async fn request_device(&mut self, filter: &DeviceFilter) -> Result<Self::Peripheral, BleError>;
}

/// A selected peripheral
pub trait GattPeripheral {
    /// Incoming notification payloads of one subscription
    type Notifications: Read<Error = BleError>;

    /// Advertised name, if known
    fn name(&self) -> Option<&str>;

    /// Largest payload accepted by one characteristic write
    fn max_write_len(&self) -> usize {
        DEFAULT_WRITE_CHUNK
    }

    /// Open the GATT connection
    async fn connect(&mut self) -> Result<(), BleError>;

    /// Write `data` to a characteristic (write-with-response)
    async fn write_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
        data: &[u8],
    ) -> Result<(), BleError>;

    /// Enable notifications/indications on a characteristic
    ///
    /// The returned stream yields notification payloads as bytes, in arrival
    /// order, and reads `Ok(0)` once the peripheral disconnects.
    async fn start_notifications(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Self::Notifications, BleError>;

    /// Tear down the GATT connection
    async fn disconnect(&mut self);
}
