//! Serial port abstractions
//!
//! Provides traits for picking and opening a serial port that can be
//! implemented by host-specific integrations.

use embedded_io_async::{Read, Write};

/// Serial configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl SerialConfig {
    /// 8N1 at the given baud rate
    pub fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            ..Self::default()
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// What to open: line settings plus an optional picker filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortRequest {
    pub config: SerialConfig,
    /// Only offer ports with this USB vendor id
    pub vendor_id: Option<u16>,
}

/// USB identity of a port, where the host knows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortInfo {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

/// Errors reported by a serial port implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// Host has no serial API
    Unavailable,
    /// Picker cancelled or no port matched
    NoPortSelected,
    /// Port exists but could not be opened (busy, permissions)
    OpenFailed,
    /// Write failed on an open port
    Io,
    /// Port is closed
    Closed,
}

impl embedded_io::Error for SerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            SerialError::Unavailable => embedded_io::ErrorKind::Unsupported,
            SerialError::NoPortSelected => embedded_io::ErrorKind::NotFound,
            SerialError::OpenFailed => embedded_io::ErrorKind::PermissionDenied,
            SerialError::Io => embedded_io::ErrorKind::Other,
            SerialError::Closed => embedded_io::ErrorKind::NotConnected,
        }
    }
}

/// Port enumeration / picker
pub trait SerialPorts {
    type Port: SerialPort;

    /// Ask the host for a port, optionally filtered by USB vendor id
    async fn request_port(&mut self, vendor_id: Option<u16>) -> Result<Self::Port, SerialError>;
}

/// One serial port; writable once opened
pub trait SerialPort: Write<Error = SerialError> {
    /// Read side of an open port
    type Reader: Read<Error = SerialError>;

    /// USB identity of the port
    fn info(&self) -> PortInfo;

    /// Open the port with the given line settings
    ///
    /// Returns the read side; it reads `Ok(0)` once the port is closed or
    /// unplugged.
    async fn open(&mut self, config: &SerialConfig) -> Result<Self::Reader, SerialError>;

    /// Close the port
    async fn close(&mut self);
}
