//! Chromalink Hardware Abstraction Layer
//!
//! This crate defines the transport traits the pipeline is written against.
//! Host integrations (a browser shim, a desktop BLE stack, a serial port
//! library) implement the low-level traits; `chromalink-drivers` turns them
//! into [`link::Connector`]s the runtime can drive.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  chromalink-runtime (channels, session) │
//! └─────────────────────────────────────────┘
//!                     │ Connector / Link
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  chromalink-drivers (BLE UART, serial)  │
//! └─────────────────────────────────────────┘
//!                     │ GattCentral / SerialPorts
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  host integration (out of tree)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`link::Connector`], [`link::Link`] - Uniform channel transport
//! - [`ble::GattCentral`], [`ble::GattPeripheral`] - BLE central role
//! - [`serial::SerialPorts`], [`serial::SerialPort`] - Serial port access

#![no_std]
#![deny(unsafe_code)]
#![allow(async_fn_in_trait)]

pub mod ble;
pub mod link;
pub mod serial;

// Re-export key traits at crate root for convenience
pub use ble::{BleError, DeviceFilter, GattCentral, GattPeripheral, Uuid};
pub use link::{ConnectError, Connector, Link};
pub use serial::{
    DataBits, Parity, PortInfo, PortRequest, SerialConfig, SerialError, SerialPort, SerialPorts,
    StopBits,
};
