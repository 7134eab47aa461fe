//! Transport driver implementations
//!
//! This crate provides concrete [`Connector`](chromalink_hal::Connector)s
//! built on the low-level traits in `chromalink-hal`:
//!
//! - BLE UART (Nordic UART Service, micro:bit flavour)
//! - Serial port (8N1, raw bytes)

#![no_std]
#![deny(unsafe_code)]
#![allow(async_fn_in_trait)]

pub mod ble_uart;
pub mod serial;

pub use ble_uart::{BleUartConnector, BleUartLink};
pub use serial::{SerialConnector, SerialLink};
