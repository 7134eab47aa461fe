//! UART over BLE (Nordic UART Service)
//!
//! The micro:bit exposes the NUS with the characteristic roles swapped with
//! respect to Nordic's reference firmware: the host writes to `...0003` and
//! receives indications on `...0002`.
//!
//! # Connect sequence
//!
//! 1. Ask the central for a peripheral matching the name prefix
//! 2. Open the GATT connection
//! 3. Subscribe to the TX characteristic; its notifications become the
//!    link's receive half
//!
//! Writes larger than the peripheral's ATT payload are split into chunks.

use chromalink_hal::{
    BleError, ConnectError, Connector, DeviceFilter, GattCentral, GattPeripheral, Link, Uuid,
};

/// Nordic UART service
pub const NUS_SERVICE: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);

/// Device-to-host characteristic (notify/indicate)
pub const NUS_TX_CHARACTERISTIC: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);

/// Host-to-device characteristic (write)
pub const NUS_RX_CHARACTERISTIC: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/// Discovery filter for a micro:bit style NUS peripheral
pub fn nus_filter(name_prefix: &str) -> DeviceFilter {
    DeviceFilter::new(name_prefix, NUS_SERVICE)
}

/// Connector for the wireless channel
pub struct BleUartConnector<C> {
    central: C,
}

impl<C: GattCentral> BleUartConnector<C> {
    pub fn new(central: C) -> Self {
        Self { central }
    }

    pub fn central(&self) -> &C {
        &self.central
    }
}

impl<C: GattCentral> Connector for BleUartConnector<C> {
    type Selector = DeviceFilter;
    type Link = BleUartLink<C::Peripheral>;

    async fn connect(&mut self, filter: &DeviceFilter) -> Result<Self::Link, ConnectError> {
        let mut peripheral = self.central.request_device(filter).await?;

        peripheral.connect().await?;

        let notifications = match peripheral
            .start_notifications(filter.service, NUS_TX_CHARACTERISTIC)
            .await
        {
            Ok(notifications) => notifications,
            Err(e) => {
                peripheral.disconnect().await;
                return Err(e.into());
            }
        };

        Ok(BleUartLink::new(peripheral, filter.service).with_rx(notifications))
    }
}

/// Open NUS connection
pub struct BleUartLink<P: GattPeripheral> {
    peripheral: P,
    service: Uuid,
    rx: Option<P::Notifications>,
    connected: bool,
}

impl<P: GattPeripheral> BleUartLink<P> {
    /// Wrap an already connected and subscribed peripheral
    pub fn new(peripheral: P, service: Uuid) -> Self {
        Self {
            peripheral,
            service,
            rx: None,
            connected: true,
        }
    }

    /// Attach the TX characteristic subscription as the receive half
    pub fn with_rx(mut self, notifications: P::Notifications) -> Self {
        self.rx = Some(notifications);
        self
    }

    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl<P: GattPeripheral> embedded_io::ErrorType for BleUartLink<P> {
    type Error = BleError;
}

impl<P: GattPeripheral> embedded_io_async::Write for BleUartLink<P> {
    /// Write at most one ATT payload
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if !self.connected {
            return Err(BleError::Disconnected);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let len = buf.len().min(self.peripheral.max_write_len().max(1));
        self.peripheral
            .write_characteristic(self.service, NUS_RX_CHARACTERISTIC, &buf[..len])
            .await?;
        Ok(len)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<P: GattPeripheral> Link for BleUartLink<P> {
    type Rx = P::Notifications;

    fn take_rx(&mut self) -> Option<P::Notifications> {
        self.rx.take()
    }

    async fn close(&mut self) {
        if self.connected {
            self.connected = false;
            self.peripheral.disconnect().await;
        }
    }
}
