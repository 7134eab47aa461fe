//! Test doubles for the transport traits

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_futures::yield_now;
use embedded_io::ErrorKind;

use chromalink_core::classifier::Label;
use chromalink_core::link::{ChannelKind, LinkState};
use chromalink_hal::{
    BleError, ConnectError, Connector, DeviceFilter, GattCentral, GattPeripheral, Link, PortInfo,
    SerialConfig, SerialError, SerialPort, SerialPorts, Uuid,
};
use chromalink_protocol::HostMessage;

use crate::clock::Clock;
use crate::session::Facing;
use crate::status::StatusSink;

/// Link recording every byte written; clones share state
#[derive(Clone, Default)]
pub struct MockLink {
    written: Rc<RefCell<Vec<u8>>>,
    closes: Rc<Cell<u32>>,
    fail: Rc<Cell<bool>>,
    held: Rc<Cell<bool>>,
    rx: Rc<Cell<Option<&'static [u8]>>>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device-to-host bytes handed out as the receive half
    pub fn with_rx(self, bytes: &'static [u8]) -> Self {
        self.rx.set(Some(bytes));
        self
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    /// Written bytes split into lines
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written.borrow())
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect()
    }

    pub fn closes(&self) -> u32 {
        self.closes.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail.set(fail);
    }

    /// Park writes until [`MockLink::release_writes`]
    pub fn hold_writes(&self) {
        self.held.set(true);
    }

    pub fn release_writes(&self) {
        self.held.set(false);
    }
}

impl embedded_io::ErrorType for MockLink {
    type Error = ErrorKind;
}

impl embedded_io_async::Write for MockLink {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        while self.held.get() {
            yield_now().await;
        }
        if self.fail.get() {
            return Err(ErrorKind::BrokenPipe);
        }
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

impl Link for MockLink {
    type Rx = &'static [u8];

    fn take_rx(&mut self) -> Option<&'static [u8]> {
        self.rx.take()
    }

    async fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

/// Connector handing out queued results in order
pub struct MockConnector<S> {
    results: Rc<RefCell<VecDeque<Result<MockLink, ConnectError>>>>,
    calls: Rc<Cell<u32>>,
    selectors: Rc<RefCell<Vec<S>>>,
}

impl<S> MockConnector<S> {
    /// Every connect fails with `DeviceNotFound` (picker cancelled)
    pub fn empty() -> Self {
        Self {
            results: Rc::default(),
            calls: Rc::default(),
            selectors: Rc::default(),
        }
    }

    pub fn with_link(link: MockLink) -> Self {
        let connector = Self::empty();
        connector.push_link(link);
        connector
    }

    pub fn failing(error: ConnectError) -> Self {
        let connector = Self::empty();
        connector.results.borrow_mut().push_back(Err(error));
        connector
    }

    pub fn push_link(&self, link: MockLink) {
        self.results.borrow_mut().push_back(Ok(link));
    }

    pub fn calls(&self) -> Rc<Cell<u32>> {
        self.calls.clone()
    }

    pub fn selectors(&self) -> Rc<RefCell<Vec<S>>> {
        self.selectors.clone()
    }
}

impl<S: Clone> Connector for MockConnector<S> {
    type Selector = S;
    type Link = MockLink;

    async fn connect(&mut self, selector: &S) -> Result<MockLink, ConnectError> {
        self.calls.set(self.calls.get() + 1);
        self.selectors.borrow_mut().push(selector.clone());
        yield_now().await;
        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(ConnectError::DeviceNotFound))
    }
}

/// Notification stream replaying fixed bytes, then end of stream
pub struct MockNotifications(&'static [u8]);

impl embedded_io::ErrorType for MockNotifications {
    type Error = BleError;
}

impl embedded_io_async::Read for MockNotifications {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, BleError> {
        let n = self.0.len().min(buf.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
    }
}

/// GATT peripheral that accepts every write
#[derive(Clone, Default)]
pub struct MockPeripheral {
    notifications: &'static [u8],
    written: Rc<RefCell<Vec<u8>>>,
    disconnects: Rc<Cell<u32>>,
}

impl MockPeripheral {
    /// Peripheral whose TX notifications carry `bytes`
    pub fn notifying(bytes: &'static [u8]) -> Self {
        Self {
            notifications: bytes,
            ..Self::default()
        }
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    pub fn disconnects(&self) -> u32 {
        self.disconnects.get()
    }
}

impl GattPeripheral for MockPeripheral {
    type Notifications = MockNotifications;

    fn name(&self) -> Option<&str> {
        Some("BBC micro:bit [vatav]")
    }

    async fn connect(&mut self) -> Result<(), BleError> {
        Ok(())
    }

    async fn write_characteristic(
        &mut self,
        _service: Uuid,
        _characteristic: Uuid,
        data: &[u8],
    ) -> Result<(), BleError> {
        self.written.borrow_mut().extend_from_slice(data);
        Ok(())
    }

    async fn start_notifications(
        &mut self,
        _service: Uuid,
        _characteristic: Uuid,
    ) -> Result<MockNotifications, BleError> {
        Ok(MockNotifications(self.notifications))
    }

    async fn disconnect(&mut self) {
        self.disconnects.set(self.disconnects.get() + 1);
    }
}

/// Central offering one peripheral, then reporting the picker cancelled
pub struct MockCentral {
    peripheral: Option<MockPeripheral>,
}

impl MockCentral {
    pub fn new(peripheral: MockPeripheral) -> Self {
        Self {
            peripheral: Some(peripheral),
        }
    }
}

impl GattCentral for MockCentral {
    type Peripheral = MockPeripheral;

    async fn request_device(&mut self, _filter: &DeviceFilter) -> Result<MockPeripheral, BleError> {
        self.peripheral.take().ok_or(BleError::NotFound)
    }
}

/// Host without a serial API
pub struct NoSerial;

/// Port type of [`NoSerial`]; never constructed
pub enum NoPort {}

impl embedded_io::ErrorType for NoPort {
    type Error = SerialError;
}

impl embedded_io_async::Read for NoPort {
    async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, SerialError> {
        match *self {}
    }
}

impl embedded_io_async::Write for NoPort {
    async fn write(&mut self, _buf: &[u8]) -> Result<usize, SerialError> {
        match *self {}
    }

    async fn flush(&mut self) -> Result<(), SerialError> {
        match *self {}
    }
}

impl SerialPort for NoPort {
    type Reader = NoPort;

    fn info(&self) -> PortInfo {
        match *self {}
    }

    async fn open(&mut self, _config: &SerialConfig) -> Result<NoPort, SerialError> {
        match *self {}
    }

    async fn close(&mut self) {
        match *self {}
    }
}

impl SerialPorts for NoSerial {
    type Port = NoPort;

    async fn request_port(&mut self, _vendor_id: Option<u16>) -> Result<NoPort, SerialError> {
        Err(SerialError::Unavailable)
    }
}

/// Route `log` output to the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Clock advanced by hand
#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Everything a [`RecordingSink`] saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Classified {
        label: Label,
        name: String,
        confidence: u8,
    },
    Transmit(HostMessage),
    Channel {
        channel: ChannelKind,
        state: LinkState,
        reason: Option<String>,
    },
    DeviceLine(ChannelKind, String),
    Facing(Facing),
}

#[derive(Default)]
pub struct RecordingSink {
    events: RefCell<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.borrow().clone()
    }

    pub fn transmits(&self) -> Vec<HostMessage> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Transmit(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<(ChannelKind, LinkState, Option<String>)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Channel {
                    channel,
                    state,
                    reason,
                } => Some((*channel, *state, reason.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: SinkEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl StatusSink for RecordingSink {
    fn on_classification(&self, label: Label, name: &str, confidence_percent: u8) {
        self.push(SinkEvent::Classified {
            label,
            name: name.to_string(),
            confidence: confidence_percent,
        });
    }

    fn on_transmit(&self, message: &HostMessage) {
        self.push(SinkEvent::Transmit(*message));
    }

    fn on_channel_status(&self, channel: ChannelKind, state: LinkState, reason: Option<&str>) {
        self.push(SinkEvent::Channel {
            channel,
            state,
            reason: reason.map(str::to_string),
        });
    }

    fn on_device_line(&self, channel: ChannelKind, line: &str) {
        self.push(SinkEvent::DeviceLine(channel, line.to_string()));
    }

    fn on_facing_changed(&self, facing: Facing) {
        self.push(SinkEvent::Facing(facing));
    }
}
