//! Serial port transport
//!
//! Opens a user-picked port at the deployment baud rate (8N1) and writes
//! frames as raw bytes. The port's read side is the link's receive half.

use chromalink_hal::{ConnectError, Connector, Link, PortRequest, SerialError, SerialPort, SerialPorts};

/// Connector for the wired channel
pub struct SerialConnector<S> {
    ports: S,
}

impl<S: SerialPorts> SerialConnector<S> {
    pub fn new(ports: S) -> Self {
        Self { ports }
    }
}

impl<S: SerialPorts> Connector for SerialConnector<S> {
    type Selector = PortRequest;
    type Link = SerialLink<S::Port>;

    async fn connect(&mut self, request: &PortRequest) -> Result<Self::Link, ConnectError> {
        let mut port = self.ports.request_port(request.vendor_id).await?;
        let reader = port.open(&request.config).await?;
        Ok(SerialLink::new(port).with_rx(reader))
    }
}

/// Open serial port
pub struct SerialLink<P: SerialPort> {
    port: P,
    rx: Option<P::Reader>,
    open: bool,
}

impl<P: SerialPort> SerialLink<P> {
    /// Wrap an already opened port
    pub fn new(port: P) -> Self {
        Self {
            port,
            rx: None,
            open: true,
        }
    }

    /// Attach the port's read side as the receive half
    pub fn with_rx(mut self, reader: P::Reader) -> Self {
        self.rx = Some(reader);
        self
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl<P: SerialPort> embedded_io::ErrorType for SerialLink<P> {
    type Error = SerialError;
}

impl<P: SerialPort> embedded_io_async::Write for SerialLink<P> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if !self.open {
            return Err(SerialError::Closed);
        }
        self.port.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        if !self.open {
            return Err(SerialError::Closed);
        }
        self.port.flush().await
    }
}

impl<P: SerialPort> Link for SerialLink<P> {
    type Rx = P::Reader;

    fn take_rx(&mut self) -> Option<P::Reader> {
        self.rx.take()
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            self.port.close().await;
        }
    }
}
