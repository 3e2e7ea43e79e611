//! Serial-port transport for USB ANT sticks.
//!
//! USB ANT radios enumerate as CDC-ACM serial devices. The `serialport`
//! crate only offers blocking I/O, so every operation moves the boxed port
//! into `spawn_blocking` and takes it back afterwards. The port therefore
//! lives in an `Option`: `None` only while a blocking call is in flight or
//! after [`SerialTransport::close`].

use std::io::ErrorKind;
use std::time::Duration;

use bytes::Bytes;
use serialport::SerialPort;
use tokio::task;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::AntTransport;

/// Baud rate of every known USB ANT stick.
pub const ANT_BAUD_RATE: u32 = 115_200;

const READ_BUFFER_SIZE: usize = 512;

/// Transport over a serial port.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use antler_transport::serial::SerialTransport;
/// use antler_transport::AntTransport;
///
/// # async fn example() -> antler_transport::Result<()> {
/// let mut transport = SerialTransport::open("/dev/ttyUSB0").await?;
/// let bytes = transport.receive(Duration::from_secs(1)).await?;
/// println!("read {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    path: String,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialTransport {
    /// Open the given serial device at the standard ANT baud rate.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::OpenFailed`] if the port cannot be opened.
    pub async fn open(path: impl Into<String>) -> Result<Self> {
        Self::open_with_baud(path, ANT_BAUD_RATE).await
    }

    /// Open the given serial device at a specific baud rate.
    ///
    /// Some older radios and serial bridges run slower than
    /// [`ANT_BAUD_RATE`].
    pub async fn open_with_baud(path: impl Into<String>, baud: u32) -> Result<Self> {
        let path = path.into();
        debug!(port = %path, baud, "Opening serial port");

        let open_path = path.clone();
        let port = task::spawn_blocking(move || {
            serialport::new(&open_path, baud)
                .timeout(Duration::from_secs(1))
                .open()
        })
        .await
        .map_err(|e| TransportError::task_failed(e.to_string()))?
        .map_err(|e| TransportError::open_failed(path.clone(), e))?;

        Ok(Self {
            port: Some(port),
            path,
        })
    }

    fn take_port(&mut self) -> Result<Box<dyn SerialPort>> {
        self.port
            .take()
            .ok_or_else(|| TransportError::disconnected(self.path.clone()))
    }
}

impl AntTransport for SerialTransport {
    async fn send(&mut self, data: Bytes) -> Result<()> {
        let mut port = self.take_port()?;
        trace!(port = %self.path, len = data.len(), "Serial write");

        let (port, result) = task::spawn_blocking(move || {
            let result = port.write_all(&data).and_then(|()| port.flush());
            (port, result)
        })
        .await
        .map_err(|e| TransportError::task_failed(e.to_string()))?;

        self.port = Some(port);
        result.map_err(TransportError::from)
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Bytes> {
        let mut port = self.take_port()?;

        let (port, result) = task::spawn_blocking(move || {
            let result = port.set_timeout(timeout).map_err(TransportError::from).and_then(|()| {
                let mut buf = [0u8; READ_BUFFER_SIZE];
                match port.read(&mut buf) {
                    Ok(n) => Ok(Bytes::copy_from_slice(&buf[..n])),
                    // a quiet radio is not an error
                    Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                        Ok(Bytes::new())
                    }
                    Err(e) => Err(TransportError::from(e)),
                }
            });
            (port, result)
        })
        .await
        .map_err(|e| TransportError::task_failed(e.to_string()))?;

        self.port = Some(port);
        let bytes = result?;
        if !bytes.is_empty() {
            trace!(port = %self.path, len = bytes.len(), "Serial read");
        }
        Ok(bytes)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(port) = self.port.take() {
            debug!(port = %self.path, "Closing serial port");
            // dropping the port closes the fd; do it off the runtime thread
            task::spawn_blocking(move || drop(port))
                .await
                .map_err(|e| TransportError::task_failed(e.to_string()))?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.path
    }
}
