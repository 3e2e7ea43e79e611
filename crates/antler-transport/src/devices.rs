//! Enum wrapper for transport dispatch.
//!
//! Native `async fn` in traits (Edition 2024 RPITIT) is not object-safe, so
//! `Box<dyn AntTransport>` cannot exist. This enum provides concrete-type
//! dispatch instead: monomorphized at compile time, extensible by adding a
//! variant.

use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;
use crate::mock::MockTransport;
use crate::serial::SerialTransport;
use crate::traits::AntTransport;

/// Any supported transport behind one concrete type.
///
/// # Examples
///
/// ```
/// use antler_transport::{AntTransport, AnyTransport, MockTransport};
///
/// let (transport, _handle) = MockTransport::new();
/// let any = AnyTransport::Mock(transport);
/// assert_eq!(any.description(), "Mock ANT radio");
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    /// USB ANT stick on a serial port.
    Serial(SerialTransport),

    /// Simulated radio for development and testing.
    Mock(MockTransport),
}

impl AntTransport for AnyTransport {
    async fn send(&mut self, data: Bytes) -> Result<()> {
        match self {
            Self::Serial(transport) => transport.send(data).await,
            Self::Mock(transport) => transport.send(data).await,
        }
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Bytes> {
        match self {
            Self::Serial(transport) => transport.receive(timeout).await,
            Self::Mock(transport) => transport.receive(timeout).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Serial(transport) => transport.close().await,
            Self::Mock(transport) => transport.close().await,
        }
    }

    fn description(&self) -> &str {
        match self {
            Self::Serial(transport) => transport.description(),
            Self::Mock(transport) => transport.description(),
        }
    }
}
