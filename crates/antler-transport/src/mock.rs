//! Mock transport for testing and development.
//!
//! Simulates an ANT radio at the byte level: tests inject the bytes the
//! radio would produce and observe the bytes the host writes, all through a
//! cloneable handle. No hardware, no timing requirements.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc};

use crate::error::{Result, TransportError};
use crate::traits::AntTransport;

const CHANNEL_CAPACITY: usize = 64;

/// Mock ANT radio transport.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use antler_transport::mock::MockTransport;
/// use antler_transport::AntTransport;
///
/// #[tokio::main]
/// async fn main() -> antler_transport::Result<()> {
///     let (mut transport, handle) = MockTransport::new();
///
///     handle.inject(&[0xA4, 0x01, 0x6F, 0x20, 0xEA]).await;
///
///     let bytes = transport.receive(Duration::from_millis(10)).await?;
///     assert_eq!(bytes.len(), 5);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    /// Bytes the simulated radio has produced.
    inbound_rx: mpsc::Receiver<Bytes>,

    /// Bytes the host has written, observable through the handle.
    outbound_tx: mpsc::Sender<Bytes>,

    name: String,
}

impl MockTransport {
    /// Create a mock transport with the default name.
    ///
    /// Returns the transport and the handle that drives it.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("Mock ANT radio".to_string())
    }

    /// Create a mock transport with a custom name.
    pub fn with_name(name: String) -> (Self, MockTransportHandle) {
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let transport = Self {
            inbound_rx,
            outbound_tx,
            name: name.clone(),
        };

        let handle = MockTransportHandle {
            inbound_tx,
            outbound_rx: Arc::new(Mutex::new(outbound_rx)),
            name,
        };

        (transport, handle)
    }
}

impl AntTransport for MockTransport {
    async fn send(&mut self, data: Bytes) -> Result<()> {
        self.outbound_tx
            .send(data)
            .await
            .map_err(|_| TransportError::disconnected(self.name.clone()))
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Bytes> {
        match tokio::time::timeout(timeout, self.inbound_rx.recv()).await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(TransportError::disconnected(self.name.clone())),
            Err(_) => Ok(Bytes::new()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.inbound_rx.close();
        Ok(())
    }

    fn description(&self) -> &str {
        &self.name
    }
}

/// Handle for driving a [`MockTransport`].
///
/// Can be cloned and shared across tasks; observation of written bytes is
/// serialized through an internal lock, so normally one task plays the
/// radio while others only inject.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    inbound_tx: mpsc::Sender<Bytes>,
    outbound_rx: Arc<Mutex<mpsc::Receiver<Bytes>>>,
    name: String,
}

impl MockTransportHandle {
    /// Feed bytes that the transport's next `receive` calls will return.
    ///
    /// A panic on a closed channel is deliberate: in a test, injecting into
    /// a dropped transport is a bug in the test.
    pub async fn inject(&self, bytes: &[u8]) {
        self.inbound_tx
            .send(Bytes::copy_from_slice(bytes))
            .await
            .expect("mock transport dropped");
    }

    /// Like [`MockTransportHandle::inject`], but reports a dropped
    /// transport instead of panicking. Long-running driver tasks (a
    /// simulated device beaconing in a loop) use this to wind down when
    /// the test shuts the transport.
    pub async fn try_inject(&self, bytes: &[u8]) -> bool {
        self.inbound_tx
            .send(Bytes::copy_from_slice(bytes))
            .await
            .is_ok()
    }

    /// Wait for the next chunk of bytes the host wrote.
    ///
    /// Returns `None` once the transport is dropped and all written bytes
    /// have been observed.
    pub async fn next_sent(&self) -> Option<Bytes> {
        self.outbound_rx.lock().await.recv().await
    }

    /// Wait for the next written chunk, allowing at most `timeout`.
    pub async fn next_sent_timeout(&self, timeout: Duration) -> Option<Bytes> {
        tokio::time::timeout(timeout, self.next_sent()).await.ok()?
    }

    /// The transport's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inject_then_receive() {
        let (mut transport, handle) = MockTransport::new();

        handle.inject(&[1, 2, 3]).await;
        let bytes = transport.receive(Duration::from_millis(50)).await.unwrap();
        assert_eq!(&bytes[..], &[1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_timeout_yields_empty() {
        let (mut transport, _handle) = MockTransport::new();

        let bytes = transport.receive(Duration::from_secs(1)).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_receive_after_handle_drop_is_disconnect() {
        let (mut transport, handle) = MockTransport::new();
        drop(handle);

        let result = transport.receive(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(TransportError::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_sent_bytes_are_observable() {
        let (mut transport, handle) = MockTransport::new();

        transport.send(Bytes::from_static(&[9, 8, 7])).await.unwrap();
        let sent = handle.next_sent().await.unwrap();
        assert_eq!(&sent[..], &[9, 8, 7]);
    }

    #[tokio::test]
    async fn test_description() {
        let (transport, _handle) = MockTransport::with_name("usb0".to_string());
        assert_eq!(transport.description(), "usb0");
    }
}
