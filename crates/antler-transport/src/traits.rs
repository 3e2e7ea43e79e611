//! Transport trait definition.
//!
//! A transport moves raw bytes between the host and an ANT radio. It knows
//! nothing about frames: the engine layers the codec on top. Traits use
//! native `async fn` methods (Edition 2024 RPITIT), so there is no
//! `async_trait` macro here; dynamic dispatch goes through the enum wrapper
//! in [`crate::devices`].

#![allow(async_fn_in_trait)]

use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// Byte-level link to an ANT radio.
///
/// # Object Safety and Dynamic Dispatch
///
/// Native `async fn` methods are not object-safe, so `Box<dyn AntTransport>`
/// does not exist. Use generic parameters, or [`crate::devices::AnyTransport`]
/// where one concrete type must stand in for several.
pub trait AntTransport: Send {
    /// Write raw bytes to the radio, completely.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is gone or the write fails.
    async fn send(&mut self, data: Bytes) -> Result<()>;

    /// Read whatever bytes the radio has produced, waiting at most `timeout`.
    ///
    /// An empty buffer means the timeout elapsed quietly; that is not an
    /// error, since an idle radio is a normal state. Errors are reserved for
    /// a broken link.
    async fn receive(&mut self, timeout: Duration) -> Result<Bytes>;

    /// Release the underlying device.
    async fn close(&mut self) -> Result<()>;

    /// Human-readable identity for logs (port path or mock name).
    fn description(&self) -> &str;
}
