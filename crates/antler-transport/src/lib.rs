//! Byte transports for ANT radios.
//!
//! This crate carries raw bytes between the host and the radio and nothing
//! more; framing lives in `antler-protocol` and is applied by the engine.
//! Two implementations exist: [`SerialTransport`] for USB ANT sticks and
//! [`MockTransport`] for tests, unified by the [`AnyTransport`] enum
//! wrapper.

pub mod devices;
pub mod error;
pub mod mock;
pub mod serial;
pub mod traits;

pub use devices::AnyTransport;
pub use error::{Result, TransportError};
pub use mock::{MockTransport, MockTransportHandle};
pub use serial::{ANT_BAUD_RATE, SerialTransport};
pub use traits::AntTransport;
