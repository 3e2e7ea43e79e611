//! ANT-FS session layer.
//!
//! Drives a client device through link, identity, pairing, passkey
//! authentication, and paginated file downloads using the wait primitives
//! of `antler-engine`. Retry budgets and the leniency policies for
//! disconnect and authentication are explicit configuration, not
//! hard-coded behavior.

pub mod config;
pub mod error;
pub mod session;
pub mod state;

pub use config::{AuthPolicy, DisconnectPolicy, SessionConfig};
pub use error::{Result, SessionError};
pub use session::{DeviceIdentity, DownloadResult, FsSession, PairingOutcome};
pub use state::SessionState;
