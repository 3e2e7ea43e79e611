//! Session configuration and policy choices.

use serde::{Deserialize, Serialize};

use antler_core::constants::{ANTFS_RF_FREQUENCY, DEFAULT_HOST_SERIAL, DEFAULT_RETRY_ATTEMPTS};
use antler_core::types::BeaconPeriod;

/// What to do when disconnect attempts run out.
///
/// The historic behavior is best-effort: a client that stopped listening is
/// effectively disconnected already, so exhaustion is reported as success.
/// `Required` propagates the failure instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectPolicy {
    /// Exhausted attempts still count as disconnected.
    #[default]
    BestEffort,

    /// Exhausted attempts are an error.
    Required,
}

/// How much weight the device's authentication verdict carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthPolicy {
    /// Log the verdict, proceed regardless. Devices that already hold the
    /// pairing key accept downloads even when the passkey exchange reports
    /// oddly, so this is the permissive default.
    #[default]
    Advisory,

    /// Anything but an explicit acceptance is an error.
    Strict,
}

/// Tunables for an ANT-FS session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Channel the session runs on.
    pub channel: u8,

    /// Serial number we present to the client.
    pub host_serial: u32,

    /// Name sent in pairing requests (truncated to the 16-byte wire field).
    pub host_name: String,

    /// Attempt budget for each retried operation.
    pub retry_attempts: u32,

    /// Radio frequency requested in the link command.
    pub link_frequency: u8,

    /// Beacon period requested in the link command.
    pub beacon_period: BeaconPeriod,

    pub disconnect_policy: DisconnectPolicy,
    pub auth_policy: AuthPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            host_serial: DEFAULT_HOST_SERIAL,
            host_name: "antler".to_string(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            link_frequency: ANTFS_RF_FREQUENCY,
            beacon_period: BeaconPeriod::Hz8,
            disconnect_policy: DisconnectPolicy::default(),
            auth_policy: AuthPolicy::default(),
        }
    }
}
