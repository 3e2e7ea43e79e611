//! ANT channel bring-up and teardown.
//!
//! A fresh radio knows nothing: every run starts with a reset, then
//! programs the network key and channel parameters for the profile in use
//! before opening the channel. The radio acknowledges each configuration
//! command individually, so bring-up is a straight sequence of
//! command/response round trips ending with a status poll.

use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info};

use antler_core::constants::{
    ANT_PLUS_NETWORK_KEY, ANTFS_CHANNEL_PERIOD, ANTFS_NETWORK_KEY, ANTFS_RF_FREQUENCY,
    ANTFS_SEARCH_TIMEOUT, ANTFS_SEARCH_WAVEFORM, DEFAULT_NETWORK, HRM_CHANNEL_PERIOD,
    HRM_DEVICE_TYPE, HRM_RF_FREQUENCY, HRM_SEARCH_TIMEOUT,
};
use antler_core::{ChannelState, ChannelType, MessageId};
use antler_engine::AntStation;
use antler_protocol::messages;

const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);
const STATUS_POLL_ATTEMPTS: u32 = 20;

/// Radio parameters for one receive profile.
pub struct ChannelProfile {
    pub network_key: [u8; 8],
    pub rf_frequency: u8,
    pub period: u16,
    pub search_timeout: u8,
    /// Device type to search for; 0 is the wildcard.
    pub device_type: u8,
    /// Search waveform override, where the profile specifies one.
    pub search_waveform: Option<u16>,
}

/// The ANT-FS host profile: wildcard search on the ANT-FS network.
pub fn antfs_profile() -> ChannelProfile {
    ChannelProfile {
        network_key: ANTFS_NETWORK_KEY,
        rf_frequency: ANTFS_RF_FREQUENCY,
        period: ANTFS_CHANNEL_PERIOD,
        search_timeout: ANTFS_SEARCH_TIMEOUT,
        device_type: 0,
        search_waveform: Some(ANTFS_SEARCH_WAVEFORM),
    }
}

/// The ANT+ heart-rate monitor profile.
pub fn hrm_profile() -> ChannelProfile {
    ChannelProfile {
        network_key: ANT_PLUS_NETWORK_KEY,
        rf_frequency: HRM_RF_FREQUENCY,
        period: HRM_CHANNEL_PERIOD,
        search_timeout: HRM_SEARCH_TIMEOUT,
        device_type: HRM_DEVICE_TYPE,
        search_waveform: None,
    }
}

/// Reset the radio and open a receive channel for the given profile.
///
/// Fails if the channel is not `Unassigned` after the reset or never
/// reports `Searching` after opening.
pub async fn bring_up(station: &mut AntStation, channel: u8, profile: &ChannelProfile) -> Result<()> {
    station.reset().await?;

    let state = channel_state(station, channel).await?;
    if state != ChannelState::Unassigned {
        bail!("channel {channel} is {state} after reset");
    }

    station
        .command(messages::set_network_key(DEFAULT_NETWORK, &profile.network_key))
        .await?;
    station
        .command(messages::assign_channel(channel, ChannelType::Receive, DEFAULT_NETWORK))
        .await?;
    // wildcard device number so any master matching the type is found
    station
        .command(messages::set_channel_id(channel, 0, false, profile.device_type, 0))
        .await?;
    station
        .command(messages::set_channel_period(channel, profile.period))
        .await?;
    station
        .command(messages::set_channel_search_timeout(channel, profile.search_timeout))
        .await?;
    station
        .command(messages::set_channel_rf_freq(channel, profile.rf_frequency))
        .await?;
    if let Some(waveform) = profile.search_waveform {
        station
            .command(messages::set_search_waveform(channel, waveform))
            .await?;
    }
    station.command(messages::open_channel(channel)).await?;

    for _ in 0..STATUS_POLL_ATTEMPTS {
        let state = channel_state(station, channel).await?;
        if matches!(state, ChannelState::Searching | ChannelState::Tracking) {
            info!(channel, %state, "Channel open");
            return Ok(());
        }
        debug!(channel, %state, "Waiting for the channel to search");
        tokio::time::sleep(STATUS_POLL_INTERVAL).await;
    }
    bail!("channel {channel} never started searching")
}

/// Close and unassign the channel.
pub async fn tear_down(station: &mut AntStation, channel: u8) -> Result<()> {
    station.command(messages::close_channel(channel)).await?;
    station.command(messages::unassign_channel(channel)).await?;
    Ok(())
}

async fn channel_state(station: &mut AntStation, channel: u8) -> Result<ChannelState> {
    let status = station.request(channel, MessageId::ChannelStatus).await?;
    if status.len() < 2 {
        bail!("short channel status answer ({} bytes)", status.len());
    }
    Ok(ChannelState::from_status_byte(status[1]))
}
