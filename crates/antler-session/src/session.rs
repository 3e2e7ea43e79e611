//! The ANT-FS session state machine.
//!
//! An [`FsSession`] drives one client device through the ANT-FS lifecycle:
//! link, identity exchange, pairing or passkey authentication, and
//! paginated downloads. Every operation is a retried sequence of engine
//! primitives (wait for a ready beacon, send a command, collect the burst
//! answer) with a bounded attempt budget; what happens when the budget runs
//! out is a named policy in [`SessionConfig`], not an accident.

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, warn};

use antler_core::Error as ProtocolError;
use antler_engine::AntStation;
use antler_protocol::{
    AuthAnswer, AuthVerdict, Beacon, Crc16, Directory, DownloadFooter, DownloadHeader,
    DownloadResponse, PairingAnswer, SerialNumberAnswer, antfs,
};

use crate::config::{AuthPolicy, DisconnectPolicy, SessionConfig};
use crate::error::{Result, SessionError};
use crate::state::SessionState;

/// Identity reported by a serial-number request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub unit_id: u32,
    pub unit_name: String,
}

/// Outcome of a pairing exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingOutcome {
    pub unit_id: u32,
    pub verdict: AuthVerdict,
    /// The passkey the device issued; persist it for later sessions.
    pub key: u64,
}

/// One fully downloaded file.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub data: Bytes,
    pub file_size: u32,
    /// Whether our running CRC-16 over the payload matched the seed the
    /// device reported in the final packet footer. A mismatch is suspicious
    /// but not fatal; callers decide what to do with the file.
    pub crc_matched: bool,
}

/// ANT-FS session over a running station.
///
/// # Examples
///
/// ```no_run
/// use antler_engine::AntStation;
/// use antler_session::{FsSession, SessionConfig};
/// # async fn example(station: AntStation) -> antler_session::Result<()> {
/// let mut session = FsSession::new(station, SessionConfig::default());
///
/// session.link().await?;
/// let identity = session.request_serial().await?;
/// println!("device: {} ({})", identity.unit_name, identity.unit_id);
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct FsSession {
    station: AntStation,
    config: SessionConfig,
    state: SessionState,
}

impl FsSession {
    /// Wrap a station in a fresh, disconnected session.
    pub fn new(station: AntStation, config: SessionConfig) -> Self {
        Self {
            station,
            config,
            state: SessionState::Disconnected,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The station, for channel bring-up and teardown around the session.
    pub fn station_mut(&mut self) -> &mut AntStation {
        &mut self.station
    }

    /// Tear down the session and its station.
    pub async fn shutdown(self) -> Result<()> {
        self.station.shutdown().await?;
        Ok(())
    }

    /// Establish a link: move the client from its search beacon onto our
    /// channel at the configured frequency and period.
    ///
    /// # Errors
    ///
    /// [`SessionError::RetriesExhausted`] after the attempt budget; fatal
    /// engine errors propagate immediately.
    pub async fn link(&mut self) -> Result<()> {
        self.require_state("link", SessionState::Disconnected)?;

        let command = antfs::link_command(
            self.config.link_frequency,
            self.config.beacon_period,
            self.config.host_serial,
        );

        let attempts = self.attempt_budget();
        for attempt in 1..=attempts {
            match self.try_acknowledged_command(&command).await {
                Ok(()) => {
                    info!("Link established");
                    self.state = SessionState::Linked;
                    return Ok(());
                }
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "Link attempt failed");
                }
                Err(e) => return Err(e),
            }
        }
        Err(SessionError::RetriesExhausted {
            operation: "link",
            attempts,
        })
    }

    /// Return the client to its search beacon.
    ///
    /// Under [`DisconnectPolicy::BestEffort`] an unreachable client still
    /// counts as disconnected; `Required` surfaces the exhaustion.
    pub async fn disconnect(&mut self) -> Result<()> {
        let command = antfs::disconnect_command(true);

        let attempts = self.attempt_budget();
        let mut outcome = Err(SessionError::RetriesExhausted {
            operation: "disconnect",
            attempts,
        });
        for attempt in 1..=attempts {
            match self.try_acknowledged_command(&command).await {
                Ok(()) => {
                    outcome = Ok(());
                    break;
                }
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "Disconnect attempt failed");
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        self.state = SessionState::Disconnected;
        match outcome {
            Ok(()) => {
                info!("Disconnected");
                Ok(())
            }
            Err(e) if self.config.disconnect_policy == DisconnectPolicy::BestEffort => {
                warn!(error = %e, "Disconnect failed, treating as disconnected");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Ask the client for its serial number and display name.
    pub async fn request_serial(&mut self) -> Result<DeviceIdentity> {
        self.require_state("request_serial", SessionState::Linked)?;

        let command = antfs::serial_number_request(self.config.host_serial);
        let answer = self
            .exchange_retried("request_serial", &command, Exchange::Acknowledged)
            .await?;

        let parsed = SerialNumberAnswer::parse(&answer)?;
        info!(unit_id = parsed.unit_id, name = %parsed.unit_name, "Device identity");
        Ok(DeviceIdentity {
            unit_id: parsed.unit_id,
            unit_name: parsed.unit_name,
        })
    }

    /// Request pairing; the user typically has to confirm on the device.
    ///
    /// Returns the device's verdict and, on acceptance, the passkey to
    /// persist for [`FsSession::authenticate`] in later sessions.
    pub async fn pair(&mut self) -> Result<PairingOutcome> {
        self.require_state("pair", SessionState::Linked)?;

        let command = antfs::pairing_request(self.config.host_serial, &self.config.host_name);
        let answer = self
            .exchange_retried("pair", &command, Exchange::Burst)
            .await?;

        let parsed = PairingAnswer::parse(&answer)?;
        info!(unit_id = parsed.unit_id, verdict = ?parsed.verdict, "Pairing answer");
        Ok(PairingOutcome {
            unit_id: parsed.unit_id,
            verdict: parsed.verdict,
            key: parsed.key,
        })
    }

    /// Present the stored passkey and move to the transport state.
    ///
    /// Under [`AuthPolicy::Advisory`] the device's verdict (and even a run
    /// of failed exchanges) is logged but not fatal; `Strict` demands an
    /// explicit acceptance.
    pub async fn authenticate(&mut self, key: u64) -> Result<AuthVerdict> {
        self.require_state("authenticate", SessionState::Linked)?;

        let command = antfs::passkey_request(self.config.host_serial, key);
        let outcome = self
            .exchange_retried("authenticate", &command, Exchange::Burst)
            .await;

        let verdict = match outcome {
            Ok(answer) => AuthAnswer::parse(&answer)?.verdict,
            Err(e)
                if self.config.auth_policy == AuthPolicy::Advisory
                    && !matches!(e, SessionError::Engine(antler_engine::EngineError::Stopped)) =>
            {
                warn!(error = %e, "Passkey exchange failed, proceeding on advisory policy");
                AuthVerdict::NotApplicable
            }
            Err(e) => return Err(e),
        };

        match verdict {
            AuthVerdict::Accepted => info!("Authentication accepted"),
            other => {
                warn!(verdict = ?other, "Authentication not accepted");
                if self.config.auth_policy == AuthPolicy::Strict {
                    return Err(SessionError::Rejected {
                        operation: "authenticate",
                    });
                }
            }
        }

        self.state = SessionState::Transport;
        Ok(verdict)
    }

    /// Download one file by index.
    ///
    /// Pages through the file: each iteration waits for a ready beacon,
    /// requests the next block at the current offset with the CRC seed from
    /// the previous packet's footer, and validates the answer's declared
    /// lengths against what actually arrived. Wait failures abort the whole
    /// download; there is no partial-result recovery.
    pub async fn download(&mut self, file_index: u16) -> Result<DownloadResult> {
        self.require_state("download", SessionState::Transport)?;
        debug!(file_index, "Starting download");

        let mut data = BytesMut::new();
        let mut crc = Crc16::new();
        let mut offset: u32 = 0;
        let mut seed: u16 = 0;
        let mut file_size: u32 = 0;
        let mut initial = true;

        loop {
            self.wait_for_ready_beacon().await?;

            let request = antfs::download_request(file_index, offset, initial, seed, 0);
            self.station
                .send_burst(self.config.channel, &request)
                .await?;

            let packet = self.station.wait_for_burst().await?;
            let header = DownloadHeader::parse(&packet)?;

            if header.response != DownloadResponse::Ok {
                return Err(SessionError::DownloadRefused {
                    response: header.response,
                });
            }

            if initial {
                file_size = header.file_size;
                debug!(file_index, file_size, "Download geometry");
                if file_size == 0 {
                    break;
                }
                initial = false;
            }

            let remain = header.data_remain as usize;
            let body_end = DownloadHeader::SIZE + remain;
            if packet.len() < body_end {
                return Err(
                    ProtocolError::truncated("download data", body_end, packet.len()).into(),
                );
            }
            let footer = DownloadFooter::parse(&packet[body_end..])?;

            let body = &packet[DownloadHeader::SIZE..body_end];
            crc.update(body);
            data.extend_from_slice(body);

            offset += header.data_remain;
            seed = footer.crc_seed;

            info!(
                file_index,
                offset,
                file_size,
                percent = 100 * offset as u64 / file_size.max(1) as u64,
                "Download progress"
            );

            if offset >= file_size {
                break;
            }
        }

        let crc_matched = crc.value() == seed;
        if !crc_matched && file_size > 0 {
            warn!(
                file_index,
                computed = format_args!("0x{:04X}", crc.value()),
                reported = format_args!("0x{seed:04X}"),
                "Download CRC mismatch"
            );
        }

        Ok(DownloadResult {
            data: data.freeze(),
            file_size,
            crc_matched,
        })
    }

    /// Download and parse the file directory (file index 0).
    pub async fn download_directory(&mut self) -> Result<Directory> {
        let result = self.download(0).await?;
        Ok(Directory::parse(&result.data)?)
    }

    // One attempt: ready beacon, then the command as acknowledged data.
    async fn try_acknowledged_command(&mut self, command: &Bytes) -> Result<()> {
        self.wait_for_ready_beacon().await?;
        self.station
            .send_acknowledged(self.config.channel, command)
            .await?;
        Ok(())
    }

    // One attempt of a command-then-burst-answer exchange.
    async fn try_exchange(&mut self, command: &Bytes, mode: Exchange) -> Result<Bytes> {
        self.wait_for_ready_beacon().await?;
        match mode {
            Exchange::Acknowledged => {
                self.station
                    .send_acknowledged(self.config.channel, command)
                    .await?;
            }
            Exchange::Burst => {
                self.station.send_burst(self.config.channel, command).await?;
            }
        }
        Ok(self.station.wait_for_burst().await?)
    }

    async fn exchange_retried(
        &mut self,
        operation: &'static str,
        command: &Bytes,
        mode: Exchange,
    ) -> Result<Bytes> {
        let attempts = self.attempt_budget();
        for attempt in 1..=attempts {
            match self.try_exchange(command, mode).await {
                Ok(answer) => return Ok(answer),
                Err(e) if e.is_retryable() => {
                    warn!(operation, attempt, error = %e, "Exchange attempt failed");
                }
                Err(e) => return Err(e),
            }
        }
        Err(SessionError::RetriesExhausted {
            operation,
            attempts,
        })
    }

    /// Wait for a beacon from a client that is not busy.
    ///
    /// Busy beacons and non-beacon broadcasts are skipped, but they charge
    /// against one overall deadline: a client that never stops beaconing
    /// Busy must not keep an attempt alive forever, or the retry budget
    /// never engages.
    async fn wait_for_ready_beacon(&mut self) -> Result<Beacon> {
        let budget = self.station.config().data_timeout;
        let started = tokio::time::Instant::now();
        loop {
            if started.elapsed() >= budget {
                return Err(
                    antler_engine::EngineError::timeout("ready beacon", budget).into(),
                );
            }
            let (_, beacon) = self.station.wait_for_broadcast().await?;
            match beacon {
                Some(beacon) if beacon.is_busy() => {
                    debug!("Client busy, waiting for the next beacon");
                }
                Some(beacon) => return Ok(beacon),
                // not an ANT-FS beacon; keep listening
                None => {}
            }
        }
    }

    fn attempt_budget(&self) -> u32 {
        self.config.retry_attempts.max(1)
    }

    fn require_state(&self, operation: &'static str, required: SessionState) -> Result<()> {
        if self.state == required {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                required,
                actual: self.state,
            })
        }
    }
}

/// How a session command is put on the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    /// Fits one frame: acknowledged data.
    Acknowledged,
    /// Larger than one frame: burst transfer.
    Burst,
}
