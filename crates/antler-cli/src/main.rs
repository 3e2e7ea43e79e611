//! `antler` — ANT / ANT-FS host for fitness devices.
//!
//! Talks to a USB ANT radio over a serial port and drives the ANT-FS
//! session against whatever client device answers the search: pair with a
//! new device, print its identity, download its activity files, or listen
//! to a heart-rate monitor.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use antler_engine::{AntStation, EngineError};
use antler_protocol::{AuthVerdict, HeartRateData, HeartRatePage};
use antler_session::{FsSession, SessionConfig};
use antler_transport::{ANT_BAUD_RATE, AnyTransport, SerialTransport};

mod channel;
mod store;

use store::{DownloadLog, KeyStore};

/// The one channel this host uses.
const CHANNEL: u8 = 0;

#[derive(Parser)]
#[command(name = "antler", version, about = "ANT / ANT-FS host for fitness devices")]
struct Cli {
    /// Serial port of the ANT radio
    #[arg(long, short, default_value = "/dev/ttyUSB0", env = "ANTLER_PORT")]
    port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = ANT_BAUD_RATE)]
    baud: u32,

    /// Pairing-key file
    #[arg(long, default_value = "antler.key")]
    key_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair with a device and store the passkey it issues
    Pair {
        /// Host name shown on the device's pairing prompt
        #[arg(long, default_value = "antler")]
        name: String,
    },
    /// Print the identity of the nearest device
    Info,
    /// Download activity files from a paired device
    Download {
        /// Specific file indices; defaults to every activity not yet fetched
        indices: Vec<u16>,
        /// Log of already-downloaded file indices
        #[arg(long, default_value = "downloaded.txt")]
        log: PathBuf,
        /// Directory for downloaded files
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Listen to a heart-rate monitor and print decoded broadcasts
    Hrm {
        /// How long to listen, in seconds
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Pair { name } => run_pair(&cli, name.clone()).await,
        Commands::Info => run_info(&cli).await,
        Commands::Download { indices, log, out } => {
            run_download(&cli, indices.clone(), log.clone(), out.clone()).await
        }
        Commands::Hrm { seconds } => run_hrm(&cli, *seconds).await,
    }
}

async fn open_station(cli: &Cli) -> Result<AntStation> {
    let transport = SerialTransport::open_with_baud(&cli.port, cli.baud).await?;
    Ok(AntStation::new(AnyTransport::Serial(transport)))
}

/// Bring up the ANT-FS channel and wrap it in a session.
async fn open_session(cli: &Cli, host_name: String) -> Result<FsSession> {
    let mut station = open_station(cli).await?;
    channel::bring_up(&mut station, CHANNEL, &channel::antfs_profile()).await?;
    Ok(FsSession::new(
        station,
        SessionConfig {
            channel: CHANNEL,
            host_name,
            ..SessionConfig::default()
        },
    ))
}

/// Disconnect, close the channel, and stop the engine.
async fn finish(mut session: FsSession) -> Result<()> {
    session.disconnect().await?;
    channel::tear_down(session.station_mut(), CHANNEL).await?;
    session.shutdown().await?;
    Ok(())
}

async fn run_pair(cli: &Cli, name: String) -> Result<()> {
    let mut session = open_session(cli, name).await?;

    session.link().await?;
    let identity = session.request_serial().await?;
    println!("Pairing with {} ({})", identity.unit_name, identity.unit_id);
    println!("Confirm on the device...");

    let outcome = session.pair().await?;
    let result = match outcome.verdict {
        AuthVerdict::Accepted => {
            KeyStore::new(&cli.key_file).save(outcome.key)?;
            println!("Paired; key stored in {}", cli.key_file.display());
            Ok(())
        }
        other => Err(anyhow!("device refused pairing ({other:?})")),
    };

    finish(session).await?;
    result
}

async fn run_info(cli: &Cli) -> Result<()> {
    let mut session = open_session(cli, "antler".into()).await?;

    session.link().await?;
    let identity = session.request_serial().await?;
    println!("Device:  {}", identity.unit_name);
    println!("Unit id: {}", identity.unit_id);

    finish(session).await
}

async fn run_download(cli: &Cli, indices: Vec<u16>, log: PathBuf, out: PathBuf) -> Result<()> {
    let key = KeyStore::new(&cli.key_file)
        .load()?
        .context("no pairing key stored; run `antler pair` first")?;
    let mut log = DownloadLog::open(log)?;

    let mut session = open_session(cli, "antler".into()).await?;
    session.link().await?;
    session.authenticate(key).await?;

    let wanted = if indices.is_empty() {
        let directory = session.download_directory().await?;
        info!(files = directory.entries.len(), "Directory read");
        directory.activity_indices()
    } else {
        indices
    };

    let mut fetched = 0usize;
    for index in wanted {
        if log.contains(index) {
            info!(index, "Already downloaded, skipping");
            continue;
        }

        let result = session.download(index).await?;
        if !result.crc_matched {
            warn!(index, "Stored file failed its checksum");
        }

        let path = out.join(format!("{index}.fit"));
        fs::write(&path, &result.data).with_context(|| format!("writing {}", path.display()))?;
        println!("{} ({} bytes)", path.display(), result.data.len());
        log.record(index)?;
        fetched += 1;
    }
    println!("{fetched} file(s) downloaded");

    finish(session).await
}

async fn run_hrm(cli: &Cli, seconds: u64) -> Result<()> {
    let mut station = open_station(cli).await?;
    channel::bring_up(&mut station, CHANNEL, &channel::hrm_profile()).await?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(seconds);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        let broadcast = tokio::time::timeout(remaining, station.wait_for_broadcast()).await;
        let payload = match broadcast {
            Ok(Ok((payload, _))) => payload,
            Ok(Err(EngineError::Timeout { .. })) => {
                warn!("No heart-rate monitor in range");
                continue;
            }
            Ok(Err(e)) => return Err(e.into()),
            // listening window over
            Err(_) => break,
        };

        match HeartRatePage::parse(&payload) {
            Ok(page) if page.is_valid() => print_heart_rate(&page),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Undecodable broadcast"),
        }
    }

    channel::tear_down(&mut station, CHANNEL).await?;
    station.shutdown().await?;
    Ok(())
}

fn print_heart_rate(page: &HeartRatePage) {
    match page.data {
        HeartRateData::PreviousBeat { .. } => {
            // beat clock ticks at 1024 Hz
            let rr_ms = u32::from(page.rr_interval().unwrap_or(0)) * 1000 / 1024;
            println!(
                "{:3} bpm  (beat {:3}, R-R {rr_ms} ms)",
                page.heart_rate, page.beat_count
            );
        }
        HeartRateData::OperatingTime { seconds } => {
            println!(
                "{:3} bpm  (worn {} h total)",
                page.heart_rate,
                seconds / 3600
            );
        }
        HeartRateData::ProductId { manufacturer, serial } => {
            println!(
                "{:3} bpm  (manufacturer {manufacturer}, serial {serial})",
                page.heart_rate
            );
        }
        HeartRateData::Version { hardware, software, model } => {
            println!(
                "{:3} bpm  (hw {hardware} sw {software} model {model})",
                page.heart_rate
            );
        }
        _ => println!("{:3} bpm  (beat {:3})", page.heart_rate, page.beat_count),
    }
}
