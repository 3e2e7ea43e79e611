//! On-disk state: the pairing key and the downloaded-file log.
//!
//! Both are deliberately plain text so a user can inspect or edit them:
//! the key file holds one 16-digit uppercase hex number, the download log
//! one decimal file index per line.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// The pairing passkey a device issued, persisted between runs.
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the stored key, or `None` if no key has been saved yet.
    pub fn load(&self) -> Result<Option<u64>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        let key = u64::from_str_radix(text.trim(), 16)
            .with_context(|| format!("{} does not hold a hex key", self.path.display()))?;
        Ok(Some(key))
    }

    /// Store a key, replacing any previous one.
    pub fn save(&self, key: u64) -> Result<()> {
        fs::write(&self.path, format!("{key:016X}\n"))
            .with_context(|| format!("writing {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Pairing key saved");
        Ok(())
    }
}

/// Append-only log of file indices already downloaded.
///
/// Lets a download run resume at file granularity: indices present in the
/// log are skipped on the next run.
pub struct DownloadLog {
    path: PathBuf,
    seen: HashSet<u16>,
}

impl DownloadLog {
    /// Open the log, reading any indices recorded by previous runs.
    ///
    /// A missing file is an empty log; unparsable lines are skipped with a
    /// warning so a hand-edited file cannot brick the download.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut seen = HashSet::new();

        match fs::read_to_string(&path) {
            Ok(text) => {
                for line in text.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match line.parse::<u16>() {
                        Ok(index) => {
                            seen.insert(index);
                        }
                        Err(_) => warn!(path = %path.display(), line, "Ignoring bad log line"),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        }

        debug!(path = %path.display(), entries = seen.len(), "Download log open");
        Ok(Self { path, seen })
    }

    /// Whether this file index was already downloaded.
    pub fn contains(&self, index: u16) -> bool {
        self.seen.contains(&index)
    }

    /// Record a completed download, appending to the file immediately.
    pub fn record(&mut self, index: u16) -> Result<()> {
        if !self.seen.insert(index) {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        writeln!(file, "{index}").with_context(|| format!("appending {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
