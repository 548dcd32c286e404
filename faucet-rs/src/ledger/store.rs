//! File-backed ledger persistence
//!
//! The whole ledger is written as one JSON snapshot. Writes go to a sibling
//! `.tmp` file which is synced and then renamed over the live file, so a
//! reader only ever sees a complete snapshot.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::types::{Ledger, LedgerFile, LEDGER_SCHEMA_VERSION};
use crate::error::{FaucetError, Result};

/// Durable home of the ledger
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LedgerStore { path: path.into() }
    }

    /// Location of the live snapshot
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the ledger. A missing file is an empty ledger.
    pub async fn load(&self) -> Result<Ledger> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No ledger at {}, starting empty", self.path.display());
                return Ok(Ledger::new());
            }
            Err(e) => {
                return Err(FaucetError::Storage(format!(
                    "Failed to read ledger {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        self.decode(&bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Ledger> {
        let file: LedgerFile = serde_json::from_slice(bytes).map_err(|e| {
            FaucetError::Storage(format!(
                "Malformed ledger {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if file.version != LEDGER_SCHEMA_VERSION {
            return Err(FaucetError::Storage(format!(
                "Unsupported ledger version {} in {} (expected {})",
                file.version,
                self.path.display(),
                LEDGER_SCHEMA_VERSION
            )));
        }

        Ok(file.into())
    }

    /// Replace the persisted ledger with `ledger`
    pub async fn save(&self, ledger: &Ledger) -> Result<()> {
        let payload = serde_json::to_vec_pretty(&LedgerFile::from(ledger))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    FaucetError::Storage(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let tmp_path = self.tmp_path();
        self.write_synced(&tmp_path, &payload).await.map_err(|e| {
            FaucetError::Storage(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;

        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            FaucetError::Storage(format!(
                "Failed to replace ledger {}: {}",
                self.path.display(),
                e
            ))
        })?;

        self.sync_parent().await.map_err(|e| {
            FaucetError::Storage(format!(
                "Failed to sync directory of {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Saved {} ledger entries to {}", ledger.len(), self.path.display());
        Ok(())
    }

    /// Flush the rename itself to disk
    #[cfg(unix)]
    async fn sync_parent(&self) -> std::io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::File::open(parent).await?.sync_all().await
    }

    #[cfg(not(unix))]
    async fn sync_parent(&self) -> std::io::Result<()> {
        Ok(())
    }

    async fn write_synced(&self, path: &Path, payload: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(payload).await?;
        file.sync_all().await
    }
}
