//! Append-only audit log.
//!
//! Records every accepted command verbatim and every emitted frame, one
//! per line, in arrival order. There is no rotation.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Permissions for a newly created log file.
const LOG_FILE_MODE: u32 = 0o600;

/// Open handle on the audit log file.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: File,
}

impl AuditLog {
    /// Opens `path` for appending, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(LOG_FILE_MODE)
            .open(&path)
            .await
            .map_err(|e| AuditError::Open {
                path: path.clone(),
                source: e,
            })?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `bytes` and flushes them to the file.
    pub async fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes).await?;
        self.file.flush().await
    }
}

/// Errors opening the audit log.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
