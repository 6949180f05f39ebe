use std::path::{Path, PathBuf};

use {thiserror::Error, tracing::debug};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store io: {0}")]
    Io(#[from] std::io::Error),
}

/// Persists opaque authentication credentials across restarts.
///
/// The lifecycle manager never inspects the blob: it hands it over on update
/// and back on startup. The store also owns the fixed local directory the
/// messaging library uses for its own session files.
pub trait SessionStore: Send + Sync {
    /// Directory the messaging library may use for its session database.
    fn dir(&self) -> &Path;

    fn persist(&self, blob: &[u8]) -> Result<(), SessionError>;

    fn load(&self) -> Result<Option<Vec<u8>>, SessionError>;
}

/// File-backed store: `credentials.bin` under a fixed local directory.
pub struct FsSessionStore {
    dir: PathBuf,
}

impl FsSessionStore {
    /// Creates the directory if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn credentials_path(&self) -> PathBuf {
        self.dir.join("credentials.bin")
    }
}

impl SessionStore for FsSessionStore {
    fn dir(&self) -> &Path {
        &self.dir
    }

    fn persist(&self, blob: &[u8]) -> Result<(), SessionError> {
        // Write-then-rename so a crash mid-write never truncates the live file.
        let tmp = self.dir.join("credentials.bin.tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, self.credentials_path())?;
        debug!(bytes = blob.len(), "persisted session credentials");
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<u8>>, SessionError> {
        match std::fs::read(self.credentials_path()) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
