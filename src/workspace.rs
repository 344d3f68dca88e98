use crate::error::SubtitleError;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PREFIX: &str = "yt-subtitles-";

/// A uniquely named scratch directory owned by one retrieval.
///
/// Call [`WorkingArea::release`] to remove it and observe failures; if the
/// area is dropped instead, removal is attempted silently.
#[derive(Debug)]
pub struct WorkingArea {
    dir: TempDir,
}

impl WorkingArea {
    /// Creates a new directory under the system temp dir.
    pub fn create() -> io::Result<Self> {
        Self::create_in(std::env::temp_dir())
    }

    pub fn create_in(parent: impl AsRef<Path>) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir_in(parent)?;
        Ok(Self { dir })
    }

    /// Creates the area on the blocking pool, under `parent` when given.
    pub async fn acquire(parent: Option<PathBuf>) -> io::Result<Self> {
        tokio::task::spawn_blocking(move || match parent {
            Some(parent) => Self::create_in(parent),
            None => Self::create(),
        })
        .await
        .map_err(io::Error::other)?
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory and everything written into it.
    pub fn release(self) -> Result<(), SubtitleError> {
        let path: PathBuf = self.dir.path().to_path_buf();
        self.dir.close().map_err(|err| SubtitleError::CleanupFailed {
            path,
            reason: err.to_string(),
        })
    }

    /// [`WorkingArea::release`] on the blocking pool.
    pub async fn release_async(self) -> Result<(), SubtitleError> {
        let path = self.dir.path().to_path_buf();
        tokio::task::spawn_blocking(move || self.release())
            .await
            .map_err(|err| SubtitleError::CleanupFailed {
                path,
                reason: format!("background task failed: {err}"),
            })?
    }
}
