//! Export of the entry buffer as a downloadable JSON dump

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::buffer::Logger;
use super::entry::LogEntry;
use super::targets;
use crate::error::{Error, Result};

/// File name used when the caller does not pick one
pub const DEFAULT_DUMP_FILENAME: &str = "log-dump.json";

/// Directory downloads are written to: the user's downloads folder, else the working directory
pub fn download_dir() -> Result<PathBuf> {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .ok_or(Error::NoDownloadDirectory)
}

/// Parse a dump produced by [`Logger::to_json`] back into entries
pub fn load_dump<C: DeserializeOwned>(json: &str) -> Result<Vec<LogEntry<C>>> {
    Ok(serde_json::from_str(json)?)
}

impl<C> Logger<C>
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    /// Serialize the whole buffer as a JSON array indented by two spaces
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.all_entries())?)
    }

    /// Write the dump into the downloads directory and return its path
    pub fn download_log(&self, filename: Option<&str>) -> Result<PathBuf> {
        let dir = download_dir()?;
        self.download_log_to(&dir, filename)
    }

    /// Write the dump into `dir` and return its path
    pub fn download_log_to(&self, dir: &Path, filename: Option<&str>) -> Result<PathBuf> {
        let path = dir.join(filename.unwrap_or(DEFAULT_DUMP_FILENAME));
        let content = self.to_json()?;

        std::fs::write(&path, content).map_err(|source| {
            tracing::warn!(
                target: targets::DIAGNOSTICS,
                "Failed to write log dump {}: {}",
                path.display(),
                source
            );
            Error::Io {
                path: path.clone(),
                source,
            }
        })?;

        Ok(path)
    }
}
