use std::path::PathBuf;

use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in this crate.
///
/// Log calls themselves never fail; these cover export, scope lookup and configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Entries could not be serialized or parsed.
    #[error("Log dump JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing or reading a file failed.
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither a downloads directory nor a working directory could be determined.
    #[error("No download directory available")]
    NoDownloadDirectory,

    /// A logger was requested outside of a logger provider.
    #[error("Logger requested outside of a logger provider")]
    NoProvider,

    /// A named logger was requested without a registry in scope.
    #[error("Named logger requested outside of a registry provider")]
    NoRegistry,

    /// The logger in scope uses a different context type.
    #[error("Logger in scope does not use context type {expected}")]
    ContextTypeMismatch { expected: &'static str },

    /// Configuration file could not be parsed.
    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),
}
