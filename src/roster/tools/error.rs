use std::path::PathBuf;

use thiserror::Error;

use crate::roster::tools::remote::RemoteError;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the failures that stop the tool before any team is
/// processed: unreadable rosters, broken configuration, or an unreachable
/// organization.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading the roster or configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the CSV reader implementation.
    #[error("CSV read error: {0}")]
    CsvRead(#[from] csv::Error),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the roster file extension is not one we can read.
    #[error("unsupported roster format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the configuration file cannot be parsed.
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Raised when a setting needed by the requested action is absent.
    #[error("missing configuration value '{0}'")]
    MissingSetting(&'static str),

    /// Raised when talking to the remote host fails during startup.
    #[error("remote host error: {0}")]
    Remote(#[from] RemoteError),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
