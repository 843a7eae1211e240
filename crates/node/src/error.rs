//! A bunch of wrap errors.

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors of the node daemon.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Ring error: {0}")]
    Ring(#[from] rings_chord::error::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid logging level: {0}")]
    InvalidLoggingLevel(String),
    #[error("Create file error: {0}")]
    CreateFileError(#[source] std::io::Error),
    #[error("Open file error: {0}")]
    OpenFileError(#[source] std::io::Error),
    #[error("Encode yaml error: {0}")]
    EncodeError(#[source] serde_yaml::Error),
    #[error("Decode yaml error: {0}")]
    DecodeError(#[source] serde_yaml::Error),
    #[error("Cannot find home directory")]
    HomeDirError,
    #[error("Cannot find parent directory")]
    ParentDirError,
}
