use obskey_rpc::CommandError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced when routing an action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("No OBS session (running disconnected)")]
    NoSession,

    #[error(transparent)]
    Command(#[from] CommandError),
}
