use thiserror::Error;

/// Top-level application error, one variant per subsystem boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::ports::PersistenceError),

    #[error("Transport error: {0}")]
    Transport(#[from] crate::fetch::FetchError),
}
