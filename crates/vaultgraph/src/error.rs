pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling client configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}
