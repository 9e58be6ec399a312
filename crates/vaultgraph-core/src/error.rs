pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Model payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
