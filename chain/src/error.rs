use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no RPC endpoints configured")]
    NoEndpoints,

    #[error("HTTP client setup failed: {0}")]
    Setup(String),

    #[error("transport error from {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("{label} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        label: String,
        attempts: u32,
        last: Box<ChainError>,
    },
}
