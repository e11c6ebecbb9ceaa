//! Streamer error types.

use thiserror::Error;

pub type StreamerResult<T> = Result<T, StreamerError>;

#[derive(Debug, Error)]
pub enum StreamerError {
    /// The streamer only handles single-sequence generation.
    #[error("text streamer only supports batch size 1, got {got}")]
    UnsupportedBatchSize { got: usize },

    /// Detokenizer failure, passed through unchanged.
    #[error(transparent)]
    Decode(#[from] anyhow::Error),

    #[error("invalid streamer config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid streamer config: {0}")]
    InvalidConfig(String),
}
