use thiserror::Error;

/// Errors raised while decoding or validating signaling frames.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed message: {0}")]
    Malformed(String),
}
