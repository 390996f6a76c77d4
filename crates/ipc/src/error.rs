//! Errors raised while encoding or decoding protocol lines.

/// Errors that can occur while handling a protocol line.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty message line")]
    EmptyLine,

    #[error("Message of {len} bytes exceeds the {limit} byte limit")]
    TooLarge { len: usize, limit: usize },
}
