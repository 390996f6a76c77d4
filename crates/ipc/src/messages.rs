//! Request and response enums plus the line envelope.

use serde::{Deserialize, Serialize};

use crate::error::IpcError;
use crate::types::{CanvasBody, ErrorCode};

/// Longest accepted request line
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Requests from a client to the canvas service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientToCanvas {
    /// Clear and reseed the whole canvas
    Reset,

    /// Set one cell. Fields are signed so out-of-range input reaches
    /// validation instead of failing to parse.
    Draw { x: i64, y: i64, value: i64 },

    /// Whole canvas; `application/octet-stream` asks for raw bytes,
    /// anything else for base64
    Fetch {
        #[serde(default)]
        content_type: Option<String>,
    },
}

/// Responses from the canvas service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CanvasToClient {
    /// Every cell has been seeded
    ResetComplete,

    /// The cell was written
    Drawn { x: u32, y: u32, value: u16 },

    /// Packed canvas bytes
    Canvas {
        content_type: String,
        body: CanvasBody,
    },

    /// Failure, with every violated constraint described in `message`
    Error { code: ErrorCode, message: String },
}

impl CanvasToClient {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

/// One protocol line: a message tagged with the caller's correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub id: u64,
    pub message: T,
}

impl<T> Envelope<T> {
    pub fn new(id: u64, message: T) -> Self {
        Self { id, message }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Encode as a single JSON line without the trailing newline
    pub fn to_line(&self) -> Result<String, IpcError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: for<'de> Deserialize<'de>> Envelope<T> {
    /// Decode one JSON line
    pub fn from_line(line: &str) -> Result<Self, IpcError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(IpcError::EmptyLine);
        }
        if line.len() > MAX_LINE_BYTES {
            return Err(IpcError::TooLarge {
                len: line.len(),
                limit: MAX_LINE_BYTES,
            });
        }
        Ok(serde_json::from_str(line)?)
    }
}
