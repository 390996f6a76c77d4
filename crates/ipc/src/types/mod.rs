//! Type definitions for IPC messages.

use serde::{Deserialize, Serialize};

/// Machine-readable failure category carried by error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Coordinate outside the canvas
    OutOfBounds,
    /// Value does not fit the cell width
    InvalidValue,
    /// Several constraints broken at once, or the request itself was malformed
    InvalidRequest,
    /// Backend unreachable or errored
    StoreUnavailable,
    /// Store call exceeded its deadline
    Timeout,
}

/// Canvas bytes as carried inside a JSON message.
///
/// JSON has no raw byte type, so binary bodies are base64 encoded on the wire
/// and decoded back into octets. Text bodies are already base64 and pass as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasBody {
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    Text(String),
}

impl CanvasBody {
    /// Octet count for `Bytes`, text length for `Text`
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(bytes) => bytes.len(),
            Self::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
