//! Rendering of fetched byte ranges for transport

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::{BASE64_TEXT, OCTET_STREAM};

/// Wire encoding of a fetched range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Representation {
    /// Raw octets, passed through verbatim
    Binary,
    /// Padded standard-alphabet base64 text
    #[default]
    Base64,
}

impl Representation {
    /// Pick a representation from a content-type hint.
    ///
    /// Only `application/octet-stream` (parameters and case ignored) selects
    /// binary; anything else, including no hint, is base64.
    pub fn from_content_type(hint: Option<&str>) -> Self {
        let media_type = hint
            .and_then(|h| h.split(';').next())
            .map(str::trim)
            .unwrap_or_default();
        if media_type.eq_ignore_ascii_case(OCTET_STREAM) {
            Self::Binary
        } else {
            Self::Base64
        }
    }

    /// Content type the rendered payload is declared as
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Binary => OCTET_STREAM,
            Self::Base64 => BASE64_TEXT,
        }
    }
}

/// A rendered range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Binary(Vec<u8>),
    Base64(String),
}

impl Payload {
    pub fn representation(&self) -> Representation {
        match self {
            Self::Binary(_) => Representation::Binary,
            Self::Base64(_) => Representation::Base64,
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.representation().content_type()
    }
}

/// Render raw bytes in the requested representation. Pure.
pub fn render(bytes: Vec<u8>, representation: Representation) -> Payload {
    match representation {
        Representation::Binary => Payload::Binary(bytes),
        Representation::Base64 => Payload::Base64(STANDARD.encode(bytes)),
    }
}
