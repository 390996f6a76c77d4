/// Content type that selects the raw binary representation.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type declared for base64 payloads.
pub const BASE64_TEXT: &str = "text/plain";

/// Bits per byte in the packed buffer.
pub const BITS_PER_BYTE: u64 = 8;
