//! Hex text helpers
//!
//! EMV and smart-card traces are usually exchanged as hex text, often with
//! spaces or line breaks between bytes. These helpers accept that form and
//! always print upper-case hex without separators.

use crate::error::{TlvError, TlvResult};

/// Parse hex text into bytes, ignoring any whitespace
///
/// # Error Handling
/// Returns `TlvError::InvalidHex` for odd digit counts or non-hex characters.
pub fn decode_hex(text: &str) -> TlvResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    ::hex::decode(&compact).map_err(|e| TlvError::InvalidHex(format!("{:?}: {}", text, e)))
}

/// Format bytes as upper-case hex
pub fn encode_hex(bytes: &[u8]) -> String {
    ::hex::encode_upper(bytes)
}
