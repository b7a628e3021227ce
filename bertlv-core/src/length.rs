//! BER length model
//!
//! Short form (lengths 0-127):
//! ```text
//! Byte: 0 L L L L L L L
//! ```
//!
//! Long form:
//! ```text
//! First byte:  1 N N N N N N N  (N = number of length bytes, 1-126)
//! Following bytes: L L L L L L L L  (big-endian length value)
//! ```
//!
//! The single byte `0x80` announces indefinite length: the content runs
//! until an end-of-contents marker (`00 00`). `0xFF` is reserved.

use bytes::BufMut;

use crate::error::{TlvError, TlvResult};

const LONG_FORM_BIT: u8 = 0x80;
const INDEFINITE: u8 = 0x80;
const RESERVED: u8 = 0xFF;
const MAX_LENGTH_BYTES: usize = std::mem::size_of::<usize>();

/// BER Length encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    /// Content length in bytes
    Definite(usize),
    /// Content terminated by an end-of-contents marker
    Indefinite,
}

impl Length {
    /// Get the definite length value, `None` for indefinite length
    pub fn definite(&self) -> Option<usize> {
        match self {
            Length::Definite(len) => Some(*len),
            Length::Indefinite => None,
        }
    }

    /// Check if this is the indefinite form
    pub fn is_indefinite(&self) -> bool {
        matches!(self, Length::Indefinite)
    }

    /// Number of octets the canonical encoding occupies
    pub fn encoded_len(&self) -> usize {
        match self {
            Length::Definite(len) if *len < 0x80 => 1,
            Length::Definite(len) => 1 + significant_bytes(*len),
            Length::Indefinite => 1,
        }
    }

    /// Write the canonical encoding into a buffer
    ///
    /// Definite lengths use the short form when possible and otherwise the
    /// long form with the minimal number of length bytes.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        match *self {
            Length::Definite(len) if len < 0x80 => buf.put_u8(len as u8),
            Length::Definite(len) => {
                let num_bytes = significant_bytes(len);
                buf.put_u8(LONG_FORM_BIT | num_bytes as u8);
                for i in (0..num_bytes).rev() {
                    buf.put_u8((len >> (i * 8)) as u8);
                }
            }
            Length::Indefinite => buf.put_u8(INDEFINITE),
        }
    }

    /// Encode length to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut result);
        result
    }

    /// Decode a length starting at `offset` in `data`
    ///
    /// # Returns
    /// Returns `Ok((Length, bytes_consumed))` if successful
    ///
    /// Long forms with more bytes than needed are accepted.
    ///
    /// # Error Handling
    /// - `TruncatedInput` if the data ends inside the length field
    /// - `MalformedLength` for the reserved `0xFF` octet, a length-of-length
    ///   wider than `usize`, or a value that overflows `usize`
    pub fn decode(data: &[u8], offset: usize) -> TlvResult<(Self, usize)> {
        let first_byte = *data
            .get(offset)
            .ok_or_else(|| TlvError::truncated(offset, 1, data))?;

        if first_byte & LONG_FORM_BIT == 0 {
            return Ok((Length::Definite(first_byte as usize), 1));
        }
        if first_byte == INDEFINITE {
            return Ok((Length::Indefinite, 1));
        }
        if first_byte == RESERVED {
            return Err(TlvError::MalformedLength {
                offset,
                reason: "reserved length octet 0xFF".to_string(),
            });
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes > MAX_LENGTH_BYTES {
            return Err(TlvError::MalformedLength {
                offset,
                reason: format!(
                    "length with {} bytes exceeds {} byte limit",
                    num_bytes, MAX_LENGTH_BYTES
                ),
            });
        }
        let start = offset + 1;
        if data.len().saturating_sub(start) < num_bytes {
            return Err(TlvError::truncated(start, num_bytes, data));
        }

        let mut length = 0usize;
        for &byte in &data[start..start + num_bytes] {
            length = length
                .checked_mul(256)
                .map(|l| l | byte as usize)
                .ok_or_else(|| TlvError::MalformedLength {
                    offset,
                    reason: "length value overflows usize".to_string(),
                })?;
        }

        Ok((Length::Definite(length), 1 + num_bytes))
    }
}

fn significant_bytes(value: usize) -> usize {
    let bits = (usize::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8).max(1)
}
