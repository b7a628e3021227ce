//! BER tag model
//!
//! A tag's identifier octets are laid out as:
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//!
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 when the number follows in
//!   base-128 continuation octets (bit 8 set on all but the last one)

use std::fmt;
use std::str::FromStr;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::error::{TlvError, TlvResult};
use crate::hex_util;

const CONSTRUCTED_BIT: u8 = 0x20;
const NUMBER_MASK: u8 = 0x1F;
const CONTINUATION_BIT: u8 = 0x80;
const MAX_SHORT_NUMBER: u32 = 30;

/// BER Tag Class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from the top two bits of an identifier octet
    pub fn from_bits(byte: u8) -> Self {
        match (byte >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Convert tag class to the top two bits of an identifier octet
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// BER Tag
///
/// Two tags are equal when class, constructed flag and number all match,
/// regardless of how their identifier octets were laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    class: TagClass,
    constructed: bool,
    number: u32,
}

impl Tag {
    /// End-of-contents marker tag (Universal, primitive, 0)
    pub const END_OF_CONTENTS: Tag = Tag::new(TagClass::Universal, false, 0);

    /// Create a new BER tag
    pub const fn new(class: TagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub const fn universal(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub const fn application(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub const fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub const fn private(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Private, constructed, number)
    }

    /// Create a tag from its identifier octets written as an integer literal
    ///
    /// This is how EMV and ISO 7816 documents name tags: `0x6F` is the FCI
    /// template, `0x9F4D` is Log Entry. Leading zero octets are ignored, so
    /// `0x00` is the end-of-contents tag.
    ///
    /// Tags are compared by class, constructed flag and number. A two-octet
    /// literal whose number is 30 or less is the non-minimal form of a
    /// one-octet tag: `0x9F02` equals `0x82` and encodes as `82`.
    ///
    /// # Error Handling
    /// Returns error if the octets are not exactly one tag encoding
    /// (e.g. `0x9F` alone announces a continuation octet that is missing).
    pub fn from_u32(raw: u32) -> TlvResult<Self> {
        let bytes = raw.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
        Self::from_encoded(&bytes[start..])
    }

    /// Decode a tag from a slice holding exactly one tag encoding
    pub fn from_encoded(data: &[u8]) -> TlvResult<Self> {
        let (tag, consumed) = Self::decode(data, 0)?;
        if consumed != data.len() {
            return Err(TlvError::TrailingGarbage { offset: consumed });
        }
        Ok(tag)
    }

    /// Get tag class
    pub fn class(&self) -> TagClass {
        self.class
    }

    /// Check if tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Check if this is the end-of-contents marker tag
    pub fn is_end_of_contents(&self) -> bool {
        *self == Self::END_OF_CONTENTS
    }

    /// Number of octets the canonical encoding of this tag occupies
    pub fn encoded_len(&self) -> usize {
        if self.number <= MAX_SHORT_NUMBER {
            1
        } else {
            1 + base128_digits(self.number)
        }
    }

    /// Write the canonical encoding of this tag into a buffer
    ///
    /// Tag numbers up to 30 use a single octet; larger numbers use the
    /// minimal count of base-128 continuation octets.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        let lead = self.class.to_bits() | if self.constructed { CONSTRUCTED_BIT } else { 0 };

        if self.number <= MAX_SHORT_NUMBER {
            buf.put_u8(lead | self.number as u8);
            return;
        }

        buf.put_u8(lead | NUMBER_MASK);
        let digits = base128_digits(self.number);
        for i in (0..digits).rev() {
            let digit = ((self.number >> (7 * i)) & 0x7F) as u8;
            if i > 0 {
                buf.put_u8(digit | CONTINUATION_BIT);
            } else {
                buf.put_u8(digit);
            }
        }
    }

    /// Encode tag to bytes (canonical form)
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut result);
        result
    }

    /// Decode a tag starting at `offset` in `data`
    ///
    /// # Returns
    /// Returns `Ok((Tag, bytes_consumed))` if successful
    ///
    /// Non-minimal multi-octet forms (leading `0x80` octets, or the
    /// multi-octet form used for numbers up to 30) are accepted.
    ///
    /// # Error Handling
    /// - `TruncatedInput` if the data ends before the last tag octet
    /// - `MalformedTag` if the tag number does not fit in 32 bits
    pub fn decode(data: &[u8], offset: usize) -> TlvResult<(Self, usize)> {
        let first_byte = *data
            .get(offset)
            .ok_or_else(|| TlvError::truncated(offset, 1, data))?;
        let class = TagClass::from_bits(first_byte);
        let constructed = (first_byte & CONSTRUCTED_BIT) != 0;
        let tag_bits = first_byte & NUMBER_MASK;

        if tag_bits != NUMBER_MASK {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        let mut number = 0u32;
        let mut pos = offset + 1;
        loop {
            let byte = *data
                .get(pos)
                .ok_or_else(|| TlvError::truncated(pos, 1, data))?;
            if number > (u32::MAX >> 7) {
                return Err(TlvError::MalformedTag {
                    offset,
                    reason: "tag number does not fit in 32 bits".to_string(),
                });
            }
            number = (number << 7) | (byte & 0x7F) as u32;
            pos += 1;
            if byte & CONTINUATION_BIT == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, number), pos - offset))
    }
}

fn base128_digits(number: u32) -> usize {
    let bits = (32 - number.leading_zeros()) as usize;
    bits.div_ceil(7).max(1)
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_util::encode_hex(&self.encode()))
    }
}

impl FromStr for Tag {
    type Err = TlvError;

    /// Parse a tag from hex text such as `"9F4D"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex_util::decode_hex(s)?;
        Self::from_encoded(&bytes)
    }
}
