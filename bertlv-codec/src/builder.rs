//! Builder for constructed nodes
//!
//! # Usage Example
//!
//! ```rust
//! use bertlv_codec::{encoder, Tag, TlvBuilder};
//!
//! let record = TlvBuilder::new(Tag::from_u32(0x70).unwrap())
//!     .add_uint(Tag::from_u32(0x9F36).unwrap(), 0x0102)?
//!     .add_bcd(Tag::from_u32(0x5F2A).unwrap(), 978, 2)?
//!     .build()?;
//! assert_eq!(encoder::encode(&record)[..2], [0x70, 0x0A]);
//! # Ok::<(), bertlv_codec::TlvError>(())
//! ```

use bertlv_core::error::{TlvError, TlvResult};
use bertlv_core::hex_util;
use bertlv_core::tag::Tag;

use crate::node::TlvNode;

/// Builder collecting the children of one constructed node
#[derive(Debug, Clone)]
pub struct TlvBuilder {
    tag: Tag,
    children: Vec<TlvNode>,
}

impl TlvBuilder {
    /// Start a constructed node with `tag`
    ///
    /// The tag is checked by [`TlvBuilder::build`].
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            children: Vec::new(),
        }
    }

    /// Add an already built node
    pub fn add_node(mut self, node: TlvNode) -> Self {
        self.children.push(node);
        self
    }

    /// Add a primitive node with raw value bytes
    pub fn add_bytes(self, tag: Tag, value: &[u8]) -> TlvResult<Self> {
        let node = TlvNode::primitive(tag, value)?;
        Ok(self.add_node(node))
    }

    /// Add a primitive node whose value is given as hex text
    pub fn add_hex(self, tag: Tag, hex: &str) -> TlvResult<Self> {
        let value = hex_util::decode_hex(hex)?;
        self.add_bytes(tag, &value)
    }

    /// Add a primitive node holding text bytes
    pub fn add_text(self, tag: Tag, text: &str) -> TlvResult<Self> {
        self.add_bytes(tag, text.as_bytes())
    }

    /// Add a primitive node holding `value` as a minimal big-endian integer
    ///
    /// Zero is encoded as a single `0x00` byte.
    pub fn add_uint(self, tag: Tag, value: u64) -> TlvResult<Self> {
        let bytes = value.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
        self.add_bytes(tag, &bytes[start..])
    }

    /// Add a primitive node holding `value` as packed BCD, left-padded with
    /// zeros to `width` bytes
    ///
    /// # Error Handling
    /// Returns `TlvError::InvalidValue` if the digits do not fit in `width`
    /// bytes.
    pub fn add_bcd(self, tag: Tag, value: u64, width: usize) -> TlvResult<Self> {
        let bytes = encode_bcd(value, width)?;
        self.add_bytes(tag, &bytes)
    }

    /// Finish the node
    ///
    /// # Error Handling
    /// Returns `TlvError::InvalidConstruction` if the builder's tag is
    /// primitive.
    pub fn build(self) -> TlvResult<TlvNode> {
        TlvNode::constructed(self.tag, self.children)
    }
}

fn encode_bcd(value: u64, width: usize) -> TlvResult<Vec<u8>> {
    let mut bytes = vec![0u8; width];
    let mut remaining = value;
    for byte in bytes.iter_mut().rev() {
        let low = (remaining % 10) as u8;
        let high = ((remaining / 10) % 10) as u8;
        *byte = (high << 4) | low;
        remaining /= 100;
    }
    if remaining != 0 {
        return Err(TlvError::InvalidValue(format!(
            "{} does not fit in {} BCD bytes",
            value, width
        )));
    }
    Ok(bytes)
}
