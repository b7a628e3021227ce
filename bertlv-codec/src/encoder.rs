//! BER-TLV encoder
//!
//! Serializes a node tree into canonical bytes: minimal tag octets and
//! minimal definite lengths. Indefinite length is never produced, even for
//! trees decoded from indefinite-length input.
//!
//! # Usage Example
//!
//! ```rust
//! use bertlv_codec::{encoder, Tag, TlvNode};
//!
//! let name = TlvNode::primitive(Tag::context_specific(false, 4), vec![0xA0, 0x00]).unwrap();
//! assert_eq!(encoder::encode(&name), vec![0x84, 0x02, 0xA0, 0x00]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use bertlv_core::length::Length;
use bertlv_core::tag::Tag;

use crate::node::{Content, TlvNode};

/// Write the canonical encoding of `node` into any byte buffer
///
/// Children are written after the parent's length, which is computed
/// bottom-up from the content without encoding it twice.
pub fn encode_into<B: BufMut>(node: &TlvNode, buf: &mut B) {
    node.tag().write_to(buf);
    Length::Definite(node.content_len()).write_to(buf);
    match node.content() {
        Content::Primitive(value) => buf.put_slice(value),
        Content::Constructed(children) => {
            for child in children {
                encode_into(child, buf);
            }
        }
    }
}

/// Encode one node
pub fn encode(node: &TlvNode) -> Vec<u8> {
    let mut result = Vec::with_capacity(node.encoded_size());
    encode_into(node, &mut result);
    result
}

/// Encode several root nodes back to back
pub fn encode_all(nodes: &[TlvNode]) -> Vec<u8> {
    let mut result = Vec::with_capacity(nodes.iter().map(TlvNode::encoded_size).sum());
    for node in nodes {
        encode_into(node, &mut result);
    }
    result
}

/// Buffer accumulating encoded TLVs
///
/// Useful when a message is assembled from several trees or from value
/// bytes that are already encoded.
pub struct Encoder {
    buffer: BytesMut,
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Create a new encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a node tree
    pub fn write_node(&mut self, node: &TlvNode) {
        self.buffer.reserve(node.encoded_size());
        encode_into(node, &mut self.buffer);
    }

    /// Append a raw TLV triplet
    ///
    /// `value` is written verbatim after the tag and a definite length, so
    /// for constructed tags it must already hold encoded child nodes.
    pub fn write_tlv(&mut self, tag: &Tag, value: &[u8]) {
        tag.write_to(&mut self.buffer);
        Length::Definite(value.len()).write_to(&mut self.buffer);
        self.buffer.put_slice(value);
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
