//! BER-TLV decoder
//!
//! Turns a byte buffer into a tree of [`TlvNode`]s by recursive descent.
//! Each node is read as tag, then length, then either the value bytes
//! (primitive) or the nested nodes (constructed). Constructed content may
//! use a definite length or the indefinite form closed by an end-of-contents
//! marker.
//!
//! # Usage Example
//!
//! ```rust
//! use bertlv_codec::decoder;
//!
//! let data = [0x6F, 0x03, 0x84, 0x01, 0xA0];
//! let roots = decoder::decode(&data).unwrap();
//! assert_eq!(roots.len(), 1);
//! ```
//!
//! # Error Handling
//!
//! Decoding is all-or-nothing: the first problem aborts the whole call and
//! no partial tree is returned. Errors carry the absolute offset into the
//! input buffer.

use log::{debug, trace};

use bertlv_core::error::{TlvError, TlvResult};
use bertlv_core::length::Length;
use bertlv_core::tag::Tag;

use crate::node::{Content, TlvNode};

const END_OF_CONTENTS: u8 = 0x00;
const PADDING: u8 = 0xFF;

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    max_depth: usize,
    allow_indefinite: bool,
    skip_padding: bool,
}

impl DecoderConfig {
    /// Default nesting limit
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            allow_indefinite: true,
            skip_padding: false,
        }
    }

    /// Maximum number of nested levels; a root node is level 1
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Accept or reject indefinite lengths
    ///
    /// Rejecting them gives a strict profile in which every length is
    /// definite, as DER requires.
    pub fn with_indefinite(mut self, allow: bool) -> Self {
        self.allow_indefinite = allow;
        self
    }

    /// Skip `0x00` and `0xFF` padding bytes before, between and after nodes
    ///
    /// EMV card records are padded this way. Inside indefinite-length
    /// content only `0xFF` is skipped, since `0x00` starts the
    /// end-of-contents marker.
    pub fn with_padding_skip(mut self, skip: bool) -> Self {
        self.skip_padding = skip;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn allows_indefinite(&self) -> bool {
        self.allow_indefinite
    }

    pub fn skips_padding(&self) -> bool {
        self.skip_padding
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// BER-TLV decoder
///
/// Holds only configuration; every call works on its own input and output,
/// so one decoder can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode every root node in `data`
    ///
    /// BER-TLV streams (EMV records, APDU responses) often hold several
    /// top-level nodes back to back. Empty input yields an empty vector.
    pub fn decode(&self, data: &[u8]) -> TlvResult<Vec<TlvNode>> {
        let mut cursor = Cursor::new(data, self.config);
        let mut roots = Vec::new();
        loop {
            cursor.skip_padding(data.len(), true);
            if cursor.position >= data.len() {
                break;
            }
            let start = cursor.position;
            let node = cursor.read_node(data.len(), 1)?;
            trace!(
                "Decoded root {} at offset {} ({} bytes)",
                node.tag(),
                start,
                cursor.position - start
            );
            roots.push(node);
        }
        Ok(roots)
    }

    /// Decode exactly one root node
    ///
    /// # Error Handling
    /// - `TruncatedInput` if `data` holds no node at all
    /// - `TrailingGarbage` if bytes remain after the root node
    pub fn decode_one(&self, data: &[u8]) -> TlvResult<TlvNode> {
        let (node, consumed) = self.decode_prefix(data)?;
        let mut cursor = Cursor::new(data, self.config);
        cursor.position = consumed;
        cursor.skip_padding(data.len(), true);
        if cursor.position != data.len() {
            debug!("Trailing bytes after root {} at offset {}", node.tag(), cursor.position);
            return Err(TlvError::TrailingGarbage {
                offset: cursor.position,
            });
        }
        Ok(node)
    }

    /// Decode the first root node and report how many bytes it used
    ///
    /// Leading padding (when enabled) counts towards the consumed bytes.
    /// Bytes after the node are left untouched for the next call.
    pub fn decode_prefix(&self, data: &[u8]) -> TlvResult<(TlvNode, usize)> {
        let mut cursor = Cursor::new(data, self.config);
        cursor.skip_padding(data.len(), true);
        let node = cursor.read_node(data.len(), 1)?;
        Ok((node, cursor.position))
    }
}

/// Decode every root node with the default configuration
pub fn decode(data: &[u8]) -> TlvResult<Vec<TlvNode>> {
    Decoder::default().decode(data)
}

/// Decode exactly one root node with the default configuration
pub fn decode_one(data: &[u8]) -> TlvResult<TlvNode> {
    Decoder::default().decode_one(data)
}

/// Decode the first root node with the default configuration
pub fn decode_prefix(data: &[u8]) -> TlvResult<(TlvNode, usize)> {
    Decoder::default().decode_prefix(data)
}

/// Read position over the input buffer
///
/// Every read takes an explicit `end` bound: the end of the enclosing
/// definite-length content, or the end of the buffer.
struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
    config: DecoderConfig,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            data,
            position: 0,
            config,
        }
    }

    fn skip_padding(&mut self, end: usize, allow_zero: bool) {
        if !self.config.skip_padding {
            return;
        }
        let start = self.position;
        while self.position < end {
            let byte = self.data[self.position];
            if byte == PADDING || (allow_zero && byte == 0x00) {
                self.position += 1;
            } else {
                break;
            }
        }
        if self.position > start {
            trace!("Skipped {} padding bytes at offset {}", self.position - start, start);
        }
    }

    /// Check that `len` content bytes fit before `end`
    fn content_end(&self, end: usize, len: usize) -> TlvResult<usize> {
        let available = end - self.position;
        if len > available {
            return Err(TlvError::TruncatedInput {
                offset: self.position,
                needed: len,
                available,
            });
        }
        Ok(self.position + len)
    }

    fn read_node(&mut self, end: usize, depth: usize) -> TlvResult<TlvNode> {
        let start = self.position;
        if depth > self.config.max_depth {
            debug!(
                "Nesting limit {} exceeded at offset {}",
                self.config.max_depth, start
            );
            return Err(TlvError::NestingTooDeep {
                offset: start,
                limit: self.config.max_depth,
            });
        }

        let bounded = &self.data[..end];
        let (tag, tag_len) = Tag::decode(bounded, self.position)?;
        self.position += tag_len;
        let length_offset = self.position;
        let (length, length_len) = Length::decode(bounded, self.position)?;
        self.position += length_len;

        let content = match (length, tag.is_constructed()) {
            (Length::Definite(len), false) => {
                let value_end = self.content_end(end, len)?;
                let value = self.data[self.position..value_end].to_vec();
                self.position = value_end;
                Content::Primitive(value)
            }
            (Length::Indefinite, false) => {
                return Err(TlvError::MalformedLength {
                    offset: length_offset,
                    reason: format!("indefinite length on primitive tag {}", tag),
                });
            }
            (Length::Definite(len), true) => {
                let content_end = self.content_end(end, len)?;
                let children = self.read_children(content_end, depth + 1)?;
                Content::Constructed(children)
            }
            (Length::Indefinite, true) => {
                if !self.config.allow_indefinite {
                    return Err(TlvError::MalformedLength {
                        offset: length_offset,
                        reason: "indefinite length is not allowed".to_string(),
                    });
                }
                trace!("Indefinite length for {} at offset {}", tag, start);
                let children = self.read_until_end_of_contents(end, depth + 1, start)?;
                Content::Constructed(children)
            }
        };

        Ok(TlvNode::from_parts(tag, content))
    }

    /// Read nodes filling exactly the definite-length range up to `end`
    fn read_children(&mut self, end: usize, depth: usize) -> TlvResult<Vec<TlvNode>> {
        let mut children = Vec::new();
        loop {
            self.skip_padding(end, true);
            if self.position >= end {
                return Ok(children);
            }
            let child_start = self.position;
            let child = self.read_node(end, depth).map_err(|err| match err {
                TlvError::TruncatedInput { .. } => {
                    debug!(
                        "Child at offset {} runs past its parent's content ending at {}",
                        child_start, end
                    );
                    TlvError::TrailingGarbage {
                        offset: child_start,
                    }
                }
                other => other,
            })?;
            children.push(child);
        }
    }

    /// Read nodes until the end-of-contents marker, consuming the marker
    ///
    /// Only a literal `0x00` tag octet starts the marker. A non-minimal
    /// encoding of tag 0 such as `1F 00 00` is read as an ordinary child.
    fn read_until_end_of_contents(
        &mut self,
        end: usize,
        depth: usize,
        node_start: usize,
    ) -> TlvResult<Vec<TlvNode>> {
        let mut children = Vec::new();
        loop {
            self.skip_padding(end, false);
            if self.position >= end {
                return Err(TlvError::UnterminatedIndefiniteLength { offset: node_start });
            }

            if self.data[self.position] == END_OF_CONTENTS {
                let length_offset = self.position + 1;
                let (length, length_len) = Length::decode(&self.data[..end], length_offset)
                    .map_err(|err| match err {
                        TlvError::TruncatedInput { .. } => {
                            TlvError::UnterminatedIndefiniteLength { offset: node_start }
                        }
                        other => other,
                    })?;
                if length != Length::Definite(0) {
                    return Err(TlvError::MalformedLength {
                        offset: length_offset,
                        reason: "end-of-contents marker with non-zero length".to_string(),
                    });
                }
                self.position = length_offset + length_len;
                return Ok(children);
            }

            children.push(self.read_node(end, depth)?);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder;
    use bertlv_core::tag::TagClass;

    const FCI: [u8; 12] = [
        0x6F, 0x0A, 0x84, 0x08, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38,
    ];

    #[test]
    fn test_decode_fci() {
        let roots = decode(&FCI).unwrap();
        assert_eq!(roots.len(), 1);

        let root = &roots[0];
        assert_eq!(root.tag(), Tag::application(true, 15));
        assert_eq!(root.children().len(), 1);

        let name = root.find_first(&[Tag::from_u32(0x84).unwrap()]).unwrap();
        assert_eq!(name.value(), Some(&b"12345678"[..]));
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode(&[]).unwrap().is_empty());
        assert!(matches!(
            decode_one(&[]),
            Err(TlvError::TruncatedInput { offset: 0, .. })
        ));
    }

    #[test]
    fn test_decode_multiple_roots() {
        let data = [0x5A, 0x02, 0x12, 0x34, 0x9F, 0x02, 0x01, 0x00, 0x50, 0x00];
        let roots = decode(&data).unwrap();
        assert_eq!(roots.len(), 3);
        assert_eq!(roots[1].tag(), Tag::context_specific(false, 2));
        assert_eq!(roots[2].value(), Some(&[][..]));
    }

    #[test]
    fn test_decode_one_rejects_trailing_bytes() {
        let mut data = FCI.to_vec();
        data.push(0x90);
        assert_eq!(
            decode_one(&data).unwrap_err(),
            TlvError::TrailingGarbage { offset: 12 }
        );
        assert_eq!(decode_one(&FCI).unwrap().tag(), Tag::application(true, 15));
    }

    #[test]
    fn test_decode_prefix_leaves_rest() {
        let mut data = FCI.to_vec();
        data.extend_from_slice(&[0x90, 0x00]);
        let (node, consumed) = decode_prefix(&data).unwrap();
        assert_eq!(consumed, 12);
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn test_truncated_primitive_prefixes() {
        let node = [0x9F, 0x02, 0x03, 0x00, 0x10, 0x00];
        for cut in 1..node.len() {
            let err = decode(&node[..cut]).unwrap_err();
            assert!(
                matches!(err, TlvError::TruncatedInput { .. }),
                "prefix of {} bytes gave {:?}",
                cut,
                err
            );
        }
    }

    #[test]
    fn test_truncated_constructed() {
        assert_eq!(
            decode(&FCI[..6]).unwrap_err(),
            TlvError::TruncatedInput {
                offset: 2,
                needed: 10,
                available: 4
            }
        );
    }

    #[test]
    fn test_child_overrunning_parent() {
        // Parent declares 3 content bytes, child declares 5
        let data = [0x6F, 0x03, 0x84, 0x05, 0x31, 0x32, 0x33, 0x34, 0x35];
        assert_eq!(
            decode(&data).unwrap_err(),
            TlvError::TrailingGarbage { offset: 2 }
        );
    }

    #[test]
    fn test_indefinite_matches_definite() {
        let indefinite = [
            0x6F, 0x80, 0x84, 0x02, 0xA0, 0x00, 0xA5, 0x80, 0x50, 0x01, 0x41, 0x00, 0x00, 0x00,
            0x00,
        ];
        let definite = [
            0x6F, 0x09, 0x84, 0x02, 0xA0, 0x00, 0xA5, 0x03, 0x50, 0x01, 0x41,
        ];
        let from_indefinite = decode_one(&indefinite).unwrap();
        assert_eq!(from_indefinite, decode_one(&definite).unwrap());
        assert_eq!(encoder::encode(&from_indefinite), definite.to_vec());
    }

    #[test]
    fn test_unterminated_indefinite() {
        let data = [0x30, 0x80, 0x04, 0x01, 0xAA];
        assert_eq!(
            decode(&data).unwrap_err(),
            TlvError::UnterminatedIndefiniteLength { offset: 0 }
        );

        let data = [0x30, 0x80, 0x04, 0x01, 0xAA, 0x00];
        assert_eq!(
            decode(&data).unwrap_err(),
            TlvError::UnterminatedIndefiniteLength { offset: 0 }
        );
    }

    #[test]
    fn test_indefinite_bounded_by_parent() {
        // The inner indefinite node must close inside its parent's 4 bytes
        let data = [0x30, 0x04, 0x30, 0x80, 0x05, 0x00, 0x00, 0x00];
        assert_eq!(
            decode(&data).unwrap_err(),
            TlvError::UnterminatedIndefiniteLength { offset: 2 }
        );
    }

    #[test]
    fn test_end_of_contents_with_length() {
        let data = [0x30, 0x80, 0x00, 0x01, 0x00];
        assert!(matches!(
            decode(&data),
            Err(TlvError::MalformedLength { offset: 3, .. })
        ));
    }

    #[test]
    fn test_non_minimal_end_of_contents_is_a_child() {
        // 1F 00 00 is tag 0 in long form, so only the final 00 00 closes
        let data = [0x30, 0x80, 0x1F, 0x00, 0x00, 0x00, 0x00];
        let node = decode_one(&data).unwrap();
        assert_eq!(node.children().len(), 1);
        assert!(node.children()[0].tag().is_end_of_contents());
        assert_eq!(node.children()[0].value(), Some(&[][..]));
    }

    #[test]
    fn test_indefinite_on_primitive() {
        let data = [0x04, 0x80, 0x01, 0x00, 0x00];
        assert!(matches!(
            decode(&data),
            Err(TlvError::MalformedLength { offset: 1, .. })
        ));
    }

    #[test]
    fn test_indefinite_disallowed() {
        let decoder = Decoder::new(DecoderConfig::default().with_indefinite(false));
        let data = [0x30, 0x80, 0x00, 0x00];
        assert!(matches!(
            decoder.decode(&data),
            Err(TlvError::MalformedLength { offset: 1, .. })
        ));
    }

    #[test]
    fn test_nesting_too_deep() {
        let mut data = vec![0x04, 0x00];
        for _ in 0..5 {
            let mut outer = vec![0x30, data.len() as u8];
            outer.extend_from_slice(&data);
            data = outer;
        }

        let decoder = Decoder::new(DecoderConfig::default().with_max_depth(6));
        assert!(decoder.decode(&data).is_ok());

        let decoder = Decoder::new(DecoderConfig::default().with_max_depth(5));
        assert_eq!(
            decoder.decode(&data).unwrap_err(),
            TlvError::NestingTooDeep {
                offset: 10,
                limit: 5
            }
        );
    }

    #[test]
    fn test_nesting_too_deep_indefinite() {
        let mut data = Vec::new();
        for _ in 0..100 {
            data.extend_from_slice(&[0x30, 0x80]);
        }
        for _ in 0..100 {
            data.extend_from_slice(&[0x00, 0x00]);
        }
        assert!(matches!(
            decode(&data),
            Err(TlvError::NestingTooDeep { limit: 32, .. })
        ));
    }

    #[test]
    fn test_malformed_tag_and_length() {
        let data = [0x1F, 0x90, 0x80, 0x80, 0x80, 0x00, 0x00];
        assert!(matches!(
            decode(&data),
            Err(TlvError::MalformedTag { offset: 0, .. })
        ));

        let data = [0x84, 0xFF];
        assert!(matches!(
            decode(&data),
            Err(TlvError::MalformedLength { offset: 1, .. })
        ));
    }

    #[test]
    fn test_non_minimal_input_reencodes_minimal() {
        let data = [0x7F, 0x0F, 0x81, 0x05, 0x84, 0x81, 0x02, 0xA0, 0x00];
        let node = decode_one(&data).unwrap();
        assert_eq!(node.tag(), Tag::new(TagClass::Application, true, 15));
        assert_eq!(encoder::encode(&node), vec![0x6F, 0x04, 0x84, 0x02, 0xA0, 0x00]);
    }

    #[test]
    fn test_padding_skip() {
        let data = [
            0x00, 0x70, 0x06, 0x5A, 0x01, 0x11, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0x00,
        ];
        let decoder = Decoder::new(DecoderConfig::default().with_padding_skip(true));
        let roots = decoder.decode(&data).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children().len(), 1);
        assert_eq!(decoder.decode_one(&data).unwrap(), roots[0]);

        // Without skipping, the leading 0x00 is read as a tag whose length overruns
        assert!(matches!(
            decode(&data),
            Err(TlvError::TruncatedInput { offset: 2, .. })
        ));
    }

    #[test]
    fn test_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Decoder>();
        assert_send_sync::<TlvNode>();
    }

    #[test]
    fn test_padding_skip_keeps_end_of_contents() {
        let data = [0x30, 0x80, 0xFF, 0x04, 0x00, 0xFF, 0x00, 0x00];
        let decoder = Decoder::new(DecoderConfig::default().with_padding_skip(true));
        let node = decoder.decode_one(&data).unwrap();
        assert_eq!(node.children().len(), 1);
    }
}
