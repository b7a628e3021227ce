//! TLV node tree
//!
//! A node pairs a [`Tag`] with its content: raw value bytes for primitive
//! tags, an ordered list of child nodes for constructed tags. The length is
//! never stored; it is always derived from the content when encoding.

use serde::{Deserialize, Serialize};

use bertlv_core::error::{TlvError, TlvResult};
use bertlv_core::hex_util;
use bertlv_core::tag::Tag;

/// Content of a TLV node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    /// Opaque value bytes of a primitive tag
    Primitive(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Nested nodes of a constructed tag
    Constructed(Vec<TlvNode>),
}

/// A BER-TLV node owning its whole subtree
///
/// The tag's constructed bit always agrees with the content variant; every
/// constructor checks this, so encoding a node never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedNode")]
pub struct TlvNode {
    tag: Tag,
    content: Content,
}

#[derive(Deserialize)]
struct UncheckedNode {
    tag: Tag,
    content: Content,
}

impl TryFrom<UncheckedNode> for TlvNode {
    type Error = TlvError;

    fn try_from(raw: UncheckedNode) -> TlvResult<Self> {
        TlvNode::new(raw.tag, raw.content)
    }
}

impl TlvNode {
    /// Create a node, checking that the tag matches the content kind
    ///
    /// # Error Handling
    /// Returns `TlvError::InvalidConstruction` if a primitive tag is paired
    /// with children or a constructed tag with raw value bytes.
    pub fn new(tag: Tag, content: Content) -> TlvResult<Self> {
        match (&content, tag.is_constructed()) {
            (Content::Primitive(_), false) | (Content::Constructed(_), true) => {
                Ok(Self::from_parts(tag, content))
            }
            (Content::Primitive(_), true) => Err(TlvError::InvalidConstruction(format!(
                "tag {} is constructed but was given a primitive value",
                tag
            ))),
            (Content::Constructed(_), false) => Err(TlvError::InvalidConstruction(format!(
                "tag {} is primitive but was given child nodes",
                tag
            ))),
        }
    }

    /// Create a primitive node
    pub fn primitive(tag: Tag, value: impl Into<Vec<u8>>) -> TlvResult<Self> {
        Self::new(tag, Content::Primitive(value.into()))
    }

    /// Create a constructed node
    pub fn constructed(tag: Tag, children: Vec<TlvNode>) -> TlvResult<Self> {
        Self::new(tag, Content::Constructed(children))
    }

    /// Build a node whose tag/content agreement the caller already checked
    pub(crate) fn from_parts(tag: Tag, content: Content) -> Self {
        Self { tag, content }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn into_content(self) -> Content {
        self.content
    }

    pub fn is_constructed(&self) -> bool {
        self.tag.is_constructed()
    }

    /// Value bytes of a primitive node, `None` for constructed nodes
    pub fn value(&self) -> Option<&[u8]> {
        match &self.content {
            Content::Primitive(value) => Some(value),
            Content::Constructed(_) => None,
        }
    }

    /// Child nodes; empty for primitive nodes
    pub fn children(&self) -> &[TlvNode] {
        match &self.content {
            Content::Primitive(_) => &[],
            Content::Constructed(children) => children,
        }
    }

    /// Mutable child nodes; empty for primitive nodes
    pub fn children_mut(&mut self) -> &mut [TlvNode] {
        match &mut self.content {
            Content::Primitive(_) => Default::default(),
            Content::Constructed(children) => children,
        }
    }

    /// Append a child to a constructed node
    pub fn push_child(&mut self, child: TlvNode) -> TlvResult<()> {
        match &mut self.content {
            Content::Constructed(children) => {
                children.push(child);
                Ok(())
            }
            Content::Primitive(_) => Err(TlvError::InvalidConstruction(format!(
                "cannot add child {} to primitive tag {}",
                child.tag, self.tag
            ))),
        }
    }

    /// Replace the value of a primitive node
    pub fn set_value(&mut self, value: impl Into<Vec<u8>>) -> TlvResult<()> {
        match &mut self.content {
            Content::Primitive(current) => {
                *current = value.into();
                Ok(())
            }
            Content::Constructed(_) => Err(TlvError::InvalidConstruction(format!(
                "cannot set a value on constructed tag {}",
                self.tag
            ))),
        }
    }

    fn primitive_value(&self) -> TlvResult<&[u8]> {
        self.value().ok_or_else(|| {
            TlvError::InvalidValue(format!("constructed tag {} has no value bytes", self.tag))
        })
    }

    /// Value bytes as upper-case hex, `None` for constructed nodes
    pub fn value_hex(&self) -> Option<String> {
        self.value().map(hex_util::encode_hex)
    }

    /// Value bytes as UTF-8 text (EMV `an`/`ans` fields are plain ASCII)
    pub fn value_text(&self) -> TlvResult<&str> {
        let value = self.primitive_value()?;
        std::str::from_utf8(value).map_err(|e| {
            TlvError::InvalidValue(format!("value of tag {} is not text: {}", self.tag, e))
        })
    }

    /// Value bytes as a big-endian unsigned integer (EMV `b` numeric fields)
    ///
    /// An empty value is zero. Values wider than 8 bytes are rejected.
    pub fn value_uint(&self) -> TlvResult<u64> {
        let value = self.primitive_value()?;
        if value.len() > 8 {
            return Err(TlvError::InvalidValue(format!(
                "value of tag {} has {} bytes, more than fits in u64",
                self.tag,
                value.len()
            )));
        }
        Ok(value.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Value bytes as packed BCD digits (EMV `n` fields such as amounts)
    pub fn value_bcd(&self) -> TlvResult<u64> {
        let value = self.primitive_value()?;
        let mut result = 0u64;
        for &byte in value {
            for digit in [byte >> 4, byte & 0x0F] {
                if digit > 9 {
                    return Err(TlvError::InvalidValue(format!(
                        "value of tag {} is not BCD: nibble {:X}",
                        self.tag, digit
                    )));
                }
                result = result
                    .checked_mul(10)
                    .and_then(|r| r.checked_add(digit as u64))
                    .ok_or_else(|| {
                        TlvError::InvalidValue(format!(
                            "BCD value of tag {} overflows u64",
                            self.tag
                        ))
                    })?;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn df_name() -> TlvNode {
        TlvNode::primitive(Tag::context_specific(false, 4), b"12345678".to_vec()).unwrap()
    }

    #[test]
    fn test_construction_checks_tag_kind() {
        let err = TlvNode::primitive(Tag::application(true, 15), vec![0x01]).unwrap_err();
        assert!(matches!(err, TlvError::InvalidConstruction(_)));

        let err = TlvNode::constructed(Tag::context_specific(false, 4), vec![]).unwrap_err();
        assert!(matches!(err, TlvError::InvalidConstruction(_)));
    }

    #[test]
    fn test_children_and_value() {
        let fci = TlvNode::constructed(Tag::application(true, 15), vec![df_name()]).unwrap();
        assert_eq!(fci.children().len(), 1);
        assert_eq!(fci.value(), None);

        let name = &fci.children()[0];
        assert!(name.children().is_empty());
        assert_eq!(name.value(), Some(&b"12345678"[..]));
    }

    #[test]
    fn test_push_child() {
        let mut fci = TlvNode::constructed(Tag::application(true, 15), vec![]).unwrap();
        fci.push_child(df_name()).unwrap();
        assert_eq!(fci.children().len(), 1);

        let mut name = df_name();
        assert!(name.push_child(df_name()).is_err());
        assert!(name.children_mut().is_empty());
    }

    #[test]
    fn test_set_value() {
        let mut name = df_name();
        name.set_value(vec![0xA0, 0x00]).unwrap();
        assert_eq!(name.value_hex().as_deref(), Some("A000"));

        let mut fci = TlvNode::constructed(Tag::application(true, 15), vec![]).unwrap();
        assert!(fci.set_value(vec![0x00]).is_err());
    }

    #[test]
    fn test_value_helpers() {
        let name = df_name();
        assert_eq!(name.value_text().unwrap(), "12345678");
        assert_eq!(name.value_hex().unwrap(), "3132333435363738");

        let amount_tag = Tag::from_u32(0x9F5D).unwrap();
        let amount =
            TlvNode::primitive(amount_tag, vec![0x00, 0x00, 0x00, 0x01, 0x23, 0x45]).unwrap();
        assert_eq!(amount.value_bcd().unwrap(), 12345);
        assert_eq!(amount.value_uint().unwrap(), 0x012345);

        let not_bcd = TlvNode::primitive(Tag::from_u32(0x9F5D).unwrap(), vec![0x1A]).unwrap();
        assert!(matches!(not_bcd.value_bcd(), Err(TlvError::InvalidValue(_))));

        let wide = TlvNode::primitive(Tag::from_u32(0x9F5D).unwrap(), vec![0x01; 9]).unwrap();
        assert!(matches!(wide.value_uint(), Err(TlvError::InvalidValue(_))));

        let fci = TlvNode::constructed(Tag::application(true, 15), vec![]).unwrap();
        assert!(fci.value_text().is_err());
        assert_eq!(fci.value_hex(), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let fci = TlvNode::constructed(Tag::application(true, 15), vec![df_name()]).unwrap();
        let json = serde_json::to_string(&fci).unwrap();
        let back: TlvNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fci);
    }

    #[test]
    fn test_serde_rejects_mismatched_content() {
        let fci = TlvNode::constructed(Tag::application(true, 15), vec![]).unwrap();
        let json = serde_json::to_string(&fci)
            .unwrap()
            .replace("\"constructed\":true", "\"constructed\":false");
        assert!(serde_json::from_str::<TlvNode>(&json).is_err());
    }
}
