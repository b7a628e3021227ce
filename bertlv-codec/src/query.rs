//! Traversal and lookup over node trees

use bertlv_core::length::Length;
use bertlv_core::tag::Tag;

use crate::node::{Content, TlvNode};

impl TlvNode {
    /// Length of the content in canonical encoding
    pub fn content_len(&self) -> usize {
        match self.content() {
            Content::Primitive(value) => value.len(),
            Content::Constructed(children) => children.iter().map(TlvNode::encoded_size).sum(),
        }
    }

    /// Total canonical size of this node: tag, length and content
    ///
    /// Computed without producing any output bytes.
    pub fn encoded_size(&self) -> usize {
        let content_len = self.content_len();
        self.tag().encoded_len() + Length::Definite(content_len).encoded_len() + content_len
    }

    /// Follow a path of tags down from this node
    ///
    /// Each tag in `path` is matched against the direct children of the
    /// previous match. When several siblings share a tag, the first one
    /// through which the rest of the path can be followed is used. An empty
    /// path returns the node itself.
    pub fn find_first(&self, path: &[Tag]) -> Option<&TlvNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };
        self.children()
            .iter()
            .filter(|child| child.tag() == *head)
            .find_map(|child| child.find_first(rest))
    }

    /// Mutable variant of [`TlvNode::find_first`]
    pub fn find_first_mut(&mut self, path: &[Tag]) -> Option<&mut TlvNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };
        let index = self
            .children()
            .iter()
            .position(|child| child.tag() == *head && child.find_first(rest).is_some())?;
        self.children_mut()[index].find_first_mut(rest)
    }

    /// First descendant with `tag`, at any depth, in pre-order
    pub fn find(&self, tag: Tag) -> Option<&TlvNode> {
        self.iter().skip(1).find(|node| node.tag() == tag)
    }

    /// All descendants with `tag`, at any depth, in pre-order
    pub fn find_all(&self, tag: Tag) -> Vec<&TlvNode> {
        self.iter().skip(1).filter(|node| node.tag() == tag).collect()
    }

    /// Pre-order walk over this node and its whole subtree
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }
}

/// Follow a path of tags starting from a list of root nodes
///
/// The first tag selects among `roots`, as returned by a multi-root decode.
pub fn find_first_in<'a>(roots: &'a [TlvNode], path: &[Tag]) -> Option<&'a TlvNode> {
    let (head, rest) = path.split_first()?;
    roots
        .iter()
        .filter(|root| root.tag() == *head)
        .find_map(|root| root.find_first(rest))
}

/// Pre-order iterator over a node tree
pub struct Iter<'a> {
    stack: Vec<&'a TlvNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TlvNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

impl<'a> IntoIterator for &'a TlvNode {
    type Item = &'a TlvNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
