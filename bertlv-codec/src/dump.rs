//! Human-readable rendering of node trees
//!
//! Each node becomes one line, indented two spaces per nesting level:
//!
//! ```text
//! - 6F [10]
//!   - 84 [8] 3132333435363738
//! ```

use std::fmt::{self, Write};

use log::debug;

use bertlv_core::hex_util;

use crate::node::{Content, TlvNode};

fn write_node<W: Write>(out: &mut W, node: &TlvNode, level: usize) -> fmt::Result {
    write!(out, "{:indent$}- {} [{}]", "", node.tag(), node.content_len(), indent = level * 2)?;
    match node.content() {
        Content::Primitive(value) if value.is_empty() => writeln!(out),
        Content::Primitive(value) => writeln!(out, " {}", hex_util::encode_hex(value)),
        Content::Constructed(children) => {
            writeln!(out)?;
            for child in children {
                write_node(out, child, level + 1)?;
            }
            Ok(())
        }
    }
}

/// Render root nodes as an indented tree, one line per node
pub fn dump(nodes: &[TlvNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        // Writing into a String cannot fail
        let _ = write_node(&mut out, node, 0);
    }
    out
}

/// Emit the rendering of `nodes` through the `log` facade at debug level
pub fn log_tree(nodes: &[TlvNode]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    for line in dump(nodes).lines() {
        debug!("{}", line);
    }
}

impl fmt::Display for TlvNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_node(&mut out, self, 0)?;
        f.write_str(out.trim_end())
    }
}
