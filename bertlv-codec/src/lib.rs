//! BER-TLV tree codec
//!
//! This crate turns BER-TLV bytes into an owned node tree and back:
//!
//! - [`decoder`]: lenient recursive-descent decoding (definite and
//!   indefinite lengths, non-minimal tag and length forms)
//! - [`encoder`]: canonical encoding (minimal definite lengths)
//! - [`query`]: path lookup, subtree search and sizing
//! - [`builder`]: assembling constructed nodes from typed values
//! - [`dump`]: indented text rendering for logs
//!
//! Data flow: bytes → [`Decoder`] → [`TlvNode`] tree → [`encoder::encode`]
//! → bytes.

pub mod builder;
pub mod decoder;
pub mod dump;
pub mod encoder;
pub mod node;
pub mod query;

pub use bertlv_core::{Length, Tag, TagClass, TlvError, TlvResult};
pub use builder::TlvBuilder;
pub use decoder::{Decoder, DecoderConfig, decode, decode_one, decode_prefix};
pub use dump::{dump, log_tree};
pub use encoder::{Encoder, encode, encode_all, encode_into};
pub use node::{Content, TlvNode};
pub use query::find_first_in;
