//! BerTlv - Rust implementation of BER-TLV encoding
//!
//! BER-TLV (Basic Encoding Rules, Tag-Length-Value, ISO/IEC 8825-1) frames
//! the data exchanged with smart cards, EMV payment applications and
//! cryptographic tokens.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `bertlv-core`: Tag and length models, error handling, hex helpers
//! - `bertlv-codec`: Node tree, decoder, encoder, queries, builder, dump
//!
//! # Usage
//!
//! ```rust
//! use bertlv::{Tag, decode, encode};
//!
//! let bytes = [0x6F, 0x0A, 0x84, 0x08, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38];
//! let roots = decode(&bytes)?;
//! let df_name = roots[0].find_first(&[Tag::from_u32(0x84)?]).unwrap();
//! assert_eq!(df_name.value_text()?, "12345678");
//! assert_eq!(encode(&roots[0]), bytes.to_vec());
//! # Ok::<(), bertlv::TlvError>(())
//! ```

pub use bertlv_core::{Length, Tag, TagClass, TlvError, TlvResult, decode_hex, encode_hex};
pub use bertlv_codec::{
    Content, Decoder, DecoderConfig, Encoder, TlvBuilder, TlvNode, decode, decode_one,
    decode_prefix, dump, encode, encode_all, encode_into, find_first_in, log_tree,
};
