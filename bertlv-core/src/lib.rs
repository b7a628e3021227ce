//! Core types for BER-TLV encoding
//!
//! This crate provides the tag and length models, error handling and hex
//! helpers used throughout the BER-TLV implementation.

pub mod error;
pub mod hex_util;
pub mod length;
pub mod tag;

pub use error::{TlvError, TlvResult};
pub use hex_util::{decode_hex, encode_hex};
pub use length::Length;
pub use tag::{Tag, TagClass};
