//! Value codec and type descriptor parser for the Cassandra native protocol.
//!
//! Decodes and encodes the `[bytes]`-framed cell payloads a CQL driver
//! exchanges with a server, and the recursive `<type>` descriptor that
//! describes their shape in result metadata and prepared-statement
//! signatures. See [`decode::decode_cell`], [`encode::encode_cell`], and
//! [`descriptor::TypeDescriptor`].

#![allow(clippy::module_name_repetitions)]

pub mod bignum;
pub mod config;
pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod error;
pub mod parser;
pub mod reader;
pub mod value;
pub mod writer;

pub use bignum::BigInt;
pub use config::CodecConfig;
pub use decode::decode_cell;
pub use descriptor::TypeDescriptor;
pub use encode::encode_cell;
pub use error::{Error, ErrorCategory, Result};
pub use reader::ByteReader;
pub use value::CqlValue;
pub use writer::ByteWriter;
