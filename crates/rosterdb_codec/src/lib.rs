//! # rosterdb Codec
//!
//! Wire-format primitives shared by the backend adapters:
//!
//! - [`FrameWriter`] / [`FrameReader`] - a length-prefixed binary record
//!   stream with CBOR payloads, terminated by a sentinel end marker
//! - [`XmlElement`] - a minimal XML document model with a quick-xml
//!   reader/writer behind it
//! - [`read_delimited`] / [`write_delimited`] - delimited-text record IO
//!
//! The codec layer is format-only: it moves raw records in and out of
//! their wire shapes and knows nothing about domain types or backends.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod frame;
mod text;
mod xml;

pub use error::{CodecError, CodecResult};
pub use frame::{decode_record, encode_record, FrameReader, FrameWriter, MAX_FRAME_LEN};
pub use text::{read_delimited, write_delimited, FIELD_DELIMITER};
pub use xml::XmlElement;
