//! # Replica Serde
//! Bit-level serialization used by the replica tick replication protocol.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_buffer;
mod constants;
mod error;
mod integer;
mod number;
mod pack;
mod serde;
mod string;

pub use bit_buffer::BitBuffer;
pub use constants::{ASCII_BITS, PACKED_COUNT_MAX, STRING_LENGTH_MAX, VARINT_FALLBACK_SIZE};
pub use error::SerdeErr;
pub use number::{log2, FloatCompressor, IntCompressor};
pub use serde::Serde;
