/// Longest string that fits the length prefix of [`BitBuffer::write_string`](crate::BitBuffer::write_string)
pub const STRING_LENGTH_MAX: usize = 63;

/// Characters are restricted to the 7-bit ASCII table
pub const ASCII_BITS: u32 = 7;

/// Compressors that need more bits than this write a varint instead
pub const VARINT_FALLBACK_SIZE: u32 = 10;

/// Upper bound on the number of items in a single packed list
pub const PACKED_COUNT_MAX: u8 = 255;

pub(crate) const PACKED_COUNT_BITS: u32 = 8;
