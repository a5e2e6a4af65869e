use log::warn;

use crate::{bit_buffer::BitBuffer, constants::VARINT_FALLBACK_SIZE, error::SerdeErr};

const DE_BRUIJN_LOOKUP: [u32; 32] = [
    0, 9, 1, 10, 13, 21, 2, 29, 11, 14, 16, 18, 22, 25, 3, 30, 8, 12, 20, 28, 15, 17, 24, 7, 19,
    27, 23, 6, 26, 5, 4, 31,
];

/// Floor of the base 2 logarithm, `log2(0) == 0`
pub const fn log2(mut value: u32) -> u32 {
    // round down to one less than a power of 2
    value |= value >> 1;
    value |= value >> 2;
    value |= value >> 4;
    value |= value >> 8;
    value |= value >> 16;
    DE_BRUIJN_LOOKUP[(value.wrapping_mul(0x07C4_ACDD) >> 27) as usize]
}

fn mask_for(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Packs integers in `[min, max]` into the smallest number of bits able to
/// hold the range.
///
/// Out-of-range values are not rejected: they are logged and masked into
/// the range, so sender and receiver keep reading the same bit widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntCompressor {
    min: i32,
    max: i32,
    mask: u32,
    required_bits: u32,
}

impl IntCompressor {
    pub fn new(min: i32, max: i32) -> Self {
        let required_bits = if min >= max {
            0
        } else {
            let range = (i64::from(max) - i64::from(min)) as u32;
            log2(range) + 1
        };
        Self {
            min,
            max,
            mask: mask_for(required_bits),
            required_bits,
        }
    }

    pub fn required_bits(&self) -> u32 {
        self.required_bits
    }

    pub fn pack(&self, value: i32) -> u32 {
        if value < self.min || value > self.max {
            warn!(
                "Clamping value for send! {} vs. [{},{}]",
                value, self.min, self.max
            );
        }
        (value.wrapping_sub(self.min) as u32) & self.mask
    }

    pub fn unpack(&self, data: u32) -> i32 {
        (data as i32).wrapping_add(self.min)
    }
}

/// Packs floats in `[min, max]` with a fixed precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatCompressor {
    min: f32,
    max: f32,
    precision: f32,
    inv_precision: f32,
    mask: u32,
    required_bits: u32,
}

impl FloatCompressor {
    pub fn new(min: f32, max: f32, precision: f32) -> Self {
        let inv_precision = 1.0 / precision;
        let steps = (max - min) * inv_precision;
        let required_bits = log2((steps + 0.5) as u32) + 1;
        Self {
            min,
            max,
            precision,
            inv_precision,
            mask: mask_for(required_bits),
            required_bits,
        }
    }

    pub fn required_bits(&self) -> u32 {
        self.required_bits
    }

    pub fn pack(&self, value: f32) -> u32 {
        let clamped = value.clamp(self.min, self.max);
        if clamped != value {
            warn!(
                "Clamping value for send! {} vs. [{},{}]",
                value, self.min, self.max
            );
        }
        let adjusted = (clamped - self.min) * self.inv_precision;
        ((adjusted + 0.5) as u32) & self.mask
    }

    pub fn unpack(&self, data: u32) -> f32 {
        let adjusted = (data as f32 * self.precision) + self.min;
        adjusted.clamp(self.min, self.max)
    }
}

// Compressed values
impl BitBuffer {
    fn write_packed(&mut self, bits: u32, packed: u32) {
        if bits > VARINT_FALLBACK_SIZE {
            self.write_uint(packed);
        } else {
            self.write(bits, packed);
        }
    }

    fn read_packed(&mut self, bits: u32) -> Result<u32, SerdeErr> {
        if bits > VARINT_FALLBACK_SIZE {
            self.read_uint()
        } else {
            self.read(bits)
        }
    }

    fn peek_packed(&self, bits: u32) -> Result<u32, SerdeErr> {
        if bits > VARINT_FALLBACK_SIZE {
            self.peek_uint()
        } else {
            self.peek(bits)
        }
    }

    pub fn write_compressed_int(&mut self, compressor: &IntCompressor, value: i32) {
        self.write_packed(compressor.required_bits(), compressor.pack(value));
    }

    pub fn read_compressed_int(&mut self, compressor: &IntCompressor) -> Result<i32, SerdeErr> {
        let packed = self.read_packed(compressor.required_bits())?;
        Ok(compressor.unpack(packed))
    }

    pub fn peek_compressed_int(&self, compressor: &IntCompressor) -> Result<i32, SerdeErr> {
        let packed = self.peek_packed(compressor.required_bits())?;
        Ok(compressor.unpack(packed))
    }

    pub fn write_compressed_float(&mut self, compressor: &FloatCompressor, value: f32) {
        self.write_packed(compressor.required_bits(), compressor.pack(value));
    }

    pub fn read_compressed_float(
        &mut self,
        compressor: &FloatCompressor,
    ) -> Result<f32, SerdeErr> {
        let packed = self.read_packed(compressor.required_bits())?;
        Ok(compressor.unpack(packed))
    }

    pub fn peek_compressed_float(&self, compressor: &FloatCompressor) -> Result<f32, SerdeErr> {
        let packed = self.peek_packed(compressor.required_bits())?;
        Ok(compressor.unpack(packed))
    }
}
