use crate::{bit_buffer::BitBuffer, error::SerdeErr};

const VARINT_GROUP_BITS: u32 = 7;
const VARINT_CONTINUE: u32 = 0x80;
const VARINT_MAX_BYTES: usize = 5;

// Byte
impl BitBuffer {
    pub fn write_byte(&mut self, value: u8) {
        self.write(8, u32::from(value));
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        Ok(self.read(8)? as u8)
    }

    pub fn peek_byte(&self) -> Result<u8, SerdeErr> {
        Ok(self.peek(8)? as u8)
    }
}

// Bool
impl BitBuffer {
    pub fn write_bool(&mut self, value: bool) {
        self.write(1, u32::from(value));
    }

    pub fn read_bool(&mut self) -> Result<bool, SerdeErr> {
        Ok(self.read(1)? > 0)
    }

    pub fn peek_bool(&self) -> Result<bool, SerdeErr> {
        Ok(self.peek(1)? > 0)
    }
}

// UInt
impl BitBuffer {
    /// Writes using an elastic number of bytes based on the value:
    ///
    /// | value range             | bytes |
    /// |-------------------------|-------|
    /// | 0 ..= 127               | 1     |
    /// | 128 ..= 16383           | 2     |
    /// | 16384 ..= 2097151       | 3     |
    /// | 2097152 ..= 268435455   | 4     |
    /// | 268435456 ..= u32::MAX  | 5     |
    pub fn write_uint(&mut self, mut value: u32) {
        loop {
            let mut group = value & 0x7F;
            value >>= VARINT_GROUP_BITS;

            if value > 0 {
                group |= VARINT_CONTINUE;
            }

            self.write(8, group);

            if value == 0 {
                return;
            }
        }
    }

    pub fn read_uint(&mut self) -> Result<u32, SerdeErr> {
        let (value, bits) = self.uint_at(self.read_pos())?;
        self.advance_read(bits);
        Ok(value)
    }

    pub fn peek_uint(&self) -> Result<u32, SerdeErr> {
        let (value, _) = self.uint_at(self.read_pos())?;
        Ok(value)
    }

    fn uint_at(&self, position: usize) -> Result<(u32, usize), SerdeErr> {
        let mut value: u64 = 0;
        let mut shift = 0;

        for index in 0..VARINT_MAX_BYTES {
            let group = self.peek_at(position + (index * 8), 8)?;
            value |= u64::from(group & 0x7F) << shift;
            shift += VARINT_GROUP_BITS;

            if group & VARINT_CONTINUE == 0 {
                if value > u64::from(u32::MAX) {
                    return Err(SerdeErr::VarIntOverflow);
                }
                return Ok((value as u32, (index + 1) * 8));
            }
        }

        Err(SerdeErr::VarIntOverflow)
    }
}

// Int
impl BitBuffer {
    /// Zig-zag encodes the value so that small magnitudes of either sign
    /// stay small on the wire
    pub fn write_int(&mut self, value: i32) {
        self.write_uint(zig_zag(value));
    }

    pub fn read_int(&mut self) -> Result<i32, SerdeErr> {
        Ok(zag_zig(self.read_uint()?))
    }

    pub fn peek_int(&self) -> Result<i32, SerdeErr> {
        Ok(zag_zig(self.peek_uint()?))
    }
}

fn zig_zag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

fn zag_zig(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}
