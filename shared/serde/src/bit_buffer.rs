use crate::error::SerdeErr;

const DEFAULT_CAPACITY: usize = 8;
const GROW_FACTOR: usize = 2;
const MIN_GROW: usize = 1;

/// A first-in-first-out bit buffer with independent read & write cursors.
///
/// Bits are packed least-significant first into 32-bit chunks. Serializing
/// the buffer appends a single sentinel bit after the last written bit, so
/// that [`BitBuffer::load`] can recover the exact bit length from the byte
/// array alone.
#[derive(Debug, Clone)]
pub struct BitBuffer {
    chunks: Vec<u32>,
    read_pos: usize,
    write_pos: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Capacity is given in 32-bit chunks
    pub fn with_capacity(chunks: usize) -> Self {
        Self {
            chunks: vec![0; chunks.max(2)],
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Resets both cursors. Previously written chunks are not zeroed, every
    /// write masks out stale bits above its own position.
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Number of bytes required to hold every written bit
    pub fn byte_size(&self) -> usize {
        if self.write_pos == 0 {
            return 0;
        }
        ((self.write_pos - 1) >> 3) + 1
    }

    /// Returns true once everything written has been read back
    pub fn is_finished(&self) -> bool {
        self.write_pos == self.read_pos
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    pub fn bits_remaining(&self) -> usize {
        self.write_pos.saturating_sub(self.read_pos)
    }

    /// Takes the lowest `num_bits` of `value` and appends them.
    ///
    /// # Panics
    ///
    /// Panics if `num_bits` is greater than 32.
    pub fn write(&mut self, num_bits: u32, value: u32) {
        assert!(num_bits <= 32, "cannot write {} bits at once", num_bits);

        let index = self.write_pos >> 5;
        let used = (self.write_pos & 0x1F) as u32;

        while index + 1 >= self.chunks.len() {
            self.expand();
        }

        let chunk_mask = (1u64 << used) - 1;
        let scratch = u64::from(self.chunks[index]) & chunk_mask;
        let result = scratch | (u64::from(low_bits(value, num_bits)) << used);

        self.chunks[index] = result as u32;
        self.chunks[index + 1] = (result >> 32) as u32;

        self.write_pos += num_bits as usize;
    }

    /// Reads the next `num_bits` and advances the read cursor
    pub fn read(&mut self, num_bits: u32) -> Result<u32, SerdeErr> {
        let value = self.peek(num_bits)?;
        self.read_pos += num_bits as usize;
        Ok(value)
    }

    /// Reads the next `num_bits` without advancing the read cursor
    pub fn peek(&self, num_bits: u32) -> Result<u32, SerdeErr> {
        self.peek_at(self.read_pos, num_bits)
    }

    pub(crate) fn peek_at(&self, position: usize, num_bits: u32) -> Result<u32, SerdeErr> {
        if num_bits > 32 {
            return Err(SerdeErr::TooManyBits { bits: num_bits });
        }
        if position + num_bits as usize > self.write_pos {
            return Err(SerdeErr::OutOfBounds {
                position,
                requested: num_bits,
                written: self.write_pos,
            });
        }
        if num_bits == 0 {
            return Ok(0);
        }

        let index = position >> 5;
        let used = (position & 0x1F) as u32;

        let mut scratch = u64::from(self.chunks.get(index).copied().unwrap_or(0));
        if let Some(next) = self.chunks.get(index + 1) {
            scratch |= u64::from(*next) << 32;
        }

        let chunk_mask = ((1u64 << num_bits) - 1) << used;
        Ok(((scratch & chunk_mask) >> used) as u32)
    }

    pub(crate) fn advance_read(&mut self, bits: usize) {
        self.read_pos += bits;
    }

    /// Moves the write cursor back to a previously recorded position,
    /// discarding everything written after it
    pub(crate) fn rollback(&mut self, position: usize) {
        debug_assert!(position <= self.write_pos);
        self.write_pos = position;
    }

    /// ORs `value` into space that was reserved earlier by writing zeroes
    pub(crate) fn insert(&mut self, position: usize, num_bits: u32, value: u32) {
        debug_assert!(num_bits <= 32);
        debug_assert!(position + num_bits as usize <= self.write_pos);

        let index = position >> 5;
        let used = (position & 0x1F) as u32;

        while index + 1 >= self.chunks.len() {
            self.expand();
        }

        let prepared = u64::from(low_bits(value, num_bits)) << used;
        let scratch =
            u64::from(self.chunks[index]) | (u64::from(self.chunks[index + 1]) << 32);
        let result = scratch | prepared;

        self.chunks[index] = result as u32;
        self.chunks[index + 1] = (result >> 32) as u32;
    }

    /// Appends the sentinel bit and copies the buffer into a byte array.
    /// Call once per packet, the sentinel stays in the buffer afterwards.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        self.write(1, 1);

        let length = self.byte_size();
        let mut output = Vec::with_capacity(length);
        for chunk in &self.chunks {
            output.extend_from_slice(&chunk.to_le_bytes());
            if output.len() >= length {
                break;
            }
        }
        output.truncate(length);
        output
    }

    /// Overwrites this buffer with bytes produced by [`BitBuffer::to_bytes`]
    pub fn load(&mut self, data: &[u8]) -> Result<(), SerdeErr> {
        let last = match data.last() {
            Some(last) if *last != 0 => *last,
            _ => {
                return Err(SerdeErr::MissingSentinel {
                    length: data.len(),
                });
            }
        };

        let num_chunks = (data.len() / 4) + 2;
        self.chunks.clear();
        self.chunks.resize(num_chunks, 0);
        for (index, bytes) in data.chunks(4).enumerate() {
            let mut word = [0u8; 4];
            word[..bytes.len()].copy_from_slice(bytes);
            self.chunks[index] = u32::from_le_bytes(word);
        }

        let position_in_byte = highest_bit_position(last);

        // step back over the sentinel bit
        self.write_pos = ((data.len() - 1) * 8) + (position_in_byte - 1);
        self.read_pos = 0;
        Ok(())
    }

    fn expand(&mut self) {
        let new_capacity = (self.chunks.len() * GROW_FACTOR) + MIN_GROW;
        self.chunks.resize(new_capacity, 0);
    }
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn low_bits(value: u32, num_bits: u32) -> u32 {
    if num_bits >= 32 {
        value
    } else {
        value & ((1u32 << num_bits) - 1)
    }
}

fn highest_bit_position(byte: u8) -> usize {
    (8 - byte.leading_zeros()) as usize
}
