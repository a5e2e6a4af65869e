use log::warn;

use crate::{
    bit_buffer::BitBuffer,
    constants::{PACKED_COUNT_BITS, PACKED_COUNT_MAX},
    error::SerdeErr,
};

// Packed lists
impl BitBuffer {
    /// Writes a count-prefixed list of every element, up to 255 of them
    pub fn pack_all<T, I, E>(&mut self, elements: I, mut encode: E) -> u8
    where
        I: IntoIterator<Item = T>,
        E: FnMut(&mut BitBuffer, T),
    {
        let mut count: u8 = 0;

        // Reserve: [Count]
        let count_position = self.write_pos();
        self.write(PACKED_COUNT_BITS, 0);

        for element in elements {
            if count == PACKED_COUNT_MAX {
                break;
            }
            encode(self, element);
            count += 1;
        }

        self.insert(count_position, PACKED_COUNT_BITS, u32::from(count));
        count
    }

    /// Writes a count-prefixed list, committing elements greedily until the
    /// buffer would grow past `max_total_bytes`.
    ///
    /// An element whose own encoding grows the buffer by more than
    /// `max_individual_bytes` can never fit, so it is rolled back, logged and
    /// skipped. The first element that would push the buffer past the total
    /// cap is rolled back and packing stops. `packed` is invoked for every
    /// committed element, in order. Returns the number of committed elements.
    pub fn pack_to_size<T, I, E, P>(
        &mut self,
        max_total_bytes: usize,
        max_individual_bytes: usize,
        elements: I,
        mut encode: E,
        mut packed: P,
    ) -> u8
    where
        I: IntoIterator<Item = T>,
        E: FnMut(&mut BitBuffer, &T),
        P: FnMut(T),
    {
        // the sentinel bit can spill into one more byte
        let max_total_bytes = max_total_bytes.saturating_sub(1);
        let mut count: u8 = 0;

        // Reserve: [Count]
        let count_position = self.write_pos();
        self.write(PACKED_COUNT_BITS, 0);

        for element in elements {
            if count == PACKED_COUNT_MAX {
                break;
            }

            let rollback = self.write_pos();
            let start_byte_size = self.byte_size();

            encode(self, &element);

            let end_byte_size = self.byte_size();
            let write_byte_size = end_byte_size - start_byte_size;
            if write_byte_size > max_individual_bytes {
                self.rollback(rollback);
                warn!(
                    "Skipping packed item of {}B, larger than the {}B limit",
                    write_byte_size, max_individual_bytes
                );
            } else if end_byte_size > max_total_bytes {
                self.rollback(rollback);
                break;
            } else {
                packed(element);
                count += 1;
            }
        }

        self.insert(count_position, PACKED_COUNT_BITS, u32::from(count));
        count
    }

    /// Reads a list written by [`BitBuffer::pack_all`] or [`BitBuffer::pack_to_size`]
    pub fn unpack_all<T, D>(&mut self, mut decode: D) -> Result<Vec<T>, SerdeErr>
    where
        D: FnMut(&mut BitBuffer) -> Result<T, SerdeErr>,
    {
        let count = self.read_byte()?;
        let mut output = Vec::with_capacity(count as usize);
        for _ in 0..count {
            output.push(decode(self)?);
        }
        Ok(output)
    }

    /// Reads a packed list, handing each element to `decode` as it goes.
    /// Returns the declared count.
    pub fn unpack_each<E, D>(&mut self, mut decode: D) -> Result<u8, E>
    where
        E: From<SerdeErr>,
        D: FnMut(&mut BitBuffer) -> Result<(), E>,
    {
        let count = self.read_byte()?;
        for _ in 0..count {
            decode(self)?;
        }
        Ok(count)
    }
}
