use log::warn;

use crate::{
    bit_buffer::BitBuffer,
    constants::{ASCII_BITS, STRING_LENGTH_MAX},
    error::SerdeErr,
    number::log2,
};

fn string_length_bits() -> u32 {
    log2(STRING_LENGTH_MAX as u32) + 1
}

impl BitBuffer {
    /// Writes a length-prefixed 7-bit ASCII string. Strings longer than
    /// [`STRING_LENGTH_MAX`] are truncated and characters outside the ASCII
    /// table are replaced with `0`.
    pub fn write_string(&mut self, value: &str) {
        let characters: Vec<char> = value.chars().collect();
        let mut length = characters.len();
        if length > STRING_LENGTH_MAX {
            warn!(
                "Truncating string of {} characters to {}",
                length, STRING_LENGTH_MAX
            );
            length = STRING_LENGTH_MAX;
        }

        self.write(string_length_bits(), length as u32);
        for character in &characters[..length] {
            self.write(ASCII_BITS, to_ascii(*character));
        }
    }

    pub fn read_string(&mut self) -> Result<String, SerdeErr> {
        let length = self.read(string_length_bits())?;
        let mut output = String::with_capacity(length as usize);
        for _ in 0..length {
            let code = self.read(ASCII_BITS)?;
            output.push(char::from(code as u8));
        }
        Ok(output)
    }
}

fn to_ascii(character: char) -> u32 {
    if character.is_ascii() {
        character as u32
    } else {
        warn!("Cannot convert to simple ASCII: {}", character);
        0
    }
}
