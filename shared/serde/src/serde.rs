use crate::{bit_buffer::BitBuffer, error::SerdeErr};

/// A type that knows how to write itself to, and read itself from, a
/// [`BitBuffer`]
pub trait Serde: Sized {
    fn ser(&self, buffer: &mut BitBuffer);

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr>;
}

impl Serde for bool {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write_bool(*self);
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        buffer.read_bool()
    }
}

impl Serde for u8 {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write_byte(*self);
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        buffer.read_byte()
    }
}

impl Serde for u32 {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write_uint(*self);
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        buffer.read_uint()
    }
}

impl Serde for i32 {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write_int(*self);
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        buffer.read_int()
    }
}

impl Serde for String {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write_string(self);
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        buffer.read_string()
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write_bool(self.is_some());
        if let Some(value) = self {
            value.ser(buffer);
        }
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        if buffer.read_bool()? {
            Ok(Some(T::de(buffer)?))
        } else {
            Ok(None)
        }
    }
}
