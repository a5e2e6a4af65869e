use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Sub},
};

use replica_serde::{BitBuffer, Serde, SerdeErr};

/// A rolling 10-bit counter used to order events. `0` is invalid, valid
/// values run from 1 to 1023 and wrap back around to 1.
///
/// Comparisons are circular: of any two ids, the one less than half the
/// range ahead of the other is considered greater.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceId(u16);

impl SequenceId {
    pub const BITS_USED: u32 = 10;
    const MAX_VALUE: i32 = (1 << Self::BITS_USED) - 1;
    const BIT_SHIFT: u32 = 32 - Self::BITS_USED;

    pub const INVALID: SequenceId = SequenceId(0);
    pub const START: SequenceId = SequenceId(1);

    /// Only the low 10 bits of `raw` are kept
    pub const fn new(raw: u16) -> Self {
        Self(raw & (Self::MAX_VALUE as u16))
    }

    pub fn raw_value(&self) -> u16 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }

    pub fn next(&self) -> SequenceId {
        debug_assert!(self.is_valid());
        let next = i32::from(self.0) + 1;
        if next > Self::MAX_VALUE {
            SequenceId(1)
        } else {
            SequenceId(next as u16)
        }
    }

    /// Sign of the circular distance, without skipping the invalid value
    fn difference(a: SequenceId, b: SequenceId) -> i32 {
        debug_assert!(a.is_valid() && b.is_valid());
        (u32::from(a.0) << Self::BIT_SHIFT).wrapping_sub(u32::from(b.0) << Self::BIT_SHIFT) as i32
    }

    fn wrap(raw: i32) -> SequenceId {
        // skip 0 since it's not a valid id
        let wrapped = if raw > Self::MAX_VALUE {
            raw % Self::MAX_VALUE
        } else if raw < 1 {
            (raw % Self::MAX_VALUE) + Self::MAX_VALUE
        } else {
            raw
        };
        SequenceId(wrapped as u16)
    }
}

impl Add<i32> for SequenceId {
    type Output = SequenceId;

    fn add(self, rhs: i32) -> SequenceId {
        debug_assert!(self.is_valid());
        SequenceId::wrap(i32::from(self.0) + rhs)
    }
}

impl Sub<i32> for SequenceId {
    type Output = SequenceId;

    fn sub(self, rhs: i32) -> SequenceId {
        debug_assert!(self.is_valid());
        SequenceId::wrap(i32::from(self.0) - rhs)
    }
}

/// Signed circular distance in `[-511, 511]`, skipping the invalid value
impl Sub<SequenceId> for SequenceId {
    type Output = i32;

    fn sub(self, rhs: SequenceId) -> i32 {
        let mut difference = SequenceId::difference(self, rhs) >> SequenceId::BIT_SHIFT;

        if self.0 < rhs.0 {
            if difference > 0 {
                difference -= 1;
            }
        } else if difference < 0 {
            difference += 1;
        }

        difference
    }
}

impl PartialOrd for SequenceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(SequenceId::difference(*self, *other).cmp(&0))
    }
}

impl fmt::Debug for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "SequenceId:{}", self.0)
        } else {
            write!(f, "SequenceId:INVALID")
        }
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serde for SequenceId {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write(Self::BITS_USED, u32::from(self.0));
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        Ok(SequenceId(buffer.read(Self::BITS_USED)? as u16))
    }
}
