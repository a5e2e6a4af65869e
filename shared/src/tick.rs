use std::{
    fmt,
    ops::{Add, AddAssign, Sub},
};

use log::warn;
use thiserror::Error;

use replica_serde::{BitBuffer, Serde, SerdeErr};

/// Errors that can occur during tick arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    /// The operation requires a valid tick
    #[error("operation on an invalid tick")]
    Invalid,
    /// Subtracting would move the tick before the first simulation tick
    #[error("subtracting {amount} from {tick} would move before the first tick")]
    SubtractUnderflow { tick: Tick, amount: u32 },
}

/// A simulation tick.
///
/// The stored value is offset by one so that `0` can mean "invalid": the
/// first simulation tick is stored as `1` and reported by
/// [`Tick::raw_value`] as `0`. Ordering and difference are only meaningful
/// between valid ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(u32);

impl Tick {
    pub const INVALID: Tick = Tick(0);
    pub const START: Tick = Tick(1);

    /// Builds a tick from its stored (offset) value, as found on the wire
    pub const fn from_stored(stored: u32) -> Self {
        Self(stored)
    }

    /// Builds a tick from a zero-based simulation step
    pub fn from_raw(raw: u32) -> Self {
        Self(raw.saturating_add(1))
    }

    pub fn stored_value(&self) -> u32 {
        self.0
    }

    /// Zero-based simulation step. Should be used sparingly.
    pub fn raw_value(&self) -> u32 {
        debug_assert!(self.is_valid());
        self.0.saturating_sub(1)
    }

    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }

    pub fn next(&self) -> Tick {
        debug_assert!(self.is_valid());
        Tick(self.0 + 1)
    }

    /// Seconds elapsed at this tick for a fixed per-tick duration
    pub fn to_time(&self, tick_delta_time: f32) -> f32 {
        debug_assert!(self.is_valid());
        self.raw_value() as f32 * tick_delta_time
    }

    /// True on every `send_rate`-th tick, starting with the first
    pub fn is_send_tick(&self, send_rate: u32) -> bool {
        self.is_valid() && send_rate > 0 && self.raw_value() % send_rate == 0
    }

    /// Subtracts `amount` ticks, failing instead of leaving the valid range
    pub fn try_sub(self, amount: u32) -> Result<Tick, TickError> {
        if !self.is_valid() {
            return Err(TickError::Invalid);
        }
        match self.0.checked_sub(amount) {
            Some(stored) if stored >= 1 => Ok(Tick(stored)),
            _ => Err(TickError::SubtractUnderflow { tick: self, amount }),
        }
    }

    /// Subtracts `amount` ticks, clamping at [`Tick::START`]
    pub fn saturating_sub(self, amount: u32) -> Tick {
        match self.try_sub(amount) {
            Ok(tick) => tick,
            Err(_) => Tick::START,
        }
    }
}

impl Add<u32> for Tick {
    type Output = Tick;

    fn add(self, rhs: u32) -> Tick {
        debug_assert!(self.is_valid());
        Tick(self.0 + rhs)
    }
}

impl AddAssign<u32> for Tick {
    fn add_assign(&mut self, rhs: u32) {
        *self = *self + rhs;
    }
}

/// Clamps at [`Tick::START`], logging when it does
impl Sub<u32> for Tick {
    type Output = Tick;

    fn sub(self, rhs: u32) -> Tick {
        match self.try_sub(rhs) {
            Ok(tick) => tick,
            Err(error) => {
                warn!("Clamping tick subtraction: {}", error);
                Tick::START
            }
        }
    }
}

/// Signed distance in ticks
impl Sub<Tick> for Tick {
    type Output = i32;

    fn sub(self, rhs: Tick) -> i32 {
        debug_assert!(self.is_valid() && rhs.is_valid());
        (i64::from(self.0) - i64::from(rhs.0)) as i32
    }
}

impl fmt::Debug for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Tick:{}", self.0 - 1)
        } else {
            write!(f, "Tick:INVALID")
        }
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serde for Tick {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write_uint(self.0);
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        Ok(Tick(buffer.read_uint()?))
    }
}

/// Something stamped with a tick, as stored in the history buffers
pub trait Timed {
    fn tick(&self) -> Tick;
}
