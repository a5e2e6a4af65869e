use replica_serde::{BitBuffer, IntCompressor, SerdeErr};

use crate::{tick::Tick, world::UpdateOrder};

pub mod error;
pub use error::ProtocolError;

/// A closed family of variants with a stable numeric kind per variant.
///
/// Kinds are dense and zero-based. On the wire a kind is sent as `kind + 1`
/// through a [`KindCodec`], leaving `0` free to mean "invalid".
pub trait Kinded: Sized {
    fn kind(&self) -> u16;

    /// Builds the default value of the variant with the given kind
    fn from_kind(kind: u16) -> Option<Self>;

    fn kind_count() -> u16;
}

/// Wire codec for the type codes of a [`Kinded`] family
#[derive(Debug, Clone)]
pub struct KindCodec {
    compressor: IntCompressor,
    count: u16,
}

impl KindCodec {
    pub fn new<K: Kinded>() -> Self {
        let count = K::kind_count();
        Self {
            compressor: IntCompressor::new(0, i32::from(count) + 1),
            count,
        }
    }

    pub fn write(&self, buffer: &mut BitBuffer, kind: u16) {
        debug_assert!(kind < self.count);
        buffer.write_compressed_int(&self.compressor, i32::from(kind) + 1);
    }

    pub fn read(&self, buffer: &mut BitBuffer) -> Result<u16, SerdeErr> {
        let code = buffer.read_compressed_int(&self.compressor)?;
        if code < 1 || code > i32::from(self.count) {
            return Err(SerdeErr::UnknownTypeCode { code: code as u32 });
        }
        Ok((code - 1) as u16)
    }
}

/// The synchronized payload of an entity.
///
/// Each variant splits its fields into three regions with their own send
/// cadence. Mutable fields are delta-compared and each owns one bit of a
/// dirty mask. Controller fields are sent in full, only to the controlling
/// peer. Immutable fields are sent once, when the entity is first seen.
pub trait StateData: Kinded + Clone {
    /// Number of bits of the dirty mask used by this variant
    fn flag_bits(&self) -> u32;

    /// Bit-or of the flags of every mutable field that differs from `basis`.
    /// Must be pure, and floats should be compared with an epsilon.
    fn compare_mutable(&self, basis: &Self) -> u32;

    fn is_controller_equal(&self, other: &Self) -> bool;

    /// Copies exactly the mutable fields named by `flags`
    fn apply_mutable_from(&mut self, source: &Self, flags: u32);

    fn apply_controller_from(&mut self, source: &Self);

    fn apply_immutable_from(&mut self, source: &Self);

    fn reset_controller(&mut self);

    /// Blends the mutable fields of two states, `t` in `[0, 1]`
    fn apply_interpolated(&mut self, _first: &Self, _second: &Self, _t: f32) {}

    /// When entities of this variant update relative to others
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::Normal
    }

    fn encode_mutable(&self, buffer: &mut BitBuffer, flags: u32);

    fn decode_mutable(&mut self, buffer: &mut BitBuffer, flags: u32) -> Result<(), SerdeErr>;

    fn encode_controller(&self, buffer: &mut BitBuffer);

    fn decode_controller(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;

    fn encode_immutable(&self, buffer: &mut BitBuffer);

    fn decode_immutable(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;
}

/// Per-tick input sampled by a client for the entities it controls
pub trait CommandData: Default + Clone {
    fn encode(&self, buffer: &mut BitBuffer);

    fn decode(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr>;
}

/// A message sent outside the tick cadence.
///
/// `packet_tick` is the tick of the packet carrying the event, which may be
/// later than the tick the event was queued on when it is being resent.
pub trait EventData: Kinded + Clone {
    fn encode(&self, buffer: &mut BitBuffer, packet_tick: Tick);

    fn decode(&mut self, buffer: &mut BitBuffer, packet_tick: Tick) -> Result<(), SerdeErr>;
}

/// Binds together the state, command and event families of an application
pub trait Protocol: 'static {
    type State: StateData;
    type Command: CommandData;
    type Event: EventData;
}
