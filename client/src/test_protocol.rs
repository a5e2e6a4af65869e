use replica_shared::{
    BitBuffer, CommandData, EventData, Kinded, Protocol, SerdeErr, StateData, Tick,
};

/// Minimal protocol for the unit tests of this crate
pub struct Marker;

impl Protocol for Marker {
    type State = Beacon;
    type Command = Nudge;
    type Event = Signal;
}

/// One mutable field, one controller field, one immutable field
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Beacon {
    pub value: u32,
    pub owner_note: u32,
    pub serial: u32,
}

impl Kinded for Beacon {
    fn kind(&self) -> u16 {
        0
    }

    fn from_kind(kind: u16) -> Option<Self> {
        (kind == 0).then(Beacon::default)
    }

    fn kind_count() -> u16 {
        1
    }
}

impl StateData for Beacon {
    fn flag_bits(&self) -> u32 {
        1
    }

    fn compare_mutable(&self, basis: &Self) -> u32 {
        u32::from(self.value != basis.value)
    }

    fn is_controller_equal(&self, other: &Self) -> bool {
        self.owner_note == other.owner_note
    }

    fn apply_mutable_from(&mut self, source: &Self, flags: u32) {
        if flags & 1 != 0 {
            self.value = source.value;
        }
    }

    fn apply_controller_from(&mut self, source: &Self) {
        self.owner_note = source.owner_note;
    }

    fn apply_immutable_from(&mut self, source: &Self) {
        self.serial = source.serial;
    }

    fn reset_controller(&mut self) {
        self.owner_note = 0;
    }

    fn apply_interpolated(&mut self, first: &Self, second: &Self, t: f32) {
        let first = first.value as f32;
        let second = second.value as f32;
        self.value = (first + (second - first) * t) as u32;
    }

    fn encode_mutable(&self, buffer: &mut BitBuffer, flags: u32) {
        if flags & 1 != 0 {
            buffer.write_uint(self.value);
        }
    }

    fn decode_mutable(&mut self, buffer: &mut BitBuffer, flags: u32) -> Result<(), SerdeErr> {
        if flags & 1 != 0 {
            self.value = buffer.read_uint()?;
        }
        Ok(())
    }

    fn encode_controller(&self, buffer: &mut BitBuffer) {
        buffer.write_uint(self.owner_note);
    }

    fn decode_controller(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.owner_note = buffer.read_uint()?;
        Ok(())
    }

    fn encode_immutable(&self, buffer: &mut BitBuffer) {
        buffer.write_uint(self.serial);
    }

    fn decode_immutable(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.serial = buffer.read_uint()?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Nudge {
    pub amount: u32,
}

impl CommandData for Nudge {
    fn encode(&self, buffer: &mut BitBuffer) {
        buffer.write_uint(self.amount);
    }

    fn decode(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        self.amount = buffer.read_uint()?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    Hello,
}

impl Kinded for Signal {
    fn kind(&self) -> u16 {
        0
    }

    fn from_kind(kind: u16) -> Option<Self> {
        (kind == 0).then_some(Signal::Hello)
    }

    fn kind_count() -> u16 {
        1
    }
}

impl EventData for Signal {
    fn encode(&self, _buffer: &mut BitBuffer, _packet_tick: Tick) {}

    fn decode(&mut self, _buffer: &mut BitBuffer, _packet_tick: Tick) -> Result<(), SerdeErr> {
        Ok(())
    }
}
