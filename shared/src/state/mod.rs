mod state_delta;
mod state_record;

pub use state_delta::StateDelta;
pub use state_record::StateRecord;

use crate::{pool::Poolable, protocol::StateData, tick::Tick};

/// Synchronized data of an entity, plus the replication bookkeeping that
/// travels alongside it.
///
/// `data` holds the application's payload. The remaining fields say which
/// regions of `data` are meaningful: on a delta only the mutable fields
/// named by `flags` are, and the controller and immutable regions only when
/// their `has_*` flag is set.
#[derive(Debug, Clone)]
pub struct State<S: StateData> {
    /// Dirty mask over the mutable fields
    pub flags: u32,
    pub has_controller_data: bool,
    pub has_immutable_data: bool,
    /// Tick on which the entity is removed, if it is being destroyed
    pub removed_tick: Tick,
    /// Latest client tick whose command the server applied. Only sent to
    /// the controlling peer.
    pub command_ack: Tick,
    pub data: S,
}

impl<S: StateData> State<S> {
    /// Every mutable field differs
    pub const FLAGS_ALL: u32 = 0xFFFF_FFFF;
    /// No mutable field differs
    pub const FLAGS_NONE: u32 = 0;

    pub fn new(data: S) -> Self {
        Self {
            flags: Self::FLAGS_NONE,
            has_controller_data: false,
            has_immutable_data: false,
            removed_tick: Tick::INVALID,
            command_ack: Tick::INVALID,
            data,
        }
    }

    pub fn kind(&self) -> u16 {
        self.data.kind()
    }

    pub fn is_removed(&self) -> bool {
        self.removed_tick.is_valid()
    }

    pub fn compare_mutable(&self, basis: &State<S>) -> u32 {
        self.data.compare_mutable(&basis.data)
    }

    pub fn is_controller_equal(&self, other: &State<S>) -> bool {
        self.data.is_controller_equal(&other.data)
    }

    /// Copies every data region and flag from `source`. The removal and
    /// command acknowledgement ticks are left alone.
    pub fn overwrite_from(&mut self, source: &State<S>) {
        debug_assert_eq!(self.kind(), source.kind());
        self.flags = source.flags;
        self.data.apply_mutable_from(&source.data, Self::FLAGS_ALL);
        self.data.apply_controller_from(&source.data);
        self.data.apply_immutable_from(&source.data);
        self.has_controller_data = source.has_controller_data;
        self.has_immutable_data = source.has_immutable_data;
    }

    /// Rolls this state forward by a received delta state
    pub fn apply_delta(&mut self, delta: &State<S>) {
        self.data.apply_mutable_from(&delta.data, delta.flags);

        self.data.reset_controller();
        if delta.has_controller_data {
            self.data.apply_controller_from(&delta.data);
        }
        self.has_controller_data = delta.has_controller_data;

        self.has_immutable_data = delta.has_immutable_data || self.has_immutable_data;
        if delta.has_immutable_data {
            self.data.apply_immutable_from(&delta.data);
        }
    }
}

impl<S: StateData> Poolable for State<S> {
    fn reset(&mut self) {
        self.flags = Self::FLAGS_NONE;
        self.has_controller_data = false;
        self.has_immutable_data = false;
        self.removed_tick = Tick::INVALID;
        self.command_ack = Tick::INVALID;
        if let Some(data) = S::from_kind(self.data.kind()) {
            self.data = data;
        }
    }
}
