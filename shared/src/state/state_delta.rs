use replica_serde::{BitBuffer, Serde, SerdeErr};

use crate::{
    entity_id::EntityId, pools::StatePools, protocol::KindCodec, protocol::StateData,
    state::State, tick::Tick, Timed,
};

/// The change to one entity at one tick, as sent from server to client.
///
/// A frozen delta carries no state: it tells the client the entity has left
/// its scope. Otherwise `state` holds the changed mutable fields (per
/// `state.flags`), plus full controller and immutable data when flagged.
#[derive(Debug)]
pub struct StateDelta<S: StateData> {
    pub tick: Tick,
    pub entity_id: EntityId,
    pub state: Option<State<S>>,
    pub is_frozen: bool,
}

impl<S: StateData> StateDelta<S> {
    pub fn new(tick: Tick, entity_id: EntityId, state: State<S>) -> Self {
        Self {
            tick,
            entity_id,
            state: Some(state),
            is_frozen: false,
        }
    }

    pub fn frozen(tick: Tick, entity_id: EntityId) -> Self {
        Self {
            tick,
            entity_id,
            state: None,
            is_frozen: true,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.as_ref().map_or(false, State::is_removed)
    }

    /// Builds the delta of `current` against `basis`, or nothing if there
    /// is nothing worth sending.
    ///
    /// Without a basis every mutable field is included. Controller data,
    /// immutable data and a removal always force a delta.
    #[allow(clippy::too_many_arguments)]
    pub fn produce(
        pools: &mut StatePools<S>,
        tick: Tick,
        entity_id: EntityId,
        current: &State<S>,
        basis: Option<&State<S>>,
        include_controller_data: bool,
        include_immutable_data: bool,
        command_ack: Tick,
        removed_tick: Tick,
    ) -> Option<Self> {
        let forced = include_controller_data || include_immutable_data || removed_tick.is_valid();

        let flags = match basis {
            Some(basis) => current.compare_mutable(basis),
            None => State::<S>::FLAGS_ALL,
        };

        if flags == State::<S>::FLAGS_NONE && !forced {
            return None;
        }

        let mut state = pools.create_state_like(current);
        state.flags = flags;
        state.data.apply_mutable_from(&current.data, flags);

        state.has_controller_data = include_controller_data;
        if include_controller_data {
            state.data.apply_controller_from(&current.data);
        }

        state.has_immutable_data = include_immutable_data;
        if include_immutable_data {
            state.data.apply_immutable_from(&current.data);
        }

        state.removed_tick = removed_tick;
        state.command_ack = command_ack;

        Some(Self::new(tick, entity_id, state))
    }

    pub fn write(&self, buffer: &mut BitBuffer, kinds: &KindCodec) {
        // Write: [EntityId]
        self.entity_id.ser(buffer);

        // Write: [IsFrozen]
        buffer.write_bool(self.is_frozen);

        let Some(state) = self.state.as_ref().filter(|_| !self.is_frozen) else {
            return;
        };

        // Write: [TypeCode]
        kinds.write(buffer, state.kind());

        // Write: [IsRemoved]
        buffer.write_bool(state.is_removed());

        if state.is_removed() {
            // Write: [RemovedTick]
            state.removed_tick.ser(buffer);
            return;
        }

        // Write: [HasControllerData]
        buffer.write_bool(state.has_controller_data);

        // Write: [HasImmutableData]
        buffer.write_bool(state.has_immutable_data);

        // Write: [Flags]
        buffer.write(state.data.flag_bits(), state.flags);

        // Write: [Mutable Data]
        state.data.encode_mutable(buffer, state.flags);

        if state.has_controller_data {
            // Write: [Controller Data]
            state.data.encode_controller(buffer);

            // Write: [CommandAck]
            state.command_ack.ser(buffer);
        }

        if state.has_immutable_data {
            // Write: [Immutable Data]
            state.data.encode_immutable(buffer);
        }
    }

    /// Reads a delta. Deltas carry no tick of their own, they are stamped
    /// with the tick of the packet they arrived in.
    pub fn read(
        buffer: &mut BitBuffer,
        kinds: &KindCodec,
        pools: &mut StatePools<S>,
        packet_tick: Tick,
    ) -> Result<Self, SerdeErr> {
        // Read: [EntityId]
        let entity_id = EntityId::de(buffer)?;

        // Read: [IsFrozen]
        if buffer.read_bool()? {
            return Ok(Self::frozen(packet_tick, entity_id));
        }

        // Read: [TypeCode]
        let kind = kinds.read(buffer)?;
        let mut state = pools
            .create_state(kind)
            .map_err(|_| SerdeErr::UnknownTypeCode {
                code: u32::from(kind) + 1,
            })?;

        match Self::read_state(buffer, &mut state) {
            Ok(()) => Ok(Self::new(packet_tick, entity_id, state)),
            Err(error) => {
                pools.release_state(state);
                Err(error)
            }
        }
    }

    fn read_state(buffer: &mut BitBuffer, state: &mut State<S>) -> Result<(), SerdeErr> {
        // Read: [IsRemoved]
        if buffer.read_bool()? {
            // Read: [RemovedTick]
            state.removed_tick = Tick::de(buffer)?;
            return Ok(());
        }

        // Read: [HasControllerData]
        state.has_controller_data = buffer.read_bool()?;

        // Read: [HasImmutableData]
        state.has_immutable_data = buffer.read_bool()?;

        // Read: [Flags]
        state.flags = buffer.read(state.data.flag_bits())?;

        // Read: [Mutable Data]
        let flags = state.flags;
        state.data.decode_mutable(buffer, flags)?;

        if state.has_controller_data {
            // Read: [Controller Data]
            state.data.decode_controller(buffer)?;

            // Read: [CommandAck]
            state.command_ack = Tick::de(buffer)?;
        }

        if state.has_immutable_data {
            // Read: [Immutable Data]
            state.data.decode_immutable(buffer)?;
        }

        Ok(())
    }
}

impl<S: StateData> Timed for StateDelta<S> {
    fn tick(&self) -> Tick {
        self.tick
    }
}
