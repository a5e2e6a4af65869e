use replica_shared::{
    read_view_entry, BitBuffer, Command, CommandData, CommandUpdate, EntityId, KindCodec,
    PacketError, Pool, ReplicationConfig, StateData, StateDelta, Tick, View,
};

/// Identifies a delta that made it into a packet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SentDelta {
    pub entity_id: EntityId,
    pub tick: Tick,
    pub is_frozen: bool,
}

/// Writes the payload of a server packet: as many of `deltas` as fit, in
/// order, leaving `reserved_bytes` free at the end of the packet.
pub(crate) fn write_deltas<S: StateData>(
    buffer: &mut BitBuffer,
    config: &ReplicationConfig,
    kinds: &KindCodec,
    deltas: &[StateDelta<S>],
    reserved_bytes: usize,
    sent: &mut Vec<SentDelta>,
) {
    // Write: [Deltas]
    buffer.pack_to_size(
        config
            .packcap_message_total
            .saturating_sub(reserved_bytes),
        config.maxsize_entity,
        deltas.iter(),
        |buffer, delta| delta.write(buffer, kinds),
        |delta| {
            sent.push(SentDelta {
                entity_id: delta.entity_id,
                tick: delta.tick,
                is_frozen: delta.is_frozen,
            })
        },
    );
}

/// What a client sends besides its events: recent commands for each entity
/// it controls, and the latest tick it holds of each entity
pub(crate) struct ClientPayload<C: CommandData> {
    pub command_updates: Vec<CommandUpdate<C>>,
    pub view: View,
}

impl<C: CommandData> ClientPayload<C> {
    pub fn new() -> Self {
        Self {
            command_updates: Vec::new(),
            view: View::new(),
        }
    }

    /// Returns every command to the pool
    pub fn release(self, pool: &mut Pool<Command<C>>) {
        for update in self.command_updates {
            update.release(pool);
        }
    }
}

/// Reads the payload of a client packet into `output`. On error, whatever
/// was read so far is left in `output` for the caller to release.
pub(crate) fn read_client_payload<C: CommandData>(
    buffer: &mut BitBuffer,
    config: &ReplicationConfig,
    pool: &mut Pool<Command<C>>,
    output: &mut ClientPayload<C>,
) -> Result<(), PacketError> {
    // Read: [Command Updates]
    buffer.unpack_each(|buffer| -> Result<(), PacketError> {
        let update = CommandUpdate::read(buffer, config.command_send_count, pool)?;
        if !update.entity_id.is_valid() {
            update.release(pool);
            return Err(PacketError::InvalidEntityId);
        }
        output.command_updates.push(update);
        Ok(())
    })?;

    // Read: [View]
    buffer.unpack_each(|buffer| -> Result<(), PacketError> {
        let (entity_id, entry) = read_view_entry(buffer)?;
        output.view.record_update(entity_id, entry);
        Ok(())
    })?;

    Ok(())
}
