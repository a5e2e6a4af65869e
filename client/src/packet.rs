use replica_shared::{
    write_view_entry, BitBuffer, CommandUpdate, EntityId, KindCodec, PacketError, Protocol,
    ReplicationConfig, StateData, StateDelta, StatePools, Tick, ViewEntry,
};

use crate::entity::ClientEntity;

/// Writes the payload of a client packet: the pending commands of each
/// controlled entity in the given order, then as much of the view as fits.
/// The ids of the entities whose commands made it in are pushed to `sent`.
pub(crate) fn write_client_payload<P: Protocol>(
    buffer: &mut BitBuffer,
    config: &ReplicationConfig,
    reserved_bytes: usize,
    controlled: &[&ClientEntity<P>],
    view: &[(EntityId, ViewEntry)],
    sent: &mut Vec<EntityId>,
) {
    // Write: [Command Updates]
    buffer.pack_to_size(
        config.packcap_commands,
        config.maxsize_command_update,
        controlled.iter(),
        |buffer, entity| {
            CommandUpdate::write(
                buffer,
                entity.id(),
                config.command_send_count,
                entity.outgoing_commands.iter(),
            )
        },
        |entity| sent.push(entity.id()),
    );

    // Write: [View]
    buffer.pack_to_size(
        config
            .packcap_message_total
            .saturating_sub(reserved_bytes),
        usize::MAX,
        view.iter(),
        |buffer, (entity_id, entry)| write_view_entry(buffer, *entity_id, entry),
        |_| {},
    );
}

/// Reads the payload of a server packet into `deltas`. On error, whatever
/// was read so far is left in `deltas` for the caller to release.
pub(crate) fn read_server_payload<S: StateData>(
    buffer: &mut BitBuffer,
    kinds: &KindCodec,
    pools: &mut StatePools<S>,
    packet_tick: Tick,
    deltas: &mut Vec<StateDelta<S>>,
) -> Result<(), PacketError> {
    // Read: [Deltas]
    buffer.unpack_each(|buffer| -> Result<(), PacketError> {
        let delta = StateDelta::read(buffer, kinds, pools, packet_tick)?;
        let is_valid = delta.entity_id.is_valid();
        deltas.push(delta);
        if !is_valid {
            return Err(PacketError::InvalidEntityId);
        }
        Ok(())
    })?;
    Ok(())
}
