/// Helpers for inspecting packets on the wire

use replica_shared::{
    decode_packet, BitBuffer, Event, EventPools, KindCodec, PacketError, PacketHeader,
    ReplicationConfig, StateDelta, StatePools,
};

use crate::test_protocol::{GameEvent, GameState};

/// A server packet, decoded outside of any world
pub struct ServerPacket {
    pub header: PacketHeader,
    pub deltas: Vec<StateDelta<GameState>>,
    pub events: Vec<Event<GameEvent>>,
}

impl ServerPacket {
    pub fn delta_for(&self, entity_id: replica_shared::EntityId) -> Option<&StateDelta<GameState>> {
        self.deltas.iter().find(|delta| delta.entity_id == entity_id)
    }
}

/// Decodes a packet the server sent, the way a client would
pub fn read_server_packet(
    bytes: &[u8],
    config: &ReplicationConfig,
) -> Result<ServerPacket, PacketError> {
    let mut buffer = BitBuffer::new();
    let state_kinds = KindCodec::new::<GameState>();
    let event_kinds = KindCodec::new::<GameEvent>();
    let mut states = StatePools::<GameState>::new();
    let mut events = EventPools::<GameEvent>::new();

    let mut deltas = Vec::new();
    let packet = decode_packet(
        &mut buffer,
        bytes,
        config,
        &event_kinds,
        &mut events,
        |buffer, packet_tick| {
            buffer.unpack_each(|buffer| -> Result<(), PacketError> {
                deltas.push(StateDelta::read(buffer, &state_kinds, &mut states, packet_tick)?);
                Ok(())
            })?;
            Ok(())
        },
    )?;

    Ok(ServerPacket {
        header: packet.header,
        deltas,
        events: packet.events,
    })
}
