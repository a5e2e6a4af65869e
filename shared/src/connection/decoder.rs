use replica_serde::{BitBuffer, Serde};

use crate::{
    config::ReplicationConfig, connection::error::PacketError,
    connection::packet_header::PacketHeader, event::Event, pools::EventPools,
    protocol::EventData, protocol::KindCodec, tick::Tick,
};

/// The parts of an incoming packet common to both directions
#[derive(Debug)]
pub struct IncomingPacket<E: EventData> {
    pub header: PacketHeader,
    pub events: Vec<Event<E>>,
}

/// Reads a whole packet written by [`encode_packet`](super::encoder::encode_packet).
///
/// `read_payload` is handed the packet tick and must consume exactly the
/// payload. A packet is only accepted if every bit of it was read. On
/// failure the decoded events are released; the caller is responsible for
/// whatever `read_payload` produced.
pub fn decode_packet<E, F>(
    buffer: &mut BitBuffer,
    bytes: &[u8],
    config: &ReplicationConfig,
    kinds: &KindCodec,
    pools: &mut EventPools<E>,
    read_payload: F,
) -> Result<IncomingPacket<E>, PacketError>
where
    E: EventData,
    F: FnOnce(&mut BitBuffer, Tick) -> Result<(), PacketError>,
{
    if bytes.len() > config.packcap_message_total {
        return Err(PacketError::PacketTooLarge {
            length: bytes.len(),
            max: config.packcap_message_total,
        });
    }

    buffer.load(bytes)?;

    // Read: [Header]
    let header = PacketHeader::de(buffer)?;

    let mut events = Vec::new();
    let result = read_body(buffer, kinds, pools, header.sender_tick, &mut events, read_payload);

    match result {
        Ok(()) => Ok(IncomingPacket { header, events }),
        Err(error) => {
            for event in events {
                pools.release_event(event);
            }
            Err(error)
        }
    }
}

fn read_body<E, F>(
    buffer: &mut BitBuffer,
    kinds: &KindCodec,
    pools: &mut EventPools<E>,
    packet_tick: Tick,
    events: &mut Vec<Event<E>>,
    read_payload: F,
) -> Result<(), PacketError>
where
    E: EventData,
    F: FnOnce(&mut BitBuffer, Tick) -> Result<(), PacketError>,
{
    // Read: [Events] (Early Pack)
    read_events(buffer, kinds, pools, packet_tick, events)?;

    // Read: [Payload]
    read_payload(buffer, packet_tick)?;

    // Read: [Events] (Fill Pack)
    read_events(buffer, kinds, pools, packet_tick, events)?;

    if !buffer.is_finished() {
        return Err(PacketError::TrailingBits {
            remaining: buffer.bits_remaining(),
        });
    }
    Ok(())
}

fn read_events<E: EventData>(
    buffer: &mut BitBuffer,
    kinds: &KindCodec,
    pools: &mut EventPools<E>,
    packet_tick: Tick,
    events: &mut Vec<Event<E>>,
) -> Result<(), PacketError> {
    buffer.unpack_each(|buffer| -> Result<(), PacketError> {
        events.push(Event::read(buffer, kinds, pools, packet_tick)?);
        Ok(())
    })?;
    Ok(())
}
