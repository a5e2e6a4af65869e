use std::collections::VecDeque;

use replica_serde::{BitBuffer, Serde};

use crate::{
    config::ReplicationConfig, connection::error::PacketError,
    connection::packet_header::PacketHeader, event::Event, protocol::EventData,
    protocol::KindCodec,
};

/// Bytes the payload must leave free for the count of the fill event pass
pub const PAYLOAD_RESERVED_BYTES: usize = 1;

/// Writes a whole packet into `buffer` and returns its bytes.
///
/// After the header, the packet is written in three passes. The first
/// packs events up to the early cap, so events are never starved by a
/// large payload. The payload then fills what it can of the packet, and a
/// final pass tops the packet up with any events that are left.
///
/// `sendable` holds the indices into `events` that may go out, in order.
/// Every event that was written has one of its attempts used up.
pub fn encode_packet<E, F>(
    buffer: &mut BitBuffer,
    config: &ReplicationConfig,
    kinds: &KindCodec,
    header: &PacketHeader,
    events: &mut VecDeque<Event<E>>,
    sendable: &[usize],
    write_payload: F,
) -> Result<Vec<u8>, PacketError>
where
    E: EventData,
    F: FnOnce(&mut BitBuffer, usize),
{
    buffer.clear();

    // Write: [Header]
    header.ser(buffer);

    let packet_tick = header.sender_tick;
    let mut sent: Vec<usize> = Vec::new();

    // Write: [Events] (Early Pack)
    {
        let queue = &*events;
        buffer.pack_to_size(
            config.packcap_early_events,
            config.maxsize_event,
            sendable.iter().copied(),
            |buffer, index| queue[*index].write(buffer, kinds, packet_tick),
            |index| sent.push(index),
        );
    }

    // Write: [Payload]
    write_payload(buffer, PAYLOAD_RESERVED_BYTES);

    // Write: [Events] (Fill Pack)
    {
        let queue = &*events;
        let remaining: Vec<usize> = sendable
            .iter()
            .copied()
            .filter(|index| !sent.contains(index))
            .collect();
        buffer.pack_to_size(
            config.packcap_message_total,
            config.maxsize_event,
            remaining,
            |buffer, index| queue[*index].write(buffer, kinds, packet_tick),
            |index| sent.push(index),
        );
    }

    for index in sent {
        events[index].register_sent();
    }

    let bytes = buffer.to_bytes();
    if bytes.len() > config.packcap_message_total {
        return Err(PacketError::PacketTooLarge {
            length: bytes.len(),
            max: config.packcap_message_total,
        });
    }
    Ok(bytes)
}
