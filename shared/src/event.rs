use replica_serde::{BitBuffer, Serde, SerdeErr};

use crate::{
    entity_id::EntityId, pool::Poolable, pools::EventPools, protocol::EventData,
    protocol::KindCodec, sequence_id::SequenceId, tick::Tick,
};

/// A message sent outside the tick cadence, optionally addressed to an
/// entity.
///
/// `attempts` counts the remaining sends: [`Event::SEND_RELIABLE`] means
/// retry until acknowledged, `0` means the event is exhausted.
#[derive(Debug, Clone)]
pub struct Event<E: EventData> {
    pub event_id: SequenceId,
    pub entity_id: EntityId,
    pub attempts: i32,
    pub data: E,
}

impl<E: EventData> Event<E> {
    pub const SEND_RELIABLE: i32 = -1;

    pub fn new(data: E) -> Self {
        Self {
            event_id: SequenceId::INVALID,
            entity_id: EntityId::INVALID,
            attempts: 0,
            data,
        }
    }

    pub fn kind(&self) -> u16 {
        self.data.kind()
    }

    pub fn is_reliable(&self) -> bool {
        self.attempts == Self::SEND_RELIABLE
    }

    pub fn can_send(&self) -> bool {
        self.attempts > 0 || self.is_reliable()
    }

    /// Uses up one attempt of a best-effort event
    pub fn register_sent(&mut self) {
        if self.attempts > 0 {
            self.attempts -= 1;
        }
    }

    /// `packet_tick` may be later than the tick the event was queued on, if
    /// this is a resend
    pub fn write(&self, buffer: &mut BitBuffer, kinds: &KindCodec, packet_tick: Tick) {
        // Write: [EventType]
        kinds.write(buffer, self.kind());

        // Write: [EventId]
        self.event_id.ser(buffer);

        // Write: [HasEntityId]
        buffer.write_bool(self.entity_id.is_valid());

        if self.entity_id.is_valid() {
            // Write: [EntityId]
            self.entity_id.ser(buffer);
        }

        // Write: [EventData]
        self.data.encode(buffer, packet_tick);
    }

    pub fn read(
        buffer: &mut BitBuffer,
        kinds: &KindCodec,
        pools: &mut EventPools<E>,
        packet_tick: Tick,
    ) -> Result<Self, SerdeErr> {
        // Read: [EventType]
        let kind = kinds.read(buffer)?;
        let mut event = pools
            .create_event(kind)
            .map_err(|_| SerdeErr::UnknownTypeCode {
                code: u32::from(kind) + 1,
            })?;

        match event.read_fields(buffer, packet_tick) {
            Ok(()) => Ok(event),
            Err(error) => {
                pools.release_event(event);
                Err(error)
            }
        }
    }

    fn read_fields(&mut self, buffer: &mut BitBuffer, packet_tick: Tick) -> Result<(), SerdeErr> {
        // Read: [EventId]
        self.event_id = SequenceId::de(buffer)?;

        // Read: [HasEntityId]
        if buffer.read_bool()? {
            // Read: [EntityId]
            self.entity_id = EntityId::de(buffer)?;
        }

        // Read: [EventData]
        self.data.decode(buffer, packet_tick)
    }
}

impl<E: EventData> Poolable for Event<E> {
    fn reset(&mut self) {
        self.event_id = SequenceId::INVALID;
        self.entity_id = EntityId::INVALID;
        self.attempts = 0;
        if let Some(data) = E::from_kind(self.data.kind()) {
            self.data = data;
        }
    }
}
