use std::collections::VecDeque;

use log::warn;

use replica_serde::BitBuffer;

use crate::{
    clock::Clock,
    config::ReplicationConfig,
    connection::{encoder::encode_packet, error::PacketError, packet_header::PacketHeader},
    entity_id::EntityId,
    event::Event,
    pools::EventPools,
    protocol::{EventData, KindCodec},
    sequence_id::SequenceId,
    sequence_window::SequenceWindow,
    tick::Tick,
};

/// Session state kept for one remote peer: its clock and the reliable
/// event channel in both directions
pub struct Controller<E: EventData> {
    clock: Clock,
    outgoing_events: VecDeque<Event<E>>,
    next_event_id: SequenceId,
    processed_event_history: SequenceWindow,
}

impl<E: EventData> Controller<E> {
    pub fn new(config: &ReplicationConfig) -> Self {
        Self {
            clock: Clock::new(
                config.network_send_rate,
                config.clock_delay_min,
                config.clock_delay_max,
            ),
            outgoing_events: VecDeque::new(),
            next_event_id: SequenceId::START.next(),
            processed_event_history: SequenceWindow::new(SequenceId::START),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Estimate of the remote peer's current tick
    pub fn estimated_remote_tick(&self) -> Tick {
        self.clock.estimated_remote()
    }

    /// Queues a copy of `data` to be sent to this peer and returns the id
    /// it was given. Use [`Event::SEND_RELIABLE`] as `attempts` to retry
    /// until the peer acknowledges it.
    pub fn queue_event(
        &mut self,
        pools: &mut EventPools<E>,
        data: &E,
        entity_id: EntityId,
        attempts: i32,
    ) -> SequenceId {
        let mut event = pools.create_event_from(data);
        event.event_id = self.next_event_id;
        event.entity_id = entity_id;
        event.attempts = attempts;

        self.outgoing_events.push_back(event);
        let event_id = self.next_event_id;
        self.next_event_id = self.next_event_id.next();
        event_id
    }

    pub fn outgoing_events(&self) -> impl Iterator<Item = &Event<E>> {
        self.outgoing_events.iter()
    }

    /// Indices of the queued events that may go out in the next packet.
    ///
    /// The peer only remembers the last [`SequenceWindow::HISTORY_LENGTH`]
    /// event ids, and drops anything older as stale, reliable or not. So
    /// nothing may be sent that would push the oldest unacknowledged
    /// reliable event out of that window.
    pub fn sendable_events(&self) -> Vec<usize> {
        let mut output = Vec::new();
        let mut first_reliable = SequenceId::INVALID;

        for (index, event) in self.outgoing_events.iter().enumerate() {
            if event.is_reliable() {
                if !first_reliable.is_valid() {
                    first_reliable = event.event_id;
                }
                debug_assert!(first_reliable <= event.event_id);
            }

            if first_reliable.is_valid()
                && !SequenceWindow::are_in_range(first_reliable, event.event_id)
            {
                warn!(
                    "Throttling events behind unacked reliable {}: {} queued",
                    first_reliable,
                    self.outgoing_events.len()
                );
                break;
            }

            if event.can_send() {
                output.push(index);
            }
        }

        output
    }

    /// Header for a packet sent on `local_tick`
    pub fn header(&self, local_tick: Tick) -> PacketHeader {
        PacketHeader {
            sender_tick: local_tick,
            ack_tick: self.clock.latest_remote(),
            ack_event_id: self.processed_event_history.latest(),
        }
    }

    /// Writes a packet to this peer, packing as many pending events as fit
    /// around the payload
    pub fn write_packet<F>(
        &mut self,
        buffer: &mut BitBuffer,
        config: &ReplicationConfig,
        kinds: &KindCodec,
        local_tick: Tick,
        write_payload: F,
    ) -> Result<Vec<u8>, PacketError>
    where
        F: FnOnce(&mut BitBuffer, usize),
    {
        let header = self.header(local_tick);
        let sendable = self.sendable_events();
        encode_packet(
            buffer,
            config,
            kinds,
            &header,
            &mut self.outgoing_events,
            &sendable,
            write_payload,
        )
    }

    /// Records the sender tick of an incoming packet
    pub fn receive_header(&mut self, header: &PacketHeader) {
        self.clock.update_latest(header.sender_tick);
    }

    /// Whether an incoming event has not been processed yet and is recent
    /// enough to be
    pub fn is_new_event(&self, event_id: SequenceId) -> bool {
        self.processed_event_history.is_new_id(event_id)
    }

    pub fn mark_event_processed(&mut self, event_id: SequenceId) {
        self.processed_event_history.store(event_id);
    }

    /// Drops every leading queued event that is acknowledged, if reliable,
    /// or out of attempts otherwise
    pub fn clean_outgoing_events(&mut self, acked_event_id: SequenceId, pools: &mut EventPools<E>) {
        if !acked_event_id.is_valid() {
            return;
        }

        while let Some(top) = self.outgoing_events.front() {
            let done = if top.is_reliable() {
                top.event_id <= acked_event_id
            } else {
                top.attempts <= 0
            };
            if !done {
                break;
            }
            if let Some(event) = self.outgoing_events.pop_front() {
                pools.release_event(event);
            }
        }
    }

    /// Releases every queued event
    pub fn clear(&mut self, pools: &mut EventPools<E>) {
        for event in self.outgoing_events.drain(..) {
            pools.release_event(event);
        }
    }
}
