use std::collections::{BTreeMap, HashMap, VecDeque};

use log::{debug, trace, warn};

use replica_shared::{
    decode_packet, BitBuffer, Connection, EntityId, KindCodec, Pools, Protocol, Recycle,
    ReplicationConfig, SequenceId, StateDelta, Tick, TransportError, ViewEntry, World,
};

use crate::{
    behavior::ClientBehavior,
    client_config::ClientConfig,
    controller::ClientController,
    entity::ClientEntity,
    error::ClientError,
    packet::{read_server_payload, write_client_payload},
};

/// The client's replica of the server world.
///
/// Set the connection to the server with [`ClientWorld::set_connection`]
/// and feed its packets in with [`ClientWorld::receive_payload`]. Each call
/// to [`ClientWorld::update`] processes what was received, steps every
/// entity to the estimated server tick, and on send ticks writes a packet
/// back to the server.
pub struct ClientWorld<P: Protocol> {
    config: ClientConfig,
    world: World<ClientEntity<P>>,
    /// Entities seen in a delta, waiting for the server clock to reach one
    /// of their states
    pending: BTreeMap<EntityId, ClientEntity<P>>,
    /// Entities that have shut down, with their removal tick. Late deltas
    /// for them are ignored.
    retired: HashMap<EntityId, Tick>,
    controller: Option<ClientController<P>>,
    incoming_payloads: VecDeque<Vec<u8>>,
    pools: Pools<P>,
    state_kinds: KindCodec,
    event_kinds: KindCodec,
    buffer: BitBuffer,
    local_tick: Tick,
    transport_errors: Vec<TransportError>,
}

impl<P: Protocol> ClientWorld<P> {
    pub fn new(config: ClientConfig) -> Self {
        let buffer = BitBuffer::with_capacity(config.replication.data_buffer_size / 4);
        Self {
            config,
            world: World::new(Tick::INVALID),
            pending: BTreeMap::new(),
            retired: HashMap::new(),
            controller: None,
            incoming_payloads: VecDeque::new(),
            pools: Pools::new(),
            state_kinds: KindCodec::new::<P::State>(),
            event_kinds: KindCodec::new::<P::Event>(),
            buffer,
            local_tick: Tick::START,
            transport_errors: Vec::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sets the connection to the server. Nothing is sent or processed
    /// until this is called.
    pub fn set_connection(&mut self, connection: Box<dyn Connection>) -> Result<(), ClientError> {
        if self.controller.is_some() {
            return Err(ClientError::AlreadyConnected);
        }
        self.controller = Some(ClientController::new(
            connection,
            &self.config.replication,
        ));
        debug!("Client connected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.controller.is_some()
    }

    pub fn controller(&self) -> Option<&ClientController<P>> {
        self.controller.as_ref()
    }

    /// Queues a packet received from the server, to be processed on the
    /// next update
    pub fn receive_payload(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        if self.controller.is_none() {
            return Err(ClientError::NotConnected);
        }
        self.incoming_payloads.push_back(bytes.to_vec());
        Ok(())
    }

    /// Transport failures from the sends of past updates, oldest first
    pub fn take_transport_errors(&mut self) -> Vec<TransportError> {
        std::mem::take(&mut self.transport_errors)
    }

    // Ticks

    /// The local simulation tick, stamped on commands
    pub fn local_tick(&self) -> Tick {
        self.local_tick
    }

    /// The estimated server tick the world was last updated to. Invalid
    /// until the first packet from the server has been processed.
    pub fn server_tick(&self) -> Tick {
        self.world.tick()
    }

    // Entities

    pub fn entity(&self, entity_id: EntityId) -> Option<&ClientEntity<P>> {
        self.world.entity(entity_id)
    }

    pub fn entity_mut(&mut self, entity_id: EntityId) -> Option<&mut ClientEntity<P>> {
        self.world.entity_mut(entity_id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &ClientEntity<P>> {
        self.world.entities()
    }

    /// Number of entities known but not yet in the world
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Entities the server has handed control of to this client
    pub fn controlled_entities(&self) -> Vec<EntityId> {
        self.controller
            .as_ref()
            .map(|controller| controller.controlled_entities().collect())
            .unwrap_or_default()
    }

    /// Every pooled object the world has handed out
    pub fn pools(&self) -> &Pools<P> {
        &self.pools
    }

    // Events

    /// Queues an event for the server. Use
    /// [`Event::SEND_RELIABLE`](replica_shared::Event::SEND_RELIABLE) as
    /// `attempts` to resend until acknowledged.
    pub fn queue_event(&mut self, data: &P::Event, attempts: i32) -> Result<SequenceId, ClientError> {
        self.queue_entity_event(EntityId::INVALID, data, attempts)
    }

    /// Queues an event addressed to an entity in the world. The server only
    /// acts on it if this client controls the entity.
    pub fn queue_entity_event(
        &mut self,
        entity_id: EntityId,
        data: &P::Event,
        attempts: i32,
    ) -> Result<SequenceId, ClientError> {
        let controller = self.controller.as_mut().ok_or(ClientError::NotConnected)?;
        if entity_id.is_valid() && !self.world.contains(entity_id) {
            return Err(ClientError::UnknownEntity { entity_id });
        }
        Ok(controller
            .core
            .queue_event(&mut self.pools.events, data, entity_id, attempts))
    }

    // Update

    /// Runs one client tick. Does nothing until a connection is set.
    pub fn update<B: ClientBehavior<P>>(&mut self, behavior: &mut B) {
        if self.controller.is_none() {
            return;
        }

        while let Some(bytes) = self.incoming_payloads.pop_front() {
            self.read_packet(&bytes, behavior);
        }

        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        controller.core.clock_mut().update();
        let estimated_tick = controller.estimated_remote_tick();

        if estimated_tick.is_valid() {
            self.admit_pending(estimated_tick);
            self.update_entities(estimated_tick, behavior);
            self.prune_retired(estimated_tick);
        }

        if self.config.replication.is_send_tick(self.local_tick) {
            self.send_packet();
        }

        self.local_tick += 1;
    }

    fn read_packet<B: ClientBehavior<P>>(&mut self, bytes: &[u8], behavior: &mut B) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };

        let states = &mut self.pools.states;
        let state_kinds = &self.state_kinds;
        let mut deltas: Vec<StateDelta<P::State>> = Vec::new();
        let result = decode_packet(
            &mut self.buffer,
            bytes,
            &self.config.replication,
            &self.event_kinds,
            &mut self.pools.events,
            |buffer, packet_tick| {
                read_server_payload(buffer, state_kinds, states, packet_tick, &mut deltas)
            },
        );

        let packet = match result {
            Ok(packet) => packet,
            Err(error) => {
                warn!("Bad packet read from server, discarding: {}", error);
                for delta in deltas {
                    self.pools.states.recycle(delta);
                }
                return;
            }
        };

        controller.core.receive_header(&packet.header);

        for event in packet.events {
            if controller.core.is_new_event(event.event_id) {
                if !event.entity_id.is_valid() {
                    behavior.on_event(&event);
                } else if let Some(entity) = self.world.entity_mut(event.entity_id) {
                    behavior.on_entity_event(entity, &event);
                } else {
                    debug!("Dropping event for {}, not in the world", event.entity_id);
                }
                controller.core.mark_event_processed(event.event_id);
            }
            self.pools.events.release_event(event);
        }

        controller
            .core
            .clean_outgoing_events(packet.header.ack_event_id, &mut self.pools.events);

        for delta in deltas {
            controller
                .local_view
                .record_update(delta.entity_id, ViewEntry::new(delta.tick, delta.is_frozen));
            receive_delta(
                delta,
                controller,
                &mut self.world,
                &mut self.pending,
                &mut self.retired,
                &mut self.pools,
                &self.config.replication,
            );
        }
    }

    /// Moves pending entities into the world once they have a state at or
    /// before the estimated server tick
    fn admit_pending(&mut self, estimated_tick: Tick) {
        let ready: Vec<EntityId> = self
            .pending
            .values()
            .filter(|entity| entity.incoming_states.latest_at(estimated_tick).is_some())
            .map(|entity| entity.id())
            .collect();

        for entity_id in ready {
            if let Some(entity) = self.pending.remove(&entity_id) {
                trace!("{} entered the world", entity_id);
                self.world.insert(entity);
            }
        }
    }

    fn update_entities<B: ClientBehavior<P>>(&mut self, estimated_tick: Tick, behavior: &mut B) {
        let local_tick = self.local_tick;
        let config = &self.config.replication;
        let pools = &mut self.pools;
        let mut shut_down = Vec::new();

        self.world.update(
            estimated_tick,
            |entity| update_entity(entity, estimated_tick, local_tick, config, pools, behavior),
            |entity| shut_down.push(entity),
        );

        for entity in shut_down {
            behavior.on_shutdown(&entity);
            trace!("{} shut down on {}", entity.id(), estimated_tick);

            if let Some(controller) = self.controller.as_mut() {
                controller.controlled.remove(&entity.id());
            }
            self.retired.insert(entity.id(), entity.removed_tick());
            entity.release(&mut self.pools);
        }
    }

    /// Forgets retired entities once the server is far enough past their
    /// removal that no delta for them can still be in flight
    fn prune_retired(&mut self, estimated_tick: Tick) {
        let horizon = self.config.replication.dejitter_buffer_length as i32;
        let Some(controller) = self.controller.as_mut() else {
            return;
        };

        self.retired.retain(|entity_id, removed_tick| {
            let keep = !removed_tick.is_valid() || estimated_tick - *removed_tick <= horizon;
            if !keep {
                controller.local_view.remove(*entity_id);
            }
            keep
        });
    }

    fn send_packet(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let local_tick = self.local_tick;
        let config = &self.config.replication;

        // round-robin, so no entity's commands are starved
        let mut controlled: Vec<&ClientEntity<P>> = controller
            .controlled
            .iter()
            .filter_map(|entity_id| self.world.entity(*entity_id))
            .collect();
        controlled.sort_by_key(|entity| entity.last_sent_command_tick);

        let view = controller.local_view.newest_first();
        let mut sent: Vec<EntityId> = Vec::new();
        let result = controller.core.write_packet(
            &mut self.buffer,
            config,
            &self.event_kinds,
            local_tick,
            |buffer, reserved_bytes| {
                write_client_payload(buffer, config, reserved_bytes, &controlled, &view, &mut sent)
            },
        );

        match result {
            Ok(bytes) => {
                if let Err(error) = controller.connection.send_payload(&bytes) {
                    warn!("Failed to send to server: {}", error);
                    self.transport_errors.push(error);
                }
            }
            Err(error) => warn!("Failed to write packet for server: {}", error),
        }

        for entity_id in sent {
            if let Some(entity) = self.world.entity_mut(entity_id) {
                entity.last_sent_command_tick = local_tick;
            }
        }
    }
}

/// Files a received delta with its entity, creating the entity if this is
/// the first time it is seen, and updates control from its controller data
fn receive_delta<P: Protocol>(
    delta: StateDelta<P::State>,
    controller: &mut ClientController<P>,
    world: &mut World<ClientEntity<P>>,
    pending: &mut BTreeMap<EntityId, ClientEntity<P>>,
    retired: &mut HashMap<EntityId, Tick>,
    pools: &mut Pools<P>,
    config: &ReplicationConfig,
) {
    let entity_id = delta.entity_id;
    if retired.contains_key(&entity_id) {
        pools.states.recycle(delta);
        return;
    }

    if !world.contains(entity_id) && !pending.contains_key(&entity_id) {
        // an entity can only be discovered through a delta with state
        let template = match delta.state.as_ref() {
            Some(state) if !delta.is_frozen && !delta.is_destroyed() => state,
            _ => {
                // retire it, so its view entry is pruned like any other
                if !delta.is_frozen && delta.is_destroyed() {
                    let removed_tick = delta
                        .state
                        .as_ref()
                        .map_or(Tick::INVALID, |state| state.removed_tick);
                    retired.insert(entity_id, removed_tick);
                }
                pools.states.recycle(delta);
                return;
            }
        };
        let entity = ClientEntity::new(entity_id, template, pools, config);
        pending.insert(entity_id, entity);
        debug!("Discovered {}", entity_id);
    }

    let entity = match world.entity_mut(entity_id) {
        Some(entity) => entity,
        None => match pending.get_mut(&entity_id) {
            Some(entity) => entity,
            None => {
                pools.states.recycle(delta);
                return;
            }
        },
    };

    let is_frozen = delta.is_frozen;
    let (has_controller_data, command_ack) = match delta.state.as_ref() {
        Some(state) if !is_frozen => (state.has_controller_data, state.command_ack),
        _ => (false, Tick::INVALID),
    };

    if !is_frozen && delta.is_destroyed() {
        entity.removed_tick = delta
            .state
            .as_ref()
            .map_or(Tick::INVALID, |state| state.removed_tick);
        pools.states.recycle(delta);
    } else if let Err(delta) = entity.incoming_states.store(delta, &mut pools.states) {
        pools.states.recycle(delta);
    }

    if has_controller_data {
        entity.clean_commands(command_ack, pools);
    }

    // a frozen delta says nothing about control
    if is_frozen {
        return;
    }

    if has_controller_data && !entity.is_controlled() {
        entity.set_controlled(true, pools);
        controller.controlled.insert(entity_id);
        debug!("Granted control of {}", entity_id);
    } else if !has_controller_data && entity.is_controlled() {
        entity.set_controlled(false, pools);
        controller.controlled.remove(&entity_id);
        debug!("Control of {} revoked", entity_id);
    }
}

fn update_entity<P: Protocol, B: ClientBehavior<P>>(
    entity: &mut ClientEntity<P>,
    world_tick: Tick,
    local_tick: Tick,
    config: &ReplicationConfig,
    pools: &mut Pools<P>,
    behavior: &mut B,
) {
    entity.update_auth_state(world_tick);

    if !entity.has_started {
        entity.has_started = true;
        behavior.on_start(entity);
    }

    if entity.defer_notify_controller_changed {
        entity.defer_notify_controller_changed = false;
        behavior.on_controller_changed(entity);
    }

    if entity.update_frozen() {
        if entity.is_frozen() {
            trace!("{} frozen", entity.id());
            behavior.on_frozen(entity);
        } else {
            trace!("{} unfrozen", entity.id());
            behavior.on_unfrozen(entity);
        }
    }

    if entity.is_frozen() {
        return;
    }

    if entity.is_controlled() {
        entity.update_controlled(local_tick, config, pools, behavior);
    } else {
        behavior.update_proxy(entity);
    }

    behavior.post_update(entity);
}
