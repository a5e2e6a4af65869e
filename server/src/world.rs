use std::collections::{BTreeMap, HashMap, VecDeque};

use log::{debug, info, trace, warn};

use replica_shared::{
    decode_packet, BitBuffer, Connection, EntityId, KindCodec, Pools, Protocol, Recycle,
    SequenceId, Tick, TransportError, World,
};

use crate::{
    behavior::ServerBehavior,
    controller::{ControllerKey, ServerController},
    entity::ServerEntity,
    error::ServerError,
    packet::{read_client_payload, write_deltas, ClientPayload, SentDelta},
    scope::ScopeEvaluator,
    server_config::ServerConfig,
};

enum ControllerNotice {
    Joined(ControllerKey),
    Left(ControllerKey),
}

/// The authoritative world.
///
/// Connections are added with [`ServerWorld::add_connection`], and their
/// packets fed in with [`ServerWorld::receive_payload`]. Each call to
/// [`ServerWorld::update`] processes what was received, advances the world
/// by one tick, and on send ticks writes one packet to every controller.
pub struct ServerWorld<P: Protocol> {
    config: ServerConfig,
    world: World<ServerEntity<P>>,
    /// Entities past their removal tick that some client has not yet seen
    /// removed
    destroyed: BTreeMap<EntityId, ServerEntity<P>>,
    controllers: HashMap<ControllerKey, ServerController<P>>,
    notices: VecDeque<ControllerNotice>,
    pools: Pools<P>,
    state_kinds: KindCodec,
    event_kinds: KindCodec,
    buffer: BitBuffer,
    next_entity_id: EntityId,
    next_controller_key: u64,
    transport_errors: Vec<(ControllerKey, TransportError)>,
}

impl<P: Protocol> ServerWorld<P> {
    pub fn new(config: ServerConfig) -> Self {
        let buffer = BitBuffer::with_capacity(config.replication.data_buffer_size / 4);
        Self {
            config,
            world: World::new(Tick::START),
            destroyed: BTreeMap::new(),
            controllers: HashMap::new(),
            notices: VecDeque::new(),
            pools: Pools::new(),
            state_kinds: KindCodec::new::<P::State>(),
            event_kinds: KindCodec::new::<P::Event>(),
            buffer,
            next_entity_id: EntityId::START,
            next_controller_key: 0,
            transport_errors: Vec::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The tick of the most recent update
    pub fn tick(&self) -> Tick {
        self.world.tick()
    }

    // Connections

    /// Registers a newly connected client. The behavior hears about it on
    /// the next update.
    pub fn add_connection(&mut self, connection: Box<dyn Connection>) -> ControllerKey {
        let key = ControllerKey::new(self.next_controller_key);
        self.next_controller_key += 1;

        self.controllers.insert(
            key,
            ServerController::new(key, connection, &self.config.replication),
        );
        self.notices.push_back(ControllerNotice::Joined(key));
        info!("Controller {} connected", key.to_u64());
        key
    }

    /// Drops a client. Every entity it controlled has its control revoked,
    /// and its queued events and unprocessed packets are discarded.
    pub fn remove_connection(&mut self, key: ControllerKey) -> Result<(), ServerError> {
        let mut controller = self
            .controllers
            .remove(&key)
            .ok_or(ServerError::UnknownController { key })?;

        for entity_id in controller.controlled.iter() {
            if let Some(entity) = self.world.entity_mut(*entity_id) {
                entity.set_controller(None, &mut self.pools);
            }
        }
        controller.core.clear(&mut self.pools.events);

        self.notices.push_back(ControllerNotice::Left(key));
        info!("Controller {} disconnected", key.to_u64());
        Ok(())
    }

    /// Queues a packet received from a client. Packets are processed on the
    /// next update, in the order they were received.
    pub fn receive_payload(&mut self, key: ControllerKey, bytes: &[u8]) -> Result<(), ServerError> {
        let controller = self
            .controllers
            .get_mut(&key)
            .ok_or(ServerError::UnknownController { key })?;
        controller.incoming_payloads.push_back(bytes.to_vec());
        Ok(())
    }

    pub fn controller(&self, key: ControllerKey) -> Option<&ServerController<P>> {
        self.controllers.get(&key)
    }

    pub fn controllers(&self) -> impl Iterator<Item = &ServerController<P>> {
        self.controllers.values()
    }

    pub fn set_scope_evaluator(
        &mut self,
        key: ControllerKey,
        evaluator: Box<dyn ScopeEvaluator<P>>,
    ) -> Result<(), ServerError> {
        let controller = self
            .controllers
            .get_mut(&key)
            .ok_or(ServerError::UnknownController { key })?;
        controller.scope.set_evaluator(evaluator);
        Ok(())
    }

    /// Transport failures from the sends of past updates, oldest first
    pub fn take_transport_errors(&mut self) -> Vec<(ControllerKey, TransportError)> {
        std::mem::take(&mut self.transport_errors)
    }

    // Entities

    /// Creates an entity holding the default state of `kind`. It is first
    /// updated, and first sent, on the next update.
    pub fn create_entity(&mut self, kind: u16) -> Result<EntityId, ServerError> {
        let state = self.pools.states.create_state(kind)?;

        let entity_id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.next();

        self.world.insert(ServerEntity::new(
            entity_id,
            state,
            &self.config.replication,
        ));
        debug!("Created {} of kind {}", entity_id, kind);
        Ok(entity_id)
    }

    /// Schedules an entity for removal on the next tick. Its controller, if
    /// any, loses control immediately.
    pub fn destroy_entity(&mut self, entity_id: EntityId) -> Result<(), ServerError> {
        let removed_tick = self.world.tick().next();
        let entity = self
            .world
            .entity_mut(entity_id)
            .ok_or(ServerError::UnknownEntity { entity_id })?;

        if let Some(key) = entity.controller() {
            entity.set_controller(None, &mut self.pools);
            if let Some(controller) = self.controllers.get_mut(&key) {
                controller.controlled.remove(&entity_id);
            }
        }

        if !entity.is_removing() {
            entity.mark_for_removal(removed_tick);
            debug!("Destroying {} on {}", entity_id, removed_tick);
        }
        Ok(())
    }

    pub fn entity(&self, entity_id: EntityId) -> Option<&ServerEntity<P>> {
        self.world.entity(entity_id)
    }

    pub fn entity_mut(&mut self, entity_id: EntityId) -> Option<&mut ServerEntity<P>> {
        self.world.entity_mut(entity_id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &ServerEntity<P>> {
        self.world.entities()
    }

    /// Number of destroyed entities whose removal some client has yet to see
    pub fn destroyed_count(&self) -> usize {
        self.destroyed.len()
    }

    /// Hands control of an entity to a controller. Granting an entity to
    /// the controller that already has it does nothing.
    pub fn grant_control(
        &mut self,
        key: ControllerKey,
        entity_id: EntityId,
    ) -> Result<(), ServerError> {
        let controller = self
            .controllers
            .get_mut(&key)
            .ok_or(ServerError::UnknownController { key })?;
        let entity = self
            .world
            .entity_mut(entity_id)
            .ok_or(ServerError::UnknownEntity { entity_id })?;

        match entity.controller() {
            Some(current) if current == key => return Ok(()),
            Some(current) => {
                return Err(ServerError::AlreadyControlled {
                    entity_id,
                    controller: current,
                })
            }
            None => {}
        }

        entity.set_controller(Some(key), &mut self.pools);
        controller.controlled.insert(entity_id);
        debug!("Granted control of {} to {}", entity_id, key.to_u64());
        Ok(())
    }

    pub fn revoke_control(
        &mut self,
        key: ControllerKey,
        entity_id: EntityId,
    ) -> Result<(), ServerError> {
        let entity = self
            .world
            .entity_mut(entity_id)
            .ok_or(ServerError::UnknownEntity { entity_id })?;
        if entity.controller() != Some(key) {
            return Err(ServerError::NotController { entity_id, key });
        }

        entity.set_controller(None, &mut self.pools);
        if let Some(controller) = self.controllers.get_mut(&key) {
            controller.controlled.remove(&entity_id);
        }
        debug!("Revoked control of {} from {}", entity_id, key.to_u64());
        Ok(())
    }

    // Events

    /// Queues an event for one controller. Use
    /// [`Event::SEND_RELIABLE`](replica_shared::Event::SEND_RELIABLE) as
    /// `attempts` to resend until acknowledged.
    pub fn queue_event(
        &mut self,
        key: ControllerKey,
        data: &P::Event,
        attempts: i32,
    ) -> Result<SequenceId, ServerError> {
        self.queue_entity_event(key, EntityId::INVALID, data, attempts)
    }

    /// Queues an event addressed to an entity, for one controller
    pub fn queue_entity_event(
        &mut self,
        key: ControllerKey,
        entity_id: EntityId,
        data: &P::Event,
        attempts: i32,
    ) -> Result<SequenceId, ServerError> {
        let controller = self
            .controllers
            .get_mut(&key)
            .ok_or(ServerError::UnknownController { key })?;
        Ok(controller
            .core
            .queue_event(&mut self.pools.events, data, entity_id, attempts))
    }

    /// Queues an event for every controller whose scope evaluator accepts it
    pub fn queue_event_broadcast(&mut self, data: &P::Event, attempts: i32) {
        for controller in self.controllers.values_mut() {
            if controller.scope.evaluate_event(data) {
                controller
                    .core
                    .queue_event(&mut self.pools.events, data, EntityId::INVALID, attempts);
            }
        }
    }

    /// Every pooled object the world has handed out
    pub fn pools(&self) -> &Pools<P> {
        &self.pools
    }

    // Update

    /// Runs one server tick: processes received packets, updates every
    /// entity, and on send ticks writes a packet to every controller.
    pub fn update<B: ServerBehavior<P>>(&mut self, behavior: &mut B) {
        self.dispatch_notices(behavior);
        self.process_incoming(behavior);

        for controller in self.controllers.values_mut() {
            controller.core.clock_mut().update();
        }

        let tick = self.world.tick().next();
        behavior.pre_update(tick);

        let controllers = &self.controllers;
        let mut shut_down = Vec::new();
        self.world.update(
            tick,
            |entity| update_entity(entity, controllers, behavior),
            |entity| shut_down.push(entity),
        );

        for mut entity in shut_down {
            behavior.on_shutdown(&entity);
            entity.incoming_commands.clear(&mut self.pools.commands);
            trace!("{} shut down on {}", entity.id(), tick);
            self.destroyed.insert(entity.id(), entity);
        }

        behavior.post_world_update(tick);

        if self.config.replication.is_send_tick(tick) {
            self.send_packets(tick);
        }
    }

    fn dispatch_notices<B: ServerBehavior<P>>(&mut self, behavior: &mut B) {
        while let Some(notice) = self.notices.pop_front() {
            match notice {
                ControllerNotice::Joined(key) => behavior.on_controller_joined(key),
                ControllerNotice::Left(key) => behavior.on_controller_left(key),
            }
        }
    }

    fn process_incoming<B: ServerBehavior<P>>(&mut self, behavior: &mut B) {
        let mut keys: Vec<ControllerKey> = self.controllers.keys().copied().collect();
        keys.sort();

        for key in keys {
            while let Some(bytes) = self
                .controllers
                .get_mut(&key)
                .and_then(|controller| controller.incoming_payloads.pop_front())
            {
                self.read_packet(key, &bytes, behavior);
            }
        }
    }

    fn read_packet<B: ServerBehavior<P>>(
        &mut self,
        key: ControllerKey,
        bytes: &[u8],
        behavior: &mut B,
    ) {
        let Some(controller) = self.controllers.get_mut(&key) else {
            return;
        };

        let config = &self.config.replication;
        let commands = &mut self.pools.commands;
        let mut payload = ClientPayload::new();
        let result = decode_packet(
            &mut self.buffer,
            bytes,
            config,
            &self.event_kinds,
            &mut self.pools.events,
            |buffer, _| read_client_payload(buffer, config, commands, &mut payload),
        );

        let packet = match result {
            Ok(packet) => packet,
            Err(error) => {
                warn!(
                    "Bad packet read from controller {}, discarding: {}",
                    key.to_u64(),
                    error
                );
                payload.release(&mut self.pools.commands);
                return;
            }
        };

        controller.core.receive_header(&packet.header);

        for event in packet.events {
            if controller.core.is_new_event(event.event_id) {
                if !event.entity_id.is_valid() {
                    behavior.on_event(key, &event);
                } else {
                    match self.world.entity_mut(event.entity_id) {
                        Some(entity) if entity.controller() == Some(key) => {
                            behavior.on_entity_event(key, entity, &event)
                        }
                        _ => debug!(
                            "Dropping event for {}, not controlled by {}",
                            event.entity_id,
                            key.to_u64()
                        ),
                    }
                }
                controller.core.mark_event_processed(event.event_id);
            }
            self.pools.events.release_event(event);
        }

        controller
            .core
            .clean_outgoing_events(packet.header.ack_event_id, &mut self.pools.events);
        controller.scope.integrate_acked(&payload.view);

        for mut update in payload.command_updates {
            let entity = self
                .world
                .entity_mut(update.entity_id)
                .filter(|entity| entity.controller() == Some(key));

            let Some(entity) = entity else {
                update.release(&mut self.pools.commands);
                continue;
            };

            for command in update.commands.drain() {
                if let Err(command) = entity
                    .incoming_commands
                    .store(command, &mut self.pools.commands)
                {
                    self.pools.commands.release(command);
                }
            }
        }
    }

    fn send_packets(&mut self, tick: Tick) {
        for entity in self.world.entities_mut() {
            entity.store_record(tick, &mut self.pools);
        }

        let mut keys: Vec<ControllerKey> = self.controllers.keys().copied().collect();
        keys.sort();

        // shuffle order of controllers in order to avoid priority among clients
        fastrand::shuffle(&mut keys);

        for key in keys {
            let Some(controller) = self.controllers.get_mut(&key) else {
                continue;
            };

            let deltas = controller.scope.populate_deltas(
                key,
                tick,
                self.world.entities(),
                self.destroyed.values(),
                &mut self.pools.states,
            );

            let config = &self.config.replication;
            let state_kinds = &self.state_kinds;
            let mut sent: Vec<SentDelta> = Vec::new();
            let result = controller.core.write_packet(
                &mut self.buffer,
                config,
                &self.event_kinds,
                tick,
                |buffer, reserved_bytes| {
                    write_deltas(buffer, config, state_kinds, &deltas, reserved_bytes, &mut sent)
                },
            );

            match result {
                Ok(bytes) => {
                    for delta in sent {
                        controller
                            .scope
                            .record_sent(delta.entity_id, delta.tick, delta.is_frozen);
                    }
                    if let Err(error) = controller.connection.send_payload(&bytes) {
                        warn!("Failed to send to controller {}: {}", key.to_u64(), error);
                        self.transport_errors.push((key, error));
                    }
                }
                Err(error) => warn!(
                    "Failed to write packet for controller {}: {}",
                    key.to_u64(),
                    error
                ),
            }

            for delta in deltas {
                self.pools.states.recycle(delta);
            }
        }

        self.forget_destroyed();
    }

    /// Releases destroyed entities every client has seen removed
    fn forget_destroyed(&mut self) {
        let forgotten: Vec<EntityId> = self
            .destroyed
            .values()
            .filter(|entity| {
                !self.controllers.values().any(|controller| {
                    controller
                        .scope
                        .is_removal_pending(entity.id(), entity.removed_tick())
                })
            })
            .map(|entity| entity.id())
            .collect();

        for entity_id in forgotten {
            let Some(entity) = self.destroyed.remove(&entity_id) else {
                continue;
            };
            for controller in self.controllers.values_mut() {
                controller.scope.forget(entity_id);
            }
            entity.release(&mut self.pools);
            trace!("Forgot {}", entity_id);
        }
    }
}

fn update_entity<P: Protocol, B: ServerBehavior<P>>(
    entity: &mut ServerEntity<P>,
    controllers: &HashMap<ControllerKey, ServerController<P>>,
    behavior: &mut B,
) {
    if !entity.has_started {
        entity.has_started = true;
        behavior.on_start(entity);
    }

    if entity.defer_notify_controller_changed {
        entity.defer_notify_controller_changed = false;
        behavior.on_controller_changed(entity);
    }

    behavior.update_auth(entity);

    let estimated_tick = entity
        .controller()
        .and_then(|key| controllers.get(&key))
        .map(ServerController::estimated_remote_tick);
    if let Some(estimated_tick) = estimated_tick {
        entity.apply_latest_command(estimated_tick, behavior);
    }

    behavior.post_update(entity);
}
