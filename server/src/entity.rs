use replica_shared::{
    Command, DejitterBuffer, EntityId, Pools, Protocol, QueueBuffer, ReplicationConfig, State, StateData,
    StateRecord, Tick, UpdateOrder, WorldEntity,
};

use crate::{behavior::ServerBehavior, controller::ControllerKey};

/// An entity as held by the server: the authoritative state, the commands
/// received from its controller, and the history of states used as delta
/// bases for each client.
pub struct ServerEntity<P: Protocol> {
    id: EntityId,
    state: State<P::State>,
    pub(crate) incoming_commands: DejitterBuffer<Command<P::Command>>,
    pub(crate) outgoing_states: QueueBuffer<StateRecord<P::State>>,
    /// The client tick of the last command we processed
    command_ack: Tick,
    pub(crate) controller: Option<ControllerKey>,
    removed_tick: Tick,
    pub(crate) has_started: bool,
    pub(crate) defer_notify_controller_changed: bool,
}

impl<P: Protocol> ServerEntity<P> {
    pub(crate) fn new(id: EntityId, state: State<P::State>, config: &ReplicationConfig) -> Self {
        Self {
            id,
            state,
            // commands arrive in batches that fill the gaps between send
            // ticks, so they are stored without a divisor
            incoming_commands: DejitterBuffer::new(config.dejitter_buffer_length, 1),
            outgoing_states: QueueBuffer::new(config.dejitter_buffer_length),
            command_ack: Tick::INVALID,
            controller: None,
            removed_tick: Tick::INVALID,
            has_started: false,
            defer_notify_controller_changed: true,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> u16 {
        self.state.kind()
    }

    pub fn state(&self) -> &State<P::State> {
        &self.state
    }

    pub fn data(&self) -> &P::State {
        &self.state.data
    }

    pub fn data_mut(&mut self) -> &mut P::State {
        &mut self.state.data
    }

    /// The controller currently in charge of this entity, if any
    pub fn controller(&self) -> Option<ControllerKey> {
        self.controller
    }

    pub fn is_controlled(&self) -> bool {
        self.controller.is_some()
    }

    pub fn command_ack(&self) -> Tick {
        self.command_ack
    }

    pub fn removed_tick(&self) -> Tick {
        self.removed_tick
    }

    pub fn is_removing(&self) -> bool {
        self.removed_tick.is_valid()
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub(crate) fn mark_for_removal(&mut self, removed_tick: Tick) {
        self.removed_tick = removed_tick;
    }

    /// Hands control to `controller`, or takes it away with `None`.
    /// Buffered commands from the previous controller are released.
    pub(crate) fn set_controller(&mut self, controller: Option<ControllerKey>, pools: &mut Pools<P>) {
        self.controller = controller;
        self.incoming_commands.clear(&mut pools.commands);
        self.defer_notify_controller_changed = true;
    }

    /// Applies the latest command at or before `estimated_tick`, the
    /// controller's estimate of its own current tick.
    ///
    /// The estimate rather than the command's own tick becomes the
    /// acknowledgement, since commands may be skipped to keep up.
    pub(crate) fn apply_latest_command<B: ServerBehavior<P>>(
        &mut self,
        estimated_tick: Tick,
        behavior: &mut B,
    ) {
        let Some(command) = self.incoming_commands.latest_at_mut(estimated_tick) else {
            return;
        };

        behavior.apply_command(self.id, &mut self.state.data, command);
        command.is_new = false;

        if !self.command_ack.is_valid() || estimated_tick > self.command_ack {
            self.command_ack = estimated_tick;
        }
    }

    /// Snapshots the current state into the outgoing history, if it changed
    pub(crate) fn store_record(&mut self, tick: Tick, pools: &mut Pools<P>) {
        let record = StateRecord::produce(
            &mut pools.states,
            tick,
            &self.state,
            self.outgoing_states.latest(),
        );
        if let Some(record) = record {
            self.outgoing_states.store(record, &mut pools.states);
        }
    }

    /// The recorded state at or before `tick`
    pub(crate) fn record_at(&self, tick: Tick) -> Option<&StateRecord<P::State>> {
        if !tick.is_valid() {
            return None;
        }
        self.outgoing_states.latest_at(tick)
    }

    /// Returns every pooled object held by this entity
    pub(crate) fn release(mut self, pools: &mut Pools<P>) {
        self.incoming_commands.clear(&mut pools.commands);
        self.outgoing_states.clear(&mut pools.states);
        pools.states.release_state(self.state);
    }
}

impl<P: Protocol> WorldEntity for ServerEntity<P> {
    fn id(&self) -> EntityId {
        self.id
    }

    fn removed_tick(&self) -> Tick {
        self.removed_tick
    }

    fn update_order(&self) -> UpdateOrder {
        self.state.data.update_order()
    }
}
