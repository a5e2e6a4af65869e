use std::collections::VecDeque;

use replica_shared::{
    Command, DejitterBuffer, EntityId, Pools, Protocol, ReplicationConfig, State, StateData, StateDelta,
    Tick, UpdateOrder, WorldEntity,
};

use crate::behavior::ClientBehavior;

/// An entity as seen by a client.
///
/// Three states are kept. The authoritative state is the server's state at
/// the current server tick. The next state, when there is one, is the
/// server's state at the following received tick, for interpolation. The
/// main state is what the application works with: a copy of the
/// authoritative state, or for controlled entities the latest server state
/// with every unacknowledged command replayed on top.
pub struct ClientEntity<P: Protocol> {
    id: EntityId,
    state: State<P::State>,
    auth_state: State<P::State>,
    next_state: State<P::State>,
    auth_tick: Tick,
    next_tick: Tick,
    pub(crate) incoming_states: DejitterBuffer<StateDelta<P::State>>,
    pub(crate) outgoing_commands: VecDeque<Command<P::Command>>,
    /// The local tick we last sent this entity's commands on
    pub(crate) last_sent_command_tick: Tick,
    is_frozen: bool,
    should_be_frozen: bool,
    is_controlled: bool,
    pub(crate) removed_tick: Tick,
    pub(crate) has_started: bool,
    pub(crate) defer_notify_controller_changed: bool,
}

impl<P: Protocol> ClientEntity<P> {
    pub(crate) fn new(
        id: EntityId,
        template: &State<P::State>,
        pools: &mut Pools<P>,
        config: &ReplicationConfig,
    ) -> Self {
        Self {
            id,
            state: pools.states.create_state_like(template),
            auth_state: pools.states.create_state_like(template),
            next_state: pools.states.create_state_like(template),
            auth_tick: Tick::START,
            next_tick: Tick::INVALID,
            // the server only sends every few ticks
            incoming_states: DejitterBuffer::new(
                config.dejitter_buffer_length,
                config.network_send_rate,
            ),
            outgoing_commands: VecDeque::new(),
            last_sent_command_tick: Tick::START,
            // entities start frozen until their first delta is applied
            is_frozen: true,
            should_be_frozen: true,
            is_controlled: false,
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

    /// The main state: authoritative for proxies, predicted when controlled
    pub fn state(&self) -> &State<P::State> {
        &self.state
    }

    pub fn data(&self) -> &P::State {
        &self.state.data
    }

    pub fn data_mut(&mut self) -> &mut P::State {
        &mut self.state.data
    }

    /// The server's state at [`ClientEntity::auth_tick`]
    pub fn auth_state(&self) -> &State<P::State> {
        &self.auth_state
    }

    pub fn auth_tick(&self) -> Tick {
        self.auth_tick
    }

    /// The server's state at the next received tick, if it is known
    pub fn next_state(&self) -> Option<&State<P::State>> {
        self.next_tick.is_valid().then_some(&self.next_state)
    }

    /// Invalid when there is no next state
    pub fn next_tick(&self) -> Tick {
        self.next_tick
    }

    /// Frozen entities are out of this client's scope and do not update
    pub fn is_frozen(&self) -> bool {
        self.is_frozen
    }

    /// Whether this client controls the entity
    pub fn is_controlled(&self) -> bool {
        self.is_controlled
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

    /// Commands sampled but not yet acknowledged by the server
    pub fn pending_commands(&self) -> impl Iterator<Item = &Command<P::Command>> {
        self.outgoing_commands.iter()
    }

    /// Hands control of the entity to this client, or takes it away.
    /// Unsent commands are released either way.
    pub(crate) fn set_controlled(&mut self, controlled: bool, pools: &mut Pools<P>) {
        self.is_controlled = controlled;
        self.release_commands(pools);
        self.defer_notify_controller_changed = true;
    }

    /// Releases every command the server has acknowledged
    pub(crate) fn clean_commands(&mut self, command_ack: Tick, pools: &mut Pools<P>) {
        if !command_ack.is_valid() {
            return;
        }

        while let Some(command) = self.outgoing_commands.front() {
            if command.client_tick > command_ack {
                break;
            }
            if let Some(command) = self.outgoing_commands.pop_front() {
                pools.commands.release(command);
            }
        }
    }

    /// Rolls the authoritative state forward through every delta up to
    /// `world_tick`, and prepares the next state for interpolation
    pub(crate) fn update_auth_state(&mut self, world_tick: Tick) {
        let (to_apply, next) = self
            .incoming_states
            .range_and_next(self.auth_tick, world_tick);

        for delta in to_apply {
            if let Some(state) = delta.state.as_ref().filter(|_| !delta.is_frozen) {
                self.auth_state.apply_delta(state);
            }
            self.should_be_frozen = delta.is_frozen;
            self.auth_tick = delta.tick;
        }

        let next = next
            .filter(|next| !self.should_be_frozen && !next.is_frozen)
            .and_then(|next| next.state.as_ref().map(|state| (next.tick, state)));
        match next {
            Some((tick, state)) => {
                self.next_state.overwrite_from(&self.auth_state);
                self.next_state.apply_delta(state);
                self.next_tick = tick;
            }
            None => self.next_tick = Tick::INVALID,
        }

        self.state.overwrite_from(&self.auth_state);
    }

    /// Applies a pending freeze or unfreeze, returning whether the frozen
    /// status changed
    pub(crate) fn update_frozen(&mut self) -> bool {
        let changed = self.is_frozen != self.should_be_frozen;
        self.is_frozen = self.should_be_frozen;
        changed
    }

    /// Samples this tick's command, then predicts the main state: the
    /// latest received server state with every pending command replayed
    pub(crate) fn update_controlled<B: ClientBehavior<P>>(
        &mut self,
        local_tick: Tick,
        config: &ReplicationConfig,
        pools: &mut Pools<P>,
        behavior: &mut B,
    ) {
        self.next_tick = Tick::INVALID;

        if self.outgoing_commands.len() < config.command_buffer_count {
            let mut command = pools.commands.allocate();
            command.client_tick = local_tick;
            command.is_new = true;
            behavior.sample_command(self, &mut command);
            self.outgoing_commands.push_back(command);
        }

        for delta in self.incoming_states.range(self.auth_tick) {
            if let Some(state) = delta.state.as_ref().filter(|_| !delta.is_frozen) {
                self.state.apply_delta(state);
            }
        }

        behavior.revert(self);

        for command in self.outgoing_commands.iter_mut() {
            behavior.apply_command(self.id, &mut self.state.data, command);
            command.is_new = false;
        }
    }

    fn release_commands(&mut self, pools: &mut Pools<P>) {
        for command in self.outgoing_commands.drain(..) {
            pools.commands.release(command);
        }
    }

    /// Returns every pooled object held by this entity
    pub(crate) fn release(mut self, pools: &mut Pools<P>) {
        self.release_commands(pools);
        self.incoming_states.clear(&mut pools.states);
        pools.states.release_state(self.state);
        pools.states.release_state(self.auth_state);
        pools.states.release_state(self.next_state);
    }
}

impl<P: Protocol> WorldEntity for ClientEntity<P> {
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
