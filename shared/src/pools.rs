use std::collections::HashMap;

use crate::{
    command::Command,
    event::Event,
    pool::{Pool, Recycle},
    protocol::{EventData, Protocol, ProtocolError, StateData},
    state::{State, StateDelta, StateRecord},
};

/// One pool of states per state kind
pub struct StatePools<S: StateData> {
    pools: HashMap<u16, Pool<State<S>>>,
}

impl<S: StateData> StatePools<S> {
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
        }
    }

    /// Allocates a default state of the given kind
    pub fn create_state(&mut self, kind: u16) -> Result<State<S>, ProtocolError> {
        self.pools
            .entry(kind)
            .or_default()
            .try_allocate_with(|| {
                S::from_kind(kind)
                    .map(State::new)
                    .ok_or(ProtocolError::UnknownStateKind { kind })
            })
    }

    /// Allocates a default state of the same kind as `template`
    pub fn create_state_like(&mut self, template: &State<S>) -> State<S> {
        let kind = template.kind();
        self.pools.entry(kind).or_default().allocate_with(|| {
            State::new(S::from_kind(kind).unwrap_or_else(|| template.data.clone()))
        })
    }

    /// Allocates a full copy of `source`, see [`State::overwrite_from`]
    pub fn clone_state(&mut self, source: &State<S>) -> State<S> {
        let mut state = self.create_state_like(source);
        state.overwrite_from(source);
        state
    }

    pub fn release_state(&mut self, state: State<S>) {
        self.pools.entry(state.kind()).or_default().release(state);
    }

    /// States currently handed out
    pub fn live(&self) -> usize {
        self.pools.values().map(Pool::live).sum()
    }
}

impl<S: StateData> Default for StatePools<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateData> Recycle<State<S>> for StatePools<S> {
    fn recycle(&mut self, value: State<S>) {
        self.release_state(value);
    }
}

impl<S: StateData> Recycle<StateDelta<S>> for StatePools<S> {
    fn recycle(&mut self, value: StateDelta<S>) {
        if let Some(state) = value.state {
            self.release_state(state);
        }
    }
}

impl<S: StateData> Recycle<StateRecord<S>> for StatePools<S> {
    fn recycle(&mut self, value: StateRecord<S>) {
        self.release_state(value.state);
    }
}

/// One pool of events per event kind
pub struct EventPools<E: EventData> {
    pools: HashMap<u16, Pool<Event<E>>>,
}

impl<E: EventData> EventPools<E> {
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
        }
    }

    pub fn create_event(&mut self, kind: u16) -> Result<Event<E>, ProtocolError> {
        self.pools
            .entry(kind)
            .or_default()
            .try_allocate_with(|| {
                E::from_kind(kind)
                    .map(Event::new)
                    .ok_or(ProtocolError::UnknownEventKind { kind })
            })
    }

    /// Allocates an unsent event carrying a copy of `data`
    pub fn create_event_from(&mut self, data: &E) -> Event<E> {
        let mut event = self
            .pools
            .entry(data.kind())
            .or_default()
            .allocate_with(|| Event::new(data.clone()));
        event.data.clone_from(data);
        event
    }

    /// Allocates a copy of `source`, including its id and attempts
    pub fn clone_event(&mut self, source: &Event<E>) -> Event<E> {
        let mut event = self.create_event_from(&source.data);
        event.event_id = source.event_id;
        event.entity_id = source.entity_id;
        event.attempts = source.attempts;
        event
    }

    pub fn release_event(&mut self, event: Event<E>) {
        self.pools.entry(event.kind()).or_default().release(event);
    }

    pub fn live(&self) -> usize {
        self.pools.values().map(Pool::live).sum()
    }
}

impl<E: EventData> Default for EventPools<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EventData> Recycle<Event<E>> for EventPools<E> {
    fn recycle(&mut self, value: Event<E>) {
        self.release_event(value);
    }
}

/// Every pool a world allocates its replication objects from
pub struct Pools<P: Protocol> {
    pub states: StatePools<P::State>,
    pub commands: Pool<Command<P::Command>>,
    pub events: EventPools<P::Event>,
}

impl<P: Protocol> Pools<P> {
    pub fn new() -> Self {
        Self {
            states: StatePools::new(),
            commands: Pool::new(),
            events: EventPools::new(),
        }
    }

    /// Total number of pooled objects currently handed out
    pub fn live(&self) -> usize {
        self.states.live() + self.commands.live() + self.events.live()
    }
}

impl<P: Protocol> Default for Pools<P> {
    fn default() -> Self {
        Self::new()
    }
}
