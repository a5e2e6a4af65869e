use std::collections::{BTreeSet, VecDeque};

use replica_shared::{Connection, Controller, EntityId, Protocol, ReplicationConfig, Tick};

use crate::scope::Scope;

// ControllerKey
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct ControllerKey(u64);

impl ControllerKey {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

/// A connected client, as seen by the server
pub struct ServerController<P: Protocol> {
    key: ControllerKey,
    pub(crate) core: Controller<P::Event>,
    pub(crate) connection: Box<dyn Connection>,
    pub(crate) scope: Scope<P>,
    pub(crate) controlled: BTreeSet<EntityId>,
    pub(crate) incoming_payloads: VecDeque<Vec<u8>>,
}

impl<P: Protocol> ServerController<P> {
    pub(crate) fn new(
        key: ControllerKey,
        connection: Box<dyn Connection>,
        config: &ReplicationConfig,
    ) -> Self {
        Self {
            key,
            core: Controller::new(config),
            connection,
            scope: Scope::new(),
            controlled: BTreeSet::new(),
            incoming_payloads: VecDeque::new(),
        }
    }

    pub fn key(&self) -> ControllerKey {
        self.key
    }

    /// Entities this client currently controls
    pub fn controlled_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.controlled.iter().copied()
    }

    pub fn controls(&self, entity_id: EntityId) -> bool {
        self.controlled.contains(&entity_id)
    }

    /// Estimate of the client's current local tick
    pub fn estimated_remote_tick(&self) -> Tick {
        self.core.estimated_remote_tick()
    }

    /// Highest client tick received so far
    pub fn latest_remote_tick(&self) -> Tick {
        self.core.clock().latest_remote()
    }

    pub fn scope(&self) -> &Scope<P> {
        &self.scope
    }
}
