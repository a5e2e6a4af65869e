use std::collections::BTreeSet;

use replica_shared::{Connection, Controller, EntityId, Protocol, ReplicationConfig, Tick, View};

/// The client's session with the server
pub struct ClientController<P: Protocol> {
    pub(crate) core: Controller<P::Event>,
    pub(crate) connection: Box<dyn Connection>,
    /// The latest server tick received for each entity, acknowledged back
    /// to the server in every packet
    pub(crate) local_view: View,
    pub(crate) controlled: BTreeSet<EntityId>,
}

impl<P: Protocol> ClientController<P> {
    pub(crate) fn new(connection: Box<dyn Connection>, config: &ReplicationConfig) -> Self {
        Self {
            core: Controller::new(config),
            connection,
            local_view: View::new(),
            controlled: BTreeSet::new(),
        }
    }

    /// Estimate of the server's current tick
    pub fn estimated_remote_tick(&self) -> Tick {
        self.core.estimated_remote_tick()
    }

    /// Highest server tick received so far
    pub fn latest_remote_tick(&self) -> Tick {
        self.core.clock().latest_remote()
    }

    pub fn local_view(&self) -> &View {
        &self.local_view
    }

    /// Entities the server has handed control of to this client
    pub fn controlled_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.controlled.iter().copied()
    }
}
