//! # Replica Server
//! The authoritative side of a replicated session. Owns entity state,
//! applies the commands of controlling clients, and sends every connected
//! client the deltas of the entities in its scope.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use replica_shared::{
        BitBuffer, Command, CommandData, Connection, EntityId, Event, EventData, Kinded,
        Protocol, ReplicationConfig, SequenceId, Serde, SerdeErr, State, StateData, Tick,
        TransportError, UpdateOrder,
    };
}

mod behavior;
mod controller;
mod entity;
mod error;
mod packet;
mod scope;
mod server_config;
mod world;


pub use behavior::ServerBehavior;
pub use controller::{ControllerKey, ServerController};
pub use entity::ServerEntity;
pub use error::ServerError;
pub use scope::{DefaultScopeEvaluator, Scope, ScopeEvaluator};
pub use server_config::ServerConfig;
pub use world::ServerWorld;
