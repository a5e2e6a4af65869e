//! # Replica Client
//! The client side of a replicated session. Buffers the deltas received
//! from the server, steps every known entity to the estimated server tick,
//! and predicts the entities this client controls by replaying its
//! unacknowledged commands.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod shared {
    pub use replica_shared::{
        BitBuffer, Command, CommandData, Connection, EntityId, Event, EventData, Kinded,
        Protocol, ReplicationConfig, SequenceId, Serde, SerdeErr, State, StateData, Tick,
        TransportError, UpdateOrder,
    };
}

mod behavior;
mod client_config;
mod controller;
mod entity;
mod error;
mod interpolation;
mod packet;
mod world;

#[cfg(test)]
mod test_protocol;

pub use behavior::ClientBehavior;
pub use client_config::ClientConfig;
pub use controller::ClientController;
pub use entity::ClientEntity;
pub use error::ClientError;
pub use interpolation::{compute_interpolation, interpolate, ticks_ahead};
pub use world::ClientWorld;
