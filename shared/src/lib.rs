//! # Replica Shared
//! Common functionality shared between replica-server & replica-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use replica_serde::{
    log2, BitBuffer, FloatCompressor, IntCompressor, Serde, SerdeErr, ASCII_BITS,
    PACKED_COUNT_MAX, STRING_LENGTH_MAX, VARINT_FALLBACK_SIZE,
};

mod buffers;
mod clock;
mod command;
mod config;
mod connection;
pub mod constants;
mod controller;
mod entity_id;
mod event;
mod pool;
mod pools;
mod protocol;
mod sequence_id;
mod sequence_window;
mod state;
mod tick;
mod transport;
mod view;
mod world;

pub use buffers::{DejitterBuffer, QueueBuffer, RollingBuffer};
pub use clock::Clock;
pub use command::{Command, CommandUpdate};
pub use config::ReplicationConfig;
pub use connection::{
    decoder::{decode_packet, IncomingPacket},
    encoder::{encode_packet, PAYLOAD_RESERVED_BYTES},
    error::PacketError,
    packet_header::PacketHeader,
};
pub use controller::Controller;
pub use entity_id::EntityId;
pub use event::Event;
pub use pool::{Pool, PoolError, Poolable, Recycle};
pub use pools::{EventPools, Pools, StatePools};
pub use protocol::{
    CommandData, EventData, KindCodec, Kinded, Protocol, ProtocolError, StateData,
};
pub use sequence_id::SequenceId;
pub use sequence_window::SequenceWindow;
pub use state::{State, StateDelta, StateRecord};
pub use tick::{Tick, TickError, Timed};
pub use transport::{Connection, TransportError};
pub use view::{read_view_entry, write_view_entry, View, ViewEntry};
pub use world::{UpdateOrder, World, WorldEntity};
