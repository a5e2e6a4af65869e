//! # Replica Test
//! End-to-end harness for the replica crates: a small game protocol, an
//! in-memory transport, and a server/client pair wired through it.

pub mod helpers;

pub use helpers::{read_server_packet, ServerPacket};
pub use local_connection::{LocalConnection, LocalConnectionPair, LocalLink};
pub use test_protocol::{
    apply_movement, AvatarState, DummyEntityState, Game, GameActionEvent, GameCommand, GameEvent,
    GameScopeEvaluator, GameState,
};
pub use test_world::{GameClientBehavior, GameServerBehavior, TestWorld};
