use thiserror::Error;

use replica_shared::EntityId;

/// Errors returned by [`ClientWorld`](crate::ClientWorld) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// No connection to the server has been set
    #[error("the client has no connection to a server")]
    NotConnected,

    /// A connection to the server was already set
    #[error("the client is already connected to a server")]
    AlreadyConnected,

    /// The entity is not in the client's world
    #[error("{entity_id} is not in the world")]
    UnknownEntity { entity_id: EntityId },
}
