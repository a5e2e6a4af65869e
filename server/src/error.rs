use thiserror::Error;

use replica_shared::{EntityId, ProtocolError};

use crate::controller::ControllerKey;

/// Errors returned by [`ServerWorld`](crate::ServerWorld) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// No connected controller has this key
    #[error("no connected controller with key {key:?}")]
    UnknownController { key: ControllerKey },

    /// The entity does not exist, or has already been destroyed
    #[error("{entity_id} does not exist")]
    UnknownEntity { entity_id: EntityId },

    /// The entity is already controlled by another controller
    #[error("{entity_id} is already controlled by {controller:?}")]
    AlreadyControlled {
        entity_id: EntityId,
        controller: ControllerKey,
    },

    /// The entity is not controlled by the given controller
    #[error("{entity_id} is not controlled by {key:?}")]
    NotController {
        entity_id: EntityId,
        key: ControllerKey,
    },

    /// The requested state kind is not part of the protocol
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
