use thiserror::Error;

use replica_serde::SerdeErr;

use crate::protocol::ProtocolError;

/// Reasons an incoming packet is discarded, or an outgoing one cannot be
/// produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// The packet is truncated or otherwise malformed
    #[error("malformed packet: {0}")]
    Serde(#[from] SerdeErr),

    /// The packet names a type the protocol does not know
    #[error("packet refers to an unknown type: {0}")]
    Protocol(#[from] ProtocolError),

    /// Bits were left over after the last section of the packet
    #[error("{remaining} unread bits after the end of the packet")]
    TrailingBits { remaining: usize },

    /// An entity id of 0 was found where a real entity is required
    #[error("packet refers to the invalid entity id")]
    InvalidEntityId,

    /// The packet is larger than the configured packet cap
    #[error("packet of {length} bytes exceeds the {max} byte cap")]
    PacketTooLarge { length: usize, max: usize },
}
