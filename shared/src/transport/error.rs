use thiserror::Error;

/// Errors reported by a transport when handing it a payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The remote peer is no longer reachable
    #[error("the peer has disconnected")]
    Disconnected,

    /// The transport could not send a payload
    #[error("failed to send a {length} byte payload: {reason}")]
    SendFailed { length: usize, reason: String },
}
