use thiserror::Error;

/// Errors that can occur while resolving protocol type codes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A state kind is not part of the registered state family
    #[error("unknown state kind {kind}")]
    UnknownStateKind { kind: u16 },
    /// An event kind is not part of the registered event family
    #[error("unknown event kind {kind}")]
    UnknownEventKind { kind: u16 },
}
