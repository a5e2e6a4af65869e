pub mod error;

pub use error::TransportError;

/// The only contract the replication core needs from a transport: hand one
/// packet to the remote peer, best-effort.
///
/// Incoming payloads travel the other way: whoever owns the transport hands
/// each received packet to the world's `receive_payload`, one call per
/// packet.
pub trait Connection {
    fn send_payload(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}
