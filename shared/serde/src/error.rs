use thiserror::Error;

/// Errors raised while reading values back out of a [`BitBuffer`](crate::BitBuffer)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// A read would consume bits past the last written bit
    #[error("attempted to read {requested} bits at position {position}, only {written} bits were written")]
    OutOfBounds {
        position: usize,
        requested: u32,
        written: usize,
    },
    /// A single fixed-width read or write asked for more than 32 bits
    #[error("cannot transfer {bits} bits at once, the maximum is 32")]
    TooManyBits { bits: u32 },
    /// A variable length integer did not terminate within 5 bytes
    #[error("variable length integer exceeds 32 bits")]
    VarIntOverflow,
    /// The payload handed to `load` was empty or had no sentinel bit
    #[error("payload of {length} bytes has no sentinel bit")]
    MissingSentinel { length: usize },
    /// A decoded type code does not name a registered variant
    #[error("unknown type code {code}")]
    UnknownTypeCode { code: u32 },
}
