use std::fmt;

use replica_serde::{BitBuffer, Serde, SerdeErr};

/// Opaque identifier for a replicated entity. `0` is invalid, the server
/// assigns ids monotonically starting from [`EntityId::START`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityId(u32);

impl EntityId {
    pub const INVALID: EntityId = EntityId(0);
    pub const START: EntityId = EntityId(1);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }

    pub fn next(&self) -> EntityId {
        EntityId(self.0 + 1)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "EntityId:{}", self.0)
        } else {
            write!(f, "EntityId:INVALID")
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serde for EntityId {
    fn ser(&self, buffer: &mut BitBuffer) {
        buffer.write_uint(self.0);
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        Ok(EntityId(buffer.read_uint()?))
    }
}
