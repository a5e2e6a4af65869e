use std::default::Default;

use replica_shared::ReplicationConfig;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Replication tuning. Packet caps must match the server's config.
    pub replication: ReplicationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            replication: ReplicationConfig::default(),
        }
    }
}
