use std::default::Default;

use replica_shared::ReplicationConfig;

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Replication tuning. Packet caps must match the clients' config.
    pub replication: ReplicationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            replication: ReplicationConfig::default(),
        }
    }
}
