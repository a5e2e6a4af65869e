use std::default::Default;

use crate::{constants::*, tick::Tick};

/// Tuning shared by both ends of a replicated session. The packet caps must
/// match on the server and the client.
#[derive(Clone, Debug)]
pub struct ReplicationConfig {
    /// Ticks between outgoing packets
    pub network_send_rate: u32,
    /// Number of recent commands repeated in every client packet
    pub command_send_count: usize,
    /// Maximum number of unacknowledged commands a client keeps per
    /// controlled entity
    pub command_buffer_count: usize,
    /// Capacity of the incoming state, incoming command and outgoing record
    /// history buffers
    pub dejitter_buffer_length: usize,
    /// Hard cap on the byte size of any packet
    pub packcap_message_total: usize,
    /// Byte cap for the first event pass, which leaves room for the payload
    pub packcap_early_events: usize,
    /// Byte cap for the command block of a client packet
    pub packcap_commands: usize,
    /// Largest encoded entity delta. Larger deltas are dropped with a warning.
    pub maxsize_entity: usize,
    /// Largest encoded event
    pub maxsize_event: usize,
    /// Largest encoded command batch
    pub maxsize_command_update: usize,
    /// Initial capacity, in bytes, of the reusable packet buffers
    pub data_buffer_size: usize,
    /// Lower bound of the remote clock's delay window, in ticks
    pub clock_delay_min: u32,
    /// Upper bound of the remote clock's delay window, in ticks
    pub clock_delay_max: u32,
    /// Send attempts given to best-effort events when none are specified
    pub default_event_attempts: i32,
}

impl ReplicationConfig {
    /// Whether packets go out on `tick`
    pub fn is_send_tick(&self, tick: Tick) -> bool {
        tick.is_send_tick(self.network_send_rate)
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            network_send_rate: NETWORK_SEND_RATE,
            command_send_count: COMMAND_SEND_COUNT,
            command_buffer_count: COMMAND_BUFFER_COUNT,
            dejitter_buffer_length: DEJITTER_BUFFER_LENGTH,
            packcap_message_total: PACKCAP_MESSAGE_TOTAL,
            packcap_early_events: PACKCAP_EARLY_EVENTS,
            packcap_commands: PACKCAP_COMMANDS,
            maxsize_entity: MAXSIZE_ENTITY,
            maxsize_event: MAXSIZE_EVENT,
            maxsize_command_update: MAXSIZE_COMMAND_UPDATE,
            data_buffer_size: DATA_BUFFER_SIZE,
            clock_delay_min: CLOCK_DELAY_MIN,
            clock_delay_max: CLOCK_DELAY_MAX,
            default_event_attempts: DEFAULT_EVENT_ATTEMPTS,
        }
    }
}
