/// Default network send rate, in ticks per packet
pub const NETWORK_SEND_RATE: u32 = 2;

/// Number of recent commands repeated in every client packet
pub const COMMAND_SEND_COUNT: usize = 8;

/// Number of unacknowledged commands a client buffers for prediction
pub const COMMAND_BUFFER_COUNT: usize = 50;

/// Number of entries kept in a dejitter buffer
pub const DEJITTER_BUFFER_LENGTH: usize = 50;

/// Size of the scratch buffer used for packet I/O
pub const DATA_BUFFER_SIZE: usize = 2048;

/// Maximum size of a packet, based on known internet MTUs
pub const PACKCAP_MESSAGE_TOTAL: usize = 1200;

/// Byte cap of the first event pass of a packet
pub const PACKCAP_EARLY_EVENTS: usize = 370;

/// Byte cap of the command block of a client packet
pub const PACKCAP_COMMANDS: usize = 670;

pub const MAXSIZE_ENTITY: usize = 100;
pub const MAXSIZE_EVENT: usize = 100;
pub const MAXSIZE_COMMAND_UPDATE: usize = 100;

/// Bounds of the window the remote clock estimate is kept in, in ticks
pub const CLOCK_DELAY_MIN: u32 = 3;
pub const CLOCK_DELAY_MAX: u32 = 9;

/// Send attempts given to best-effort events by default
pub const DEFAULT_EVENT_ATTEMPTS: i32 = 3;
