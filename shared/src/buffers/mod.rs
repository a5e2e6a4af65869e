mod dejitter_buffer;
mod queue_buffer;
mod rolling_buffer;

pub use dejitter_buffer::DejitterBuffer;
pub use queue_buffer::QueueBuffer;
pub use rolling_buffer::RollingBuffer;
