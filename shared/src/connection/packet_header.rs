use replica_serde::{BitBuffer, Serde, SerdeErr};

use crate::{sequence_id::SequenceId, tick::Tick};

/// Leads every packet, in both directions
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub struct PacketHeader {
    /// The sender's tick when the packet was written
    pub sender_tick: Tick,
    /// The latest tick the sender has received from the recipient
    pub ack_tick: Tick,
    /// The latest event id the sender has processed from the recipient
    pub ack_event_id: SequenceId,
}

impl Serde for PacketHeader {
    fn ser(&self, buffer: &mut BitBuffer) {
        // Write: [SenderTick]
        self.sender_tick.ser(buffer);

        // Write: [AckTick]
        self.ack_tick.ser(buffer);

        // Write: [AckEventId]
        self.ack_event_id.ser(buffer);
    }

    fn de(buffer: &mut BitBuffer) -> Result<Self, SerdeErr> {
        Ok(Self {
            sender_tick: Tick::de(buffer)?,
            ack_tick: Tick::de(buffer)?,
            ack_event_id: SequenceId::de(buffer)?,
        })
    }
}
