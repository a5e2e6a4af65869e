use replica_serde::{log2, BitBuffer, Serde, SerdeErr};

use crate::{
    buffers::RollingBuffer, entity_id::EntityId, pool::Pool, pool::Poolable,
    protocol::CommandData, tick::Tick, Timed,
};

/// One tick of client input for a controlled entity
#[derive(Debug, Clone)]
pub struct Command<C: CommandData> {
    /// The client's local tick when the command was sampled
    pub client_tick: Tick,
    /// Cleared once the command has been applied, so replays can tell a
    /// fresh command from a re-simulated one
    pub is_new: bool,
    pub data: C,
}

impl<C: CommandData> Command<C> {
    pub fn write(&self, buffer: &mut BitBuffer) {
        // Write: [ClientTick]
        self.client_tick.ser(buffer);

        // Write: [CommandData]
        self.data.encode(buffer);
    }

    pub fn read_into(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        // Read: [ClientTick]
        self.client_tick = Tick::de(buffer)?;

        // Read: [CommandData]
        self.data.decode(buffer)
    }
}

impl<C: CommandData> Default for Command<C> {
    fn default() -> Self {
        Self {
            client_tick: Tick::INVALID,
            is_new: true,
            data: C::default(),
        }
    }
}

impl<C: CommandData> Poolable for Command<C> {
    fn reset(&mut self) {
        self.client_tick = Tick::INVALID;
        self.is_new = true;
        self.data = C::default();
    }
}

impl<C: CommandData> Timed for Command<C> {
    fn tick(&self) -> Tick {
        self.client_tick
    }
}

/// The most recent commands for one entity, as batched into a client
/// packet. Each packet repeats the last few commands so that a lost packet
/// does not lose input.
#[derive(Debug)]
pub struct CommandUpdate<C: CommandData> {
    pub entity_id: EntityId,
    pub commands: RollingBuffer<Command<C>>,
}

impl<C: CommandData> CommandUpdate<C> {
    pub fn new(entity_id: EntityId, capacity: usize) -> Self {
        Self {
            entity_id,
            commands: RollingBuffer::new(capacity),
        }
    }

    /// Bits used for the command count of a batch holding up to `capacity`
    pub fn count_bits(capacity: usize) -> u32 {
        log2(capacity as u32) + 1
    }

    /// Writes the last `capacity` of `commands`, oldest first
    pub fn write<'a, I>(buffer: &mut BitBuffer, entity_id: EntityId, capacity: usize, commands: I)
    where
        C: 'a,
        I: DoubleEndedIterator<Item = &'a Command<C>>,
    {
        let mut batch: Vec<&Command<C>> = commands.rev().take(capacity).collect();
        batch.reverse();

        // Write: [EntityId]
        entity_id.ser(buffer);

        // Write: [Count]
        buffer.write(Self::count_bits(capacity), batch.len() as u32);

        // Write: [Commands]
        for command in batch {
            command.write(buffer);
        }
    }

    pub fn read(
        buffer: &mut BitBuffer,
        capacity: usize,
        pool: &mut Pool<Command<C>>,
    ) -> Result<Self, SerdeErr> {
        // Read: [EntityId]
        let entity_id = EntityId::de(buffer)?;
        let mut update = Self::new(entity_id, capacity);

        // Read: [Count]
        let count = buffer.read(Self::count_bits(capacity))?;

        // Read: [Commands]
        for _ in 0..count {
            let mut command = pool.allocate();
            if let Err(error) = command.read_into(buffer) {
                pool.release(command);
                update.release(pool);
                return Err(error);
            }
            if let Some(evicted) = update.commands.store(command) {
                pool.release(evicted);
            }
        }

        Ok(update)
    }

    /// Returns every command to the pool
    pub fn release(mut self, pool: &mut Pool<Command<C>>) {
        for command in self.commands.drain() {
            pool.release(command);
        }
    }
}
