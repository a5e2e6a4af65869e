use std::collections::HashMap;

use replica_serde::{BitBuffer, Serde, SerdeErr};

use crate::{entity_id::EntityId, tick::Tick};

/// The latest acknowledged status of one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEntry {
    pub tick: Tick,
    pub is_frozen: bool,
}

impl ViewEntry {
    pub const INVALID: ViewEntry = ViewEntry {
        tick: Tick::INVALID,
        is_frozen: true,
    };

    pub fn new(tick: Tick, is_frozen: bool) -> Self {
        Self { tick, is_frozen }
    }
}

/// Per-peer record of which tick of each entity was last seen, and whether
/// it was frozen at that tick
#[derive(Debug, Clone, Default)]
pub struct View {
    latest_updates: HashMap<EntityId, ViewEntry>,
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest recorded entry, or [`ViewEntry::INVALID`] if none
    pub fn get_latest(&self, entity_id: EntityId) -> ViewEntry {
        self.latest_updates
            .get(&entity_id)
            .copied()
            .unwrap_or(ViewEntry::INVALID)
    }

    /// Records an entry unless a newer one is already known
    pub fn record_update(&mut self, entity_id: EntityId, entry: ViewEntry) {
        match self.latest_updates.get_mut(&entity_id) {
            Some(current) if current.tick > entry.tick => {}
            Some(current) => *current = entry,
            None => {
                self.latest_updates.insert(entity_id, entry);
            }
        }
    }

    /// Records every entry of `other`
    pub fn integrate(&mut self, other: &View) {
        for (entity_id, entry) in other.iter() {
            self.record_update(entity_id, entry);
        }
    }

    pub fn remove(&mut self, entity_id: EntityId) {
        self.latest_updates.remove(&entity_id);
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, ViewEntry)> + '_ {
        self.latest_updates
            .iter()
            .map(|(entity_id, entry)| (*entity_id, *entry))
    }

    /// Every entry, most recently updated first
    pub fn newest_first(&self) -> Vec<(EntityId, ViewEntry)> {
        let mut output: Vec<(EntityId, ViewEntry)> = self.iter().collect();
        output.sort_by(|(_, a), (_, b)| b.tick.cmp(&a.tick));
        output
    }

    pub fn len(&self) -> usize {
        self.latest_updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest_updates.is_empty()
    }

    pub fn clear(&mut self) {
        self.latest_updates.clear();
    }
}

/// Writes one view entry as `[EntityId][Tick][IsFrozen]`
pub fn write_view_entry(buffer: &mut BitBuffer, entity_id: EntityId, entry: &ViewEntry) {
    entity_id.ser(buffer);
    entry.tick.ser(buffer);
    buffer.write_bool(entry.is_frozen);
}

pub fn read_view_entry(buffer: &mut BitBuffer) -> Result<(EntityId, ViewEntry), SerdeErr> {
    let entity_id = EntityId::de(buffer)?;
    let tick = Tick::de(buffer)?;
    let is_frozen = buffer.read_bool()?;
    Ok((entity_id, ViewEntry::new(tick, is_frozen)))
}
