mod update_order;

pub use update_order::UpdateOrder;

use std::collections::BTreeMap;

use crate::{entity_id::EntityId, tick::Tick};

/// What the shared update loop needs to know about an entity
pub trait WorldEntity {
    fn id(&self) -> EntityId;

    /// The tick the entity is removed on, or invalid if it is not being
    /// removed
    fn removed_tick(&self) -> Tick;

    fn update_order(&self) -> UpdateOrder;
}

/// Entities keyed by id, with the tick-driven update pass shared by the
/// server and the client
pub struct World<T: WorldEntity> {
    tick: Tick,
    entities: BTreeMap<EntityId, T>,
}

impl<T: WorldEntity> World<T> {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            entities: BTreeMap::new(),
        }
    }

    /// The current synchronized tick. The authoritative tick on the server,
    /// the estimated server tick on a client.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn entity(&self, entity_id: EntityId) -> Option<&T> {
        self.entities.get(&entity_id)
    }

    pub fn entity_mut(&mut self, entity_id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&entity_id)
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.entities.contains_key(&entity_id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &T> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Adds an entity, handing back any entity it displaced
    pub fn insert(&mut self, entity: T) -> Option<T> {
        self.entities.insert(entity.id(), entity)
    }

    pub fn remove(&mut self, entity_id: EntityId) -> Option<T> {
        self.entities.remove(&entity_id)
    }

    /// Takes every entity out of the world
    pub fn drain(&mut self) -> impl Iterator<Item = T> {
        std::mem::take(&mut self.entities).into_values()
    }

    /// Moves the world to `tick` and updates every entity, `Early` entities
    /// first and `Late` ones last. Entities whose removal tick has been
    /// reached are taken out of the world and handed to `on_shutdown`
    /// instead of being updated.
    pub fn update<U, D>(&mut self, tick: Tick, mut on_update: U, mut on_shutdown: D)
    where
        U: FnMut(&mut T),
        D: FnMut(T),
    {
        self.tick = tick;

        let mut to_remove = Vec::new();
        for order in UpdateOrder::ALL {
            for entity in self.entities.values_mut() {
                if entity.update_order() != order {
                    continue;
                }

                let removed_tick = entity.removed_tick();
                if removed_tick.is_valid() && removed_tick <= tick {
                    to_remove.push(entity.id());
                } else {
                    on_update(entity);
                }
            }
        }

        for entity_id in to_remove {
            if let Some(entity) = self.entities.remove(&entity_id) {
                on_shutdown(entity);
            }
        }
    }
}
