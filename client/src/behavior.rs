use replica_shared::{Command, EntityId, Event, Protocol};

use crate::entity::ClientEntity;

/// Application logic run by [`ClientWorld::update`](crate::ClientWorld::update).
///
/// Every method has a no-op default. Hooks only run for entities in the
/// world; entities still waiting on their first usable delta are skipped.
pub trait ClientBehavior<P: Protocol> {
    /// An event from the server not addressed to an entity
    fn on_event(&mut self, _event: &Event<P::Event>) {}

    /// An event from the server addressed to an entity in the world. Events
    /// for other entities are dropped.
    fn on_entity_event(&mut self, _entity: &mut ClientEntity<P>, _event: &Event<P::Event>) {}

    /// The first update of an entity
    fn on_start(&mut self, _entity: &mut ClientEntity<P>) {}

    /// This client gained or lost control of the entity. Also called on the
    /// first update.
    fn on_controller_changed(&mut self, _entity: &mut ClientEntity<P>) {}

    /// The entity left this client's scope. Its state stops advancing.
    fn on_frozen(&mut self, _entity: &mut ClientEntity<P>) {}

    /// The entity came back into scope
    fn on_unfrozen(&mut self, _entity: &mut ClientEntity<P>) {}

    /// Per-tick update of an entity controlled by someone else
    fn update_proxy(&mut self, _entity: &mut ClientEntity<P>) {}

    /// Fills in this tick's input for a controlled entity
    fn sample_command(&mut self, _entity: &mut ClientEntity<P>, _command: &mut Command<P::Command>) {}

    /// Called on a controlled entity once its state has been rolled forward
    /// to the latest server state, before pending commands are replayed on
    /// top of it
    fn revert(&mut self, _entity: &mut ClientEntity<P>) {}

    /// Applies a command to the predicted state. `command.is_new` is true
    /// only the first time a command is applied.
    fn apply_command(
        &mut self,
        _entity_id: EntityId,
        _state: &mut P::State,
        _command: &Command<P::Command>,
    ) {
    }

    fn post_update(&mut self, _entity: &mut ClientEntity<P>) {}

    /// The entity has reached its removal tick and left the world
    fn on_shutdown(&mut self, _entity: &ClientEntity<P>) {}
}
