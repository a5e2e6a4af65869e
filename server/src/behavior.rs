use replica_shared::{Command, EntityId, Event, Protocol, Tick};

use crate::{controller::ControllerKey, entity::ServerEntity};

/// Application logic run by [`ServerWorld::update`](crate::ServerWorld::update).
///
/// Every method has a no-op default. Per-entity hooks are handed the
/// entity, and the application matches on the variant of its state.
pub trait ServerBehavior<P: Protocol> {
    /// A controller connected. It controls no entities yet.
    fn on_controller_joined(&mut self, _key: ControllerKey) {}

    /// A controller disconnected. Its entities have already had their
    /// control revoked.
    fn on_controller_left(&mut self, _key: ControllerKey) {}

    /// An event not addressed to an entity
    fn on_event(&mut self, _key: ControllerKey, _event: &Event<P::Event>) {}

    /// An event addressed to an entity controlled by the sender.
    /// Events for entities the sender does not control are dropped.
    fn on_entity_event(
        &mut self,
        _key: ControllerKey,
        _entity: &mut ServerEntity<P>,
        _event: &Event<P::Event>,
    ) {
    }

    /// Before any entity is updated for `tick`
    fn pre_update(&mut self, _tick: Tick) {}

    /// The first update of an entity
    fn on_start(&mut self, _entity: &mut ServerEntity<P>) {}

    /// The entity gained, lost or changed controller since its last update.
    /// Also called on the first update.
    fn on_controller_changed(&mut self, _entity: &mut ServerEntity<P>) {}

    /// Authoritative simulation for one tick, before any command is applied
    fn update_auth(&mut self, _entity: &mut ServerEntity<P>) {}

    /// Applies the controller's command for this tick. `command.is_new` is
    /// false when the same command is applied again because no newer one
    /// has arrived.
    fn apply_command(
        &mut self,
        _entity_id: EntityId,
        _state: &mut P::State,
        _command: &Command<P::Command>,
    ) {
    }

    fn post_update(&mut self, _entity: &mut ServerEntity<P>) {}

    /// The entity has reached its removal tick and left the world
    fn on_shutdown(&mut self, _entity: &ServerEntity<P>) {}

    /// After every entity has been updated for `tick`
    fn post_world_update(&mut self, _tick: Tick) {}
}
