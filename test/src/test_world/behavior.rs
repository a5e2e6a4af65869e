use replica_client::{ClientBehavior, ClientEntity};
use replica_server::{ControllerKey, ServerBehavior, ServerEntity};
use replica_shared::{Command, EntityId, Event, Tick};

use crate::test_protocol::{apply_movement, Game, GameCommand, GameEvent, GameState};

/// Server side of the game. Records every hook it sees.
#[derive(Default)]
pub struct GameServerBehavior {
    pub joined: Vec<ControllerKey>,
    pub left: Vec<ControllerKey>,
    pub events: Vec<(ControllerKey, GameEvent)>,
    pub entity_events: Vec<(ControllerKey, EntityId, GameEvent)>,
    pub started: Vec<EntityId>,
    pub controller_changes: Vec<(EntityId, Option<ControllerKey>)>,
    pub shut_down: Vec<EntityId>,
    /// Client ticks of the commands applied, in order, repeats included
    pub applied_commands: Vec<Tick>,
    pub last_tick: Tick,
}

impl ServerBehavior<Game> for GameServerBehavior {
    fn on_controller_joined(&mut self, key: ControllerKey) {
        self.joined.push(key);
    }

    fn on_controller_left(&mut self, key: ControllerKey) {
        self.left.push(key);
    }

    fn on_event(&mut self, key: ControllerKey, event: &Event<GameEvent>) {
        self.events.push((key, event.data.clone()));
    }

    fn on_entity_event(
        &mut self,
        key: ControllerKey,
        entity: &mut ServerEntity<Game>,
        event: &Event<GameEvent>,
    ) {
        self.entity_events
            .push((key, entity.id(), event.data.clone()));
    }

    fn on_start(&mut self, entity: &mut ServerEntity<Game>) {
        self.started.push(entity.id());
    }

    fn on_controller_changed(&mut self, entity: &mut ServerEntity<Game>) {
        self.controller_changes
            .push((entity.id(), entity.controller()));
    }

    fn apply_command(
        &mut self,
        _entity_id: EntityId,
        state: &mut GameState,
        command: &Command<GameCommand>,
    ) {
        self.applied_commands.push(command.client_tick);
        apply_movement(state, &command.data, command.is_new);
    }

    fn on_shutdown(&mut self, entity: &ServerEntity<Game>) {
        self.shut_down.push(entity.id());
    }

    fn post_world_update(&mut self, tick: Tick) {
        self.last_tick = tick;
    }
}

/// Client side of the game. Samples `input` into every command, predicts
/// with the same movement rules as the server, and records every hook.
#[derive(Default)]
pub struct GameClientBehavior {
    pub input: GameCommand,
    pub events: Vec<GameEvent>,
    pub entity_events: Vec<(EntityId, GameEvent)>,
    pub started: Vec<EntityId>,
    pub controller_changes: Vec<(EntityId, bool)>,
    pub frozen: Vec<EntityId>,
    pub unfrozen: Vec<EntityId>,
    pub shut_down: Vec<EntityId>,
    pub sampled: u32,
}

impl ClientBehavior<Game> for GameClientBehavior {
    fn on_event(&mut self, event: &Event<GameEvent>) {
        self.events.push(event.data.clone());
    }

    fn on_entity_event(&mut self, entity: &mut ClientEntity<Game>, event: &Event<GameEvent>) {
        self.entity_events.push((entity.id(), event.data.clone()));
    }

    fn on_start(&mut self, entity: &mut ClientEntity<Game>) {
        self.started.push(entity.id());
    }

    fn on_controller_changed(&mut self, entity: &mut ClientEntity<Game>) {
        self.controller_changes
            .push((entity.id(), entity.is_controlled()));
    }

    fn on_frozen(&mut self, entity: &mut ClientEntity<Game>) {
        self.frozen.push(entity.id());
    }

    fn on_unfrozen(&mut self, entity: &mut ClientEntity<Game>) {
        self.unfrozen.push(entity.id());
    }

    fn sample_command(&mut self, _entity: &mut ClientEntity<Game>, command: &mut Command<GameCommand>) {
        command.data = self.input.clone();
        self.sampled += 1;
    }

    fn apply_command(
        &mut self,
        _entity_id: EntityId,
        state: &mut GameState,
        command: &Command<GameCommand>,
    ) {
        apply_movement(state, &command.data, command.is_new);
    }

    fn on_shutdown(&mut self, entity: &ClientEntity<Game>) {
        self.shut_down.push(entity.id());
    }
}
