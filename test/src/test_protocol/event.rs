use replica_shared::{BitBuffer, EventData, Kinded, SerdeErr, Tick};

/// Every event variant of the game
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Action(GameActionEvent),
    Notice(String),
}

impl Kinded for GameEvent {
    fn kind(&self) -> u16 {
        match self {
            GameEvent::Action(_) => 0,
            GameEvent::Notice(_) => 1,
        }
    }

    fn from_kind(kind: u16) -> Option<Self> {
        match kind {
            0 => Some(GameEvent::Action(GameActionEvent::default())),
            1 => Some(GameEvent::Notice(String::new())),
            _ => None,
        }
    }

    fn kind_count() -> u16 {
        2
    }
}

impl EventData for GameEvent {
    fn encode(&self, buffer: &mut BitBuffer, _packet_tick: Tick) {
        match self {
            GameEvent::Action(action) => buffer.write_int(action.key),
            GameEvent::Notice(text) => buffer.write_string(text),
        }
    }

    fn decode(&mut self, buffer: &mut BitBuffer, _packet_tick: Tick) -> Result<(), SerdeErr> {
        match self {
            GameEvent::Action(action) => action.key = buffer.read_int()?,
            GameEvent::Notice(text) => *text = buffer.read_string()?,
        }
        Ok(())
    }
}

/// A key press
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameActionEvent {
    pub key: i32,
}
