use std::{cell::Cell, rc::Rc};

use replica_server::{ScopeEvaluator, ServerEntity};

use super::Game;

/// Scopes entities by distance from a viewpoint, nearer ones first.
///
/// Clones share the viewpoint, so a test can keep one to move the viewer
/// after handing the other to the server.
#[derive(Clone, Default)]
pub struct GameScopeEvaluator {
    origin: Rc<Cell<(f32, f32)>>,
}

impl GameScopeEvaluator {
    pub const MAX_DIST_SQR: f32 = 10000.0;

    pub fn new(x: f32, y: f32) -> Self {
        Self {
            origin: Rc::new(Cell::new((x, y))),
        }
    }

    pub fn set_origin(&self, x: f32, y: f32) {
        self.origin.set((x, y));
    }
}

impl ScopeEvaluator<Game> for GameScopeEvaluator {
    fn evaluate(&mut self, entity: &ServerEntity<Game>, ticks_since_send: i32) -> Option<f32> {
        let (origin_x, origin_y) = self.origin.get();
        let (x, y) = entity.data().position();

        let distance = (x - origin_x).powi(2) + (y - origin_y).powi(2);
        if distance > Self::MAX_DIST_SQR {
            return None;
        }

        // entities not sent for a while move up the queue
        Some(distance / ticks_since_send.max(1) as f32)
    }
}
