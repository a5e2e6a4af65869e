use replica_shared::{EntityId, Protocol, StateDelta, StatePools, Tick, View, ViewEntry};

use crate::{controller::ControllerKey, entity::ServerEntity};

/// Decides which entities a client is interested in, and in what order
/// they should be sent
pub trait ScopeEvaluator<P: Protocol> {
    /// Whether a broadcast event should be queued for this client
    fn evaluate_event(&mut self, _event: &P::Event) -> bool {
        true
    }

    /// Returns `None` if the entity is out of scope, otherwise its send
    /// priority. Lower priorities are sent first.
    ///
    /// `ticks_since_send` is `i32::MAX` if the entity was never sent.
    fn evaluate(&mut self, entity: &ServerEntity<P>, ticks_since_send: i32) -> Option<f32>;
}

/// Everything is in scope, with equal priority
#[derive(Default, Clone, Copy, Debug)]
pub struct DefaultScopeEvaluator;

impl<P: Protocol> ScopeEvaluator<P> for DefaultScopeEvaluator {
    fn evaluate(&mut self, _entity: &ServerEntity<P>, _ticks_since_send: i32) -> Option<f32> {
        Some(0.0)
    }
}

/// Per-client interest management.
///
/// Tracks what was last sent to the client and what the client has
/// acknowledged, and turns the world into the ordered list of deltas to
/// offer its next packet.
pub struct Scope<P: Protocol> {
    evaluator: Box<dyn ScopeEvaluator<P>>,
    last_sent: View,
    acked_by_client: View,
}

impl<P: Protocol> Scope<P> {
    pub fn new() -> Self {
        Self {
            evaluator: Box::new(DefaultScopeEvaluator),
            last_sent: View::new(),
            acked_by_client: View::new(),
        }
    }

    pub(crate) fn set_evaluator(&mut self, evaluator: Box<dyn ScopeEvaluator<P>>) {
        self.evaluator = evaluator;
    }

    pub(crate) fn evaluate_event(&mut self, event: &P::Event) -> bool {
        self.evaluator.evaluate_event(event)
    }

    /// The latest tick, and frozen status, the client confirmed for each entity
    pub fn acked_by_client(&self) -> &View {
        &self.acked_by_client
    }

    pub fn last_sent(&self) -> &View {
        &self.last_sent
    }

    pub(crate) fn integrate_acked(&mut self, view: &View) {
        self.acked_by_client.integrate(view);
    }

    pub(crate) fn record_sent(&mut self, entity_id: EntityId, tick: Tick, is_frozen: bool) {
        self.last_sent
            .record_update(entity_id, ViewEntry::new(tick, is_frozen));
    }

    pub(crate) fn forget(&mut self, entity_id: EntityId) {
        self.last_sent.remove(entity_id);
        self.acked_by_client.remove(entity_id);
    }

    /// Whether the entity was sent to the client, and the client has not
    /// yet acknowledged a tick at or past its removal
    pub(crate) fn is_removal_pending(&self, entity_id: EntityId, removed_tick: Tick) -> bool {
        if !self.last_sent.get_latest(entity_id).tick.is_valid() {
            return false;
        }
        let acked = self.acked_by_client.get_latest(entity_id);
        !acked.tick.is_valid() || acked.tick < removed_tick
    }

    /// Produces the deltas to offer the client `destination` at `tick`, in
    /// send order: removals of destroyed entities, then freezes of entities
    /// that left scope, then in-scope entities by ascending priority.
    ///
    /// Entities controlled by the destination are always in scope, ahead of
    /// everything else. An entity out of scope is frozen once, until the
    /// client acknowledges the freeze.
    pub(crate) fn populate_deltas<'e, A, D>(
        &mut self,
        destination: ControllerKey,
        tick: Tick,
        active: A,
        destroyed: D,
        states: &mut StatePools<P::State>,
    ) -> Vec<StateDelta<P::State>>
    where
        P: 'e,
        A: IntoIterator<Item = &'e ServerEntity<P>>,
        D: IntoIterator<Item = &'e ServerEntity<P>>,
    {
        let mut entries: Vec<(f32, &ServerEntity<P>)> = Vec::new();
        let mut frozen = Vec::new();

        for entity in active {
            if entity.controller() == Some(destination) {
                entries.push((f32::MIN, entity));
                continue;
            }

            match self.priority(entity, tick) {
                Some(priority) => entries.push((priority, entity)),
                None => {
                    if !self.acked_by_client.get_latest(entity.id()).is_frozen {
                        frozen.push(StateDelta::frozen(tick, entity.id()));
                    }
                }
            }
        }

        entries.sort_by(|(a, _), (b, _)| a.total_cmp(b));

        let mut output = Vec::new();

        for entity in destroyed {
            if !self.is_removal_pending(entity.id(), entity.removed_tick()) {
                continue;
            }
            let acked = self.acked_by_client.get_latest(entity.id());
            if let Some(delta) = produce_delta(states, tick, entity, acked, destination) {
                output.push(delta);
            }
        }

        output.append(&mut frozen);

        for (_, entity) in entries {
            let acked = self.acked_by_client.get_latest(entity.id());
            if let Some(delta) = produce_delta(states, tick, entity, acked, destination) {
                output.push(delta);
            }
        }

        output
    }

    fn priority(&mut self, entity: &ServerEntity<P>, tick: Tick) -> Option<f32> {
        let last_sent = self.last_sent.get_latest(entity.id());
        let ticks_since_send = if last_sent.tick.is_valid() {
            tick - last_sent.tick
        } else {
            i32::MAX
        };
        self.evaluator.evaluate(entity, ticks_since_send)
    }
}

impl<P: Protocol> Default for Scope<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Delta of `entity` against its recorded state at the tick the client
/// acknowledged. Without an acknowledgement the delta is complete, immutable
/// data included. After an acknowledged freeze every mutable field is sent,
/// since the client missed whatever changed while it was frozen.
fn produce_delta<P: Protocol>(
    states: &mut StatePools<P::State>,
    tick: Tick,
    entity: &ServerEntity<P>,
    acked: ViewEntry,
    destination: ControllerKey,
) -> Option<StateDelta<P::State>> {
    let basis_tick = acked.tick;
    let basis = entity
        .record_at(basis_tick)
        .filter(|_| !acked.is_frozen)
        .map(|record| &record.state);

    StateDelta::produce(
        states,
        tick,
        entity.id(),
        entity.state(),
        basis,
        entity.controller() == Some(destination),
        !basis_tick.is_valid(),
        entity.command_ack(),
        entity.removed_tick(),
    )
}
