use replica_shared::{Protocol, StateData, Tick};

use crate::entity::ClientEntity;

/// How far the displayed time has progressed from the entity's
/// authoritative tick towards its next tick, as a fraction of the gap
/// between them.
///
/// `time_since_tick` is the time elapsed since `world_tick` began. Returns
/// `None` if the entity has no next state. The result is not clamped: it
/// exceeds 1 when the next state is late.
pub fn compute_interpolation<P: Protocol>(
    entity: &ClientEntity<P>,
    world_tick: Tick,
    tick_delta_time: f32,
    time_since_tick: f32,
) -> Option<f32> {
    if !entity.next_tick().is_valid() || !world_tick.is_valid() {
        return None;
    }

    let current_time = entity.auth_tick().to_time(tick_delta_time);
    let next_time = entity.next_tick().to_time(tick_delta_time);
    let show_time = world_tick.to_time(tick_delta_time) + time_since_tick;

    let progress = show_time - current_time;
    let span = next_time - current_time;
    if span <= 0.0 {
        return Some(0.0);
    }

    Some(progress / span)
}

/// Blends the authoritative and next states of an entity for display.
/// Falls back to the authoritative state if there is no next state.
pub fn interpolate<P: Protocol>(
    entity: &ClientEntity<P>,
    world_tick: Tick,
    tick_delta_time: f32,
    time_since_tick: f32,
) -> P::State {
    let auth = &entity.auth_state().data;
    let mut output = auth.clone();

    let t = compute_interpolation(entity, world_tick, tick_delta_time, time_since_tick);
    if let (Some(t), Some(next)) = (t, entity.next_state()) {
        output.apply_interpolated(auth, &next.data, t.clamp(0.0, 1.0));
    }
    output
}

/// Number of ticks the world is ahead of the entity's authoritative state,
/// for extrapolation. Does not account for prediction.
pub fn ticks_ahead<P: Protocol>(entity: &ClientEntity<P>, world_tick: Tick) -> i32 {
    if !world_tick.is_valid() {
        return 0;
    }
    world_tick - entity.auth_tick()
}
