use crate::{pools::StatePools, protocol::StateData, state::State, tick::Tick, Timed};

/// A server-side snapshot of an entity's state, kept as the basis for
/// delta-encoding against what a client has acknowledged.
#[derive(Debug)]
pub struct StateRecord<S: StateData> {
    pub tick: Tick,
    pub state: State<S>,
}

impl<S: StateData> StateRecord<S> {
    /// Snapshots `current`, unless its mutable and controller data are
    /// unchanged since `latest`
    pub fn produce(
        pools: &mut StatePools<S>,
        tick: Tick,
        current: &State<S>,
        latest: Option<&StateRecord<S>>,
    ) -> Option<Self> {
        debug_assert!(tick.is_valid());

        if let Some(latest) = latest {
            let changed = current.compare_mutable(&latest.state) > 0
                || !current.is_controller_equal(&latest.state);
            if !changed {
                return None;
            }
        }

        Some(Self {
            tick,
            state: pools.clone_state(current),
        })
    }
}

impl<S: StateData> Timed for StateRecord<S> {
    fn tick(&self) -> Tick {
        self.tick
    }
}
