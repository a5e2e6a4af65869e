/// Controls which entities update relative to one another within a tick
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpdateOrder {
    Early,
    #[default]
    Normal,
    Late,
}

impl UpdateOrder {
    /// Every order, in the sequence entities are visited
    pub const ALL: [UpdateOrder; 3] = [UpdateOrder::Early, UpdateOrder::Normal, UpdateOrder::Late];
}
