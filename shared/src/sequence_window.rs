use crate::sequence_id::SequenceId;

/// Remembers which of the last 64 sequence ids before `latest` were seen,
/// to filter duplicate and stale events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceWindow {
    latest: SequenceId,
    history: u64,
}

impl SequenceWindow {
    pub const HISTORY_LENGTH: i32 = 64;

    pub fn new(latest: SequenceId) -> Self {
        debug_assert!(latest.is_valid());
        Self { latest, history: 0 }
    }

    /// Whether a receiver whose window ends at `highest` can still accept `lowest`
    pub fn are_in_range(lowest: SequenceId, highest: SequenceId) -> bool {
        (highest - lowest) <= Self::HISTORY_LENGTH
    }

    pub fn latest(&self) -> SequenceId {
        self.latest
    }

    pub fn is_valid(&self) -> bool {
        self.latest.is_valid()
    }

    pub fn store(&mut self, value: SequenceId) {
        let difference = self.latest - value;
        if difference > 0 {
            self.set_bit(difference - 1);
        } else if difference < 0 {
            let offset = -difference;
            self.history = self.history.checked_shl(offset as u32).unwrap_or(0);
            self.set_bit(offset - 1);
            self.latest = value;
        }
    }

    pub fn contains(&self, value: SequenceId) -> bool {
        let difference = self.latest - value;
        if difference == 0 {
            return true;
        }
        if difference < 0 || difference > Self::HISTORY_LENGTH {
            return false;
        }
        self.history & (1u64 << (difference - 1)) != 0
    }

    /// True if `id` has not been seen and is recent enough to be tracked
    pub fn is_new_id(&self, id: SequenceId) -> bool {
        !self.value_too_old(id) && !self.contains(id)
    }

    pub fn value_too_old(&self, value: SequenceId) -> bool {
        (self.latest - value) > Self::HISTORY_LENGTH
    }

    fn set_bit(&mut self, index: i32) {
        if (0..Self::HISTORY_LENGTH).contains(&index) {
            self.history |= 1u64 << index;
        }
    }
}
