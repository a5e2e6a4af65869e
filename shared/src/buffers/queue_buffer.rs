use std::collections::VecDeque;

use crate::{pool::Recycle, tick::Tick, Timed};

/// Capacity-bounded FIFO of timed values, oldest first. When full, storing
/// recycles the oldest value.
pub struct QueueBuffer<T: Timed> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T: Timed> QueueBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn store<R: Recycle<T>>(&mut self, value: T, recycler: &mut R) {
        if self.data.len() >= self.capacity {
            if let Some(oldest) = self.data.pop_front() {
                recycler.recycle(oldest);
            }
        }
        self.data.push_back(value);
    }

    pub fn latest(&self) -> Option<&T> {
        self.data.back()
    }

    /// The last value stamped at or before `tick`
    pub fn latest_at(&self, tick: Tick) -> Option<&T> {
        self.data.iter().rev().find(|value| value.tick() <= tick)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear<R: Recycle<T>>(&mut self, recycler: &mut R) {
        for value in self.data.drain(..) {
            recycler.recycle(value);
        }
    }
}
