use crate::{pool::Recycle, tick::Tick, Timed};

/// Fixed-size random access buffer for dejittering timed values.
///
/// Values are slotted by `tick / divisor` modulo the slot count, so a
/// sender that only produces every `divisor`-th tick does not waste
/// space. A value older than the latest stored one is rejected. Storing
/// into an occupied slot recycles its previous occupant.
pub struct DejitterBuffer<T: Timed> {
    divisor: u32,
    data: Vec<Option<T>>,
    latest_index: Option<usize>,
}

impl<T: Timed> DejitterBuffer<T> {
    pub fn new(capacity: usize, divisor: u32) -> Self {
        let divisor = divisor.max(1);
        let length = (capacity / divisor as usize).max(1);
        let mut data = Vec::with_capacity(length);
        data.resize_with(length, || None);
        Self {
            divisor,
            data,
            latest_index: None,
        }
    }

    /// The most recently stored value
    pub fn latest(&self) -> Option<&T> {
        self.latest_index
            .and_then(|index| self.data[index].as_ref())
    }

    /// Every stored value, in slot order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(Option::is_none)
    }

    /// Empties the buffer, recycling all contents
    pub fn clear<R: Recycle<T>>(&mut self, recycler: &mut R) {
        for slot in self.data.iter_mut() {
            if let Some(value) = slot.take() {
                recycler.recycle(value);
            }
        }
        self.latest_index = None;
    }

    /// Stores a value unless it is older than the latest one. A rejected
    /// value is handed back to the caller.
    pub fn store<R: Recycle<T>>(&mut self, value: T, recycler: &mut R) -> Result<(), T> {
        if let Some(latest) = self.latest() {
            if value.tick() < latest.tick() {
                return Err(value);
            }
        }

        let index = self.tick_to_index(value.tick());
        if let Some(previous) = self.data[index].replace(value) {
            recycler.recycle(previous);
        }
        self.latest_index = Some(index);
        Ok(())
    }

    pub fn get(&self, tick: Tick) -> Option<&T> {
        if !tick.is_valid() {
            return None;
        }
        self.data[self.tick_to_index(tick)]
            .as_ref()
            .filter(|value| value.tick() == tick)
    }

    pub fn contains(&self, tick: Tick) -> bool {
        self.get(tick).is_some()
    }

    /// Returns the value at or immediately before `tick`, and the value
    /// immediately after it. O(n).
    pub fn first_after(&self, tick: Tick) -> (Option<&T>, Option<&T>) {
        let mut current: Option<&T> = None;
        let mut next: Option<&T> = None;
        if !tick.is_valid() {
            return (current, next);
        }

        for value in self.values() {
            if value.tick() > tick {
                if next.map_or(true, |next| value.tick() < next.tick()) {
                    next = Some(value);
                }
            } else if current.map_or(true, |current| value.tick() > current.tick()) {
                current = Some(value);
            }
        }

        (current, next)
    }

    /// Finds the latest value at or before `tick`. O(n).
    pub fn latest_at(&self, tick: Tick) -> Option<&T> {
        self.latest_at_index(tick)
            .and_then(|index| self.data[index].as_ref())
    }

    pub fn latest_at_mut(&mut self, tick: Tick) -> Option<&mut T> {
        let index = self.latest_at_index(tick)?;
        self.data[index].as_mut()
    }

    fn latest_at_index(&self, tick: Tick) -> Option<usize> {
        if !tick.is_valid() {
            return None;
        }

        let direct = self.tick_to_index(tick);
        if self.data[direct]
            .as_ref()
            .map_or(false, |value| value.tick() == tick)
        {
            return Some(direct);
        }

        let mut result: Option<(usize, Tick)> = None;
        for (index, slot) in self.data.iter().enumerate() {
            let Some(value) = slot else {
                continue;
            };
            let value_tick = value.tick();
            if value_tick == tick {
                return Some(index);
            }
            if value_tick < tick && result.map_or(true, |(_, best)| best < value_tick) {
                result = Some((index, value_tick));
            }
        }
        result.map(|(index, _)| index)
    }

    /// All values at or after `start`, in tick order
    pub fn range(&self, start: Tick) -> Vec<&T> {
        if !start.is_valid() {
            return Vec::new();
        }
        let mut output: Vec<&T> = self
            .values()
            .filter(|value| value.tick() >= start)
            .collect();
        output.sort_by_key(|value| value.tick());
        output
    }

    /// All values in the inclusive range `[start, end]` in tick order, plus
    /// the earliest value after `end` if there is one
    pub fn range_and_next(&self, start: Tick, end: Tick) -> (Vec<&T>, Option<&T>) {
        let mut output = Vec::new();
        let mut next: Option<&T> = None;
        if !start.is_valid() {
            return (output, next);
        }

        for value in self.values() {
            let tick = value.tick();
            if tick >= start && tick <= end {
                output.push(value);
            }
            if tick > end && next.map_or(true, |next| tick < next.tick()) {
                next = Some(value);
            }
        }

        output.sort_by_key(|value| value.tick());
        (output, next)
    }

    fn tick_to_index(&self, tick: Tick) -> usize {
        ((tick.raw_value() / self.divisor) as usize) % self.data.len()
    }
}
