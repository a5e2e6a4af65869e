/// Fixed-capacity window over the most recently stored values. Storing
/// into a full buffer overwrites the oldest value and hands it back.
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    data: Vec<T>,
    start: usize,
    capacity: usize,
}

impl<T> RollingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RollingBuffer capacity must be positive");
        Self {
            data: Vec::with_capacity(capacity),
            start: 0,
            capacity,
        }
    }

    pub fn store(&mut self, value: T) -> Option<T> {
        let evicted = if self.data.len() < self.capacity {
            self.data.push(value);
            None
        } else {
            Some(std::mem::replace(&mut self.data[self.start], value))
        };
        self.start = (self.start + 1) % self.capacity;
        evicted
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All values, not in storage order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Takes every value out, leaving the buffer empty
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.start = 0;
        self.data.drain(..)
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.start = 0;
    }
}
