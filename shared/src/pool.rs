use log::warn;
use thiserror::Error;

/// Errors that can occur when returning values to a [`Pool`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// More values were released than were ever allocated from this pool
    #[error("released a value that was not allocated from this pool ({free} free, 0 live)")]
    ReleasedUnallocated { free: usize },
}

/// A value that can be scrubbed and handed out again by a [`Pool`]
pub trait Poolable {
    fn reset(&mut self);
}

/// Free-list of reusable values.
///
/// Releasing takes the value by move, so a value cannot be released twice
/// or used after release. The pool additionally counts live values and
/// reports a release that was never matched by an allocation.
pub struct Pool<T: Poolable> {
    free: Vec<T>,
    live: usize,
}

impl<T: Poolable> Pool<T> {
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            live: 0,
        }
    }

    /// Hands out a recycled value, or builds one with `create` if none is free
    pub fn allocate_with<F: FnOnce() -> T>(&mut self, create: F) -> T {
        self.live += 1;
        match self.free.pop() {
            Some(value) => value,
            None => create(),
        }
    }

    /// Like [`Pool::allocate_with`], for constructors that can fail
    pub fn try_allocate_with<E, F: FnOnce() -> Result<T, E>>(&mut self, create: F) -> Result<T, E> {
        let value = match self.free.pop() {
            Some(value) => value,
            None => create()?,
        };
        self.live += 1;
        Ok(value)
    }

    pub fn try_release(&mut self, mut value: T) -> Result<(), PoolError> {
        if self.live == 0 {
            return Err(PoolError::ReleasedUnallocated {
                free: self.free.len(),
            });
        }
        self.live -= 1;
        value.reset();
        self.free.push(value);
        Ok(())
    }

    /// Returns a value to the free list.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the value was not allocated from this pool.
    pub fn release(&mut self, value: T) {
        if let Err(error) = self.try_release(value) {
            debug_assert!(false, "{}", error);
            warn!("Pool misuse: {}", error);
        }
    }

    /// Number of values allocated and not yet released
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn free(&self) -> usize {
        self.free.len()
    }
}

impl<T: Poolable + Default> Pool<T> {
    pub fn allocate(&mut self) -> T {
        self.allocate_with(T::default)
    }
}

impl<T: Poolable> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination for values evicted from the history buffers
pub trait Recycle<T> {
    fn recycle(&mut self, value: T);
}

impl<T: Poolable> Recycle<T> for Pool<T> {
    fn recycle(&mut self, value: T) {
        self.release(value);
    }
}
