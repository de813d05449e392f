//! Random source abstraction.
//!
//! Everything stochastic in evosel draws uniform doubles from a [`Random`]
//! handle. A handle is a cheap clone of a shared, lock-protected
//! [`RandomSource`]; two handles are equal only when they point at the same
//! underlying source.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// A capability producing uniform doubles in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;
}

impl<R: RngCore + Send> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Shared handle to a random source.
#[derive(Clone)]
pub struct Random {
    inner: Arc<Mutex<dyn RandomSource>>,
}

impl Random {
    pub fn new<S: RandomSource + 'static>(source: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    /// A reproducible source: the same seed always yields the same sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// A source seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Next uniform double in `[0, 1)`.
    pub fn next_f64(&self) -> f64 {
        // A panic while drawing leaves the RNG state intact, so a poisoned
        // lock is still usable.
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_f64()
    }

    /// Uniform double in `[min, max)`.
    pub fn next_range(&self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform index in `[0, bound)`. Returns 0 for an empty bound.
    pub fn next_index(&self, bound: usize) -> usize {
        let index = (self.next_f64() * bound as f64) as usize;
        index.min(bound.saturating_sub(1))
    }

    /// True if both handles share the same underlying source.
    pub fn same_source(&self, other: &Random) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }
}

impl PartialEq for Random {
    fn eq(&self, other: &Self) -> bool {
        self.same_source(other)
    }
}

impl Eq for Random {}

impl fmt::Debug for Random {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Random").field("source", &self.addr()).finish()
    }
}
