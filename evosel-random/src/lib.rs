//! evosel random — random sources and the thread-scoped random registry.
//!
//! This crate supplies determinism to every stochastic operator in evosel:
//! - [`RandomSource`] / [`Random`]: uniform doubles in `[0, 1)` behind a
//!   cloneable handle
//! - [`RandomRegistry`]: the current source per thread, with nested LIFO
//!   override scopes
//! - [`SeedHierarchy`]: BLAKE3 derivation of independent sub-seeds
//!
//! The free functions operate on the process-wide registry
//! ([`RandomRegistry::global`]).

pub mod registry;
pub mod seed;
pub mod source;

pub use registry::{DefaultRandom, RandomFactory, RandomRegistry};
pub use seed::SeedHierarchy;
pub use source::{Random, RandomSource};

/// The calling thread's current source in the process-wide registry.
pub fn get() -> Random {
    RandomRegistry::global().get()
}

/// Replace the process-wide default with a source shared by all threads.
pub fn set_global(random: Random) {
    RandomRegistry::global().set_global(random);
}

/// Replace the process-wide default with a per-thread factory.
pub fn set_global_per_thread<F>(factory: F)
where
    F: Fn() -> Random + Send + Sync + 'static,
{
    RandomRegistry::global().set_global_per_thread(factory);
}

/// Derive per-thread sources in the process-wide registry from `seed`.
pub fn set_global_seed(seed: u64) {
    RandomRegistry::global().set_global_seed(seed);
}

/// Restore the process-wide default to the bootstrap source.
pub fn reset() {
    RandomRegistry::global().reset();
}

/// Run `body` with `random` as the calling thread's current source in the
/// process-wide registry.
pub fn with_scope<R, F>(random: Random, body: F) -> R
where
    F: FnOnce(&Random) -> R,
{
    RandomRegistry::global().with_scope(random, body)
}
