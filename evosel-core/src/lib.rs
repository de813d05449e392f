//! evosel core — the shared engine behind probability-proportional selection.
//!
//! This crate contains:
//! - [`Population`]: the ordered collection selection draws from
//! - [`ProbabilitySelector`]: hook → (rank inversion) → contract check →
//!   cumulative distribution → `count` draws with replacement
//! - [`distribution`]: prefix sums, serial/binary index resolution, stable
//!   index sort, rank inversion
//! - [`Bounded`] values and the [`BoundedGene`] variant hook
//! - [`SelectorConfig`]: tuning loaded from TOML
//!
//! Randomness comes from `evosel-random`; see
//! [`RandomRegistry::with_scope`](evosel_random::RandomRegistry::with_scope)
//! for reproducible runs.

pub mod bounded;
pub mod config;
pub mod distribution;
pub mod math;
pub mod optimize;
pub mod population;
pub mod selector;

pub use bounded::{Bounded, BoundedGene, DoubleGene, IntegerGene};
pub use config::{ConfigError, SelectorConfig, DEFAULT_MAX_ULP_DISTANCE};
pub use distribution::DEFAULT_SERIAL_INDEX_THRESHOLD;
pub use optimize::Optimize;
pub use population::Population;
pub use selector::{InvariantViolation, ProbabilityHook, ProbabilitySelector, SelectionError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: values that cross threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Population<u32>>();
        require_sync::<Population<u32>>();
        require_send::<Optimize>();
        require_sync::<Optimize>();
        require_send::<SelectorConfig>();
        require_sync::<SelectorConfig>();
        require_send::<SelectionError>();
        require_sync::<SelectionError>();
        require_send::<IntegerGene>();
        require_sync::<IntegerGene>();
        require_send::<DoubleGene>();
        require_sync::<DoubleGene>();
        require_send::<ProbabilitySelector<fn(&Population<u32>, usize) -> Vec<f64>>>();
        require_sync::<ProbabilitySelector<fn(&Population<u32>, usize) -> Vec<f64>>>();
    }

    /// Selection is usable wherever any hook satisfies the one-method trait.
    #[test]
    fn hook_trait_accepts_structs_and_closures() {
        struct Uniform;
        impl<T> ProbabilityHook<T> for Uniform {
            fn probabilities(&self, population: &Population<T>, _count: usize) -> Vec<f64> {
                vec![1.0 / population.len() as f64; population.len()]
            }
        }

        let population: Population<u8> = vec![1, 2, 3, 4].into();
        let closure = |p: &Population<u8>, _: usize| vec![1.0 / p.len() as f64; p.len()];

        assert_eq!(Uniform.probabilities(&population, 1), vec![0.25; 4]);
        assert_eq!(closure.probabilities(&population, 1), vec![0.25; 4]);
    }
}
