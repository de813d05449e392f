//! Probability-proportional selection.
//!
//! [`ProbabilitySelector`] turns a probability vector from a
//! [`ProbabilityHook`] into `count` independent draws with replacement:
//!
//! 1. ask the hook for one probability per individual (higher = better)
//! 2. rank-invert the vector when minimizing
//! 3. check that it has the population's length, no negative entries, and
//!    sums to one within the configured ULP tolerance
//! 4. build the cumulative distribution in place
//! 5. resolve one uniform draw per selected individual
//!
//! Draws come from the calling thread's current source in the selector's
//! [`RandomRegistry`], so wrapping a call in
//! [`RandomRegistry::with_scope`] with a seeded source makes it
//! reproducible.

use std::fmt;
use std::sync::Arc;

use evosel_random::RandomRegistry;
use thiserror::Error;
use tracing::{error, instrument};

use crate::config::SelectorConfig;
use crate::distribution::{incremental, index_of, invert};
use crate::math;
use crate::optimize::Optimize;
use crate::population::Population;

/// Computes selection probabilities for a population.
///
/// The returned vector must have one entry per individual, no negative
/// entries, and sum to one. Higher probabilities mark better individuals;
/// minimization is handled by the selector.
pub trait ProbabilityHook<T> {
    fn probabilities(&self, population: &Population<T>, count: usize) -> Vec<f64>;
}

impl<T, F> ProbabilityHook<T> for F
where
    F: Fn(&Population<T>, usize) -> Vec<f64>,
{
    fn probabilities(&self, population: &Population<T>, count: usize) -> Vec<f64> {
        self(population, count)
    }
}

/// A probability hook broke its contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("population size {expected} and probability length {actual} differ")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("probability at index {index} is negative: {value}")]
    Negative { index: usize, value: f64 },
    #[error("probabilities sum to {sum}, {ulp_distance} ULPs from one (tolerance {tolerance})")]
    SumNotOne {
        sum: f64,
        ulp_distance: u64,
        tolerance: u64,
    },
}

/// Errors from [`ProbabilitySelector::select`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("selection count must be greater than or equal to zero, but was {count}")]
    InvalidCount { count: String },
    /// A defect in the probability hook. Never retried.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(#[from] InvariantViolation),
}

/// Selects individuals with probability given by a [`ProbabilityHook`].
#[derive(Debug, Clone)]
pub struct ProbabilitySelector<H> {
    hook: H,
    config: SelectorConfig,
    registry: Arc<RandomRegistry>,
}

impl<H> ProbabilitySelector<H> {
    /// A selector with default tuning, drawing from the process-wide registry.
    pub fn new(hook: H) -> Self {
        Self {
            hook,
            config: SelectorConfig::default(),
            registry: RandomRegistry::global(),
        }
    }

    pub fn with_config(mut self, config: SelectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: Arc<RandomRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RandomRegistry> {
        &self.registry
    }

    /// Draw `count` individuals from `population`, with replacement.
    ///
    /// `count == 0` returns an empty population without consulting the hook
    /// or the random source. A negative `count` is rejected.
    #[instrument(
        level = "debug",
        skip_all,
        fields(population = population.len(), count = %count, ?optimize)
    )]
    pub fn select<T, N>(
        &self,
        population: &Population<T>,
        count: N,
        optimize: Optimize,
    ) -> Result<Population<T>, SelectionError>
    where
        H: ProbabilityHook<T>,
        T: Clone,
        N: TryInto<usize> + Copy + fmt::Display,
    {
        let count: usize = count
            .try_into()
            .map_err(|_| SelectionError::InvalidCount {
                count: count.to_string(),
            })?;

        let mut selection = Population::with_capacity(count);
        if count == 0 {
            return Ok(selection);
        }

        let mut cumulative = self.probabilities(population, count, optimize);
        self.check(population.len(), &cumulative)?;
        incremental(&mut cumulative);

        let random = self.registry.get();
        let threshold = self.config.serial_index_threshold;
        selection.fill(
            || population[resolve(&cumulative, random.next_f64(), threshold)].clone(),
            count,
        );

        Ok(selection)
    }

    /// The hook's probabilities, rank-inverted when minimizing.
    pub fn probabilities<T>(
        &self,
        population: &Population<T>,
        count: usize,
        optimize: Optimize,
    ) -> Vec<f64>
    where
        H: ProbabilityHook<T>,
    {
        let probabilities = self.hook.probabilities(population, count);
        match optimize {
            Optimize::Maximum => probabilities,
            Optimize::Minimum => invert(&probabilities),
        }
    }

    /// Verify the hook's contract. A violation is a programming error: it
    /// panics in debug builds and is returned as an error otherwise.
    fn check(&self, expected: usize, probabilities: &[f64]) -> Result<(), SelectionError> {
        let Some(violation) = find_violation(expected, probabilities, self.config.max_ulp_distance)
        else {
            return Ok(());
        };

        error!(%violation, "probability hook violated its contract");
        if cfg!(debug_assertions) {
            panic!("internal invariant violated: {violation}");
        }
        Err(violation.into())
    }
}

/// First contract violation in `probabilities`, if any.
pub fn find_violation(
    expected: usize,
    probabilities: &[f64],
    tolerance: u64,
) -> Option<InvariantViolation> {
    if probabilities.len() != expected {
        return Some(InvariantViolation::LengthMismatch {
            expected,
            actual: probabilities.len(),
        });
    }

    if let Some((index, &value)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| **p < 0.0)
    {
        return Some(InvariantViolation::Negative { index, value });
    }

    let sum = math::sum(probabilities);
    let ulp_distance = math::ulp_distance(sum, 1.0);
    if ulp_distance >= tolerance {
        return Some(InvariantViolation::SumNotOne {
            sum,
            ulp_distance,
            tolerance,
        });
    }

    None
}

/// Index selected by draw `v`.
///
/// A draw above the last cumulative value (the sum fell short of one within
/// tolerance) goes to the first slot that reaches the total mass.
fn resolve(cumulative: &[f64], v: f64, threshold: usize) -> usize {
    index_of(cumulative, v, threshold)
        .or_else(|| {
            let total = *cumulative.last()?;
            index_of(cumulative, total, threshold)
        })
        .unwrap_or_else(|| cumulative.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use evosel_random::Random;
    use std::cell::Cell;

    fn fixed(probabilities: Vec<f64>) -> impl Fn(&Population<char>, usize) -> Vec<f64> {
        move |_, _| probabilities.clone()
    }

    fn abc() -> Population<char> {
        vec!['a', 'b', 'c'].into()
    }

    fn selector<H>(hook: H) -> ProbabilitySelector<H> {
        ProbabilitySelector::new(hook).with_registry(Arc::new(RandomRegistry::new()))
    }

    #[test]
    fn selects_exactly_count() {
        let selector = selector(fixed(vec![0.2, 0.3, 0.5]));
        for count in [1usize, 2, 3, 10, 100] {
            let selection = selector.select(&abc(), count, Optimize::Maximum).unwrap();
            assert_eq!(selection.len(), count);
            assert!(selection.iter().all(|c| abc().iter().any(|p| p == c)));
        }
    }

    #[test]
    fn zero_count_consults_nothing() {
        let calls = Cell::new(0);
        let hook = |population: &Population<char>, _count: usize| {
            calls.set(calls.get() + 1);
            vec![1.0 / population.len() as f64; population.len()]
        };
        let selector = selector(hook);

        let selection = selector.select(&abc(), 0, Optimize::Maximum).unwrap();
        assert!(selection.is_empty());
        assert_eq!(calls.get(), 0);
        assert_eq!(selector.registry().depth(), 0);
    }

    #[test]
    fn negative_count_is_rejected_with_value() {
        let selector = selector(fixed(vec![0.2, 0.3, 0.5]));
        let err = selector.select(&abc(), -3, Optimize::Maximum).unwrap_err();
        assert_eq!(
            err,
            SelectionError::InvalidCount {
                count: "-3".into()
            }
        );
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn resolves_draws_through_cumulative_distribution() {
        struct Script(Vec<f64>, usize);
        impl evosel_random::RandomSource for Script {
            fn next_f64(&mut self) -> f64 {
                self.1 += 1;
                self.0[self.1 - 1]
            }
        }

        let selector = selector(fixed(vec![0.2, 0.3, 0.5]));
        let script = Random::new(Script(vec![0.25, 0.5, 0.05, 0.99], 0));
        let selection = selector
            .registry()
            .with_scope(script, |_| selector.select(&abc(), 4, Optimize::Maximum))
            .unwrap();

        assert_eq!(selection.into_vec(), vec!['b', 'b', 'a', 'c']);
    }

    #[test]
    fn minimum_inverts_probabilities() {
        let selector = selector(fixed(vec![0.2, 0.3, 0.5]));
        assert_eq!(
            selector.probabilities(&abc(), 1, Optimize::Minimum),
            vec![0.5, 0.3, 0.2]
        );
        assert_eq!(
            selector.probabilities(&abc(), 1, Optimize::Maximum),
            vec![0.2, 0.3, 0.5]
        );
    }

    #[test]
    fn short_sum_falls_back_to_last_weighted_slot() {
        let cumulative = [0.3, 0.999_999_9, 0.999_999_9];
        assert_eq!(resolve(&cumulative, 0.999_999_95, 35), 1);
        assert_eq!(resolve(&cumulative, 0.999_999_95, 0), 1);
    }

    #[test]
    fn finds_length_mismatch() {
        assert_eq!(
            find_violation(3, &[0.5, 0.5], 10),
            Some(InvariantViolation::LengthMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn finds_negative_entries() {
        assert_eq!(
            find_violation(3, &[0.6, -0.1, 0.5], 10_u64.pow(10)),
            Some(InvariantViolation::Negative {
                index: 1,
                value: -0.1
            })
        );
    }

    #[test]
    fn finds_bad_sum() {
        assert!(matches!(
            find_violation(2, &[0.5, 0.6], 10_u64.pow(10)),
            Some(InvariantViolation::SumNotOne { .. })
        ));
        assert!(matches!(
            find_violation(2, &[0.5, f64::NAN], 10_u64.pow(10)),
            Some(InvariantViolation::SumNotOne { .. })
        ));
        assert_eq!(find_violation(3, &[0.2, 0.3, 0.5], 10_u64.pow(10)), None);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "internal invariant violated")]
    fn defective_hook_aborts_in_debug() {
        let selector = selector(fixed(vec![0.5, 0.6, 0.7]));
        let _ = selector.select(&abc(), 1, Optimize::Maximum);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn defective_hook_is_reported_in_release() {
        let selector = selector(fixed(vec![0.5, 0.6, 0.7]));
        let err = selector.select(&abc(), 1, Optimize::Maximum).unwrap_err();
        assert!(matches!(err, SelectionError::InvariantViolation(_)));
    }
}
