//! Values constrained to a closed range.
//!
//! A [`Bounded`] value carries its own `[min, max]` range. Validity is
//! computed once at construction. Genes built on it implement
//! [`BoundedGene`], whose `new_instance` is how mutation and crossover
//! operators produce a sibling with the same bounds.

use std::cmp::Ordering;
use std::fmt;

use evosel_random::Random;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::instrument;

/// An immutable `(value, min, max)` triple.
///
/// Equality compares all three; [`Bounded::cmp_value`] orders by value only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bounded<A> {
    value: A,
    min: A,
    max: A,
    valid: bool,
}

impl<A: PartialOrd> Bounded<A> {
    pub fn new(value: A, min: A, max: A) -> Self {
        let valid = min <= value && value <= max;
        Self {
            value,
            min,
            max,
            valid,
        }
    }

    /// Same bounds, new value.
    pub fn with_value(&self, value: A) -> Self
    where
        A: Clone,
    {
        Self::new(value, self.min.clone(), self.max.clone())
    }

    /// Orders by value, ignoring bounds. Incomparable values compare equal.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        self.value
            .partial_cmp(&other.value)
            .unwrap_or(Ordering::Equal)
    }
}

impl<A> Bounded<A> {
    pub fn value(&self) -> &A {
        &self.value
    }

    pub fn min(&self) -> &A {
        &self.min
    }

    pub fn max(&self) -> &A {
        &self.max
    }

    /// `min <= value <= max`, as computed at construction.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl<A: fmt::Display> fmt::Display for Bounded<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.value)
    }
}

#[derive(Serialize)]
struct BoundedRef<'a, A> {
    value: &'a A,
    min: &'a A,
    max: &'a A,
}

#[derive(Deserialize)]
struct BoundedRepr<A> {
    value: A,
    min: A,
    max: A,
}

impl<A: Serialize> Serialize for Bounded<A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BoundedRef {
            value: &self.value,
            min: &self.min,
            max: &self.max,
        }
        .serialize(serializer)
    }
}

impl<'de, A> Deserialize<'de> for Bounded<A>
where
    A: Deserialize<'de> + PartialOrd,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = BoundedRepr::<A>::deserialize(deserializer)?;
        Ok(Self::new(repr.value, repr.min, repr.max))
    }
}

/// A gene whose allele lives in a bounded range.
pub trait BoundedGene: Sized {
    type Allele: PartialOrd + Clone;

    fn bounded(&self) -> &Bounded<Self::Allele>;

    /// A new gene of the same kind and bounds holding `value`.
    fn new_instance(&self, value: Self::Allele) -> Self;

    fn allele(&self) -> &Self::Allele {
        self.bounded().value()
    }

    fn min(&self) -> &Self::Allele {
        self.bounded().min()
    }

    fn max(&self) -> &Self::Allele {
        self.bounded().max()
    }

    fn is_valid(&self) -> bool {
        self.bounded().is_valid()
    }

    fn cmp_allele(&self, other: &Self) -> Ordering {
        self.bounded().cmp_value(other.bounded())
    }
}

// ── Integer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegerGene(Bounded<i64>);

impl IntegerGene {
    pub fn of(value: i64, min: i64, max: i64) -> Self {
        Self(Bounded::new(value, min, max))
    }

    /// Uniform value in `[min, max]` from the current thread's random source.
    pub fn random(min: i64, max: i64) -> Self {
        Self::random_with(&evosel_random::get(), min, max)
    }

    #[instrument(level = "trace", skip(random))]
    pub fn random_with(random: &Random, min: i64, max: i64) -> Self {
        let span = i128::from(max) - i128::from(min) + 1;
        let value = if span <= 0 {
            min
        } else {
            let offset = ((random.next_f64() * span as f64) as i128).min(span - 1);
            (i128::from(min) + offset) as i64
        };
        Self::of(value, min, max)
    }
}

impl BoundedGene for IntegerGene {
    type Allele = i64;

    fn bounded(&self) -> &Bounded<i64> {
        &self.0
    }

    fn new_instance(&self, value: i64) -> Self {
        Self(self.0.with_value(value))
    }
}

impl fmt::Display for IntegerGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ── Double ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoubleGene(Bounded<f64>);

impl DoubleGene {
    pub fn of(value: f64, min: f64, max: f64) -> Self {
        Self(Bounded::new(value, min, max))
    }

    /// Uniform value in `[min, max)` from the current thread's random source.
    pub fn random(min: f64, max: f64) -> Self {
        Self::random_with(&evosel_random::get(), min, max)
    }

    #[instrument(level = "trace", skip(random))]
    pub fn random_with(random: &Random, min: f64, max: f64) -> Self {
        Self::of(random.next_range(min, max), min, max)
    }
}

impl BoundedGene for DoubleGene {
    type Allele = f64;

    fn bounded(&self) -> &Bounded<f64> {
        &self.0
    }

    fn new_instance(&self, value: f64) -> Self {
        Self(self.0.with_value(value))
    }
}

impl fmt::Display for DoubleGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
