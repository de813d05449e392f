//! Optimization direction.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Whether higher or lower fitness is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Optimize {
    /// Lower values are better. Selection probabilities are rank-inverted.
    Minimum,
    /// Higher values are better. Selection probabilities are used as-is.
    Maximum,
}

impl Optimize {
    /// Orders `a` relative to `b` so that `Greater` means `a` is better.
    /// Incomparable values (NaN) compare as equal.
    pub fn compare<C: PartialOrd>(self, a: &C, b: &C) -> Ordering {
        let natural = a.partial_cmp(b).unwrap_or(Ordering::Equal);
        match self {
            Optimize::Maximum => natural,
            Optimize::Minimum => natural.reverse(),
        }
    }

    pub fn is_better<C: PartialOrd>(self, a: &C, b: &C) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// The better of two values; `a` on ties.
    pub fn best<C: PartialOrd>(self, a: C, b: C) -> C {
        if self.compare(&b, &a) == Ordering::Greater {
            b
        } else {
            a
        }
    }

    /// The worse of two values; `a` on ties.
    pub fn worst<C: PartialOrd>(self, a: C, b: C) -> C {
        if self.compare(&b, &a) == Ordering::Less {
            b
        } else {
            a
        }
    }
}
