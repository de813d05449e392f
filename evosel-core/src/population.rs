//! Ordered collection of individuals.

use std::ops::Index;

/// An ordered, index-addressable sequence of individuals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Population<T> {
    individuals: Vec<T>,
}

impl<T> Population<T> {
    pub fn new() -> Self {
        Self {
            individuals: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            individuals: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.individuals.get(index)
    }

    /// Append `count` individuals produced by `generator`.
    pub fn fill<F>(&mut self, mut generator: F, count: usize) -> &mut Self
    where
        F: FnMut() -> T,
    {
        self.individuals.reserve(count);
        for _ in 0..count {
            self.individuals.push(generator());
        }
        self
    }

    pub fn push(&mut self, individual: T) {
        self.individuals.push(individual);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.individuals.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.individuals
    }

    pub fn into_vec(self) -> Vec<T> {
        self.individuals
    }
}

impl<T> Default for Population<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for Population<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.individuals[index]
    }
}

impl<T> From<Vec<T>> for Population<T> {
    fn from(individuals: Vec<T>) -> Self {
        Self { individuals }
    }
}

impl<T> FromIterator<T> for Population<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            individuals: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Population<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Population<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}
