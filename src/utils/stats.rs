//! Summary statistics
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::iter::{Extend, FromIterator};

/// Running count, mean, variance and range of a stream of values.
///
/// Mean and variance are updated with Welford's algorithm.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningStats<T> {
    count: u64,
    mean: T,
    squared_residual_sum: T,
    min: T,
    max: T,
}

impl<T: Float> Default for RunningStats<T> {
    fn default() -> Self {
        Self {
            count: 0,
            mean: T::zero(),
            squared_residual_sum: T::zero(),
            min: T::infinity(),
            max: T::neg_infinity(),
        }
    }
}

impl<T: Float> RunningStats<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values seen.
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Mean of all values; NaN if there are none.
    pub fn mean(&self) -> T {
        if self.count == 0 {
            T::nan()
        } else {
            self.mean
        }
    }

    /// Population variance of all values; NaN if there are none.
    pub fn variance(&self) -> T {
        match T::from(self.count) {
            Some(count) if self.count > 0 => self.squared_residual_sum / count,
            _ => T::nan(),
        }
    }

    pub fn std_dev(&self) -> T {
        self.variance().sqrt()
    }

    /// Smallest value; `None` if there are none.
    pub fn min(&self) -> Option<T> {
        (self.count > 0).then(|| self.min)
    }

    /// Largest value; `None` if there are none.
    pub fn max(&self) -> Option<T> {
        (self.count > 0).then(|| self.max)
    }

    /// Add a value.
    pub fn push(&mut self, value: T) {
        self.count += 1;
        let residual_pre = value - self.mean;
        // A u64 count is always representable as a float, if imprecisely.
        let count = T::from(self.count).unwrap_or_else(T::max_value);
        self.mean = self.mean + residual_pre / count;
        let residual_post = value - self.mean;
        self.squared_residual_sum = self.squared_residual_sum + residual_pre * residual_post;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Combine with the statistics of another stream (Chan et al. parallel update).
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let count = self.count + other.count;
        let (n_self, n_other, n_total) = match (
            T::from(self.count),
            T::from(other.count),
            T::from(count),
        ) {
            (Some(a), Some(b), Some(n)) => (a, b, n),
            _ => return,
        };
        let delta = other.mean - self.mean;
        self.mean = self.mean + delta * n_other / n_total;
        self.squared_residual_sum = self.squared_residual_sum
            + other.squared_residual_sum
            + delta * delta * n_self * n_other / n_total;
        self.count = count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

impl<T: Float> Extend<T> for RunningStats<T> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.push(value)
        }
    }
}

impl<T: Float> FromIterator<T> for RunningStats<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut stats = Self::default();
        stats.extend(iter);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty() {
        let stats = RunningStats::<f64>::new();
        assert_eq!(stats.count(), 0);
        assert!(stats.mean().is_nan());
        assert!(stats.variance().is_nan());
        assert_eq!(stats.min(), None);
        assert_eq!(stats.max(), None);
    }

    #[rstest]
    #[case(&[1.0], 1.0, 0.0)]
    #[case(&[1.0, 3.0], 2.0, 1.0)]
    #[case(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 5.0, 4.0)]
    fn mean_variance(#[case] values: &[f64], #[case] mean: f64, #[case] variance: f64) {
        let stats: RunningStats<f64> = values.iter().copied().collect();
        assert_eq!(stats.count(), values.len() as u64);
        assert!((stats.mean() - mean).abs() < 1e-9);
        assert!((stats.variance() - variance).abs() < 1e-9);
    }

    #[test]
    fn merge_matches_single_stream() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut left: RunningStats<f64> = values[..3].iter().copied().collect();
        let right: RunningStats<f64> = values[3..].iter().copied().collect();
        left.merge(&right);
        let all: RunningStats<f64> = values.iter().copied().collect();

        assert_eq!(left.count(), all.count());
        assert!((left.mean() - all.mean()).abs() < 1e-9);
        assert!((left.variance() - all.variance()).abs() < 1e-9);
        assert_eq!(left.min(), Some(2.0));
        assert_eq!(left.max(), Some(9.0));
    }

    #[test]
    fn merge_empty() {
        let mut stats: RunningStats<f64> = [1.0, 2.0].iter().copied().collect();
        stats.merge(&RunningStats::new());
        assert_eq!(stats.count(), 2);

        let mut empty = RunningStats::new();
        empty.merge(&stats);
        assert_eq!(empty, stats);
    }

    #[test]
    fn range() {
        let stats: RunningStats<f32> = [3.0, -1.0, 8.0, 2.0].iter().copied().collect();
        assert_eq!(stats.min(), Some(-1.0));
        assert_eq!(stats.max(), Some(8.0));
    }

    #[test]
    fn all_negative_f32() {
        let stats: RunningStats<f32> = [-4.0, -2.0].iter().copied().collect();
        assert_eq!(stats.min(), Some(-4.0));
        assert_eq!(stats.max(), Some(-2.0));
        assert!((stats.mean() + 3.0).abs() < 1e-6);
        assert!((stats.std_dev() - 1.0).abs() < 1e-6);
    }
}
