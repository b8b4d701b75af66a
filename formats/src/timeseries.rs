//! Generic time-tagged series.
//!
//! Parallel arrays: one timestamp vector, one value vector, same length,
//! timestamps on the canonical scale.  This replaces the loose
//! "dictionary of 2-D arrays" shape the original field code passed around.
//!

use crate::ShapeError;

/// An ordered sequence of `(timestamp, value)` pairs.
///
/// Timestamps are canonical seconds and are expected non-decreasing within
/// one source; `ensure_monotonic` verifies that where it matters.
///
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries<T> {
    times: Vec<f64>,
    values: Vec<T>,
}

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        TimeSeries::new()
    }
}

impl<T> TimeSeries<T> {
    pub fn new() -> Self {
        TimeSeries {
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        TimeSeries {
            times: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
        }
    }

    /// Build from parallel arrays.  Lengths must match.
    ///
    pub fn try_new(times: Vec<f64>, values: Vec<T>) -> Result<Self, ShapeError> {
        if times.len() != values.len() {
            return Err(ShapeError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        Ok(TimeSeries { times, values })
    }

    pub fn push(&mut self, time: f64, value: T) {
        self.times.push(time);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn first_time(&self) -> Option<f64> {
        self.times.first().copied()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &T)> {
        self.times.iter().copied().zip(self.values.iter())
    }

    /// Index of the first timestamp that decreases, if any.
    ///
    pub fn ensure_monotonic(&self) -> Result<(), usize> {
        match self.times.windows(2).position(|w| w[1] < w[0]) {
            Some(i) => Err(i + 1),
            None => Ok(()),
        }
    }

    /// Add a constant offset to every timestamp (boot-start application).
    ///
    pub fn shift_times(&mut self, offset: f64) {
        self.times.iter_mut().for_each(|t| *t += offset);
    }

    /// Stable ascending sort by timestamp.  Ties keep their original order,
    /// so the total order is reproducible whatever the input order was.
    ///
    pub fn sort_by_time(&mut self) {
        let mut pairs: Vec<(f64, T)> = self
            .times
            .drain(..)
            .zip(self.values.drain(..))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (t, v) in pairs {
            self.times.push(t);
            self.values.push(v);
        }
    }

    /// Move every pair of `other` onto the end of `self`.
    ///
    pub fn append(&mut self, other: &mut Self) {
        self.times.append(&mut other.times);
        self.values.append(&mut other.values);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn series(pairs: &[(f64, i32)]) -> TimeSeries<i32> {
        let mut ts = TimeSeries::new();
        for &(t, v) in pairs {
            ts.push(t, v);
        }
        ts
    }

    #[test]
    fn test_try_new_mismatch() {
        let r = TimeSeries::try_new(vec![0.0, 1.0], vec![10]);
        assert!(matches!(
            r,
            Err(ShapeError::LengthMismatch { times: 2, values: 1 })
        ));
    }

    #[rstest]
    #[case(&[(0.0, 1), (1.0, 2), (1.0, 3)], Ok(()))]
    #[case(&[(0.0, 1), (2.0, 2), (1.0, 3)], Err(2))]
    fn test_ensure_monotonic(#[case] pairs: &[(f64, i32)], #[case] expected: Result<(), usize>) {
        assert_eq!(expected, series(pairs).ensure_monotonic());
    }

    #[test]
    fn test_sort_stable() {
        let mut ts = series(&[(2.0, 1), (1.0, 2), (2.0, 3), (0.0, 4)]);
        ts.sort_by_time();
        assert_eq!(&[0.0, 1.0, 2.0, 2.0], ts.times());
        // equal timestamps keep insertion order
        assert_eq!(&[4, 2, 1, 3], ts.values());
    }

    #[test]
    fn test_shift_append() {
        let mut a = series(&[(0.0, 1)]);
        let mut b = series(&[(5.0, 2)]);
        a.shift_times(10.0);
        a.append(&mut b);
        assert_eq!(&[10.0, 5.0], a.times());
        assert_eq!(2, a.len());
        assert!(b.is_empty());
    }
}
