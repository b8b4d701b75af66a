//! Spectrum-analyzer capture container.
//!
//! One capture is a waterfall: a fixed frequency axis shared by every sample,
//! a timestamp per sweep, and a power matrix with one row per sweep.  The
//! axis is fixed at construction; a row that disagrees with it can only come
//! from a torn or corrupt capture and is a hard error.
//!

use ndarray::Array2;
use thiserror::Error;

use beamcal_common::ChannelSpec;

use crate::ShapeError;

/// Power ratio to decibels.
///
pub fn db(x: f64) -> f64 {
    10.0 * x.log10()
}

/// Voltage ratio to decibels.
///
pub fn db2(x: f64) -> f64 {
    20.0 * x.log10()
}

/// Channel selection that cannot be satisfied by this capture.
///
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel {0} out of range, capture has {1} bins")]
    IndexOutOfRange(usize, usize),
    #[error("frequency {0} MHz outside captured span {1}..{2} MHz")]
    FrequencyOutOfRange(f64, f64, f64),
    #[error("capture has an empty frequency axis")]
    EmptyAxis,
}

/// A spectrum capture: times × frequency power waterfall.
///
#[derive(Clone, Debug, PartialEq)]
pub struct SpectrumCapture {
    /// Shared frequency axis (MHz), immutable once built
    freqs: Vec<f64>,
    /// Sweep timestamps, canonical seconds
    times: Vec<f64>,
    /// Power, shape (len(times), len(freqs))
    power: Array2<f64>,
}

impl SpectrumCapture {
    /// Build a capture, enforcing both shape invariants.
    ///
    pub fn try_new(freqs: Vec<f64>, times: Vec<f64>, power: Array2<f64>) -> Result<Self, ShapeError> {
        if power.nrows() != times.len() {
            return Err(ShapeError::LengthMismatch {
                times: times.len(),
                values: power.nrows(),
            });
        }
        if power.ncols() != freqs.len() {
            return Err(ShapeError::FrequencyAxis {
                nfreq: freqs.len(),
                ncols: power.ncols(),
            });
        }
        Ok(SpectrumCapture { freqs, times, power })
    }

    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn power(&self) -> &Array2<f64> {
        &self.power
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Resolve a channel spec to a bin index: direct, or nearest bin to a
    /// frequency in MHz.
    ///
    pub fn resolve_channel(&self, spec: &ChannelSpec) -> Result<usize, ChannelError> {
        if self.freqs.is_empty() {
            return Err(ChannelError::EmptyAxis);
        }
        match *spec {
            ChannelSpec::Index { index } => {
                if index >= self.freqs.len() {
                    return Err(ChannelError::IndexOutOfRange(index, self.freqs.len()));
                }
                Ok(index)
            }
            ChannelSpec::FrequencyMhz { freq_mhz } => {
                let lo = self.freqs.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = self.freqs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if freq_mhz < lo || freq_mhz > hi {
                    return Err(ChannelError::FrequencyOutOfRange(freq_mhz, lo, hi));
                }
                let (best, _) = self
                    .freqs
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| (i, (f - freq_mhz).abs()))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .ok_or(ChannelError::EmptyAxis)?;
                Ok(best)
            }
        }
    }

    /// One power vector over time for the selected channel.
    ///
    pub fn channel_select(&self, spec: &ChannelSpec) -> Result<Vec<f64>, ChannelError> {
        let chan = self.resolve_channel(spec)?;
        Ok(self.power.column(chan).to_vec())
    }

    /// Sub-capture with only the sweeps inside `[start, end]`.  Sweep times
    /// are assumed ascending, as written by the analyzer.
    ///
    pub fn slice_time_range(&self, start: f64, end: f64) -> SpectrumCapture {
        let lo = self.times.partition_point(|&t| t < start);
        let hi = self.times.partition_point(|&t| t <= end);
        SpectrumCapture {
            freqs: self.freqs.clone(),
            times: self.times[lo..hi].to_vec(),
            power: self.power.slice(ndarray::s![lo..hi, ..]).to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;
    use rstest::rstest;

    use super::*;

    fn capture() -> SpectrumCapture {
        SpectrumCapture::try_new(
            vec![137.496, 137.498, 137.500, 137.502],
            vec![10.0, 11.0, 12.0],
            arr2(&[
                [1.0, 2.0, 3.0, 4.0],
                [5.0, 6.0, 7.0, 8.0],
                [9.0, 10.0, 11.0, 12.0],
            ]),
        )
        .unwrap()
    }

    #[test]
    fn test_shape_rows() {
        let r = SpectrumCapture::try_new(
            vec![1.0, 2.0],
            vec![0.0],
            arr2(&[[0.0, 0.0], [0.0, 0.0]]),
        );
        assert!(matches!(r, Err(ShapeError::LengthMismatch { .. })));
    }

    #[test]
    fn test_shape_axis() {
        let r = SpectrumCapture::try_new(vec![1.0, 2.0, 3.0], vec![0.0], arr2(&[[0.0, 0.0]]));
        assert!(matches!(
            r,
            Err(ShapeError::FrequencyAxis { nfreq: 3, ncols: 2 })
        ));
    }

    #[rstest]
    #[case(ChannelSpec::Index { index: 1 }, 1)]
    #[case(ChannelSpec::FrequencyMhz { freq_mhz: 137.4995 }, 2)]
    #[case(ChannelSpec::FrequencyMhz { freq_mhz: 137.502 }, 3)]
    fn test_resolve_channel(#[case] spec: ChannelSpec, #[case] expected: usize) {
        assert_eq!(expected, capture().resolve_channel(&spec).unwrap());
    }

    #[test]
    fn test_channel_out_of_range() {
        let cap = capture();
        assert!(matches!(
            cap.resolve_channel(&ChannelSpec::Index { index: 9 }),
            Err(ChannelError::IndexOutOfRange(9, 4))
        ));
        assert!(matches!(
            cap.resolve_channel(&ChannelSpec::FrequencyMhz { freq_mhz: 200.0 }),
            Err(ChannelError::FrequencyOutOfRange(..))
        ));
    }

    #[test]
    fn test_channel_select() {
        let col = capture().channel_select(&ChannelSpec::Index { index: 0 }).unwrap();
        assert_eq!(vec![1.0, 5.0, 9.0], col);
    }

    #[test]
    fn test_slice_time_range() {
        let sub = capture().slice_time_range(10.5, 12.0);
        assert_eq!(&[11.0, 12.0], sub.times());
        assert_eq!(2, sub.power().nrows());
        assert_eq!(6.0, sub.power()[[0, 1]]);
    }

    #[test]
    fn test_db() {
        assert_eq!(20.0, db(100.0));
        assert_eq!(40.0, db2(100.0));
    }
}
