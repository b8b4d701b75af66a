//! Piecewise-linear resampling of the flown trajectory onto spectrum time.
//!
//! Spectrum capture commonly starts before takeoff and runs past landing, so
//! out-of-domain queries are the normal case, not an error: they come back as
//! NaN and are filtered downstream.  Ordering violations, on the other hand,
//! mean corrupt input and are rejected before any arithmetic happens.
//!

use serde::Serialize;

use beamcal_common::ChannelSpec;
use beamcal_formats::{GeoFix, ShapeError, SpectrumCapture, TimeSeries};

use crate::error::PipelineError;

/// 1-D linear interpolation of `(xs, ys)` at the points `qs`.
///
/// `xs` must be strictly increasing and duplicate-free; queries outside
/// `[xs[0], xs[last]]` yield NaN, queries exactly on a knot yield that knot's
/// value exactly.
///
pub fn interp1(xs: &[f64], ys: &[f64], qs: &[f64]) -> Result<Vec<f64>, PipelineError> {
    if xs.len() != ys.len() {
        return Err(ShapeError::LengthMismatch {
            times: xs.len(),
            values: ys.len(),
        }
        .into());
    }
    if let Some(i) = xs.windows(2).position(|w| w[1] <= w[0]) {
        return Err(PipelineError::Ordering(i + 1));
    }

    let out = qs
        .iter()
        .map(|&q| {
            if xs.is_empty() || q < xs[0] || q > xs[xs.len() - 1] {
                return f64::NAN;
            }
            let i = xs.partition_point(|&x| x < q);
            if i < xs.len() && xs[i] == q {
                return ys[i];
            }
            let frac = (q - xs[i - 1]) / (xs[i] - xs[i - 1]);
            ys[i - 1] + frac * (ys[i] - ys[i - 1])
        })
        .collect();
    Ok(out)
}

/// Resample a trajectory onto `query` times: one geographic fix per query,
/// NaN-valued where the query falls outside the flown interval.
///
pub fn interp_track(track: &TimeSeries<GeoFix>, query: &[f64]) -> Result<Vec<GeoFix>, PipelineError> {
    let lats: Vec<f64> = track.values().iter().map(|f| f.lat).collect();
    let lons: Vec<f64> = track.values().iter().map(|f| f.lon).collect();
    let alts: Vec<f64> = track.values().iter().map(|f| f.alt).collect();

    let lat = interp1(track.times(), &lats, query)?;
    let lon = interp1(track.times(), &lons, query)?;
    let alt = interp1(track.times(), &alts, query)?;

    Ok(lat
        .into_iter()
        .zip(lon)
        .zip(alt)
        .map(|((lat, lon), alt)| GeoFix { lat, lon, alt })
        .collect())
}

/// The inverse direction: received power resampled onto position times.
///
pub fn interp_rx(pos_times: &[f64], rx_times: &[f64], rx: &[f64]) -> Result<Vec<f64>, PipelineError> {
    interp1(rx_times, rx, pos_times)
}

/// One spectrum sweep with the drone position interpolated onto it.
///
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AlignedSample {
    /// Latitude (deg), NaN when the sweep fell outside the flown interval
    pub lat: f64,
    /// Longitude (deg)
    pub lon: f64,
    /// Relative altitude (m)
    pub alt: f64,
    /// Received power on the selected channel, analyzer units
    pub power: f64,
}

impl AlignedSample {
    pub fn is_valid(&self) -> bool {
        !(self.lat.is_nan() || self.lon.is_nan() || self.alt.is_nan())
    }
}

/// Align one capture against a flown trajectory: select the channel, trim the
/// capture to the trajectory's span, then give every remaining sweep a
/// geographic fix.  Output is 1:1 with the retained sweeps.
///
#[tracing::instrument(skip(track, capture))]
pub fn align_spectrum(
    track: &TimeSeries<GeoFix>,
    capture: &SpectrumCapture,
    chan: &ChannelSpec,
) -> Result<TimeSeries<AlignedSample>, PipelineError> {
    let (start, end) = match (track.first_time(), track.last_time()) {
        (Some(s), Some(e)) => (s, e),
        // nothing flown, nothing to align
        _ => return Ok(TimeSeries::new()),
    };

    let capture = capture.slice_time_range(start, end);
    let power = capture.channel_select(chan)?;
    let fixes = interp_track(track, capture.times())?;

    let mut out = TimeSeries::with_capacity(capture.len());
    for ((&t, fix), p) in capture.times().iter().zip(fixes).zip(power) {
        out.push(
            t,
            AlignedSample {
                lat: fix.lat,
                lon: fix.lon,
                alt: fix.alt,
                power: p,
            },
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_interp1_scenario() {
        // interp([0,10,20],[5,7,9]) at [5,15,25] => [6, 8, NaN]
        let out = interp1(&[0.0, 10.0, 20.0], &[5.0, 7.0, 9.0], &[5.0, 15.0, 25.0]).unwrap();
        assert_eq!(6.0, out[0]);
        assert_eq!(8.0, out[1]);
        assert!(out[2].is_nan());
    }

    #[rstest]
    #[case(-0.5)]
    #[case(20.001)]
    #[case(1.0e9)]
    fn test_interp1_out_of_domain(#[case] q: f64) {
        let out = interp1(&[0.0, 10.0, 20.0], &[5.0, 7.0, 9.0], &[q]).unwrap();
        assert!(out[0].is_nan());
    }

    #[rstest]
    #[case(0.0, 5.0)]
    #[case(10.0, 7.0)]
    #[case(20.0, 9.0)]
    fn test_interp1_exact_at_knots(#[case] q: f64, #[case] expected: f64) {
        let out = interp1(&[0.0, 10.0, 20.0], &[5.0, 7.0, 9.0], &[q]).unwrap();
        assert_eq!(expected, out[0]);
    }

    #[test]
    fn test_interp1_ordering() {
        let r = interp1(&[0.0, 10.0, 10.0], &[1.0, 2.0, 3.0], &[5.0]);
        assert!(matches!(r, Err(PipelineError::Ordering(2))));
    }

    #[test]
    fn test_interp1_shape() {
        let r = interp1(&[0.0, 10.0], &[1.0], &[5.0]);
        assert!(matches!(r, Err(PipelineError::Shape(_))));
    }

    #[test]
    fn test_interp1_empty() {
        let out = interp1(&[], &[], &[1.0, 2.0]).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_interp_rx() {
        // power onto position times, the other direction
        let out = interp_rx(&[12.0, 99.0], &[10.0, 14.0], &[1.0, 3.0]).unwrap();
        assert_eq!(2.0, out[0]);
        assert!(out[1].is_nan());
    }

    fn track() -> TimeSeries<GeoFix> {
        let mut ts = TimeSeries::new();
        for i in 0..3 {
            let t = 10.0 + 10.0 * i as f64;
            ts.push(
                t,
                GeoFix {
                    lat: 38.0 + 0.5 * i as f64,
                    lon: -79.0,
                    alt: 5.0 * i as f64,
                },
            );
        }
        ts
    }

    #[test]
    fn test_interp_track() {
        let fixes = interp_track(&track(), &[15.0, 40.0]).unwrap();
        assert_eq!(38.25, fixes[0].lat);
        assert_eq!(2.5, fixes[0].alt);
        assert!(!fixes[1].is_valid());
    }

    #[test]
    fn test_align_spectrum() {
        // sweeps at 5, 15, 25, 35 s; trajectory spans [10, 30]
        let capture = SpectrumCapture::try_new(
            vec![137.0, 137.5],
            vec![5.0, 15.0, 25.0, 35.0],
            arr2(&[[0.0, 1.0], [0.0, 2.0], [0.0, 3.0], [0.0, 4.0]]),
        )
        .unwrap();
        let aligned = align_spectrum(&track(), &capture, &ChannelSpec::FrequencyMhz { freq_mhz: 137.5 })
            .unwrap();

        // sweeps outside the flown interval are trimmed, not NaN-padded
        assert_eq!(&[15.0, 25.0], aligned.times());
        assert_eq!(2.0, aligned.values()[0].power);
        assert_eq!(38.25, aligned.values()[0].lat);
        assert!(aligned.values().iter().all(|s| s.is_valid()));
    }
}
