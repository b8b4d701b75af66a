//! Typed payloads for each flight-log record kind.
//!
//! One named struct per message kind, replacing the stringly-keyed
//! dictionaries the original ground-station code shuffled around.  These are
//! the *value* halves of a [`TimeSeries`](crate::TimeSeries); the timestamp
//! lives in the series' time array.
//!
//! [`GpsFix`] is the exception that proves the rule: it still carries the
//! host-clock column, because the boot-start offset is derived from the first
//! fix (host minus device time) before everything collapses onto the
//! canonical scale.
//!

use serde::{Deserialize, Serialize};

/// Fused global position estimate, one per autopilot solution.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GlobalPosition {
    /// Actual position (deg)
    pub lat: f64,
    /// Actual position (deg)
    pub lon: f64,
    /// Altitude above the launch point (m)
    pub alt: f64,
    /// True heading (deg), when the log carries it
    pub heading: Option<f64>,
}

/// Position in the local NED frame, re-expressed with z up.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct LocalPosition {
    /// North (m)
    pub x: f64,
    /// East (m)
    pub y: f64,
    /// Up (m)
    pub z: f64,
}

/// Raw GNSS fix.  The series' time array holds the device-relative stamp
/// until the boot-start offset is applied.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GpsFix {
    /// Host (UTC) timestamp of the same fix, seconds
    pub utc_time: f64,
    /// Reported position (deg)
    pub lat: f64,
    /// Reported position (deg)
    pub lon: f64,
    /// Reported altitude (m)
    pub alt: f64,
}

/// Mission milestone: the autopilot reports having reached waypoint `seq`.
/// Only used to derive mission boundaries, never retained downstream.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Waypoint {
    /// Waypoint sequence number; 1 means "first mapping target reached"
    pub seq: u32,
}

/// The pipeline currency: a geographic fix with no extra baggage.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeoFix {
    /// Latitude (deg)
    pub lat: f64,
    /// Longitude (deg)
    pub lon: f64,
    /// Relative altitude (m)
    pub alt: f64,
}

impl GeoFix {
    /// An interpolated fix outside the trajectory domain has no value.
    ///
    pub fn is_valid(&self) -> bool {
        !(self.lat.is_nan() || self.lon.is_nan() || self.alt.is_nan())
    }
}

impl From<&GlobalPosition> for GeoFix {
    fn from(p: &GlobalPosition) -> Self {
        GeoFix {
            lat: p.lat,
            lon: p.lon,
            alt: p.alt,
        }
    }
}

impl From<&GpsFix> for GeoFix {
    fn from(p: &GpsFix) -> Self {
        GeoFix {
            lat: p.lat,
            lon: p.lon,
            alt: p.alt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geofix_validity() {
        let good = GeoFix {
            lat: 38.42,
            lon: -79.85,
            alt: 10.0,
        };
        assert!(good.is_valid());
        let bad = GeoFix {
            lat: f64::NAN,
            ..good
        };
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_from_global() {
        let g = GlobalPosition {
            lat: 1.0,
            lon: 2.0,
            alt: 3.0,
            heading: Some(90.0),
        };
        let f = GeoFix::from(&g);
        assert_eq!(1.0, f.lat);
        assert_eq!(3.0, f.alt);
    }
}
