//! Mission-segment and angle-outlier flagging.
//!
//! Two independent passes over a sortie's position data: the endpoint pass
//! bipartitions samples around the waypoint-derived mission window, the yaw
//! pass finds orientation outliers and expands them to a time window on any
//! series sharing the canonical time base.
//!

use tracing::warn;

use beamcal_common::{MissionStartPolicy, PipelineConfig};
use beamcal_formats::{GeoFix, TimeSeries, Waypoint};

use crate::error::PipelineError;

/// Strict bipartition of one position series: every input sample lands in
/// exactly one of the two outputs.
///
#[derive(Clone, Debug, Default)]
pub struct Bipartition {
    /// Samples outside the mission window (taxi, climb, return-to-launch)
    pub flagged: TimeSeries<GeoFix>,
    /// Samples inside the mission window
    pub mission: TimeSeries<GeoFix>,
}

/// Partition `positions` around the mission window derived from `waypoints`.
///
/// The window opens at the first event whose sequence number equals
/// `cfg.first_waypoint` and closes at the last event.  A sample belongs to
/// the mission iff `start <= t <= end`.
///
/// When no event carries the start flag the behaviour follows
/// `cfg.mission_start`: `Require` refuses to guess, `Epoch` reproduces the
/// legacy fall-back to time zero (which usually marks everything
/// in-mission - hence the warning).
///
#[tracing::instrument(skip(positions, waypoints))]
pub fn flag_mission(
    positions: &TimeSeries<GeoFix>,
    waypoints: &TimeSeries<Waypoint>,
    cfg: &PipelineConfig,
) -> Result<Bipartition, PipelineError> {
    let mission_end = match waypoints.last_time() {
        Some(t) => t,
        None => return Err(PipelineError::NoMissionStart),
    };

    let mission_start = match waypoints
        .iter()
        .find(|(_, w)| w.seq == cfg.first_waypoint)
        .map(|(t, _)| t)
    {
        Some(t) => t,
        None => match cfg.mission_start {
            MissionStartPolicy::Require => return Err(PipelineError::NoMissionStart),
            MissionStartPolicy::Epoch => {
                warn!("no mission-start event, falling back to epoch zero");
                0.0
            }
        },
    };

    let mut out = Bipartition::default();
    for (t, fix) in positions.iter() {
        if t < mission_start || t > mission_end {
            out.flagged.push(t, *fix);
        } else {
            out.mission.push(t, *fix);
        }
    }
    Ok(out)
}

/// Flag yaw samples more than `sigma` standard deviations from the mean.
///
/// Yaw wraps at 0/360°, so the statistics run on `cos(yaw)`; when the mean
/// cosine exceeds 0.5 the samples cluster near the branch cut where cosine
/// stops discriminating, and the pass reruns on `sin(yaw)`.  This is a
/// heuristic: it breaks down on bimodal heading distributions.
///
/// Returns the per-sample mask and the timestamps of the flagged samples.
///
pub fn flag_angles(angles: &TimeSeries<f64>, sigma: f64) -> (Vec<bool>, Vec<f64>) {
    if angles.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let projected: Vec<f64> = angles.values().iter().map(|a| a.to_radians().cos()).collect();
    let mean = projected.iter().sum::<f64>() / projected.len() as f64;

    let (projected, mean) = if mean > 0.5 {
        // branch cut: sine discriminates where cosine saturates
        let s: Vec<f64> = angles.values().iter().map(|a| a.to_radians().sin()).collect();
        let m = s.iter().sum::<f64>() / s.len() as f64;
        (s, m)
    } else {
        (projected, mean)
    };

    let var = projected.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / projected.len() as f64;
    let std = var.sqrt();
    if std == 0.0 {
        return (vec![false; angles.len()], Vec::new());
    }

    let mask: Vec<bool> = projected
        .iter()
        .map(|x| (x - mean).abs() / std > sigma)
        .collect();
    let flagged_times: Vec<f64> = angles
        .times()
        .iter()
        .zip(mask.iter())
        .filter(|(_, &bad)| bad)
        .map(|(&t, _)| t)
        .collect();
    (mask, flagged_times)
}

/// Mark every timestamp of `times` within ±`dt` seconds of any flagged time.
/// Used to propagate yaw flags onto position samples taken at the same
/// moments.
///
pub fn apply_flag_window(times: &[f64], flag_times: &[f64], dt: f64) -> Vec<bool> {
    let mut mask = vec![false; times.len()];
    for &bad in flag_times {
        for (slot, &t) in mask.iter_mut().zip(times.iter()) {
            if (t - bad).abs() <= dt {
                *slot = true;
            }
        }
    }
    mask
}
