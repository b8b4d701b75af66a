//! One sortie: a single physical flight and its logs.
//!
//! A sortie moves through an explicit state machine - `Unread` until the
//! producer hands over its raw arrays, `Read` once timestamps are canonical,
//! then `Flagged` or `FlagFailed` after the flagging passes ran.  Downstream
//! code checks the state, never the presence of some attribute.
//!

use tracing::{debug, warn};

use beamcal_common::{BootStart, PipelineConfig};
use beamcal_formats::{GeoFix, GlobalPosition, GpsFix, LocalPosition, TimeSeries, Waypoint};

use crate::error::PipelineError;
use crate::flag::{apply_flag_window, flag_angles, flag_mission};

/// Lifecycle of one sortie.
///
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortieState {
    /// Created, no data yet
    #[default]
    Unread,
    /// Raw arrays attached, timestamps canonical
    Read,
    /// Mission/flagged bipartition derived
    Flagged,
    /// Flagging failed, sortie will be skipped at combine
    FlagFailed,
}

/// Raw per-sortie arrays as the log producer hands them over.
///
/// `global`, `local` and `yaw` timestamps are device-relative (seconds since
/// autopilot boot); `gps` rows carry the host clock alongside, which is what
/// the boot-start offset is derived from.  `waypoints` come from the ground
/// station log and are already canonical.
///
#[derive(Clone, Debug, Default)]
pub struct SortieData {
    pub global: TimeSeries<GlobalPosition>,
    pub local: TimeSeries<LocalPosition>,
    pub gps: TimeSeries<GpsFix>,
    pub waypoints: TimeSeries<Waypoint>,
    pub yaw: TimeSeries<f64>,
}

/// One flight of the drone, with its own logs and flags.
///
#[derive(Clone, Debug)]
pub struct Sortie {
    name: String,
    state: SortieState,
    global: TimeSeries<GlobalPosition>,
    local: TimeSeries<LocalPosition>,
    gps: TimeSeries<GeoFix>,
    waypoints: TimeSeries<Waypoint>,
    yaw: TimeSeries<f64>,
    flagged: Option<TimeSeries<GeoFix>>,
    mission: Option<TimeSeries<GeoFix>>,
}

impl Sortie {
    pub fn new(name: &str) -> Self {
        Sortie {
            name: name.to_string(),
            state: SortieState::Unread,
            global: TimeSeries::new(),
            local: TimeSeries::new(),
            gps: TimeSeries::new(),
            waypoints: TimeSeries::new(),
            yaw: TimeSeries::new(),
            flagged: None,
            mission: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SortieState {
        self.state
    }

    /// Attach device-relative logs.  Derives the boot-start offset from the
    /// first GNSS fix (`host - device`), shifts every device-relative series
    /// onto the canonical scale, then drops the redundant host column.
    ///
    #[tracing::instrument(skip(self, data), fields(sortie = %self.name))]
    pub fn attach(&mut self, mut data: SortieData) -> Result<(), PipelineError> {
        let (device0, fix0) = match data.gps.iter().next() {
            Some((t, fix)) => (t, *fix),
            None => return Err(beamcal_common::TimeError::EmptySeries.into()),
        };
        let boot = BootStart::derive(device0, fix0.utc_time);
        debug!("boot start offset = {}", boot.offset);

        data.global.shift_times(boot.offset);
        data.local.shift_times(boot.offset);
        data.gps.shift_times(boot.offset);
        data.yaw.shift_times(boot.offset);

        // device column is gone now; keep one timestamp per row
        let gps_times = data.gps.times().to_vec();
        let gps_fixes: Vec<GeoFix> = data.gps.values().iter().map(GeoFix::from).collect();

        self.global = data.global;
        self.local = data.local;
        self.gps = TimeSeries::try_new(gps_times, gps_fixes)?;
        self.waypoints = data.waypoints;
        self.yaw = data.yaw;
        self.state = SortieState::Read;
        Ok(())
    }

    /// Attach logs whose timestamps are already canonical (ground-station
    /// track files).  No boot-start involved.
    ///
    #[tracing::instrument(skip(self, global, waypoints, yaw), fields(sortie = %self.name))]
    pub fn attach_canonical(
        &mut self,
        global: TimeSeries<GlobalPosition>,
        waypoints: TimeSeries<Waypoint>,
        yaw: TimeSeries<f64>,
    ) {
        self.global = global;
        self.waypoints = waypoints;
        self.yaw = yaw;
        self.state = SortieState::Read;
    }

    /// Run both flagging passes and derive the mission/flagged bipartition.
    ///
    /// Failure leaves the sortie in `FlagFailed`; the aggregator will skip
    /// it and report, the batch carries on.
    ///
    #[tracing::instrument(skip(self, cfg), fields(sortie = %self.name))]
    pub fn flag(&mut self, cfg: &PipelineConfig) -> Result<(), PipelineError> {
        match self.state {
            SortieState::Read | SortieState::Flagged => (),
            _ => return Err(PipelineError::NotRead(self.name.clone())),
        }

        let mut positions = TimeSeries::with_capacity(self.global.len());
        for (t, p) in self.global.iter() {
            positions.push(t, GeoFix::from(p));
        }
        if let Err(i) = positions.ensure_monotonic() {
            self.state = SortieState::FlagFailed;
            return Err(PipelineError::Ordering(i));
        }

        let endpoints = flag_mission(&positions, &self.waypoints, cfg).map_err(|e| {
            self.state = SortieState::FlagFailed;
            e
        })?;

        // expand yaw outliers onto the in-mission samples
        let (_, bad_times) = flag_angles(&self.yaw, cfg.yaw_sigma);
        let window = apply_flag_window(endpoints.mission.times(), &bad_times, cfg.flag_window_secs);

        let mut mission = TimeSeries::with_capacity(endpoints.mission.len());
        let mut flagged = endpoints.flagged;
        for ((t, fix), bad) in endpoints.mission.iter().zip(window) {
            if bad {
                flagged.push(t, *fix);
            } else {
                mission.push(t, *fix);
            }
        }

        // yaw-window samples land after the endpoint ones, restore time order
        flagged.sort_by_time();

        if mission.is_empty() {
            warn!("no samples left inside the mission window");
            self.state = SortieState::FlagFailed;
            return Err(PipelineError::MissingData(self.name.clone()));
        }

        debug!(
            "{} mission samples, {} flagged",
            mission.len(),
            flagged.len()
        );
        self.mission = Some(mission);
        self.flagged = Some(flagged);
        self.state = SortieState::Flagged;
        Ok(())
    }

    /// In-mission samples, present once flagging succeeded.
    ///
    pub fn mission_data(&self) -> Option<&TimeSeries<GeoFix>> {
        self.mission.as_ref()
    }

    /// Samples excluded from the mission (endpoints and yaw windows).
    ///
    pub fn flagged_data(&self) -> Option<&TimeSeries<GeoFix>> {
        self.flagged.as_ref()
    }

    /// First in-mission timestamp, for sortie-level chronology.
    ///
    pub fn first_mission_time(&self) -> Option<f64> {
        self.mission.as_ref().and_then(|m| m.first_time())
    }

    /// Raw sample count before flagging.
    ///
    pub fn raw_len(&self) -> usize {
        self.global.len()
    }
}
