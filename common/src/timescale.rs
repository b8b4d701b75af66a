//! Canonical time scale and conversions into it.
//!
//! Every timestamp crossing a crate boundary is in *canonical time*: continuous
//! atomic seconds since the GPS epoch (1980-01-06T00:00:00 UTC), stored as `f64`.
//! Source logs arrive in four native representations (Unix epoch seconds,
//! GPS week + milliseconds, calendar strings, autopilot tick counters) and are
//! converted exactly once, at ingest.  Nothing downstream ever sees a
//! source-native unit.
//!
//! All conversions are pure functions of their inputs.  There is no global
//! clock state anywhere in this module.
//!

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use strum::EnumString;
use thiserror::Error;

/// Unix timestamp of the GPS epoch, 1980-01-06T00:00:00 UTC.
pub const GPS_EPOCH_UNIX: f64 = 315_964_800.0;

/// Seconds in one GPS week.
pub const SEC_PER_WEEK: f64 = 604_800.0;

/// Unix timestamps (UTC midnight) at which a new leap second took effect.
/// After entry `i`, GPS-UTC = `i + 1` seconds.  Last entry: 2017-01-01.
const LEAP_EPOCHS: [f64; 18] = [
    362_793_600.0,   // 1981-07-01
    394_329_600.0,   // 1982-07-01
    425_865_600.0,   // 1983-07-01
    489_024_000.0,   // 1985-07-01
    567_993_600.0,   // 1988-01-01
    631_152_000.0,   // 1990-01-01
    662_688_000.0,   // 1991-01-01
    709_948_800.0,   // 1992-07-01
    741_484_800.0,   // 1993-07-01
    773_020_800.0,   // 1994-07-01
    820_454_400.0,   // 1996-01-01
    867_715_200.0,   // 1997-07-01
    915_148_800.0,   // 1999-01-01
    1_136_073_600.0, // 2006-01-01
    1_230_768_000.0, // 2009-01-01
    1_341_100_800.0, // 2012-07-01
    1_435_708_800.0, // 2015-07-01
    1_483_228_800.0, // 2017-01-01
];

/// Errors out of the conversion layer.  Fatal to the single conversion call,
/// never to the batch.
///
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("unknown time format tag: {0}")]
    UnknownFormat(String),
    #[error("cannot parse {value} with format {format}")]
    Unparsable { value: String, format: String },
    #[error("empty series, nothing to derive a boot start from")]
    EmptySeries,
}

/// Tag naming a source time representation, as declared on CLI or in config
/// files.  Unknown tags are an error, they never default.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, strum::Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// Unix epoch seconds (UTC)
    Unix,
    /// GPS atomic seconds, already canonical
    #[default]
    Gps,
    /// GPS week number plus milliseconds into the week
    GpsWeekMs,
    /// Calendar date-time string with an explicit format
    Calendar,
    /// Autopilot tick counter, needs a tick scale and a boot start
    Ticks,
}

impl TimeFormat {
    /// Like `FromStr` but with our error type, for use at the CLI boundary.
    ///
    pub fn parse_tag(tag: &str) -> Result<Self, TimeError> {
        Self::from_str(tag).map_err(|_| TimeError::UnknownFormat(tag.to_string()))
    }
}

/// A timestamp tagged with its source representation.  The variant *is* the
/// format tag, so a value can never be interpreted under the wrong scale.
///
#[derive(Clone, Copy, Debug)]
pub enum TimeValue<'a> {
    /// Unix epoch seconds
    Unix(f64),
    /// GPS atomic seconds
    Gps(f64),
    /// GPS week number and milliseconds into the week
    GpsWeekMs { week: u32, ms: f64 },
    /// Calendar string plus the chrono format string to parse it with
    Calendar { value: &'a str, format: &'a str },
    /// Device tick counter
    Ticks {
        ticks: f64,
        scale: TickScale,
        boot: BootStart,
    },
}

/// Convert any tagged source timestamp into canonical GPS seconds.
///
pub fn to_canonical(value: TimeValue) -> Result<f64, TimeError> {
    let t = match value {
        TimeValue::Unix(t) => unix_to_gps(t),
        TimeValue::Gps(t) => t,
        TimeValue::GpsWeekMs { week, ms } => gps_week_ms_to_gps(week, ms),
        TimeValue::Calendar { value, format } => calendar_to_gps(value, format)?,
        TimeValue::Ticks { ticks, scale, boot } => boot.canonical(ticks, scale),
    };
    Ok(t)
}

/// Number of leap seconds in effect at Unix time `t`.
///
fn leap_count_unix(t: f64) -> usize {
    LEAP_EPOCHS.partition_point(|&e| e <= t)
}

/// Unix epoch seconds to canonical GPS seconds, leap-second aware.
///
pub fn unix_to_gps(t: f64) -> f64 {
    t - GPS_EPOCH_UNIX + leap_count_unix(t) as f64
}

/// Canonical GPS seconds back to Unix epoch seconds.
///
pub fn gps_to_unix(t: f64) -> f64 {
    // GPS second at which the (i+1)-th leap takes effect
    //
    let count = LEAP_EPOCHS
        .iter()
        .enumerate()
        .take_while(|&(i, &e)| t >= e - GPS_EPOCH_UNIX + (i as f64 + 1.0))
        .count();
    t + GPS_EPOCH_UNIX - count as f64
}

/// GPS week + milliseconds-of-week to canonical seconds.  This is how APM
/// flight logs timestamp their GPS rows.
///
pub fn gps_week_ms_to_gps(week: u32, ms: f64) -> f64 {
    week as f64 * SEC_PER_WEEK + ms / 1_000.0
}

/// Parse a calendar date-time string with an explicit chrono format, taken
/// as UTC, into canonical seconds.
///
pub fn calendar_to_gps(value: &str, format: &str) -> Result<f64, TimeError> {
    let naive = NaiveDateTime::parse_from_str(value, format).map_err(|_| TimeError::Unparsable {
        value: value.to_string(),
        format: format.to_string(),
    })?;
    let dt: DateTime<Utc> = naive.and_utc();
    let unix = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9;
    Ok(unix_to_gps(unix))
}

/// Duration of one autopilot tick.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct TickScale {
    /// Seconds per tick
    pub sec_per_tick: f64,
}

impl TickScale {
    /// Microsecond ticks, what current autopilot logs use.
    pub const MICROS: TickScale = TickScale {
        sec_per_tick: 1.0e-6,
    };
    /// Millisecond ticks, seen in older firmware.
    pub const MILLIS: TickScale = TickScale {
        sec_per_tick: 1.0e-3,
    };
}

/// Offset turning device-relative timestamps into canonical ones.
///
/// Autopilot logs carry one record kind with two parallel timestamp columns,
/// device-relative and host.  The offset is `host[0] - device[0]` from the
/// first record; once added to every device-relative column, the device
/// column is discarded so a single source of truth remains per row.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BootStart {
    /// Canonical seconds at device time zero
    pub offset: f64,
}

impl BootStart {
    /// Derive from the first synchronized record of a log.  Both arguments in
    /// seconds; `host` already canonical.
    ///
    pub fn derive(device: f64, host: f64) -> Self {
        BootStart {
            offset: host - device,
        }
    }

    /// Shift one device-relative timestamp (seconds) onto the canonical scale.
    ///
    pub fn apply(&self, device: f64) -> f64 {
        device + self.offset
    }

    /// Canonical seconds for a raw tick counter.
    ///
    pub fn canonical(&self, ticks: f64, scale: TickScale) -> f64 {
        self.apply(ticks * scale.sec_per_tick)
    }
}
