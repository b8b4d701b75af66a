//! Pipeline configuration.
//!
//! Everything that used to be ambient tables in the field scripts (channel
//! selection, flagging thresholds, mission-start policy) is an explicit
//! struct here, constructed once at pipeline setup and passed down.  A
//! versioned HCL file can override the defaults.
//!

use std::fs;
use std::path::Path;

use eyre::{eyre, Result};
use serde::Deserialize;
use tracing::trace;

use crate::timescale::TimeFormat;

/// Current beamcal.hcl version
const CONFIG_FILE_VER: usize = 1;

/// What to do when no waypoint event carries the reached-first-target flag.
///
/// The legacy pipeline silently treated mission start as time zero in that
/// case, which marks everything as in-mission.  That fallback is now opt-in.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MissionStartPolicy {
    /// Fail the flagging call for that sortie
    #[default]
    Require,
    /// Fall back to the epoch (legacy behaviour, logs a warning)
    Epoch,
}

/// Flagging knobs, one instance per pipeline run.
///
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Waypoint sequence number marking "reached first mapping target"
    pub first_waypoint: u32,
    /// Flag yaw samples this many standard deviations from the mean
    pub yaw_sigma: f64,
    /// Expand each yaw flag to ±this many seconds on other series
    pub flag_window_secs: f64,
    /// Fallback policy for missing mission-start events
    pub mission_start: MissionStartPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            first_waypoint: 1,
            yaw_sigma: 2.0,
            flag_window_secs: 1.0,
            mission_start: MissionStartPolicy::default(),
        }
    }
}

/// Which spectrum channel to carry through alignment, by bin or by frequency.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChannelSpec {
    /// Direct bin index into the frequency axis
    Index { index: usize },
    /// Nearest bin to this frequency in MHz
    FrequencyMhz { freq_mhz: f64 },
}

impl Default for ChannelSpec {
    fn default() -> Self {
        ChannelSpec::FrequencyMhz { freq_mhz: 137.5 }
    }
}

/// On-disk structure for the configuration file.
///
#[derive(Debug, Deserialize)]
struct ConfigFile {
    /// Version number for safety
    pub version: usize,
    /// Flagging parameters
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Channel selection
    #[serde(default)]
    pub channel: ChannelSpec,
    /// Time format of spectrum capture timestamps
    #[serde(default)]
    pub spectrum_time: TimeFormat,
}

/// Fully resolved configuration handed to the pipeline.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub channel: ChannelSpec,
    pub spectrum_time: TimeFormat,
}

/// Load the configuration, from `fname` if given, otherwise the built-in
/// defaults.
///
#[tracing::instrument]
pub fn load_config(fname: Option<&Path>) -> Result<Config> {
    trace!("enter");

    // Load from file if specified
    //
    let data = if let Some(fname) = fname {
        fs::read_to_string(fname)?
    } else {
        include_str!("beamcal.hcl").to_owned()
    };

    let file: ConfigFile = hcl::from_str(&data)?;
    if file.version != CONFIG_FILE_VER {
        return Err(eyre!("Bad config file version {}, aborting…", file.version));
    }
    Ok(Config {
        pipeline: file.pipeline,
        channel: file.channel,
        spectrum_time: file.spectrum_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default() -> Result<()> {
        let cfg = load_config(None)?;
        assert_eq!(1, cfg.pipeline.first_waypoint);
        assert_eq!(2.0, cfg.pipeline.yaw_sigma);
        assert_eq!(MissionStartPolicy::Require, cfg.pipeline.mission_start);
        Ok(())
    }

    #[test]
    fn test_parse_channel_index() -> Result<()> {
        let data = r#"
version = 1
channel {
  index = 512
}
"#;
        let file: ConfigFile = hcl::from_str(data)?;
        assert_eq!(ChannelSpec::Index { index: 512 }, file.channel);
        Ok(())
    }

    #[test]
    fn test_parse_policy_epoch() -> Result<()> {
        let data = r#"
version = 1
pipeline {
  mission_start = "epoch"
  yaw_sigma = 3.0
}
"#;
        let file: ConfigFile = hcl::from_str(data)?;
        assert_eq!(MissionStartPolicy::Epoch, file.pipeline.mission_start);
        assert_eq!(3.0, file.pipeline.yaw_sigma);
        Ok(())
    }

    #[test]
    fn test_bad_version() {
        let path = std::env::temp_dir().join("beamcal-bad-version.hcl");
        fs::write(&path, "version = 99\n").unwrap();
        let r = load_config(Some(&path));
        assert!(r.is_err());
    }
}
