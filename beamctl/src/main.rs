//! `beamctl` drives the beam calibration pipeline over locally stored
//! sortie and spectrum files.
//!

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{crate_authors, crate_description, crate_version, Parser};
use eyre::{eyre, Result};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::{info, trace};

use beamcal_common::{init_logging, load_config, ChannelSpec, Config, TimeFormat};
use beamcal_pipeline::{Observation, Sortie};

use crate::cli::{AlignOpts, CombineOpts, ListOpts, Opts, SubCommand};

mod cli;
mod io;

/// Binary name
pub const NAME: &str = env!("CARGO_BIN_NAME");
/// Binary version
pub const VERSION: &str = crate_version!();
/// Authors
pub const AUTHORS: &str = crate_authors!();

fn main() -> Result<()> {
    let opts = Opts::parse();

    // Initialise logging early
    //
    init_logging(NAME, opts.debug)?;
    trace!("logging initialised");

    let cfg = load_config(opts.config.as_deref())?;

    // Banner
    //
    banner()?;

    match opts.subcmd {
        SubCommand::Combine(copts) => {
            trace!("combine");
            let product = combine_sorties(&cfg, &copts)?;
            let mut out = output_stream(opts.output.as_deref())?;
            io::write_dataproduct(&mut *out, &product)?;
        }
        SubCommand::Align(aopts) => {
            trace!("align");
            let aligned = align_capture(&cfg, &aopts)?;
            let mut out = output_stream(opts.output.as_deref())?;
            io::write_aligned(&mut *out, &aligned)?;
        }
        SubCommand::List(lopts) => {
            trace!("list");
            let str = list_sorties(&cfg, &lopts)?;
            eprintln!("{}", str);
        }
        SubCommand::Version => {
            eprintln!("Modules:");
            eprintln!("\t{}", beamcal_common::version());
            eprintln!("\t{}", beamcal_formats::version());
            eprintln!("\t{}", beamcal_pipeline::version());
        }
    }
    Ok(())
}

/// One sortie on the command line is `POS.csv:WPT.csv[:YAW.csv]`.
///
fn parse_sortie_spec(spec: &str) -> Result<(PathBuf, PathBuf, Option<PathBuf>)> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.len() {
        2 => Ok((parts[0].into(), parts[1].into(), None)),
        3 => Ok((parts[0].into(), parts[1].into(), Some(parts[2].into()))),
        _ => Err(eyre!("bad sortie spec {}, need POS:WPT[:YAW]", spec)),
    }
}

/// Read every sortie named on the command line into an observation.
///
fn load_observation(copts: &CombineOpts) -> Result<Observation> {
    let fmt = TimeFormat::parse_tag(&copts.time_format)?;

    let mut obs = Observation::new();
    for (n, spec) in copts.sorties.iter().enumerate() {
        let (pos, wpt, yaw) = parse_sortie_spec(spec)?;
        let name = pos
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("sortie{:02}", n + 1));

        let positions = io::read_positions(&pos, fmt)?;
        let waypoints = io::read_waypoints(&wpt, fmt)?;
        let yaw = match yaw {
            Some(f) => io::read_yaw(&f, fmt)?,
            None => Default::default(),
        };

        let mut sortie = Sortie::new(&name);
        sortie.attach_canonical(positions, waypoints, yaw);
        obs.add_sortie(sortie);
    }
    Ok(obs)
}

/// Flag and combine; the returned observation keeps the dataproduct.
///
fn flag_and_combine(cfg: &Config, copts: &CombineOpts) -> Result<Observation> {
    let mut obs = load_observation(copts)?;
    let ok = obs.flag_all(&cfg.pipeline);
    info!("{} of {} sorties flagged", ok, obs.len());
    obs.combine()?;
    Ok(obs)
}

fn combine_sorties(
    cfg: &Config,
    copts: &CombineOpts,
) -> Result<beamcal_formats::TimeSeries<beamcal_formats::GeoFix>> {
    let obs = flag_and_combine(cfg, copts)?;
    let product = obs
        .dataproduct()
        .ok_or_else(|| eyre!("combine left no dataproduct"))?;
    println!("Combined {} sorties into {} samples.", obs.len(), product.len());
    Ok(product.clone())
}

fn align_capture(
    cfg: &Config,
    aopts: &AlignOpts,
) -> Result<beamcal_formats::TimeSeries<beamcal_pipeline::AlignedSample>> {
    let obs = flag_and_combine(cfg, &aopts.combine)?;
    let capture = io::read_spectrum(&aopts.spectrum, cfg.spectrum_time)?;

    let chan = if let Some(freq_mhz) = aopts.freq {
        ChannelSpec::FrequencyMhz { freq_mhz }
    } else if let Some(index) = aopts.channel {
        ChannelSpec::Index { index }
    } else {
        cfg.channel
    };

    let aligned = obs.align(&capture, &chan)?;
    println!(
        "Aligned {} of {} sweeps against the trajectory.",
        aligned.len(),
        capture.len()
    );
    Ok(aligned)
}

/// Per-sortie summary using `tabled`.
///
fn list_sorties(cfg: &Config, lopts: &ListOpts) -> Result<String> {
    let mut obs = load_observation(&lopts.combine)?;
    obs.flag_all(&cfg.pipeline);

    let header = vec!["Sortie", "State", "Raw", "Mission", "Flagged", "Mission span"];

    let mut builder = Builder::default();
    builder.push_record(header);

    obs.sorties().iter().for_each(|sortie| {
        let mission = sortie.mission_data().map(|m| m.len()).unwrap_or(0);
        let flagged = sortie.flagged_data().map(|f| f.len()).unwrap_or(0);
        let span = match (
            sortie.first_mission_time(),
            sortie.mission_data().and_then(|m| m.last_time()),
        ) {
            (Some(a), Some(b)) => format!("{:.0}..{:.0}", a, b),
            _ => "-".to_string(),
        };
        let row = vec![
            sortie.name().to_string(),
            sortie.state().to_string(),
            sortie.raw_len().to_string(),
            mission.to_string(),
            flagged.to_string(),
            span,
        ];
        builder.push_record(row);
    });

    let all = builder.build().with(Style::modern()).to_string();
    Ok(format!("Sorties:\n{all}"))
}

fn output_stream(fname: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match fname {
        Some(fname) => Box::new(File::create(fname)?),
        None => Box::new(std::io::stdout()),
    })
}

/// Display banner
///
fn banner() -> Result<()> {
    Ok(eprintln!(
        r##"
{}/{} by {}
{}
"##,
        NAME,
        VERSION,
        AUTHORS,
        crate_description!()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sortie_spec() {
        let (p, w, y) = parse_sortie_spec("pos.csv:wpt.csv").unwrap();
        assert_eq!(PathBuf::from("pos.csv"), p);
        assert_eq!(PathBuf::from("wpt.csv"), w);
        assert!(y.is_none());

        let (_, _, y) = parse_sortie_spec("a:b:c").unwrap();
        assert_eq!(Some(PathBuf::from("c")), y);

        assert!(parse_sortie_spec("just-one").is_err());
    }

    #[test]
    fn test_unknown_time_format_refused() {
        let copts = CombineOpts {
            time_format: "sundial".to_string(),
            sorties: vec!["a:b".to_string()],
        };
        assert!(load_observation(&copts).is_err());
    }
}
