//! Module describing all possible commands and sub-commands to the `beamctl`
//! main driver.
//!
//! We have three main commands:
//!
//! - `combine`
//! - `align`
//! - `list`
//!
//! `combine` reads one or more sorties (a position CSV and a waypoint CSV
//! each), flags them and writes the combined mission dataset.
//!
//! `align` does the same and then interpolates the combined trajectory onto
//! a spectrum capture, emitting one georeferenced row per retained sweep.
//!
//! `list` prints a per-sortie summary table without writing anything.
//!
//! A sortie on the command line is `POS.csv:WPT.csv` with an optional third
//! `:YAW.csv` member.
//!

use std::path::PathBuf;

use clap::{crate_description, crate_name, crate_version, Parser};

/// CLI options
#[derive(Parser)]
#[command(disable_version_flag = true)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!())]
pub struct Opts {
    /// configuration file.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// debug mode (hierarchical log output).
    #[clap(short = 'D', long = "debug")]
    pub debug: bool,
    /// Output file.
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
    /// Verbose mode.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Sub-commands (see below).
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

// ------

/// All sub-commands:
///
/// `combine [-T fmt] SORTIE...`
/// `align --spectrum FILE [-T fmt] SORTIE...`
/// `list SORTIE...`
/// `version`
///
#[derive(Debug, Parser)]
pub enum SubCommand {
    /// Flag every sortie and write the combined mission dataset
    Combine(CombineOpts),
    /// Combine, then georeference a spectrum capture against the trajectory
    Align(AlignOpts),
    /// Per-sortie summary table
    List(ListOpts),
    /// Display version numbers of all crates
    Version,
}

// ------

/// Options shared by everything that ingests sorties.
///
#[derive(Debug, Parser)]
pub struct CombineOpts {
    /// Time format of the position/waypoint files (unix or gps)
    #[clap(short = 'T', long, default_value = "gps")]
    pub time_format: String,
    /// Sortie specs, each POS.csv:WPT.csv[:YAW.csv]
    #[clap(required = true)]
    pub sorties: Vec<String>,
}

// ------

/// `align` takes the combine options plus the capture to georeference.
///
#[derive(Debug, Parser)]
pub struct AlignOpts {
    /// Spectrum capture CSV (header row = frequency axis in MHz)
    #[clap(short = 's', long)]
    pub spectrum: PathBuf,
    /// Select channel by frequency in MHz (overrides the config file)
    #[clap(short = 'f', long)]
    pub freq: Option<f64>,
    /// Select channel by bin index (overrides the config file)
    #[clap(long, conflicts_with = "freq")]
    pub channel: Option<usize>,
    #[clap(flatten)]
    pub combine: CombineOpts,
}

// ------

/// `list` only needs the sorties.
///
#[derive(Debug, Parser)]
pub struct ListOpts {
    #[clap(flatten)]
    pub combine: CombineOpts,
}
