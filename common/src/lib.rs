//! This library is there to share some common code amongst all beamcal crates.
//!

mod config;
mod logging;
mod timescale;

use clap::{crate_name, crate_version};
pub use config::*;
pub use logging::*;
pub use timescale::*;

const NAME: &str = crate_name!();
const VERSION: &str = crate_version!();

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}
