//! Time alignment, mission flagging and interpolation core.
//!
//! The pipeline is single-threaded, synchronous and batch-oriented: each
//! stage fully consumes its input before the next begins.  Per-sortie
//! failures are reported and skipped at the unit boundary; only a batch with
//! nothing left to aggregate fails as a whole.
//!
//! Stages, in data-flow order:
//!
//! - flagging ([`flag_mission`], [`flag_angles`], [`apply_flag_window`]) -
//!   partition each sortie's position series into mission and non-mission
//!   samples
//! - aggregation ([`Observation::combine`]) - merge every sortie's mission
//!   data into one chronologically ordered dataset
//! - interpolation ([`interp1`], [`align_spectrum`]) - give every spectrum
//!   sweep a geographic fix
//!

pub use error::*;
pub use flag::*;
pub use interp::*;
pub use observation::*;
pub use sortie::*;

mod error;
mod flag;
mod interp;
mod observation;
mod sortie;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
