//! Data shapes crossing the beamcal pipeline boundary.
//!
//! Producers (log readers, the spectrum analyzer capture) hand us these
//! containers with timestamps already on the canonical scale; consumers
//! (flaggers, the aggregator, the interpolator) only ever see them through
//! the invariants enforced here: paired time/value arrays of equal length,
//! and one immutable frequency axis per capture.
//!

use thiserror::Error;

// Re-export for convenience
//
pub use position::*;
pub use spectrum::*;
pub use timeseries::*;

mod position;
mod spectrum;
mod timeseries;

/// Paired arrays that do not line up.  Fatal to the call that detected it.
///
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("paired arrays differ in length: {times} timestamps vs {values} values")]
    LengthMismatch { times: usize, values: usize },
    #[error("frequency axis has {nfreq} bins but power rows have {ncols}")]
    FrequencyAxis { nfreq: usize, ncols: usize },
}

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
