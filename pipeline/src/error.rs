use thiserror::Error;

use beamcal_common::TimeError;
use beamcal_formats::{ChannelError, ShapeError};

/// Everything that can go wrong inside the core pipeline.
///
/// Per-unit variants (`MissingData`, `NoMissionStart`) are soft: they fail
/// one sortie's call and the batch carries on without it.  `EmptyCombine` is
/// the batch-level hard failure when nothing survived.
///
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("time axis not strictly increasing at index {0}")]
    Ordering(usize),
    #[error("sortie {0}: no mission data flagged")]
    MissingData(String),
    #[error("sortie {0}: raw data not attached")]
    NotRead(String),
    #[error("no waypoint event carries the mission-start flag")]
    NoMissionStart,
    #[error("nothing to aggregate: no sortie produced mission data")]
    EmptyCombine,
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
