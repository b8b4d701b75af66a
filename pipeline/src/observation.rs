//! An observation: every sortie flown against one antenna under test.
//!
//! The observation owns its sorties in discovery order and derives the
//! combined, globally time-sorted mission dataset from them.  Sorties are
//! never mutated during combination; the dataproduct is an independent copy.
//!

use tracing::{info, warn};

use beamcal_common::{ChannelSpec, PipelineConfig};
use beamcal_formats::{GeoFix, SpectrumCapture, TimeSeries};

use crate::error::PipelineError;
use crate::interp::{align_spectrum, AlignedSample};
use crate::sortie::Sortie;

/// A collection of sorties and the data products derived from them.
///
#[derive(Clone, Debug, Default)]
pub struct Observation {
    sorties: Vec<Sortie>,
    dataproduct: Option<TimeSeries<GeoFix>>,
}

impl Observation {
    pub fn new() -> Self {
        Observation::default()
    }

    pub fn add_sortie(&mut self, sortie: Sortie) {
        self.sorties.push(sortie);
    }

    pub fn sorties(&self) -> &[Sortie] {
        &self.sorties
    }

    pub fn len(&self) -> usize {
        self.sorties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorties.is_empty()
    }

    /// Flag every sortie.  Per-sortie failures are reported and the batch
    /// carries on; returns how many sorties flagged cleanly.
    ///
    #[tracing::instrument(skip(self, cfg))]
    pub fn flag_all(&mut self, cfg: &PipelineConfig) -> usize {
        let mut ok = 0;
        for sortie in self.sorties.iter_mut() {
            match sortie.flag(cfg) {
                Ok(()) => ok += 1,
                Err(e) => warn!("sortie {} not flagged: {}", sortie.name(), e),
            }
        }
        ok
    }

    /// Order the sortie *collection* by each sortie's first mission
    /// timestamp.  Distinct from the sample-level sort `combine` applies;
    /// sorties without mission data keep their relative order at the end.
    ///
    pub fn sort_sorties(&mut self) {
        self.sorties.sort_by(|a, b| {
            let ta = a.first_mission_time().unwrap_or(f64::INFINITY);
            let tb = b.first_mission_time().unwrap_or(f64::INFINITY);
            ta.total_cmp(&tb)
        });
    }

    /// Merge every flagged sortie's mission data into one chronologically
    /// ordered dataset.
    ///
    /// Sorties without mission data are skipped with a named diagnostic, not
    /// a fatal abort.  Only when *nothing* contributes does the whole
    /// combine fail.
    ///
    #[tracing::instrument(skip(self))]
    pub fn combine(&mut self) -> Result<&TimeSeries<GeoFix>, PipelineError> {
        let mut combined: TimeSeries<GeoFix> = TimeSeries::new();
        let mut contributed = 0;

        for sortie in &self.sorties {
            match sortie.mission_data() {
                Some(mission) => {
                    let mut part = mission.clone();
                    combined.append(&mut part);
                    contributed += 1;
                }
                None => {
                    warn!(
                        "unable to combine {}: mission data not flagged (state {})",
                        sortie.name(),
                        sortie.state()
                    );
                }
            }
        }

        if contributed == 0 {
            return Err(PipelineError::EmptyCombine);
        }

        // one stable global sort makes the result independent of sortie order
        combined.sort_by_time();
        info!(
            "combined {} of {} sorties, {} samples",
            contributed,
            self.sorties.len(),
            combined.len()
        );
        Ok(&*self.dataproduct.insert(combined))
    }

    /// The combined dataset, present once `combine` succeeded.
    ///
    pub fn dataproduct(&self) -> Option<&TimeSeries<GeoFix>> {
        self.dataproduct.as_ref()
    }

    /// Align a spectrum capture against the combined trajectory.
    ///
    #[tracing::instrument(skip(self, capture))]
    pub fn align(
        &self,
        capture: &SpectrumCapture,
        chan: &ChannelSpec,
    ) -> Result<TimeSeries<AlignedSample>, PipelineError> {
        let track = self
            .dataproduct
            .as_ref()
            .ok_or(PipelineError::EmptyCombine)?;
        align_spectrum(track, capture, chan)
    }
}

#[cfg(test)]
mod tests {
    use beamcal_formats::{GlobalPosition, Waypoint};

    use super::*;

    fn canonical_sortie(name: &str, t0: f64) -> Sortie {
        let mut global = TimeSeries::new();
        for i in 0..4 {
            global.push(
                t0 + i as f64,
                GlobalPosition {
                    lat: 38.0,
                    lon: -79.0,
                    alt: t0 + i as f64,
                    heading: None,
                },
            );
        }
        let mut waypoints = TimeSeries::new();
        waypoints.push(t0, Waypoint { seq: 1 });
        waypoints.push(t0 + 3.0, Waypoint { seq: 2 });

        let mut sortie = Sortie::new(name);
        sortie.attach_canonical(global, waypoints, TimeSeries::new());
        sortie
    }

    fn flagged_pair() -> Observation {
        let mut obs = Observation::new();
        // deliberately added out of chronological order
        obs.add_sortie(canonical_sortie("late", 100.0));
        obs.add_sortie(canonical_sortie("early", 0.0));
        obs.flag_all(&PipelineConfig::default());
        obs
    }

    #[test]
    fn test_combine_sorted() {
        let mut obs = flagged_pair();
        let product = obs.combine().unwrap();
        assert_eq!(8, product.len());
        assert!(product.times().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_combine_order_invariant() {
        let mut a = Observation::new();
        a.add_sortie(canonical_sortie("one", 0.0));
        a.add_sortie(canonical_sortie("two", 100.0));
        a.flag_all(&PipelineConfig::default());

        let mut b = Observation::new();
        b.add_sortie(canonical_sortie("two", 100.0));
        b.add_sortie(canonical_sortie("one", 0.0));
        b.flag_all(&PipelineConfig::default());

        assert_eq!(a.combine().unwrap(), b.combine().unwrap());
    }

    #[test]
    fn test_combine_skips_unflagged() {
        let mut obs = flagged_pair();
        obs.add_sortie(Sortie::new("never-read"));
        let product = obs.combine().unwrap();
        assert_eq!(8, product.len());
    }

    #[test]
    fn test_combine_nothing() {
        let mut obs = Observation::new();
        obs.add_sortie(Sortie::new("empty"));
        let r = obs.combine();
        assert!(matches!(r, Err(PipelineError::EmptyCombine)));
    }

    #[test]
    fn test_sort_sorties() {
        let mut obs = flagged_pair();
        obs.sort_sorties();
        let names: Vec<&str> = obs.sorties().iter().map(|s| s.name()).collect();
        assert_eq!(vec!["early", "late"], names);
    }
}
