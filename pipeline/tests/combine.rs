//! End-to-end run over synthetic sorties: attach raw device logs, flag,
//! combine, align a spectrum capture.

use ndarray::Array2;

use beamcal_common::{ChannelSpec, PipelineConfig};
use beamcal_formats::{GlobalPosition, GpsFix, SpectrumCapture, TimeSeries, Waypoint};
use beamcal_pipeline::{Observation, PipelineError, Sortie, SortieData, SortieState};

/// Device logs for one flight: boot at canonical `t0`, one sample per
/// second for `n` seconds, waypoints opening the mission 2 s in and closing
/// it 2 s before the end.
fn device_sortie(name: &str, t0: f64, n: usize) -> Sortie {
    let mut data = SortieData::default();
    for i in 0..n {
        let device_t = 5.0 + i as f64;
        data.global.push(
            device_t,
            GlobalPosition {
                lat: 38.42 + 1e-4 * i as f64,
                lon: -79.85,
                alt: i as f64,
                heading: Some(10.0),
            },
        );
        data.gps.push(
            device_t,
            GpsFix {
                utc_time: t0 + 5.0 + i as f64,
                lat: 38.42,
                lon: -79.85,
                alt: i as f64,
            },
        );
        data.yaw.push(device_t, 90.0 + (i % 2) as f64);
    }
    data.waypoints.push(t0 + 7.0, Waypoint { seq: 1 });
    data.waypoints.push(t0 + 5.0 + (n - 3) as f64, Waypoint { seq: 9 });

    let mut sortie = Sortie::new(name);
    sortie.attach(data).unwrap();
    sortie
}

fn capture_over(times: Vec<f64>) -> SpectrumCapture {
    let n = times.len();
    let power = Array2::from_shape_fn((n, 3), |(r, c)| (r * 10 + c) as f64);
    SpectrumCapture::try_new(vec![137.0, 137.5, 138.0], times, power).unwrap()
}

#[test]
fn full_pipeline() {
    let mut obs = Observation::new();
    obs.add_sortie(device_sortie("sortie02", 2_000.0, 12));
    obs.add_sortie(device_sortie("sortie01", 1_000.0, 12));
    obs.add_sortie(Sortie::new("sortie03")); // never read, must be skipped

    let cfg = PipelineConfig::default();
    assert_eq!(2, obs.flag_all(&cfg));
    assert_eq!(SortieState::Unread, obs.sorties()[2].state());

    // each sortie keeps samples in [t0+7, t0+14]: 8 of 12
    let product = obs.combine().unwrap().clone();
    assert_eq!(16, product.len());
    assert!(product.times().windows(2).all(|w| w[0] <= w[1]));
    // sortie01 sorts before sortie02 even though it was added after
    assert_eq!(Some(1_007.0), product.first_time());
    assert_eq!(Some(2_014.0), product.last_time());

    // capture spans both sorties and the gap between them
    let sweep_times: Vec<f64> = (0..300).map(|i| 990.0 + 5.0 * i as f64).collect();
    let aligned = obs
        .align(&capture_over(sweep_times), &ChannelSpec::FrequencyMhz { freq_mhz: 137.5 })
        .unwrap();

    // sweeps before takeoff and after landing are trimmed, the rest all get
    // a defined fix (the inter-sortie gap is bridged linearly, as upstream)
    assert_eq!(201, aligned.len());
    assert!(aligned.values().iter().all(|s| s.is_valid()));
    assert!(aligned.times().iter().all(|&t| (1_007.0..=2_014.0).contains(&t)));

    // a sweep outside the flown interval queried directly comes back NaN,
    // filterable, never an error
    let fixes = beamcal_pipeline::interp_track(&product, &[500.0]).unwrap();
    assert!(!fixes[0].is_valid());
}

#[test]
fn combine_is_order_invariant() {
    let build = |swap: bool| {
        let mut obs = Observation::new();
        let (a, b) = (
            device_sortie("a", 1_000.0, 10),
            device_sortie("b", 3_000.0, 10),
        );
        if swap {
            obs.add_sortie(b);
            obs.add_sortie(a);
        } else {
            obs.add_sortie(a);
            obs.add_sortie(b);
        }
        obs.flag_all(&PipelineConfig::default());
        obs.combine().unwrap().clone()
    };
    assert_eq!(build(false), build(true));
}

#[test]
fn batch_fails_only_when_empty() {
    let mut obs = Observation::new();
    obs.add_sortie(Sortie::new("u1"));
    obs.add_sortie(Sortie::new("u2"));
    assert!(matches!(obs.combine(), Err(PipelineError::EmptyCombine)));
}
