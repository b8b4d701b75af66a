//! CSV plumbing for the generic boundary shapes.
//!
//! These readers know nothing about autopilot log formats; they speak the
//! pipeline's contractual shapes only: position rows `(t, lat, lon, alt)`,
//! waypoint rows `(t, seq)`, yaw rows `(t, yaw_deg)`, and a spectrum capture
//! whose header row is the frequency axis.  Rows written while the producer
//! was still appending (short rows) are skipped, as the field tools always
//! did.
//!

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::ReaderBuilder;
use eyre::{eyre, Result};
use ndarray::Array2;
use tracing::{debug, trace};

use beamcal_common::{to_canonical, TimeFormat, TimeValue};
use beamcal_formats::{GeoFix, GlobalPosition, SpectrumCapture, TimeSeries, Waypoint};
use beamcal_pipeline::AlignedSample;

/// Convert one raw timestamp field under the declared format.
///
fn canonical(raw: &str, fmt: TimeFormat) -> Result<f64> {
    let t: f64 = raw.trim().parse()?;
    let value = match fmt {
        TimeFormat::Unix => TimeValue::Unix(t),
        TimeFormat::Gps => TimeValue::Gps(t),
        _ => return Err(eyre!("time format {fmt} needs more than one column")),
    };
    Ok(to_canonical(value)?)
}

fn reader(fname: &Path) -> Result<csv::Reader<File>> {
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(fname)?)
}

/// Read position rows `(t, lat, lon, alt)`.
///
#[tracing::instrument]
pub fn read_positions(fname: &Path, fmt: TimeFormat) -> Result<TimeSeries<GlobalPosition>> {
    trace!("enter");
    let mut out = TimeSeries::new();
    for record in reader(fname)?.records() {
        let record = record?;
        // skip rows the producer had not finished printing
        if record.len() != 4 {
            continue;
        }
        out.push(
            canonical(&record[0], fmt)?,
            GlobalPosition {
                lat: record[1].parse()?,
                lon: record[2].parse()?,
                alt: record[3].parse()?,
                heading: None,
            },
        );
    }
    debug!("{} position rows from {:?}", out.len(), fname);
    Ok(out)
}

/// Read waypoint rows `(t, seq)`.
///
#[tracing::instrument]
pub fn read_waypoints(fname: &Path, fmt: TimeFormat) -> Result<TimeSeries<Waypoint>> {
    trace!("enter");
    let mut out = TimeSeries::new();
    for record in reader(fname)?.records() {
        let record = record?;
        if record.len() != 2 {
            continue;
        }
        out.push(
            canonical(&record[0], fmt)?,
            Waypoint {
                seq: record[1].parse()?,
            },
        );
    }
    debug!("{} waypoint rows from {:?}", out.len(), fname);
    Ok(out)
}

/// Read yaw rows `(t, yaw_deg)`.
///
#[tracing::instrument]
pub fn read_yaw(fname: &Path, fmt: TimeFormat) -> Result<TimeSeries<f64>> {
    trace!("enter");
    let mut out = TimeSeries::new();
    for record in reader(fname)?.records() {
        let record = record?;
        if record.len() != 2 {
            continue;
        }
        out.push(canonical(&record[0], fmt)?, record[1].parse()?);
    }
    Ok(out)
}

/// Read a spectrum capture.  The header row is `time` followed by the
/// frequency axis in MHz; each data row is a timestamp and one power per
/// bin.
///
#[tracing::instrument]
pub fn read_spectrum(fname: &Path, fmt: TimeFormat) -> Result<SpectrumCapture> {
    trace!("enter");
    let mut rdr = reader(fname)?;

    let mut records = rdr.records();
    let header = match records.next() {
        Some(h) => h?,
        None => return Err(eyre!("empty spectrum file {:?}", fname)),
    };
    let freqs: Vec<f64> = header
        .iter()
        .skip(1)
        .map(|f| f.parse::<f64>())
        .collect::<std::result::Result<_, _>>()?;
    if freqs.is_empty() {
        return Err(eyre!("no frequency axis in {:?}", fname));
    }

    let mut times = Vec::new();
    let mut power = Vec::new();
    for record in records {
        let record = record?;
        if record.len() != freqs.len() + 1 {
            continue;
        }
        times.push(canonical(&record[0], fmt)?);
        for field in record.iter().skip(1) {
            power.push(field.parse::<f64>()?);
        }
    }

    let nrows = times.len();
    let power = Array2::from_shape_vec((nrows, freqs.len()), power)?;
    debug!("{} sweeps x {} bins from {:?}", nrows, freqs.len(), fname);
    Ok(SpectrumCapture::try_new(freqs, times, power)?)
}

/// Write the combined dataset as `(t, lat, lon, alt)` rows.
///
pub fn write_dataproduct(out: &mut dyn Write, product: &TimeSeries<GeoFix>) -> Result<()> {
    writeln!(out, "# Column Format: 1 Time [GPS s], 2 Lat [deg], 3 Lon [deg], 4 Rel Alt [m]")?;
    for (t, fix) in product.iter() {
        writeln!(out, "{:.2},{:.7},{:.7},{:.3}", t, fix.lat, fix.lon, fix.alt)?;
    }
    Ok(())
}

/// Write aligned sweeps as `(t, lat, lon, alt, power)` rows.
///
pub fn write_aligned(out: &mut dyn Write, aligned: &TimeSeries<AlignedSample>) -> Result<()> {
    writeln!(
        out,
        "# Column Format: 1 Time [GPS s], 2 Lat [deg], 3 Lon [deg], 4 Rel Alt [m], 5 Power"
    )?;
    for (t, s) in aligned.iter() {
        writeln!(
            out,
            "{:.2},{:.7},{:.7},{:.3},{:.6}",
            t, s.lat, s.lon, s.alt, s.power
        )?;
    }
    Ok(())
}
