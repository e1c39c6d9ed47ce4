//! Reads the trajectory export from the traffic simulation: one CSV row per vehicle per time
//! step, positions in UTM.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod utm;

use std::io::Read;

use abstutil::Timer;
use anyhow::{Context, Result};
use geom::{Duration, Speed};
use serde::{Deserialize, Serialize};

use model::{Sample, VehicleName, VehicleType};

pub use self::utm::{Hemisphere, UtmZone};

/// How to interpret a feed file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub zone: UtmZone,
    pub speed_unit: SpeedUnit,
    /// The feed has no elevation column; every sample gets this many meters.
    pub elevation: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            zone: UtmZone::default(),
            speed_unit: SpeedUnit::KilometersPerHour,
            elevation: 0.02,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedUnit {
    KilometersPerHour,
    MetersPerSecond,
}

impl SpeedUnit {
    fn to_speed(self, value: f64) -> Speed {
        match self {
            SpeedUnit::KilometersPerHour => Speed::meters_per_second(value / 3.6),
            SpeedUnit::MetersPerSecond => Speed::meters_per_second(value),
        }
    }
}

/// Reads every row, in file order. Rows for each vehicle are expected to be in time order
/// already; `model::TrajectoryStore::build` checks that.
pub fn load<R: Read>(reader: R, cfg: &FeedConfig) -> Result<Vec<Sample>> {
    cfg.zone.validate()?;

    let mut samples = Vec::new();
    // The header is line 1
    for (idx, rec) in csv::Reader::from_reader(reader).deserialize().enumerate() {
        let rec: Row = rec?;
        let sample = rec
            .into_sample(cfg)
            .with_context(|| format!("row {}", idx + 2))?;
        samples.push(sample);
    }
    Ok(samples)
}

pub fn load_path(path: &str, cfg: &FeedConfig, timer: &mut Timer) -> Result<Vec<Sample>> {
    timer.start(format!("load {}", path));
    let file = fs_err::File::open(path)?;
    let samples = load(file, cfg).with_context(|| format!("reading {}", path))?;
    info!("Read {} samples from {} (UTM zone {})", samples.len(), path, cfg.zone);
    timer.stop(format!("load {}", path));
    Ok(samples)
}

#[derive(Deserialize)]
struct Row {
    #[serde(rename = "x[m]")]
    easting: f64,
    #[serde(rename = "y[m]")]
    northing: f64,
    vehicle_id: String,
    #[serde(rename = "Time [s]")]
    time: f64,
    flw_type: String,
    #[serde(rename = "Speed [km/h]")]
    speed: f64,
    #[serde(default)]
    f_error: Option<f64>,
}

impl Row {
    fn into_sample(self, cfg: &FeedConfig) -> Result<Sample> {
        if !self.easting.is_finite() || !self.northing.is_finite() {
            bail!("bad position ({}, {})", self.easting, self.northing);
        }
        if !self.time.is_finite() || self.time < 0.0 {
            bail!("bad time {}", self.time);
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            bail!("bad speed {}", self.speed);
        }

        let (lat, lon) = cfg.zone.to_lat_lon(self.easting, self.northing);
        Ok(Sample {
            lat,
            lon,
            elevation: cfg.elevation,
            vehicle: normalize_vehicle(&self.vehicle_id),
            time: Duration::seconds(self.time),
            kind: VehicleType::parse(&self.flw_type),
            speed: cfg.speed_unit.to_speed(self.speed),
            error: self.f_error.filter(|x| x.is_finite()),
        })
    }
}

// Exports sometimes write IDs as floats. "20.0" and "20" are the same vehicle.
fn normalize_vehicle(raw: &str) -> VehicleName {
    let raw = raw.trim();
    if let Ok(x) = raw.parse::<f64>() {
        if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
            return VehicleName(format!("{}", x as i64));
        }
    }
    VehicleName(raw.to_string())
}
