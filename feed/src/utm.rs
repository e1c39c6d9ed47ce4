//! Inverse transverse Mercator on the WGS84 ellipsoid, for turning UTM eastings and northings
//! back into latitude and longitude. Series expansions from Snyder, "Map Projections: A Working
//! Manual", good to well under a meter within a zone.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmZone {
    /// 1 through 60
    pub number: u8,
    pub hemisphere: Hemisphere,
}

impl Default for UtmZone {
    /// Northern Italy, where the simulation exports come from
    fn default() -> Self {
        Self {
            number: 32,
            hemisphere: Hemisphere::North,
        }
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let h = match self.hemisphere {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
        };
        write!(f, "{}{}", self.number, h)
    }
}

/// Parses zones like "32N" or "33s"
impl FromStr for UtmZone {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        let x = x.trim();
        let (number, hemisphere) = match x.char_indices().last() {
            Some((idx, 'N' | 'n')) => (&x[..idx], Hemisphere::North),
            Some((idx, 'S' | 's')) => (&x[..idx], Hemisphere::South),
            _ => bail!("UTM zone {:?} must end with N or S", x),
        };
        let number: u8 = number.parse()?;
        let zone = Self { number, hemisphere };
        zone.validate()?;
        Ok(zone)
    }
}

impl UtmZone {
    pub fn validate(&self) -> Result<()> {
        if self.number == 0 || self.number > 60 {
            bail!("UTM zone number {} isn't between 1 and 60", self.number);
        }
        Ok(())
    }

    /// Degrees
    pub fn central_meridian(&self) -> f64 {
        (self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }

    /// Returns (latitude, longitude) in degrees.
    pub fn to_lat_lon(&self, easting: f64, northing: f64) -> (f64, f64) {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let ep2 = e2 / (1.0 - e2);

        let x = easting - FALSE_EASTING;
        let y = match self.hemisphere {
            Hemisphere::North => northing,
            Hemisphere::South => northing - FALSE_NORTHING_SOUTH,
        };

        // Footpoint latitude
        let m = y / SCALE_FACTOR;
        let mu = m
            / (SEMI_MAJOR_AXIS
                * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin, cos, tan) = (phi1.sin(), phi1.cos(), phi1.tan());
        let c1 = ep2 * cos * cos;
        let t1 = tan * tan;
        let n1 = SEMI_MAJOR_AXIS / (1.0 - e2 * sin * sin).sqrt();
        let r1 = SEMI_MAJOR_AXIS * (1.0 - e2) / (1.0 - e2 * sin * sin).powf(1.5);
        let d = x / (n1 * SCALE_FACTOR);

        let lat = phi1
            - (n1 * tan / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                        - 252.0 * ep2
                        - 3.0 * c1.powi(2))
                        * d.powi(6)
                        / 720.0);
        let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos;

        (lat.to_degrees(), self.central_meridian() + lon.to_degrees())
    }
}
