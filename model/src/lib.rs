#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod clock;
mod driver;
mod interpolate;
mod observers;
mod projection;
mod scene;
mod store;
mod trajectory;

use std::fmt;

use geom::{Duration, Speed};
use serde::{Deserialize, Serialize};

pub use self::clock::{PlaybackClock, SpeedSetting};
pub use self::driver::{
    ActorFactory, FrameDriver, FrameObserver, Stage, TickContext, VehicleFrame, VehicleStatus,
};
pub use self::interpolate::{evaluate, Evaluation, Interpolated, Pose};
pub use self::observers::{CameraFollow, ChartTrack, Legend, LegendEntry, Transform, Transforms};
pub use self::projection::{is_projectable, project, EARTH_RADIUS_METERS};
pub use self::scene::{ScenePt, SceneTransform};
pub use self::store::{TrajectoryStore, Vehicle};
pub use self::trajectory::Trajectory;

/// How the raw feed refers to a vehicle.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleName(pub String);

impl fmt::Display for VehicleName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VehicleName {
    fn from(x: &str) -> Self {
        Self(x.to_string())
    }
}

/// Dense IDs, assigned in the order vehicles first appear in the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleID(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Motorcycle,
    HeavyVehicle,
    MediumVehicle,
}

impl VehicleType {
    /// Parses the simulation's `flw_type` label. Anything unrecognized becomes a car.
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "Car" => VehicleType::Car,
            "Motorcycle" => VehicleType::Motorcycle,
            "Heavy Vehicle" => VehicleType::HeavyVehicle,
            "Medium Vehicle" => VehicleType::MediumVehicle,
            x => {
                warn!("Unknown vehicle type {:?}, defaulting to Car", x);
                VehicleType::Car
            }
        }
    }

    /// What the legend and labels call this kind of vehicle
    pub fn describe(self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Motorcycle => "Bike",
            VehicleType::HeavyVehicle => "Truck",
            VehicleType::MediumVehicle => "Suv",
        }
    }
}

/// One observation of a single vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Degrees
    pub lat: f64,
    /// Degrees
    pub lon: f64,
    /// Meters
    pub elevation: f64,
    pub vehicle: VehicleName,
    /// Since the start of the simulation
    pub time: Duration,
    pub kind: VehicleType,
    pub speed: Speed,
    /// Some feeds carry a tracking error metric per observation
    pub error: Option<f64>,
}
