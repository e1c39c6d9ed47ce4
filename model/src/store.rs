use std::collections::BTreeMap;

use anyhow::Result;
use geom::{Duration, Pt2D};

use crate::{project, Sample, Trajectory, VehicleID, VehicleName, VehicleType};

pub struct Vehicle {
    pub id: VehicleID,
    pub name: VehicleName,
    /// From the vehicle's first sample
    pub kind: VehicleType,
    pub trajectory: Trajectory,
}

impl Vehicle {
    /// Like "Bike 7"
    pub fn label(&self) -> String {
        format!("{} {}", self.kind.describe(), self.name)
    }
}

/// Every vehicle's trajectory, built once after loading.
#[derive(Default)]
pub struct TrajectoryStore {
    // Indexed by VehicleID, which follows the order vehicles first appear in the feed
    vehicles: Vec<Vehicle>,
    ids: BTreeMap<VehicleName, VehicleID>,
}

impl TrajectoryStore {
    /// Groups samples by their vehicle.
    pub fn build(samples: Vec<Sample>) -> Result<Self> {
        Self::build_by(samples, |s| s.vehicle.clone())
    }

    /// Groups samples by whatever identifies a vehicle. Samples for each vehicle must already be
    /// in time order; they aren't sorted here. A vehicle whose samples don't make a valid
    /// trajectory is logged and left out; everyone else still gets built. An empty input
    /// produces an empty store.
    pub fn build_by<F: Fn(&Sample) -> VehicleName>(
        samples: Vec<Sample>,
        id_selector: F,
    ) -> Result<Self> {
        // Indices into grouped, not VehicleIDs yet
        let mut seen: BTreeMap<VehicleName, usize> = BTreeMap::new();
        let mut grouped: Vec<(VehicleName, Vec<Sample>)> = Vec::new();
        for sample in samples {
            let name = id_selector(&sample);
            let idx = match seen.get(&name) {
                Some(idx) => *idx,
                None => {
                    seen.insert(name.clone(), grouped.len());
                    grouped.push((name, Vec::new()));
                    grouped.len() - 1
                }
            };
            grouped[idx].1.push(sample);
        }

        let mut vehicles = Vec::new();
        let mut ids = BTreeMap::new();
        let mut skipped = 0;
        for (name, samples) in grouped {
            let trajectory = match Trajectory::new(samples) {
                Ok(trajectory) => trajectory,
                Err(err) => {
                    warn!("Skipping vehicle {}: {:#}", name, err);
                    skipped += 1;
                    continue;
                }
            };
            let id = VehicleID(vehicles.len());
            ids.insert(name.clone(), id);
            vehicles.push(Vehicle {
                id,
                kind: trajectory.first().kind,
                name,
                trajectory,
            });
        }
        if skipped > 0 {
            warn!("{} vehicles had malformed trajectories and won't be replayed", skipped);
        }
        debug!("Built trajectories for {} vehicles", vehicles.len());
        Ok(Self { vehicles, ids })
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleID) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    pub fn lookup(&self, name: &VehicleName) -> Option<VehicleID> {
        self.ids.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// The projected position of the first sample of the first vehicle. The scene is centered
    /// here.
    pub fn reference_point(&self) -> Option<Pt2D> {
        let first = self.vehicles.first()?.trajectory.first();
        Some(project(first.lat, first.lon))
    }

    /// When the last vehicle finishes
    pub fn end_time(&self) -> Option<Duration> {
        self.vehicles
            .iter()
            .map(|v| v.trajectory.end_time())
            .reduce(|a, b| if b > a { b } else { a })
    }
}
