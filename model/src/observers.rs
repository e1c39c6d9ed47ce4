//! Headless stand-ins for the presentation layer: what the renderer, legend, follow camera, and
//! chart would show after each tick.

use std::collections::BTreeMap;

use crate::{FrameObserver, ScenePt, TickContext, VehicleFrame, VehicleID, VehicleStatus};

/// Where each vehicle's actor should be drawn.
#[derive(Default)]
pub struct Transforms {
    pub per_vehicle: BTreeMap<VehicleID, Transform>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: ScenePt,
    pub facing: ScenePt,
    /// Radians around the vertical axis, 0 facing +z
    pub heading: f64,
}

impl FrameObserver for Transforms {
    fn on_tick(&mut self, _: &TickContext, frames: &[VehicleFrame]) {
        for frame in frames {
            let pose = match frame.pose {
                Some(ref pose) => pose,
                None => continue,
            };
            // At the last waypoint, position and facing coincide. Keep the old heading.
            let heading = match pose.position.direction_to(pose.facing) {
                Some(dir) => dir.x.atan2(dir.z),
                None => self
                    .per_vehicle
                    .get(&frame.id)
                    .map(|t| t.heading)
                    .unwrap_or(0.0),
            };
            self.per_vehicle.insert(
                frame.id,
                Transform {
                    position: pose.position,
                    facing: pose.facing,
                    heading,
                },
            );
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    /// Like "Truck 20"
    pub title: String,
    pub status: String,
    /// Show a floating label above the vehicle, not just in the legend
    pub show_label: bool,
    pub is_target: bool,
}

/// One entry per vehicle, describing what it's doing right now.
#[derive(Default)]
pub struct Legend {
    entries: BTreeMap<VehicleID, LegendEntry>,
}

impl Legend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&VehicleID, &LegendEntry)> {
        self.entries.iter()
    }

    pub fn entry(&self, id: VehicleID) -> Option<&LegendEntry> {
        self.entries.get(&id)
    }

    /// Returns the new setting, or None if the vehicle hasn't appeared in a tick yet.
    pub fn toggle_label(&mut self, id: VehicleID) -> Option<bool> {
        let entry = self.entries.get_mut(&id)?;
        entry.show_label = !entry.show_label;
        Some(entry.show_label)
    }

    /// The floating label, only if it's turned on
    pub fn label_text(&self, id: VehicleID) -> Option<String> {
        let entry = self.entries.get(&id)?;
        if !entry.show_label {
            return None;
        }
        Some(format!("{}\n{}", entry.title, entry.status))
    }
}

fn describe_status(frame: &VehicleFrame) -> String {
    match (frame.status, frame.speed) {
        (VehicleStatus::Active, Some(speed)) => {
            format!("Speed: {:.2} m/s", speed.inner_meters_per_second())
        }
        (VehicleStatus::Finished, _) => "Status: Finished".to_string(),
        _ => "Status: Not started".to_string(),
    }
}

impl FrameObserver for Legend {
    fn on_tick(&mut self, ctx: &TickContext, frames: &[VehicleFrame]) {
        for frame in frames {
            let status = describe_status(frame);
            let is_target = ctx.target == Some(frame.id);
            match self.entries.get_mut(&frame.id) {
                Some(entry) => {
                    entry.status = status;
                    entry.is_target = is_target;
                }
                None => {
                    let title = match ctx.store.vehicle(frame.id) {
                        Some(v) => v.label(),
                        None => format!("{:?}", frame.id),
                    };
                    self.entries.insert(
                        frame.id,
                        LegendEntry {
                            title,
                            status,
                            show_label: false,
                            is_target,
                        },
                    );
                }
            }
        }
    }
}

/// A chase camera behind the target vehicle.
pub struct CameraFollow {
    pub position: ScenePt,
    pub look_at: Option<ScenePt>,
    /// How far behind the vehicle
    pub distance: f64,
    /// How far above the vehicle
    pub height: f64,
    /// How much of the remaining distance to close each tick, in (0, 1]
    pub smoothing: f64,
    forward: ScenePt,
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self {
            position: ScenePt::new(0.0, 5.0, 10.0),
            look_at: None,
            distance: 5.0,
            height: 2.0,
            smoothing: 0.2,
            forward: ScenePt::new(0.0, 0.0, 1.0),
        }
    }
}

impl CameraFollow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the camera is heading, before smoothing
    pub fn desired_position(&self, vehicle: ScenePt) -> ScenePt {
        vehicle
            .offset(
                -self.forward.x * self.distance,
                -self.forward.y * self.distance,
                -self.forward.z * self.distance,
            )
            .offset(0.0, self.height, 0.0)
    }
}

impl FrameObserver for CameraFollow {
    fn on_tick(&mut self, ctx: &TickContext, frames: &[VehicleFrame]) {
        let pose = match ctx
            .target
            .and_then(|id| frames.get(id.0))
            .and_then(|f| f.pose.as_ref())
        {
            Some(pose) => pose,
            None => return,
        };
        if let Some(dir) = pose.position.direction_to(pose.facing) {
            self.forward = dir;
        }
        let desired = self.desired_position(pose.position);
        self.position = self.position.lerp(desired, self.smoothing);
        self.look_at = Some(pose.position);
    }
}

/// The target's whole path in geographic coordinates, plus a marker where it is now.
#[derive(Default)]
pub struct ChartTrack {
    target: Option<VehicleID>,
    /// (longitude, latitude)
    pub path: Vec<(f64, f64)>,
    /// (longitude, latitude)
    pub marker: Option<(f64, f64)>,
}

impl ChartTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<VehicleID> {
        self.target
    }
}

impl FrameObserver for ChartTrack {
    fn on_tick(&mut self, ctx: &TickContext, frames: &[VehicleFrame]) {
        if ctx.target != self.target {
            self.target = ctx.target;
            self.path = ctx
                .target
                .and_then(|id| ctx.store.vehicle(id))
                .map(|v| v.trajectory.path_lonlat())
                .unwrap_or_default();
            self.marker = None;
        }

        if let Some(pose) = self
            .target
            .and_then(|id| frames.get(id.0))
            .and_then(|f| f.pose.as_ref())
        {
            self.marker = Some((pose.lon, pose.lat));
        }
    }
}
