use geom::{Duration, Speed};
use serde::{Deserialize, Serialize};

use crate::scene::lerp;
use crate::{project, Sample, ScenePt, SceneTransform, Trajectory};

/// Where a vehicle is and which way it faces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: ScenePt,
    /// The scene position of the next sample. Vehicles look at the upcoming waypoint, so the
    /// heading changes abruptly at each sample.
    pub facing: ScenePt,
    /// Interpolated directly in degrees, not through the projection
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Interpolated {
    pub pose: Pose,
    /// From the start of the segment, never interpolated
    pub speed: Speed,
    pub segment: usize,
    /// In [0, 1] along the segment
    pub progress: f64,
    /// The segment has zero duration; progress was forced to 0
    pub degenerate: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    NotStarted,
    Active(Interpolated),
    Finished,
}

/// Where is this vehicle at some simulation time? Pure; the same inputs always give the same
/// answer.
pub fn evaluate(trajectory: &Trajectory, time: Duration, scene: &SceneTransform) -> Evaluation {
    if time < trajectory.start_time() {
        return Evaluation::NotStarted;
    }
    if time > trajectory.end_time() {
        return Evaluation::Finished;
    }

    let segment = match trajectory.find_segment(time) {
        Some(idx) => idx,
        None => {
            // Only one sample, and we're exactly at it
            let only = trajectory.first();
            let position = scene_pos(only, scene);
            return Evaluation::Active(Interpolated {
                pose: Pose {
                    position,
                    facing: position,
                    lat: only.lat,
                    lon: only.lon,
                },
                speed: only.speed,
                segment: 0,
                progress: 0.0,
                degenerate: false,
            });
        }
    };

    let samples = trajectory.samples();
    let (s1, s2) = (&samples[segment], &samples[segment + 1]);
    let duration = s2.time - s1.time;
    let degenerate = duration <= Duration::ZERO;
    let progress = if degenerate {
        0.0
    } else {
        ((time - s1.time) / duration).max(0.0).min(1.0)
    };

    let pos1 = project(s1.lat, s1.lon);
    let pos2 = project(s2.lat, s2.lon);
    let position = scene.to_scene(
        lerp(pos1.x(), pos2.x(), progress),
        lerp(pos1.y(), pos2.y(), progress),
        lerp(s1.elevation, s2.elevation, progress),
    );

    Evaluation::Active(Interpolated {
        pose: Pose {
            position,
            facing: scene.to_scene(pos2.x(), pos2.y(), s2.elevation),
            lat: lerp(s1.lat, s2.lat, progress),
            lon: lerp(s1.lon, s2.lon, progress),
        },
        speed: s1.speed,
        segment,
        progress,
        degenerate,
    })
}

fn scene_pos(sample: &Sample, scene: &SceneTransform) -> ScenePt {
    let pt = project(sample.lat, sample.lon);
    scene.to_scene(pt.x(), pt.y(), sample.elevation)
}
