use geom::Pt2D;
use serde::{Deserialize, Serialize};

/// A point in the rendered scene. `y` is up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenePt {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ScenePt {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn lerp(self, other: ScenePt, pct: f64) -> Self {
        Self::new(
            lerp(self.x, other.x, pct),
            lerp(self.y, other.y, pct),
            lerp(self.z, other.z, pct),
        )
    }

    pub fn dist_to(self, other: ScenePt) -> f64 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// The unit vector pointing from here to `other`, or None if they coincide.
    pub fn direction_to(self, other: ScenePt) -> Option<ScenePt> {
        let len = self.dist_to(other);
        if len < 1e-9 {
            return None;
        }
        Some(Self::new(
            (other.x - self.x) / len,
            (other.y - self.y) / len,
            (other.z - self.z) / len,
        ))
    }
}

// Exact at both ends
pub(crate) fn lerp(a: f64, b: f64, pct: f64) -> f64 {
    a * (1.0 - pct) + b * pct
}

/// Converts projected meters into scene units, relative to a reference point so the numbers stay
/// small.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneTransform {
    /// Usually the projected position of the first sample in the feed
    #[serde(skip, default = "Pt2D::zero")]
    pub reference: Pt2D,
    /// Scene units per projected meter
    pub scale: f64,
    /// Scene units per meter of elevation
    pub elevation_scale: f64,
    /// Raises everything slightly above the ground plane
    pub ground_offset: f64,
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self {
            reference: Pt2D::zero(),
            scale: 0.05,
            elevation_scale: 0.05,
            ground_offset: 0.1,
        }
    }
}

impl SceneTransform {
    pub fn with_reference(mut self, reference: Pt2D) -> Self {
        self.reference = reference;
        self
    }

    /// `planar_x` and `planar_y` are as returned by `project`.
    pub fn to_scene(&self, planar_x: f64, planar_y: f64, elevation: f64) -> ScenePt {
        ScenePt::new(
            (planar_x - self.reference.x()) * self.scale,
            elevation * self.elevation_scale + self.ground_offset,
            (planar_y - self.reference.y()) * self.scale,
        )
    }
}
