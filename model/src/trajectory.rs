use anyhow::Result;
use geom::Duration;
use serde::Serialize;

use crate::{is_projectable, Sample};

/// Every sample of one vehicle, ordered by time. Never empty, so only `new` builds one.
#[derive(Clone, Debug, Serialize)]
pub struct Trajectory {
    inner: Vec<Sample>,
}

impl Trajectory {
    pub fn new(raw: Vec<Sample>) -> Result<Self> {
        if raw.is_empty() {
            bail!("Trajectory doesn't have any samples");
        }
        for sample in &raw {
            if !is_projectable(sample.lat, sample.lon) {
                bail!(
                    "Trajectory has a sample at {} with unusable coordinates ({}, {})",
                    sample.time,
                    sample.lat,
                    sample.lon
                );
            }
            if !sample.elevation.is_finite() {
                bail!("Trajectory has a sample at {} with no elevation", sample.time);
            }
        }
        // Equal times are allowed; the interpolator snaps across zero-length segments
        for pair in raw.windows(2) {
            if pair[0].time > pair[1].time {
                bail!(
                    "Trajectory input out-of-order: {} then {}",
                    pair[0].time,
                    pair[1].time
                );
            }
        }
        Ok(Self { inner: raw })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.inner
    }

    pub fn first(&self) -> &Sample {
        &self.inner[0]
    }

    pub fn last(&self) -> &Sample {
        &self.inner[self.inner.len() - 1]
    }

    pub fn start_time(&self) -> Duration {
        self.first().time
    }

    pub fn end_time(&self) -> Duration {
        self.last().time
    }

    /// Finds the segment `i` (between samples `i` and `i + 1`) that is active at this time.
    /// Segments own their start: a time exactly at a sample belongs to the segment starting
    /// there. The end time of the trajectory belongs to the final segment. None if the time is
    /// outside the trajectory, or if there's only one sample.
    pub fn find_segment(&self, time: Duration) -> Option<usize> {
        if self.inner.len() < 2 || time < self.start_time() || time > self.end_time() {
            return None;
        }
        // How many samples are at or before this time. At least 1, because of the check above.
        let idx = self.inner.partition_point(|s| s.time <= time);
        Some((idx - 1).min(self.inner.len() - 2))
    }

    /// (longitude, latitude) of every sample, for plotting geographically
    pub fn path_lonlat(&self) -> Vec<(f64, f64)> {
        self.inner.iter().map(|s| (s.lon, s.lat)).collect()
    }
}

#[cfg(test)]
mod tests {
    use geom::Speed;

    use super::*;
    use crate::{VehicleName, VehicleType};

    fn sample(time: f64) -> Sample {
        Sample {
            lat: 45.4,
            lon: 9.1 + time / 1000.0,
            elevation: 0.02,
            vehicle: VehicleName::from("1"),
            time: Duration::seconds(time),
            kind: VehicleType::Car,
            speed: Speed::meters_per_second(10.0),
            error: None,
        }
    }

    fn trajectory(times: &[f64]) -> Trajectory {
        Trajectory::new(times.iter().map(|t| sample(*t)).collect()).unwrap()
    }

    #[test]
    fn validation() {
        assert!(Trajectory::new(Vec::new()).is_err());
        assert!(Trajectory::new(vec![sample(2.0), sample(1.0)]).is_err());

        let mut polar = sample(0.0);
        polar.lat = 90.0;
        assert!(Trajectory::new(vec![polar]).is_err());

        // Repeated times are fine
        assert!(Trajectory::new(vec![sample(1.0), sample(1.0), sample(2.0)]).is_ok());
    }

    #[test]
    fn segments_own_their_start() {
        let traj = trajectory(&[0.0, 10.0, 20.0]);
        assert_eq!(traj.find_segment(Duration::seconds(-1.0)), None);
        assert_eq!(traj.find_segment(Duration::seconds(0.0)), Some(0));
        assert_eq!(traj.find_segment(Duration::seconds(9.9)), Some(0));
        assert_eq!(traj.find_segment(Duration::seconds(10.0)), Some(1));
        assert_eq!(traj.find_segment(Duration::seconds(15.0)), Some(1));
        // The very end belongs to the last segment
        assert_eq!(traj.find_segment(Duration::seconds(20.0)), Some(1));
        assert_eq!(traj.find_segment(Duration::seconds(20.1)), None);
    }

    #[test]
    fn repeated_times_skip_empty_segments() {
        let traj = trajectory(&[0.0, 10.0, 10.0, 20.0]);
        // [1, 2] has zero length, so 10s lands in the segment starting at the second 10s
        assert_eq!(traj.find_segment(Duration::seconds(10.0)), Some(2));
        assert_eq!(traj.find_segment(Duration::seconds(5.0)), Some(0));
    }

    #[test]
    fn single_sample_has_no_segments() {
        let traj = trajectory(&[3.0]);
        assert_eq!(traj.start_time(), traj.end_time());
        assert_eq!(traj.find_segment(Duration::seconds(3.0)), None);
        assert_eq!(traj.path_lonlat().len(), 1);
    }
}
