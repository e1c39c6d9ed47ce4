use std::str::FromStr;

use anyhow::Result;
use geom::Duration;
use serde::{Deserialize, Serialize};

/// Turns wall-clock readings into simulation time. There's exactly one of these per playback
/// session, so every vehicle sees the same time within a tick.
///
/// Wall-clock readings are passed in as the time since some arbitrary fixed instant; only
/// differences between them matter.
pub struct PlaybackClock {
    elapsed: Duration,
    paused: bool,
    last_wall_clock: Duration,
    setting: SpeedSetting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeedSetting {
    /// 1 sim second per real second
    Realtime,
    /// 5 sim seconds per real second
    Fast,
    /// 30 sim seconds per real second
    Faster,
    /// 1 sim hour per real second
    Fastest,
}

impl SpeedSetting {
    pub fn multiplier(self) -> f64 {
        match self {
            SpeedSetting::Realtime => 1.0,
            SpeedSetting::Fast => 5.0,
            SpeedSetting::Faster => 30.0,
            SpeedSetting::Fastest => 3600.0,
        }
    }
}

impl FromStr for SpeedSetting {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        match x.to_lowercase().as_ref() {
            "realtime" | "1x" => Ok(SpeedSetting::Realtime),
            "fast" | "5x" => Ok(SpeedSetting::Fast),
            "faster" | "30x" => Ok(SpeedSetting::Faster),
            "fastest" | "3600x" => Ok(SpeedSetting::Fastest),
            _ => bail!("Unknown speed setting {}", x),
        }
    }
}

impl PlaybackClock {
    /// Starts running from a simulation time of zero.
    pub fn new(now: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            paused: false,
            last_wall_clock: now,
            setting: SpeedSetting::Realtime,
        }
    }

    /// Advances simulation time by however much wall-clock time passed since the last reading,
    /// unless paused. Returns the new simulation time.
    pub fn tick(&mut self, now: Duration) -> Duration {
        if !self.paused {
            self.accrue(now);
        }
        self.last_wall_clock = now;
        self.elapsed
    }

    /// Returns true if the clock is now paused.
    pub fn toggle_pause(&mut self, now: Duration) -> bool {
        if self.paused {
            self.resume(now);
        } else {
            self.pause(now);
        }
        self.paused
    }

    pub fn pause(&mut self, now: Duration) {
        if !self.paused {
            // Keep the time that ran since the last tick
            self.accrue(now);
            self.last_wall_clock = now;
            self.paused = true;
        }
    }

    /// Whatever wall-clock time passed while paused is dropped, not applied all at once.
    pub fn resume(&mut self, now: Duration) {
        if self.paused {
            self.paused = false;
            self.last_wall_clock = now;
        }
    }

    /// Jumps ahead, even while paused. Negative increments are ignored.
    pub fn step_forwards(&mut self, increment: Duration) {
        if increment > Duration::ZERO {
            self.elapsed = self.elapsed + increment;
        }
    }

    pub fn set_speed(&mut self, setting: SpeedSetting) {
        self.setting = setting;
    }

    pub fn speed(&self) -> SpeedSetting {
        self.setting
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn accrue(&mut self, now: Duration) {
        let real_dt = now - self.last_wall_clock;
        // A wall clock going backwards never rewinds the simulation
        if real_dt > Duration::ZERO {
            self.elapsed = self.elapsed + self.setting.multiplier() * real_dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(x: f64) -> Duration {
        Duration::seconds(x)
    }

    fn close(a: Duration, b: f64) -> bool {
        (a.inner_seconds() - b).abs() < 1e-6
    }

    #[test]
    fn pause_and_resume() {
        let mut clock = PlaybackClock::new(secs(0.0));
        clock.tick(secs(0.0));
        clock.tick(secs(1.0));
        assert!(close(clock.tick(secs(2.0)), 2.0));

        assert!(clock.toggle_pause(secs(2.0)));
        assert!(close(clock.tick(secs(5.0)), 2.0));

        assert!(!clock.toggle_pause(secs(5.0)));
        assert!(close(clock.tick(secs(6.0)), 3.0));
    }

    #[test]
    fn resume_drops_the_paused_interval() {
        let mut clock = PlaybackClock::new(secs(0.0));
        clock.tick(secs(1.0));
        clock.pause(secs(1.0));
        // No ticks at all while paused
        clock.resume(secs(100.0));
        assert!(close(clock.tick(secs(100.5)), 1.5));
    }

    #[test]
    fn double_toggle_is_a_no_op() {
        let mut toggled = PlaybackClock::new(secs(0.0));
        let mut untouched = PlaybackClock::new(secs(0.0));
        for (i, t) in [0.3, 0.9, 1.4, 2.0, 2.2].into_iter().enumerate() {
            if i == 2 {
                toggled.toggle_pause(secs(1.1));
                toggled.toggle_pause(secs(1.1));
            }
            let expected = untouched.tick(secs(t));
            assert!(close(toggled.tick(secs(t)), expected.inner_seconds()));
        }
    }

    #[test]
    fn monotonic() {
        let mut clock = PlaybackClock::new(secs(10.0));
        let mut last = clock.elapsed();
        // Includes a wall clock that jumps backwards
        let readings = [10.5, 11.0, 9.0, 12.0, 12.0, 15.0, 14.0, 20.0];
        for (i, now) in readings.into_iter().enumerate() {
            if i % 3 == 1 {
                clock.toggle_pause(secs(now));
            }
            let elapsed = clock.tick(secs(now));
            assert!(elapsed >= last);
            last = elapsed;
        }
    }

    #[test]
    fn speed_settings() {
        let mut clock = PlaybackClock::new(secs(0.0));
        clock.set_speed(SpeedSetting::Faster);
        assert!(close(clock.tick(secs(2.0)), 60.0));
        clock.set_speed("realtime".parse().unwrap());
        assert!(close(clock.tick(secs(3.0)), 61.0));
        assert!("warp".parse::<SpeedSetting>().is_err());
    }

    #[test]
    fn step_forwards_while_paused() {
        let mut clock = PlaybackClock::new(secs(0.0));
        clock.pause(secs(0.0));
        clock.step_forwards(secs(0.1));
        clock.step_forwards(secs(-5.0));
        assert!(close(clock.tick(secs(4.0)), 0.1));
        assert!(clock.is_paused());
    }
}
