#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod report;

use std::io::{BufWriter, Write};
use std::time::Instant;

use abstutil::Timer;
use anyhow::{Context, Result};
use geom::Duration;
use serde::Serialize;
use structopt::StructOpt;

use feed::{FeedConfig, UtmZone};
use model::{
    ActorFactory, FrameDriver, PlaybackClock, SceneTransform, SpeedSetting, TrajectoryStore,
    VehicleFrame, VehicleName, VehicleType,
};

use self::report::Presentation;

#[derive(StructOpt)]
struct Args {
    /// The path to a CSV trajectory export from the traffic simulation
    #[structopt(long)]
    feed: String,
    /// A JSON file overriding how projected meters map into the scene
    #[structopt(long)]
    scene: Option<String>,
    /// A JSON file describing the feed's UTM zone, speed unit, and elevation
    #[structopt(long)]
    feed_config: Option<String>,
    /// Overrides the UTM zone from --feed-config, like "32N"
    #[structopt(long)]
    utm_zone: Option<UtmZone>,
    /// Ticks per wall-clock second
    #[structopt(long, default_value = "30")]
    fps: f64,
    /// realtime, fast, faster, or fastest
    #[structopt(long, default_value = "realtime")]
    speed: SpeedSetting,
    /// Start this many simulation seconds in, instead of at the beginning
    #[structopt(long, default_value = "0")]
    skip: f64,
    /// Follow this vehicle instead of the first one
    #[structopt(long)]
    target: Option<String>,
    /// Wall-clock seconds after starting when playback pauses or resumes. Can be repeated.
    #[structopt(long)]
    toggle_pause_at: Vec<f64>,
    /// Give up after this many wall-clock seconds, even if vehicles are still moving
    #[structopt(long)]
    max_seconds: Option<f64>,
    /// Write every tick's frames here, one JSON object per line
    #[structopt(long)]
    dump_frames: Option<String>,
    /// Log what the legend, camera, and chart show every this many ticks
    #[structopt(long, default_value = "30")]
    report_every: usize,
}

impl Args {
    fn feed_config(&self) -> Result<FeedConfig> {
        let mut cfg = match self.feed_config {
            Some(ref path) => read_json::<FeedConfig>(path)?,
            None => FeedConfig::default(),
        };
        if let Some(zone) = self.utm_zone {
            cfg.zone = zone;
        }
        Ok(cfg)
    }

    fn scene(&self) -> Result<SceneTransform> {
        match self.scene {
            Some(ref path) => read_json::<SceneTransform>(path),
            None => Ok(SceneTransform::default()),
        }
    }

    fn configure_clock(&self, clock: &mut PlaybackClock) {
        clock.set_speed(self.speed);
        clock.step_forwards(Duration::seconds(self.skip));
        info!(
            "Playing at {:?} speed, starting from {}",
            clock.speed(),
            clock.elapsed()
        );
    }

    fn validate(&self) -> Result<()> {
        if !(self.fps > 0.0 && self.fps.is_finite()) {
            bail!("--fps must be positive, not {}", self.fps);
        }
        if !(self.skip >= 0.0 && self.skip.is_finite()) {
            bail!("--skip can't be {}", self.skip);
        }
        if self.report_every == 0 {
            bail!("--report-every must be at least 1");
        }
        if self.toggle_pause_at.len() % 2 == 1 && self.max_seconds.is_none() {
            warn!("Playback ends paused and there's no --max-seconds; this will run forever");
        }
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let raw = fs_err::read_to_string(path)?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))
}

/// Stands in for the meshes a renderer would build. Each vehicle is just its label.
struct HeadlessActors;

impl ActorFactory for HeadlessActors {
    type Actor = String;

    fn create_actor(&mut self, kind: VehicleType, id: &VehicleName) -> String {
        let label = format!("{} {}", kind.describe(), id);
        debug!("Spawned {}", label);
        label
    }
}

#[derive(Serialize)]
struct DumpedTick<'a> {
    time: Duration,
    paused: bool,
    frames: &'a [VehicleFrame],
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    args.validate()?;

    let mut timer = Timer::new("load trajectories");
    let samples = feed::load_path(&args.feed, &args.feed_config()?, &mut timer)?;
    timer.start("build trajectories");
    let store = TrajectoryStore::build(samples)?;
    timer.stop("build trajectories");
    drop(timer);

    let mut scene = args.scene()?;
    if let Some(pt) = store.reference_point() {
        scene = scene.with_reference(pt);
    }
    if let Some(end) = store.end_time() {
        info!("{} vehicles, last one finishes at {}", store.len(), end);
    }

    let start = Instant::now();
    let now = || Duration::seconds(start.elapsed().as_secs_f64());

    let mut driver = FrameDriver::new(store, scene, &mut HeadlessActors, now());
    if driver.is_empty() {
        warn!("{} has no vehicles; nothing to replay", args.feed);
        return Ok(());
    }
    args.configure_clock(driver.clock_mut());
    if let Some(ref name) = args.target {
        let id = driver
            .store()
            .lookup(&VehicleName::from(name.as_str()))
            .ok_or_else(|| anyhow!("No vehicle {} in {}", name, args.feed))?;
        driver.set_target(id)?;
    }

    let presentation = Presentation::new();
    presentation.subscribe(&mut driver);

    let mut dump = match args.dump_frames {
        Some(ref path) => Some(BufWriter::new(fs_err::File::create(path)?)),
        None => None,
    };

    let mut toggles = args.toggle_pause_at.clone();
    toggles.sort_by(|a, b| a.total_cmp(b));
    let mut toggles = toggles.into_iter().peekable();

    let frame_time = std::time::Duration::from_secs_f64(1.0 / args.fps);
    let mut ticks = 0;
    loop {
        let wall = now();
        while toggles.next_if(|t| Duration::seconds(*t) <= wall).is_some() {
            let paused = driver.toggle_pause(wall);
            info!(
                "{} playback at {}",
                if paused { "Paused" } else { "Resumed" },
                driver.clock().elapsed()
            );
        }

        driver.tick(wall);
        ticks += 1;

        if let Some(ref mut out) = dump {
            let tick = DumpedTick {
                time: driver.clock().elapsed(),
                paused: driver.clock().is_paused(),
                frames: driver.frames(),
            };
            serde_json::to_writer(&mut *out, &tick)?;
            writeln!(out)?;
        }

        if ticks % args.report_every == 0 {
            presentation.log_state(&driver);
        }

        if driver.all_finished() {
            info!(
                "Every vehicle finished after {} of simulation time ({} ticks)",
                driver.clock().elapsed(),
                abstutil::prettyprint_usize(ticks)
            );
            break;
        }
        if let Some(max) = args.max_seconds {
            if wall >= Duration::seconds(max) {
                info!("Stopping after {} of wall-clock time", wall);
                break;
            }
        }

        std::thread::sleep(frame_time);
    }

    presentation.log_state(&driver);
    if let Some(mut out) = dump {
        out.flush()?;
    }
    Ok(())
}
