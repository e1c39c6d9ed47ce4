use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::Result;
use geom::{Duration, Speed};
use serde::{Deserialize, Serialize};

use crate::{
    evaluate, Evaluation, PlaybackClock, Pose, SceneTransform, TrajectoryStore, VehicleID,
    VehicleName, VehicleType,
};

/// Creates whatever represents a vehicle in the presentation layer. Called exactly once per
/// vehicle, before the first tick.
pub trait ActorFactory {
    type Actor;

    fn create_actor(&mut self, kind: VehicleType, id: &VehicleName) -> Self::Actor;
}

/// Observers run in this order every tick, so later ones can rely on state earlier ones set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Render,
    Legend,
    Camera,
    Chart,
}

pub struct TickContext<'a> {
    pub time: Duration,
    pub paused: bool,
    pub scene: &'a SceneTransform,
    pub store: &'a TrajectoryStore,
    /// The vehicle the camera and chart follow
    pub target: Option<VehicleID>,
}

pub trait FrameObserver {
    /// `frames` has one entry per vehicle, indexed by `VehicleID`. Don't hold onto them past the
    /// tick.
    fn on_tick(&mut self, ctx: &TickContext, frames: &[VehicleFrame]);
}

// Lets the caller keep a handle to an observer and inspect it between ticks
impl<T: FrameObserver> FrameObserver for Rc<RefCell<T>> {
    fn on_tick(&mut self, ctx: &TickContext, frames: &[VehicleFrame]) {
        self.borrow_mut().on_tick(ctx, frames);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    NotStarted,
    Active,
    Finished,
}

/// What one vehicle is doing during one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleFrame {
    pub id: VehicleID,
    pub status: VehicleStatus,
    /// While active, the current pose. Otherwise the last pose the vehicle had, if it ever
    /// started.
    pub pose: Option<Pose>,
    /// Only while active
    pub speed: Option<Speed>,
}

/// Owns all playback state and advances it once per rendered frame.
pub struct FrameDriver<A> {
    store: TrajectoryStore,
    scene: SceneTransform,
    clock: PlaybackClock,
    actors: Vec<A>,
    target: Option<VehicleID>,
    // Sorted by stage, then registration order
    observers: Vec<(Stage, Box<dyn FrameObserver>)>,

    last_pose: Vec<Option<Pose>>,
    frames: Vec<VehicleFrame>,
    // (vehicle, segment) pairs with zero-length segments we've already complained about
    warned_degenerate: BTreeSet<(VehicleID, usize)>,
}

impl<A> FrameDriver<A> {
    /// `now` is the current wall-clock reading; playback starts immediately.
    pub fn new<F: ActorFactory<Actor = A>>(
        store: TrajectoryStore,
        scene: SceneTransform,
        factory: &mut F,
        now: Duration,
    ) -> Self {
        let actors: Vec<A> = store
            .vehicles()
            .iter()
            .map(|v| factory.create_actor(v.kind, &v.name))
            .collect();
        if store.is_empty() {
            warn!("No trajectories loaded; playback will be empty");
        } else {
            info!("Created {} vehicles", actors.len());
        }

        let target = store.vehicles().first().map(|v| v.id);
        let frames = store
            .vehicles()
            .iter()
            .map(|v| VehicleFrame {
                id: v.id,
                status: VehicleStatus::NotStarted,
                pose: None,
                speed: None,
            })
            .collect();

        Self {
            last_pose: vec![None; store.len()],
            store,
            scene,
            clock: PlaybackClock::new(now),
            actors,
            target,
            observers: Vec::new(),
            frames,
            warned_degenerate: BTreeSet::new(),
        }
    }

    pub fn subscribe(&mut self, stage: Stage, observer: Box<dyn FrameObserver>) {
        let idx = self.observers.partition_point(|(s, _)| *s <= stage);
        self.observers.insert(idx, (stage, observer));
    }

    /// Advances the clock, figures out where every vehicle is, and tells all observers.
    pub fn tick(&mut self, now: Duration) -> &[VehicleFrame] {
        let time = self.clock.tick(now);

        for vehicle in self.store.vehicles() {
            let idx = vehicle.id.0;
            let frame = match evaluate(&vehicle.trajectory, time, &self.scene) {
                Evaluation::NotStarted => VehicleFrame {
                    id: vehicle.id,
                    status: VehicleStatus::NotStarted,
                    pose: self.last_pose[idx].clone(),
                    speed: None,
                },
                Evaluation::Finished => VehicleFrame {
                    id: vehicle.id,
                    status: VehicleStatus::Finished,
                    pose: self.last_pose[idx].clone(),
                    speed: None,
                },
                Evaluation::Active(x) => {
                    if x.degenerate && self.warned_degenerate.insert((vehicle.id, x.segment)) {
                        warn!(
                            "{} has a zero-length segment starting at sample {}; snapping to its start",
                            vehicle.label(),
                            x.segment
                        );
                    }
                    self.last_pose[idx] = Some(x.pose.clone());
                    VehicleFrame {
                        id: vehicle.id,
                        status: VehicleStatus::Active,
                        pose: Some(x.pose),
                        speed: Some(x.speed),
                    }
                }
            };
            self.frames[idx] = frame;
        }

        let ctx = TickContext {
            time,
            paused: self.clock.is_paused(),
            scene: &self.scene,
            store: &self.store,
            target: self.target,
        };
        for (_, observer) in &mut self.observers {
            observer.on_tick(&ctx, &self.frames);
        }

        &self.frames
    }

    /// Returns true if playback is now paused.
    pub fn toggle_pause(&mut self, now: Duration) -> bool {
        let paused = self.clock.toggle_pause(now);
        debug!("Playback {}", if paused { "paused" } else { "resumed" });
        paused
    }

    pub fn set_target(&mut self, id: VehicleID) -> Result<()> {
        if self.store.vehicle(id).is_none() {
            bail!("No vehicle {:?} to follow", id);
        }
        self.target = Some(id);
        Ok(())
    }

    pub fn target(&self) -> Option<VehicleID> {
        self.target
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    pub fn store(&self) -> &TrajectoryStore {
        &self.store
    }

    pub fn scene(&self) -> &SceneTransform {
        &self.scene
    }

    pub fn actor(&self, id: VehicleID) -> Option<&A> {
        self.actors.get(id.0)
    }

    /// The frames from the most recent tick
    pub fn frames(&self) -> &[VehicleFrame] {
        &self.frames
    }

    /// Nothing was loaded
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// True once the clock is past every trajectory. Trivially true with no vehicles.
    pub fn all_finished(&self) -> bool {
        self.frames
            .iter()
            .all(|f| f.status == VehicleStatus::Finished)
    }
}
