use std::cell::RefCell;
use std::rc::Rc;

use model::{CameraFollow, ChartTrack, FrameDriver, Legend, Stage, Transforms, VehicleStatus};

/// Handles to the headless observers, so their state can be logged between ticks.
pub struct Presentation {
    transforms: Rc<RefCell<Transforms>>,
    legend: Rc<RefCell<Legend>>,
    camera: Rc<RefCell<CameraFollow>>,
    chart: Rc<RefCell<ChartTrack>>,
}

impl Presentation {
    pub fn new() -> Self {
        Self {
            transforms: Rc::new(RefCell::new(Transforms::default())),
            legend: Rc::new(RefCell::new(Legend::new())),
            camera: Rc::new(RefCell::new(CameraFollow::new())),
            chart: Rc::new(RefCell::new(ChartTrack::new())),
        }
    }

    pub fn subscribe<A>(&self, driver: &mut FrameDriver<A>) {
        driver.subscribe(Stage::Render, Box::new(self.transforms.clone()));
        driver.subscribe(Stage::Legend, Box::new(self.legend.clone()));
        driver.subscribe(Stage::Camera, Box::new(self.camera.clone()));
        driver.subscribe(Stage::Chart, Box::new(self.chart.clone()));
    }

    pub fn log_state<A>(&self, driver: &FrameDriver<A>) {
        let mut active = 0;
        let mut finished = 0;
        for frame in driver.frames() {
            match frame.status {
                VehicleStatus::Active => active += 1,
                VehicleStatus::Finished => finished += 1,
                VehicleStatus::NotStarted => {}
            }
        }
        info!(
            "At {}{}: {} moving, {} finished, {} not started yet, {} drawn",
            driver.clock().elapsed(),
            if driver.clock().is_paused() { " (paused)" } else { "" },
            active,
            finished,
            driver.frames().len() - active - finished,
            self.transforms.borrow().per_vehicle.len()
        );

        for (_, entry) in self.legend.borrow().entries() {
            if entry.is_target {
                info!("  Following {}. {}", entry.title, entry.status);
            } else {
                debug!("  {}. {}", entry.title, entry.status);
            }
        }

        let camera = self.camera.borrow();
        if let Some(look_at) = camera.look_at {
            debug!(
                "  Camera at ({:.2}, {:.2}, {:.2}), looking at ({:.2}, {:.2}, {:.2})",
                camera.position.x,
                camera.position.y,
                camera.position.z,
                look_at.x,
                look_at.y,
                look_at.z
            );
        }

        let chart = self.chart.borrow();
        if let Some((lon, lat)) = chart.marker {
            debug!(
                "  Chart marker at {:.6}, {:.6} along a path of {} points",
                lat,
                lon,
                chart.path.len()
            );
        }
    }
}
