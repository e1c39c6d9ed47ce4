//! Whole playback sessions: load samples, drive ticks, check what the presentation layer sees.

use std::cell::RefCell;
use std::rc::Rc;

use geom::{Duration, Speed};
use model::{
    evaluate, project, ActorFactory, CameraFollow, ChartTrack, Evaluation, FrameDriver, Legend,
    Sample, SceneTransform, Stage, TrajectoryStore, Transforms, VehicleID, VehicleName,
    VehicleStatus, VehicleType,
};

struct Spawned(Vec<(VehicleType, String)>);

impl ActorFactory for Spawned {
    type Actor = usize;

    fn create_actor(&mut self, kind: VehicleType, id: &VehicleName) -> usize {
        self.0.push((kind, id.0.clone()));
        self.0.len() - 1
    }
}

fn sample(
    vehicle: &str,
    kind: &str,
    lat: f64,
    lon: f64,
    elevation: f64,
    time: f64,
    speed: f64,
) -> Sample {
    Sample {
        lat,
        lon,
        elevation,
        vehicle: VehicleName::from(vehicle),
        time: Duration::seconds(time),
        kind: VehicleType::parse(kind),
        speed: Speed::meters_per_second(speed),
        error: None,
    }
}

fn secs(x: f64) -> Duration {
    Duration::seconds(x)
}

#[test]
fn two_sample_trajectory() {
    let store = TrajectoryStore::build(vec![
        sample("1", "Car", 45.40, 9.10, 1.0, 0.0, 10.0),
        sample("1", "Car", 45.42, 9.16, 3.0, 10.0, 20.0),
    ])
    .unwrap();
    let scene = SceneTransform::default().with_reference(store.reference_point().unwrap());
    let traj = &store.vehicles()[0].trajectory;

    let x = match evaluate(traj, secs(5.0), &scene) {
        Evaluation::Active(x) => x,
        other => panic!("{:?}", other),
    };
    assert!((x.progress - 0.5).abs() < 1e-9);
    assert_eq!(x.speed, Speed::meters_per_second(10.0));

    let p1 = project(45.40, 9.10);
    let p2 = project(45.42, 9.16);
    let mid = scene.to_scene((p1.x() + p2.x()) / 2.0, (p1.y() + p2.y()) / 2.0, 2.0);
    assert!(x.pose.position.dist_to(mid) < 1e-3);

    assert_eq!(evaluate(traj, secs(-1.0), &scene), Evaluation::NotStarted);
    assert_eq!(evaluate(traj, secs(11.0), &scene), Evaluation::Finished);
}

#[test]
fn full_session() {
    let store = TrajectoryStore::build(vec![
        sample("10", "Heavy Vehicle", 45.400, 9.100, 0.02, 0.0, 8.0),
        sample("10", "Heavy Vehicle", 45.401, 9.100, 0.02, 2.0, 9.0),
        sample("12", "Scooter", 45.400, 9.101, 0.02, 1.0, 4.0),
        sample("10", "Heavy Vehicle", 45.402, 9.100, 0.02, 4.0, 7.0),
        sample("12", "Scooter", 45.400, 9.102, 0.02, 3.0, 5.0),
    ])
    .unwrap();
    let scene = SceneTransform::default().with_reference(store.reference_point().unwrap());

    let mut factory = Spawned(Vec::new());
    let mut driver = FrameDriver::new(store, scene, &mut factory, secs(100.0));
    // Unknown types fall back to cars
    assert_eq!(
        factory.0,
        vec![
            (VehicleType::HeavyVehicle, "10".to_string()),
            (VehicleType::Car, "12".to_string())
        ]
    );

    let transforms = Rc::new(RefCell::new(Transforms::default()));
    let legend = Rc::new(RefCell::new(Legend::new()));
    let camera = Rc::new(RefCell::new(CameraFollow::new()));
    let chart = Rc::new(RefCell::new(ChartTrack::new()));
    driver.subscribe(Stage::Chart, Box::new(chart.clone()));
    driver.subscribe(Stage::Camera, Box::new(camera.clone()));
    driver.subscribe(Stage::Legend, Box::new(legend.clone()));
    driver.subscribe(Stage::Render, Box::new(transforms.clone()));

    // Wall clock starts at 100s
    let frames = driver.tick(secs(100.5)).to_vec();
    assert_eq!(frames[0].status, VehicleStatus::Active);
    assert_eq!(frames[1].status, VehicleStatus::NotStarted);
    assert_eq!(
        legend.borrow().entry(VehicleID(0)).unwrap().status,
        "Speed: 8.00 m/s"
    );
    assert_eq!(
        legend.borrow().entry(VehicleID(1)).unwrap().title,
        "Car 12"
    );
    assert!(camera.borrow().look_at.is_some());
    assert_eq!(chart.borrow().path.len(), 3);

    // Pause for a long time; nothing moves
    driver.toggle_pause(secs(100.5));
    driver.tick(secs(130.0));
    assert!((driver.clock().elapsed().inner_seconds() - 0.5).abs() < 1e-6);
    let marker = chart.borrow().marker;
    driver.tick(secs(140.0));
    assert_eq!(chart.borrow().marker, marker);

    driver.toggle_pause(secs(140.0));
    let frames = driver.tick(secs(142.0)).to_vec();
    // 2.5s of simulation time
    assert_eq!(frames[0].speed, Some(Speed::meters_per_second(9.0)));
    assert_eq!(frames[1].status, VehicleStatus::Active);
    assert_eq!(transforms.borrow().per_vehicle.len(), 2);

    driver.set_target(VehicleID(1)).unwrap();
    driver.tick(secs(142.1));
    assert_eq!(chart.borrow().path, vec![(9.101, 45.400), (9.102, 45.400)]);
    assert!(legend.borrow().entry(VehicleID(1)).unwrap().is_target);

    driver.tick(secs(145.0));
    assert!(driver.all_finished());
    for (_, entry) in legend.borrow().entries() {
        assert_eq!(entry.status, "Status: Finished");
    }
    // Finished vehicles keep their last pose, so the chart still shows where vehicle 12 stopped
    assert!(chart.borrow().marker.is_some());
}

#[test]
fn monotonic_under_any_pause_pattern() {
    let store = TrajectoryStore::build(vec![sample("1", "Car", 45.4, 9.1, 0.0, 0.0, 1.0)]).unwrap();
    let mut driver = FrameDriver::new(
        store,
        SceneTransform::default(),
        &mut Spawned(Vec::new()),
        secs(0.0),
    );
    let mut last = driver.clock().elapsed();
    for i in 1..200 {
        let now = secs(i as f64 * 0.05);
        if i % 7 == 0 || i % 11 == 0 {
            driver.toggle_pause(now);
        }
        driver.tick(now);
        let elapsed = driver.clock().elapsed();
        assert!(elapsed >= last);
        last = elapsed;
    }
}
