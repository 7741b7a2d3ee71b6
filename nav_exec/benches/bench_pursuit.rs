//! # Pursuit Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nav_lib::{
    pose::Pose2D,
    pursuit::{PathParams, PursuitPath, Waypoint},
};

fn pursuit_benchmark(c: &mut Criterion) {
    // ---- Build a winding path ----

    let params = PathParams {
        turning_radius_m: 0.3,
        lookahead_m: 0.2,
        sample_step_m: 0.01,
        landing_strip_m: None,
    };

    let waypoints = vec![
        Waypoint::with_yaw(0.0, 0.0, 0.0),
        Waypoint::new(1.0, 2.0),
        Waypoint::new(-1.0, 3.0),
        Waypoint::new(0.5, 5.0),
        Waypoint::with_yaw(2.0, 4.0, std::f64::consts::PI),
    ];

    c.bench_function("PursuitPath::new", |b| {
        b.iter(|| PursuitPath::new(black_box(&waypoints), params.clone()).unwrap())
    });

    let path = PursuitPath::new(&waypoints, params).unwrap();

    // Query from every 20th sample, slightly off the path, on a fresh copy of the path each time
    let poses: Vec<Pose2D> = path
        .points()
        .iter()
        .step_by(20)
        .map(|p| Pose2D::new(p.x + 0.05, p.y - 0.03, p.yaw + 0.1))
        .collect();

    c.bench_function("PursuitPath::calculate_pursuit_estimate", |b| {
        b.iter(|| {
            let mut path = path.clone();
            for pose in poses.iter() {
                black_box(path.calculate_pursuit_estimate(pose, true));
            }
        })
    });
}

criterion_group!(benches, pursuit_benchmark);
criterion_main!(benches);
