use criterion::{criterion_group, criterion_main, Criterion};
use physics::{
    Articulation, ArticulatedSim, Collider, Joint, JointKind, JointLimits, Link, Pose, Shape,
    SimParams, Vec3, World,
};

fn quadruped() -> ArticulatedSim {
    let mut links = vec![Link {
        name: "body".into(),
        mass: 2.0,
        colliders: vec![Collider {
            origin: Pose::IDENTITY,
            shape: Shape::Box { half_extents: Vec3::new(0.2, 0.15, 0.03) },
        }],
    }];
    let mut joints = Vec::new();
    for (i, (x, y)) in [(0.15, 0.1), (0.15, -0.1), (-0.15, 0.1), (-0.15, -0.1)].into_iter().enumerate() {
        links.push(Link {
            name: format!("leg{i}"),
            mass: 0.1,
            colliders: vec![Collider {
                origin: Pose::from_translation(Vec3::new(0.0, 0.0, -0.1)),
                shape: Shape::Cylinder { radius: 0.02, length: 0.2 },
            }],
        });
        joints.push(Joint {
            name: format!("hip{i}"),
            kind: JointKind::Revolute,
            parent: 0,
            child: i + 1,
            origin: Pose::from_translation(Vec3::new(x, y, -0.03)),
            axis: Vec3::Y,
            limits: JointLimits { lower: -0.5, upper: 0.5, velocity: 0.0 },
            home: 0.0,
        });
    }
    ArticulatedSim::new(Articulation::new(links, joints).unwrap(), SimParams::default()).unwrap()
}

fn bench_substep(c: &mut Criterion) {
    let mut sim = quadruped();
    sim.reset_base(Pose::from_translation(Vec3::new(0.0, 0.0, 0.23)));
    c.bench_function("quadruped_substep", |b| b.iter(|| sim.step_substep()));
}

criterion_group!(benches, bench_substep);
criterion_main!(benches);
