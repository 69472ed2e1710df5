use physics::{
    Articulation, ArticulatedSim, Collider, Joint, JointKind, JointLimits, Link, PhysicsError,
    Pose, Shape, SimParams, Vec3, World,
};

fn hinge(limits: JointLimits) -> ArticulatedSim {
    let body = Link {
        name: "body".into(),
        mass: 1.0,
        colliders: vec![Collider {
            origin: Pose::IDENTITY,
            shape: Shape::Box { half_extents: Vec3::new(0.1, 0.1, 0.05) },
        }],
    };
    let arm = Link {
        name: "arm".into(),
        mass: 0.1,
        colliders: vec![Collider {
            origin: Pose::from_translation(Vec3::new(0.0, 0.0, -0.05)),
            shape: Shape::Cylinder { radius: 0.01, length: 0.1 },
        }],
    };
    let joint = Joint {
        name: "hinge".into(),
        kind: JointKind::Revolute,
        parent: 0,
        child: 1,
        origin: Pose::from_translation(Vec3::new(0.1, 0.0, 0.0)),
        axis: Vec3::Y,
        limits,
        home: 0.0,
    };
    let art = Articulation::new(vec![body, arm], vec![joint]).unwrap();
    let mut sim = ArticulatedSim::new(art, SimParams::default()).unwrap();
    sim.set_gravity(Vec3::ZERO);
    sim.reset_base(Pose::from_translation(Vec3::new(0.0, 0.0, 1.0)));
    sim
}

#[test]
fn servo_reaches_target() {
    let mut sim = hinge(JointLimits { lower: -1.0, upper: 1.0, velocity: 0.0 });
    sim.set_joint_target(0, 0.5).unwrap();
    sim.run(240);
    let q = sim.joint_states().unwrap()[0].position;
    assert!((q - 0.5).abs() < 1e-3, "q = {q}");
}

#[test]
fn servo_respects_speed_limit() {
    let mut sim = hinge(JointLimits { lower: -1.0, upper: 1.0, velocity: 0.5 });
    sim.set_joint_target(0, 1.0).unwrap();
    sim.run(24); // 0.1 s
    let state = sim.joint_states().unwrap()[0];
    assert!(state.position <= 0.05 + 1e-4, "q = {}", state.position);
    assert!((state.velocity - 0.5).abs() < 1e-3);
}

#[test]
fn targets_are_clamped_to_limits() {
    let mut sim = hinge(JointLimits { lower: -0.2, upper: 0.2, velocity: 0.0 });
    sim.set_joint_target(0, 3.0).unwrap();
    sim.run(240);
    let q = sim.joint_states().unwrap()[0].position;
    assert!(q <= 0.2 + 1e-6);
}

#[test]
fn bad_joint_index_is_reported() {
    let mut sim = hinge(JointLimits { lower: -1.0, upper: 1.0, velocity: 0.0 });
    assert_eq!(
        sim.set_joint_target(3, 0.0),
        Err(PhysicsError::JointIndex { index: 3, count: 1 })
    );
    assert_eq!(
        sim.reset_joints(&[0.0, 0.0]),
        Err(PhysicsError::JointCount { expected: 1, actual: 2 })
    );
}
