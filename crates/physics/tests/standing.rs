use physics::{
    Articulation, ArticulatedSim, Collider, Joint, JointKind, JointLimits, Link, Pose, Shape,
    SimParams, Vec3, World,
};

/// Box body on four cylinder legs.
fn table() -> ArticulatedSim {
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
    let art = Articulation::new(links, joints).unwrap();
    ArticulatedSim::new(art, SimParams::default()).unwrap()
}

#[test]
fn table_stands_on_its_legs() {
    let mut sim = table();
    // Leg tips sit 0.23 below the base origin.
    sim.reset_base(Pose::from_translation(Vec3::new(0.0, 0.0, 0.23)));
    sim.run(480);
    let pose = sim.base_pose().unwrap();
    assert!((pose.translation.z - 0.23).abs() < 0.02, "z = {}", pose.translation.z);
    let up = pose.rotation * Vec3::Z;
    assert!(up.z > 0.99);
    let contacts = sim.ground_contacts().unwrap();
    assert_eq!(contacts, vec![1, 2, 3, 4]);
}

#[test]
fn dropped_table_comes_to_rest() {
    let mut sim = table();
    sim.reset_base(Pose::from_translation(Vec3::new(0.0, 0.0, 0.4)));
    sim.run(960);
    let v = sim.base_velocity().unwrap();
    assert!(v.linear.length() < 0.05, "v = {:?}", v.linear);
}
