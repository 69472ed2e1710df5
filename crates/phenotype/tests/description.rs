use phenotype::{
    compute_min_clearance, DescriptionError, GeometryError, JointType, RobotDescription,
};
use physics::{Pose, SimParams, Vec3, World};
use std::path::PathBuf;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn robots(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../robots").join(name)
}

#[test]
fn parse_table_json() {
    let table = RobotDescription::load(data("table.json")).unwrap();
    assert_eq!(table.name, "table");
    assert_eq!(table.links.len(), 4);
    assert_eq!(table.joints.len(), 3);
    assert_eq!(table.actuated_joint_count(), 2);
    assert_eq!(table.joints[0].kind, JointType::Fixed);
}

#[test]
fn home_is_clamped_and_continuous_spans_full_turn() {
    let art = RobotDescription::load(data("table.json"))
        .unwrap()
        .to_articulation()
        .unwrap();
    assert_eq!(art.dof(), 2);
    assert_eq!(art.home_positions(), vec![0.5, 0.0]);
    let limits = art.limits();
    assert!((limits[1].lower + std::f32::consts::PI).abs() < 1e-6);
    assert!((limits[1].upper - std::f32::consts::PI).abs() < 1e-6);
}

#[test]
fn table_clearance_reaches_caster() {
    let table = RobotDescription::load(data("table.json")).unwrap();
    let clearance = compute_min_clearance(&table).unwrap();
    assert!((clearance - 0.35).abs() < 1e-5, "clearance = {clearance}");
}

#[test]
fn clearance_is_idempotent() {
    let table = RobotDescription::load(data("table.json")).unwrap();
    let before = table.clone();
    let a = compute_min_clearance(&table).unwrap();
    let b = compute_min_clearance(&table).unwrap();
    assert_eq!(a.to_bits(), b.to_bits());
    assert_eq!(table, before);
}

#[test]
fn parse_hopper_urdf() {
    let hopper = RobotDescription::load(data("hopper.urdf")).unwrap();
    assert_eq!(hopper.name, "hopper");
    assert_eq!(hopper.links.len(), 3);
    assert_eq!(hopper.links[2].mass, 0.0);
    assert_eq!(hopper.actuated_joint_count(), 1);
    let clearance = compute_min_clearance(&hopper).unwrap();
    assert!((clearance - 0.6).abs() < 1e-5, "clearance = {clearance}");
}

#[test]
fn hopper_simulates() {
    let hopper = RobotDescription::load(data("hopper.urdf")).unwrap();
    let mut sim = hopper.into_sim(SimParams::default()).unwrap();
    assert_eq!(sim.joint_count(), 1);
    assert!((sim.total_mass() - 3.5).abs() < 1e-6);
    sim.reset_base(Pose::from_translation(Vec3::new(0.0, 0.0, 2.0)));
    sim.run(24);
    let z = sim.base_pose().unwrap().translation.z;
    assert!(z < 2.0 && z > 1.9, "z = {z}");
}

#[test]
fn dangling_joint_is_malformed() {
    let broken = RobotDescription::load(data("broken.json")).unwrap();
    assert!(matches!(
        compute_min_clearance(&broken),
        Err(GeometryError::Malformed(_))
    ));
}

#[test]
fn missing_file_and_unknown_format() {
    assert!(matches!(
        RobotDescription::load(data("nope.json")),
        Err(DescriptionError::Io { .. })
    ));
    assert!(matches!(
        RobotDescription::load(data("table.yaml")),
        Err(DescriptionError::UnknownFormat(_))
    ));
}

#[test]
fn shipped_robots_load() {
    for (file, dof) in [
        ("simple_quadruped.json", 8),
        ("servobot.urdf", 12),
        ("arachne.json", 12),
    ] {
        let robot = RobotDescription::load(robots(file)).unwrap();
        assert_eq!(robot.actuated_joint_count(), dof, "{file}");
        let clearance = compute_min_clearance(&robot).unwrap();
        assert!(clearance > 0.1 && clearance < 0.4, "{file}: {clearance}");
    }
}
