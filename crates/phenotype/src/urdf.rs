//! URDF reader.
//!
//! Reads the subset of URDF the locomotion environment needs: link masses,
//! collision primitives and the joint tree. Visuals, materials, inertia
//! tensors and simulator extensions are skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::DescriptionError;
use crate::{CollisionDef, Geometry, JointDef, JointType, LimitDef, LinkDef, Origin, RobotDescription};

type Result<T> = std::result::Result<T, DescriptionError>;

fn xml_error(e: impl std::fmt::Display) -> DescriptionError {
    DescriptionError::Urdf(e.to_string())
}

/// Parses a URDF string.
///
/// # Errors
///
/// Returns [`DescriptionError::Urdf`] if the XML is malformed or a required
/// element or attribute is missing.
pub fn parse_urdf_str(xml: &str) -> Result<RobotDescription> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut robot = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"robot" => {
                robot = Some(parse_robot(&mut reader, e)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }

    robot.ok_or_else(|| xml_error("missing <robot> element"))
}

fn parse_robot(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<RobotDescription> {
    let mut robot = RobotDescription {
        name: get_attribute(start, "name")?,
        links: Vec::new(),
        joints: Vec::new(),
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let elem = e.name().as_ref().to_vec();
                match elem.as_slice() {
                    b"link" => robot.links.push(parse_link(reader, e)?),
                    b"joint" => robot.joints.push(parse_joint(reader, e)?),
                    _ => skip_element(reader, &elem)?,
                }
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"link" => {
                robot.links.push(LinkDef {
                    name: get_attribute(e, "name")?,
                    mass: 0.0,
                    collisions: Vec::new(),
                });
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"robot" => break,
            Ok(Event::Eof) => return Err(xml_error("unexpected EOF in robot")),
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }

    Ok(robot)
}

fn parse_link(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<LinkDef> {
    // URDF links without <inertial> are massless.
    let mut link = LinkDef {
        name: get_attribute(start, "name")?,
        mass: 0.0,
        collisions: Vec::new(),
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let elem = e.name().as_ref().to_vec();
                match elem.as_slice() {
                    b"inertial" => link.mass = parse_inertial(reader)?,
                    b"collision" => link.collisions.push(parse_collision(reader)?),
                    _ => skip_element(reader, &elem)?,
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"link" => break,
            Ok(Event::Eof) => return Err(xml_error("unexpected EOF in link")),
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }

    Ok(link)
}

/// Returns the mass of an `<inertial>` block.
fn parse_inertial(reader: &mut Reader<&[u8]>) -> Result<f32> {
    let mut mass = 0.0;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) if e.name().as_ref() == b"mass" => {
                mass = parse_float(e, "value")?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"inertial" => break,
            Ok(Event::Eof) => return Err(xml_error("unexpected EOF in inertial")),
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }
    Ok(mass)
}

fn parse_collision(reader: &mut Reader<&[u8]>) -> Result<CollisionDef> {
    let mut origin = Origin::default();
    let mut geometry = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.name().as_ref() {
                b"origin" => origin = parse_origin(e)?,
                b"box" => {
                    let [x, y, z] = parse_vector3(&get_attribute(e, "size")?)?;
                    geometry = Some(Geometry::Box { half_extents: [x / 2.0, y / 2.0, z / 2.0] });
                }
                b"sphere" => {
                    geometry = Some(Geometry::Sphere { radius: parse_float(e, "radius")? });
                }
                b"cylinder" => {
                    geometry = Some(Geometry::Cylinder {
                        radius: parse_float(e, "radius")?,
                        length: parse_float(e, "length")?,
                    });
                }
                b"mesh" => {
                    geometry = Some(Geometry::Mesh { filename: get_attribute(e, "filename")? });
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"collision" => break,
            Ok(Event::Eof) => return Err(xml_error("unexpected EOF in collision")),
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }

    let geometry = geometry.ok_or_else(|| xml_error("collision without geometry"))?;
    Ok(CollisionDef { origin, geometry })
}

fn parse_joint(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<JointDef> {
    let name = get_attribute(start, "name")?;
    let kind = match get_attribute(start, "type")?.as_str() {
        "revolute" => JointType::Revolute,
        "continuous" => JointType::Continuous,
        "prismatic" => JointType::Prismatic,
        "fixed" => JointType::Fixed,
        other => return Err(xml_error(format!("joint '{name}' has unsupported type '{other}'"))),
    };
    let mut parent = None;
    let mut child = None;
    let mut origin = Origin::default();
    let mut axis = [1.0, 0.0, 0.0];
    let mut limits = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.name().as_ref() {
                b"parent" => parent = Some(get_attribute(e, "link")?),
                b"child" => child = Some(get_attribute(e, "link")?),
                b"origin" => origin = parse_origin(e)?,
                b"axis" => axis = parse_vector3(&get_attribute(e, "xyz")?)?,
                b"limit" => {
                    limits = Some(LimitDef {
                        lower: parse_float_opt(e, "lower")?.unwrap_or(0.0),
                        upper: parse_float_opt(e, "upper")?.unwrap_or(0.0),
                        velocity: parse_float_opt(e, "velocity")?.unwrap_or(0.0),
                    });
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"joint" => break,
            Ok(Event::Eof) => return Err(xml_error("unexpected EOF in joint")),
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }

    Ok(JointDef {
        parent: parent.ok_or_else(|| xml_error(format!("joint '{name}' has no parent")))?,
        child: child.ok_or_else(|| xml_error(format!("joint '{name}' has no child")))?,
        name,
        kind,
        origin,
        axis,
        limits,
        home: None,
    })
}

fn parse_origin(e: &BytesStart) -> Result<Origin> {
    let xyz = get_attribute_opt(e, "xyz").map(|s| parse_vector3(&s)).transpose()?;
    let rpy = get_attribute_opt(e, "rpy").map(|s| parse_vector3(&s)).transpose()?;
    Ok(Origin {
        xyz: xyz.unwrap_or_default(),
        rpy: rpy.unwrap_or_default(),
    })
}

fn get_attribute(e: &BytesStart, name: &str) -> Result<String> {
    get_attribute_opt(e, name).ok_or_else(|| {
        xml_error(format!(
            "<{}> is missing attribute '{name}'",
            String::from_utf8_lossy(e.name().as_ref())
        ))
    })
}

fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name.as_bytes())
        .and_then(|attr| String::from_utf8(attr.value.to_vec()).ok())
}

fn parse_float(e: &BytesStart, name: &str) -> Result<f32> {
    let raw = get_attribute(e, name)?;
    raw.trim()
        .parse()
        .map_err(|_| xml_error(format!("attribute '{name}' is not a number: {raw}")))
}

fn parse_float_opt(e: &BytesStart, name: &str) -> Result<Option<f32>> {
    if get_attribute_opt(e, name).is_some() {
        parse_float(e, name).map(Some)
    } else {
        Ok(None)
    }
}

fn parse_vector3(s: &str) -> Result<[f32; 3]> {
    let parts = s
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| xml_error(format!("invalid vector3: {s}")))?;
    <[f32; 3]>::try_from(parts.as_slice())
        .map_err(|_| xml_error(format!("expected 3 values, got {}: {s}", parts.len())))
}

/// Skips an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<()> {
    let mut depth = 1;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == name => depth += 1,
            Ok(Event::End(ref e)) if e.name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEG: &str = r#"<?xml version="1.0"?>
<robot name="leg">
  <material name="grey"><color rgba="0.5 0.5 0.5 1"/></material>
  <link name="base">
    <inertial><mass value="1.5"/><inertia ixx="0.01" iyy="0.01" izz="0.01"/></inertial>
    <visual><geometry><box size="1 1 1"/></geometry></visual>
    <collision>
      <origin xyz="0 0 0.1" rpy="0 0 0"/>
      <geometry><box size="0.4 0.2 0.06"/></geometry>
    </collision>
  </link>
  <link name="foot">
    <collision><geometry><sphere radius="0.03"/></geometry></collision>
  </link>
  <joint name="knee" type="revolute">
    <parent link="base"/>
    <child link="foot"/>
    <origin xyz="0.2 0 -0.1"/>
    <axis xyz="0 1 0"/>
    <limit lower="-0.5" upper="0.7" effort="2" velocity="4"/>
  </joint>
</robot>"#;

    #[test]
    fn reads_links_and_joints() {
        let robot = parse_urdf_str(LEG).unwrap();
        assert_eq!(robot.name, "leg");
        assert_eq!(robot.links.len(), 2);
        assert!((robot.links[0].mass - 1.5).abs() < 1e-6);
        assert_eq!(robot.links[1].mass, 0.0);
        assert_eq!(
            robot.links[0].collisions[0].geometry,
            Geometry::Box { half_extents: [0.2, 0.1, 0.03] }
        );
        assert_eq!(robot.links[0].collisions[0].origin.xyz, [0.0, 0.0, 0.1]);

        let knee = &robot.joints[0];
        assert_eq!(knee.kind, JointType::Revolute);
        assert_eq!((knee.parent.as_str(), knee.child.as_str()), ("base", "foot"));
        assert_eq!(knee.axis, [0.0, 1.0, 0.0]);
        assert_eq!(
            knee.limits,
            Some(LimitDef { lower: -0.5, upper: 0.7, velocity: 4.0 })
        );
    }

    #[test]
    fn rejects_bad_vector() {
        let xml = r#"<robot name="r"><link name="a"><collision><origin xyz="1 2"/>
            <geometry><sphere radius="1"/></geometry></collision></link></robot>"#;
        assert!(matches!(parse_urdf_str(xml), Err(DescriptionError::Urdf(_))));
    }

    #[test]
    fn missing_robot_is_an_error() {
        assert!(parse_urdf_str("<notarobot/>").is_err());
    }
}
