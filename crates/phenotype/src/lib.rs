#![deny(clippy::all, clippy::pedantic)]
//! # Phenotype
//!
//! Robot descriptions: the links, collision geometry and joint tree of a
//! robot, loaded from the JSON format below or from URDF, and turned into a
//! [`physics::Articulation`].
//!
//! ```json
//! {
//!   "name": "walker",
//!   "links": [
//!     { "name": "body", "mass": 2.0,
//!       "collisions": [{ "shape": "box", "half_extents": [0.2, 0.1, 0.03] }] }
//!   ],
//!   "joints": [
//!     { "name": "hip", "type": "revolute", "parent": "body", "child": "leg",
//!       "origin": { "xyz": [0.2, 0.1, 0.0] }, "axis": [0, 1, 0],
//!       "limits": { "lower": -1.0, "upper": 1.0 }, "home": 0.1 }
//!   ]
//! }
//! ```

pub mod clearance;
pub mod error;
pub mod urdf;

pub use clearance::compute_min_clearance;
pub use error::{DescriptionError, GeometryError};

use physics::{
    ArticulatedSim, Articulation, Collider, Joint, JointKind, JointLimits, Link, Pose, Quat,
    Shape, SimParams, Vec3,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotDescription {
    pub name: String,
    pub links: Vec<LinkDef>,
    #[serde(default)]
    pub joints: Vec<JointDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDef {
    pub name: String,
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default)]
    pub collisions: Vec<CollisionDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionDef {
    #[serde(default)]
    pub origin: Origin,
    #[serde(flatten)]
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum Geometry {
    #[serde(rename = "sphere")]
    Sphere { radius: f32 },
    #[serde(rename = "box")]
    Box { half_extents: [f32; 3] },
    #[serde(rename = "cylinder")]
    Cylinder { radius: f32, length: f32 },
    #[serde(rename = "mesh")]
    Mesh { filename: String },
}

/// Pose as position plus fixed-axis roll/pitch/yaw, as in URDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    #[serde(default)]
    pub xyz: [f32; 3],
    #[serde(default)]
    pub rpy: [f32; 3],
}

impl Origin {
    #[must_use]
    pub fn to_pose(&self) -> Pose {
        let [roll, pitch, yaw] = self.rpy;
        let rotation =
            Quat::from_rotation_z(yaw) * Quat::from_rotation_y(pitch) * Quat::from_rotation_x(roll);
        Pose::new(Vec3::from_array(self.xyz), rotation)
    }

    fn is_finite(&self) -> bool {
        self.xyz.iter().chain(&self.rpy).all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointType {
    Revolute,
    Continuous,
    Prismatic,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: JointType,
    pub parent: String,
    pub child: String,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default = "default_axis")]
    pub axis: [f32; 3],
    #[serde(default)]
    pub limits: Option<LimitDef>,
    #[serde(default)]
    pub home: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitDef {
    #[serde(default)]
    pub lower: f32,
    #[serde(default)]
    pub upper: f32,
    #[serde(default)]
    pub velocity: f32,
}

fn default_mass() -> f32 {
    1.0
}

fn default_axis() -> [f32; 3] {
    [1.0, 0.0, 0.0]
}

impl RobotDescription {
    /// Parses the JSON description format.
    ///
    /// # Errors
    ///
    /// [`DescriptionError::Json`] if the document does not match the schema.
    pub fn from_json(json: &str) -> Result<Self, DescriptionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a URDF document.
    ///
    /// # Errors
    ///
    /// [`DescriptionError::Urdf`] on malformed XML or missing elements.
    pub fn from_urdf(xml: &str) -> Result<Self, DescriptionError> {
        urdf::parse_urdf_str(xml)
    }

    /// Loads a description from disk, choosing the parser by file extension
    /// (`.json` or `.urdf`).
    ///
    /// # Errors
    ///
    /// I/O failures, parse failures, or an unknown extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptionError> {
        let path = path.as_ref();
        let read = || {
            std::fs::read_to_string(path).map_err(|source| DescriptionError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let description = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&read()?)?,
            Some("urdf" | "xml") => Self::from_urdf(&read()?)?,
            _ => return Err(DescriptionError::UnknownFormat(path.to_path_buf())),
        };
        tracing::debug!(
            robot = %description.name,
            links = description.links.len(),
            joints = description.joints.len(),
            "loaded robot description from {}",
            path.display()
        );
        Ok(description)
    }

    /// Number of actuated (non-fixed) joints.
    #[must_use]
    pub fn actuated_joint_count(&self) -> usize {
        self.joints.iter().filter(|j| j.kind != JointType::Fixed).count()
    }

    /// Converts the description into a physics articulation.
    ///
    /// # Errors
    ///
    /// [`GeometryError::Malformed`] for bad dimensions, limits or joint
    /// trees, [`GeometryError::UnsupportedShape`] for meshes and
    /// [`GeometryError::NoCollisionGeometry`] if no link has a collider.
    pub fn to_articulation(&self) -> Result<Articulation, GeometryError> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut links = Vec::with_capacity(self.links.len());
        for (i, def) in self.links.iter().enumerate() {
            if index.insert(def.name.as_str(), i).is_some() {
                return Err(GeometryError::Malformed(format!("duplicate link '{}'", def.name)));
            }
            if !(def.mass.is_finite() && def.mass >= 0.0) {
                return Err(GeometryError::Malformed(format!(
                    "link '{}' has invalid mass {}",
                    def.name, def.mass
                )));
            }
            let colliders = def
                .collisions
                .iter()
                .map(|c| collider(&def.name, c))
                .collect::<Result<Vec<_>, _>>()?;
            links.push(Link { name: def.name.clone(), mass: def.mass, colliders });
        }
        if links.iter().all(|l| l.colliders.is_empty()) {
            return Err(GeometryError::NoCollisionGeometry(self.name.clone()));
        }

        let lookup = |name: &str, joint: &str| {
            index.get(name).copied().ok_or_else(|| {
                GeometryError::Malformed(format!("joint '{joint}' references unknown link '{name}'"))
            })
        };
        let joints = self
            .joints
            .iter()
            .map(|def| {
                let parent = lookup(&def.parent, &def.name)?;
                let child = lookup(&def.child, &def.name)?;
                joint(def, parent, child)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Articulation::new(links, joints).map_err(|e| GeometryError::Malformed(e.to_string()))
    }

    /// Builds the reference simulator for this robot.
    ///
    /// # Errors
    ///
    /// See [`RobotDescription::to_articulation`].
    pub fn into_sim(self, params: SimParams) -> Result<ArticulatedSim, GeometryError> {
        let articulation = self.to_articulation()?;
        ArticulatedSim::new(articulation, params).map_err(|e| GeometryError::Malformed(e.to_string()))
    }
}

fn collider(link: &str, def: &CollisionDef) -> Result<Collider, GeometryError> {
    let shape = match def.geometry {
        Geometry::Sphere { radius } => Shape::Sphere { radius },
        Geometry::Box { half_extents } => Shape::Box { half_extents: Vec3::from_array(half_extents) },
        Geometry::Cylinder { radius, length } => Shape::Cylinder { radius, length },
        Geometry::Mesh { ref filename } => {
            return Err(GeometryError::UnsupportedShape(format!("mesh {filename} on link '{link}'")));
        }
    };
    if !shape.is_valid() || !def.origin.is_finite() {
        return Err(GeometryError::Malformed(format!(
            "collision on link '{link}' has non-positive or non-finite dimensions"
        )));
    }
    Ok(Collider { origin: def.origin.to_pose(), shape })
}

fn joint(def: &JointDef, parent: usize, child: usize) -> Result<Joint, GeometryError> {
    let kind = match def.kind {
        JointType::Revolute => JointKind::Revolute,
        JointType::Continuous => JointKind::Continuous,
        JointType::Prismatic => JointKind::Prismatic,
        JointType::Fixed => JointKind::Fixed,
    };
    let limits = match (kind, def.limits) {
        (JointKind::Revolute | JointKind::Prismatic, None) => {
            return Err(GeometryError::Malformed(format!("joint '{}' needs limits", def.name)));
        }
        (JointKind::Revolute | JointKind::Prismatic, Some(l)) => {
            if !(l.lower.is_finite() && l.upper.is_finite() && l.lower <= l.upper) {
                return Err(GeometryError::Malformed(format!(
                    "joint '{}' has invalid limits [{}, {}]",
                    def.name, l.lower, l.upper
                )));
            }
            JointLimits { lower: l.lower, upper: l.upper, velocity: l.velocity }
        }
        (_, l) => JointLimits {
            lower: f32::NEG_INFINITY,
            upper: f32::INFINITY,
            velocity: l.map_or(0.0, |l| l.velocity),
        },
    };
    if !def.origin.is_finite() {
        return Err(GeometryError::Malformed(format!("joint '{}' has a non-finite origin", def.name)));
    }
    let home = def.home.unwrap_or(0.0);
    if !home.is_finite() {
        return Err(GeometryError::Malformed(format!("joint '{}' has a non-finite home", def.name)));
    }
    Ok(Joint {
        name: def.name.clone(),
        kind,
        parent,
        child,
        origin: def.origin.to_pose(),
        axis: Vec3::from_array(def.axis),
        limits,
        home: limits.clamp(home),
    })
}
