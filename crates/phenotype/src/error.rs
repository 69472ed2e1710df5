use std::path::PathBuf;
use thiserror::Error;

/// Problems with the collision geometry or joint tree of a description.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("robot '{0}' has no collision geometry")]
    NoCollisionGeometry(String),
    #[error("malformed robot description: {0}")]
    Malformed(String),
    #[error("unsupported collision shape '{0}' (use box, sphere or cylinder)")]
    UnsupportedShape(String),
}

#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URDF: {0}")]
    Urdf(String),
    #[error("unrecognised description format: {}", .0.display())]
    UnknownFormat(PathBuf),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
