//! Arena description loaded from a TOML file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use roomba_core::{ArenaGeometry, Boundary, GeometryError, Obstacle, Rect, Zone};
use serde::Deserialize;
use thiserror::Error;

/// Reasons an arena file cannot be turned into geometry.
#[derive(Debug, Error)]
pub enum ArenaConfigError {
    /// The file could not be read.
    #[error("failed to read arena file {}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid arena TOML.
    #[error("failed to parse arena toml contents")]
    Parse(#[from] toml::de::Error),
    /// The arena parsed but describes unusable geometry.
    #[error("invalid arena")]
    Invalid(#[from] GeometryError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArenaFile {
    zones: Vec<ZoneEntry>,
    obstacle: ObstacleEntry,
    boundary: BoundaryEntry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ZoneEntry {
    name: String,
    width: u32,
    height: u32,
    offset: (i32, i32),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObstacleEntry {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundaryEntry {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

/// Reads and validates the arena stored at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<ArenaGeometry, ArenaConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ArenaConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents)
}

/// Parses and validates arena TOML.
pub fn parse(contents: &str) -> Result<ArenaGeometry, ArenaConfigError> {
    let file: ArenaFile = toml::from_str(contents)?;

    let zones = file
        .zones
        .into_iter()
        .map(|zone| Zone::new(zone.name, zone.width, zone.height, zone.offset))
        .collect();
    let obstacle = Obstacle::new(Rect::new(
        file.obstacle.x,
        file.obstacle.y,
        file.obstacle.width,
        file.obstacle.height,
    ));
    let boundary = Boundary::new(
        file.boundary.min_x,
        file.boundary.min_y,
        file.boundary.max_x,
        file.boundary.max_y,
    );

    Ok(ArenaGeometry::new(zones, obstacle, boundary)?)
}
