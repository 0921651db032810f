//! Static arena geometry shared by path planning, manual movement and spawning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Point expressed in continuous world units. `y` grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns the position translated by the provided delta.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle anchored at its upper-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    /// Creates a rectangle from its upper-left corner and extent.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Top edge.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Horizontal extent.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical extent.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Reports whether the rectangle covers the provided point, edges included.
    #[must_use]
    pub fn contains(&self, point: Position) -> bool {
        point.x() >= self.x
            && point.x() <= self.x + self.width
            && point.y() >= self.y
            && point.y() <= self.y + self.height
    }

    /// Point of the rectangle nearest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Position) -> Position {
        Position::new(
            point.x().clamp(self.x, self.x + self.width),
            point.y().clamp(self.y, self.y + self.height),
        )
    }
}

/// Named contaminated zone in which entities spawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    name: String,
    width: u32,
    height: u32,
    offset: (i32, i32),
}

impl Zone {
    /// Creates a zone of the given size placed at `offset`.
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32, height: u32, offset: (i32, i32)) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            offset,
        }
    }

    /// Human readable zone label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width of the zone in world units.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the zone in world units.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Upper-left placement of the zone within the arena.
    #[must_use]
    pub const fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Rectangle covered by the zone.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.offset.0 as f32,
            self.offset.1 as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// The single impassable region of the arena.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    rect: Rect,
}

impl Obstacle {
    /// Wraps the provided rectangle as an obstacle.
    #[must_use]
    pub const fn new(rect: Rect) -> Self {
        Self { rect }
    }

    /// Rectangle covered by the obstacle.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    /// Reports whether a circle of `radius` centred at `center` overlaps the obstacle.
    ///
    /// Overlap uses the squared distance to the closest rectangle point, so a centre
    /// lying inside the rectangle always overlaps.
    #[must_use]
    pub fn intersects_circle(&self, center: Position, radius: f32) -> bool {
        let closest = self.rect.closest_point(center);
        let dx = center.x() - closest.x();
        let dy = center.y() - closest.y();
        dx * dx + dy * dy < radius * radius
    }
}

/// Traversable area that entity footprints must stay inside.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Boundary {
    /// Creates a boundary from its extreme coordinates.
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest admissible horizontal coordinate.
    #[must_use]
    pub const fn min_x(&self) -> f32 {
        self.min_x
    }

    /// Smallest admissible vertical coordinate.
    #[must_use]
    pub const fn min_y(&self) -> f32 {
        self.min_y
    }

    /// Exclusive horizontal limit.
    #[must_use]
    pub const fn max_x(&self) -> f32 {
        self.max_x
    }

    /// Exclusive vertical limit.
    #[must_use]
    pub const fn max_y(&self) -> f32 {
        self.max_y
    }

    /// Reports whether a circle of `radius` centred at `center` fits inside the boundary.
    ///
    /// The lower edges are inclusive and the upper edges exclusive.
    #[must_use]
    pub fn contains_circle(&self, center: Position, radius: f32) -> bool {
        center.x() - radius >= self.min_x
            && center.x() + radius < self.max_x
            && center.y() - radius >= self.min_y
            && center.y() + radius < self.max_y
    }
}

/// Reasons an arena description is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The arena declares no spawn zones.
    #[error("arena must declare at least one zone")]
    NoZones,
    /// A zone has zero width or height and cannot host spawns.
    #[error("zone `{0}` has an empty extent")]
    EmptyZone(String),
    /// The boundary's minimum corner is not strictly above-left of its maximum.
    #[error("boundary minimum must lie strictly before its maximum")]
    InvertedBoundary,
}

/// Immutable description of the arena: zones, obstacle and traversable boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaGeometry {
    zones: Vec<Zone>,
    obstacle: Obstacle,
    boundary: Boundary,
}

impl ArenaGeometry {
    /// Validates and assembles an arena description.
    pub fn new(
        zones: Vec<Zone>,
        obstacle: Obstacle,
        boundary: Boundary,
    ) -> Result<Self, GeometryError> {
        if zones.is_empty() {
            return Err(GeometryError::NoZones);
        }

        if let Some(zone) = zones
            .iter()
            .find(|zone| zone.width() == 0 || zone.height() == 0)
        {
            return Err(GeometryError::EmptyZone(zone.name().to_owned()));
        }

        if boundary.min_x() >= boundary.max_x() || boundary.min_y() >= boundary.max_y() {
            return Err(GeometryError::InvertedBoundary);
        }

        Ok(Self {
            zones,
            obstacle,
            boundary,
        })
    }

    /// Zones in declaration order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// The impassable region.
    #[must_use]
    pub const fn obstacle(&self) -> &Obstacle {
        &self.obstacle
    }

    /// The traversable boundary.
    #[must_use]
    pub const fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Admissibility predicate shared by path planning and manual movement.
    #[must_use]
    pub fn admits(&self, center: Position, radius: f32) -> bool {
        self.boundary.contains_circle(center, radius)
            && !self.obstacle.intersects_circle(center, radius)
    }
}

impl Default for ArenaGeometry {
    fn default() -> Self {
        Self {
            zones: vec![
                Zone::new("Zone 1", 500, 150, (50, 130)),
                Zone::new("Zone 2", 101, 480, (50, 280)),
                Zone::new("Zone 3", 309, 480, (240, 280)),
                Zone::new("Zone 4", 90, 220, (151, 540)),
            ],
            obstacle: Obstacle::new(Rect::new(151.0, 280.0, 89.0, 260.0)),
            boundary: Boundary::new(50.0, 130.0, 550.0, 760.0),
        }
    }
}
