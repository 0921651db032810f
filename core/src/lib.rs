#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the cleaning-robot simulation.
//!
//! This crate defines the message surface that connects the session runtime, the
//! authoritative world, and pure systems. Systems read immutable views and submit
//! [`Command`] values describing desired mutations, the world executes those commands
//! via its `apply` entry point, and then reports [`Event`] values describing what
//! actually happened. Concurrent callers serialize on the world's single lock; nothing
//! in this crate blocks or sleeps.

mod geometry;

use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{ArenaGeometry, Boundary, GeometryError, Obstacle, Position, Rect, Zone};

/// Selects which controller is authoritative over robot movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// The autonomous controller plans paths and steps the robot.
    #[default]
    Auto,
    /// Remote directional commands step the robot.
    Manual,
}

impl ControlMode {
    /// Lowercase label used on the wire and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown control mode label.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown control mode `{0}`, expected `auto` or `manual`")]
pub struct UnknownControlMode(String);

impl FromStr for ControlMode {
    type Err = UnknownControlMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            _ => Err(UnknownControlMode(value.to_owned())),
        }
    }
}

/// Cardinal movement directions. `Up` decreases `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Movement toward decreasing `y`.
    Up,
    /// Movement toward increasing `y`.
    Down,
    /// Movement toward decreasing `x`.
    Left,
    /// Movement toward increasing `x`.
    Right,
}

impl Direction {
    /// Neighbour expansion order used by path planning.
    pub const EXPANSION_ORDER: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit vector pointing in this direction.
    #[must_use]
    pub const fn unit(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }
}

/// Contaminant flavour, deciding the side effect of collecting it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    /// Plain contaminant worth score only.
    Neutral,
    /// Contaminant that also lowers the hazard level when collected.
    Beneficial,
}

/// Unique identifier assigned to a particle. Never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(u32);

impl ParticleId {
    /// Creates a new particle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a threat. Never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreatId(u32);

impl ThreatId {
    /// Creates a new threat identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Why a session reached its terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalCause {
    /// Threat collisions drained every life.
    LivesExhausted,
    /// The hazard level reached its maximum.
    HazardMaxed,
}

/// Reasons a robot move request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveRejection {
    /// The requesting controller is not the active one.
    ModeMismatch,
    /// The destination leaves the boundary or overlaps the obstacle.
    Blocked,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Inserts a new active particle.
    SpawnParticle {
        /// Centre of the new particle.
        position: Position,
        /// Flavour of the new particle.
        kind: ParticleKind,
    },
    /// Inserts a new active threat.
    SpawnThreat {
        /// Centre of the new threat.
        position: Position,
    },
    /// Raises the hazard level, clamping at its maximum.
    RaiseHazard {
        /// Amount added to the current level.
        amount: f32,
    },
    /// Relocates the robot on behalf of a controller, then resolves collisions.
    MoveRobot {
        /// Requested robot centre.
        to: Position,
        /// Controller issuing the request.
        mode: ControlMode,
    },
    /// Resolves particle and threat overlaps at the robot's current position.
    ResolveCollisions,
    /// Switches which controller is authoritative.
    SetControlMode {
        /// Mode the world should activate.
        mode: ControlMode,
    },
    /// Records when cleaning began. Only the first request is honoured.
    BeginCleaning {
        /// Moment cleaning started.
        at: Instant,
    },
    /// Records when cleaning finished. Only the first request after a start is honoured.
    FinishCleaning {
        /// Moment the last active particle was gone.
        at: Instant,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a particle was inserted.
    ParticleSpawned {
        /// Identifier assigned to the particle.
        particle: ParticleId,
        /// Centre of the particle.
        position: Position,
        /// Flavour of the particle.
        kind: ParticleKind,
    },
    /// Confirms that a threat was inserted.
    ThreatSpawned {
        /// Identifier assigned to the threat.
        threat: ThreatId,
        /// Centre of the threat.
        position: Position,
    },
    /// Confirms that the robot moved.
    RobotMoved {
        /// Centre before the move.
        from: Position,
        /// Centre after the move.
        to: Position,
    },
    /// Reports that a move request was refused and the robot stayed put.
    RobotMoveRejected {
        /// Centre that was requested.
        to: Position,
        /// Specific reason the move failed.
        reason: MoveRejection,
    },
    /// Confirms that a particle was collected and scored.
    ParticleCollected {
        /// Identifier of the collected particle.
        particle: ParticleId,
        /// Flavour of the collected particle.
        kind: ParticleKind,
        /// Score after the reward was applied.
        score: u32,
    },
    /// Reports a discrete hazard drop caused by a beneficial particle.
    HazardReduced {
        /// Level before the drop.
        from: f32,
        /// Level after the drop.
        to: f32,
    },
    /// Reports that the robot ran into a threat.
    ThreatCollided {
        /// Identifier of the threat that was neutralised.
        threat: ThreatId,
        /// Lives remaining after the hit.
        lives: u32,
    },
    /// Reports that the ambient hazard rose.
    HazardRaised {
        /// Level after the increase.
        level: f32,
    },
    /// Announces that a different controller became authoritative.
    ControlModeChanged {
        /// Mode that became active.
        mode: ControlMode,
    },
    /// Announces that the cleaning clock started.
    CleaningStarted,
    /// Announces that every particle was collected after cleaning started.
    CleaningFinished {
        /// Elapsed time between start and finish.
        duration: Duration,
    },
    /// Announces the terminal state. Emitted once per session.
    SessionEnded {
        /// What ended the session.
        cause: TerminalCause,
    },
    /// Reports that inactive entities were pruned from the registries.
    EntitiesCompacted {
        /// Number of particles removed.
        particles: usize,
        /// Number of threats removed.
        threats: usize,
    },
}

/// Immutable representation of an active particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSnapshot {
    /// Identifier assigned to the particle.
    pub id: ParticleId,
    /// Centre of the particle.
    pub position: Position,
    /// Flavour of the particle.
    pub kind: ParticleKind,
}

/// Immutable representation of the robot used by controllers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RobotSnapshot {
    /// Current robot centre.
    pub position: Position,
    /// Collision radius.
    pub radius: f32,
    /// Controller currently authoritative over movement.
    pub mode: ControlMode,
    /// Whether the session has ended.
    pub terminal: bool,
}

/// Summary of the world sent to remote presentation layers.
///
/// Entity collections are reduced to active counts to bound the payload size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Robot centre, horizontal.
    pub x: f32,
    /// Robot centre, vertical.
    pub y: f32,
    /// Robot collision radius.
    pub radius: f32,
    /// Remaining lives.
    pub lives: u32,
    /// Accumulated score.
    pub score: u32,
    /// Current hazard level.
    pub hazard: f32,
    /// Whether the session has ended.
    pub terminal: bool,
    /// Controller currently authoritative over movement.
    pub control_mode: ControlMode,
    /// Number of particles still awaiting collection.
    pub active_particles: usize,
    /// Number of threats still roaming.
    pub active_threats: usize,
    /// Seconds spent cleaning, once every particle was collected.
    pub clean_time: Option<f64>,
}

/// Uniform range of delays between two spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalRange {
    min: Duration,
    max: Duration,
}

impl IntervalRange {
    /// Creates a range, swapping the bounds if they arrive inverted.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Shortest delay.
    #[must_use]
    pub const fn min(&self) -> Duration {
        self.min
    }

    /// Longest delay.
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }
}

/// Every adjustable constant of the simulation in one place.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    /// Pitch of the path planning grid in world units.
    pub grid_step: f32,
    /// Robot centre at session start.
    pub robot_start: Position,
    /// Robot collision radius.
    pub robot_radius: f32,
    /// Lives granted at session start.
    pub starting_lives: u32,
    /// Hazard level at session start.
    pub starting_hazard: f32,
    /// Hazard level that ends the session.
    pub max_hazard: f32,
    /// Hazard added by each escalation.
    pub hazard_increment: f32,
    /// Delay between escalations.
    pub hazard_interval: Duration,
    /// Extra reach added to the robot radius when collecting particles.
    pub collection_margin: f32,
    /// Extra reach added to the robot radius when colliding with threats.
    pub threat_margin: f32,
    /// Score granted per collected particle.
    pub particle_reward: u32,
    /// Fraction of the current hazard removed by a beneficial particle.
    pub beneficial_hazard_reduction: f32,
    /// Probability that a spawned particle is beneficial.
    pub beneficial_probability: f64,
    /// Delay between particle spawns.
    pub particle_spawn_interval: IntervalRange,
    /// Delay between threat spawns.
    pub threat_spawn_interval: IntervalRange,
    /// Distance covered by a single manual step.
    pub manual_step: f32,
    /// Consecutive motionless ticks tolerated before replanning.
    pub stuck_tick_limit: u32,
    /// Delay between controller ticks.
    pub tick_interval: Duration,
    /// Inactive registry entries tolerated before compaction.
    pub compaction_threshold: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grid_step: 10.0,
            robot_start: Position::new(200.0, 180.0),
            robot_radius: 10.0,
            starting_lives: 3,
            starting_hazard: 10.0,
            max_hazard: 100.0,
            hazard_increment: 1.0,
            hazard_interval: Duration::from_secs(3),
            collection_margin: 3.0,
            threat_margin: 10.0,
            particle_reward: 10,
            beneficial_hazard_reduction: 0.1,
            beneficial_probability: 0.2,
            particle_spawn_interval: IntervalRange::new(
                Duration::from_millis(500),
                Duration::from_millis(1_500),
            ),
            threat_spawn_interval: IntervalRange::new(
                Duration::from_secs(2),
                Duration::from_secs(4),
            ),
            manual_step: 5.0,
            stuck_tick_limit: 3,
            tick_interval: Duration::from_millis(50),
            compaction_threshold: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_mode_parses_case_insensitively() {
        assert_eq!("AUTO".parse::<ControlMode>(), Ok(ControlMode::Auto));
        assert_eq!(" manual ".parse::<ControlMode>(), Ok(ControlMode::Manual));
        assert!("hover".parse::<ControlMode>().is_err());
    }

    #[test]
    fn direction_uses_uppercase_wire_names() {
        let encoded = serde_json::to_string(&Direction::Left).expect("serialize");
        assert_eq!(encoded, "\"LEFT\"");
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = WorldSnapshot {
            x: 200.0,
            y: 180.0,
            radius: 10.0,
            lives: 3,
            score: 20,
            hazard: 12.0,
            terminal: false,
            control_mode: ControlMode::Manual,
            active_particles: 4,
            active_threats: 1,
            clean_time: None,
        };
        let encoded = serde_json::to_string(&snapshot).expect("serialize");
        assert!(encoded.contains("\"control_mode\":\"manual\""));
        let restored: WorldSnapshot = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn interval_range_orders_bounds() {
        let range = IntervalRange::new(Duration::from_secs(4), Duration::from_secs(2));
        assert_eq!(range.min(), Duration::from_secs(2));
        assert_eq!(range.max(), Duration::from_secs(4));
    }
}
