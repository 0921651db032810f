#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the cleaning-robot simulation.
//!
//! The [`World`] owns the robot, the hazard level and the particle and threat
//! registries. It is mutated exclusively through [`apply`], which also hosts the
//! collision and scoring rules shared by every controller. Read access goes
//! through the [`query`] module.

mod entities;
mod navigation;

use std::time::{Duration, Instant};

use roomba_core::{
    ArenaGeometry, Command, ControlMode, Event, MoveRejection, ParticleId, ParticleKind, Position,
    TerminalCause, ThreatId, Tuning,
};

use entities::{Particle, Registry, Threat};

pub use navigation::PathPlanner;

#[derive(Clone, Debug)]
struct Robot {
    position: Position,
    radius: f32,
    lives: u32,
    score: u32,
    mode: ControlMode,
    terminal: Option<TerminalCause>,
    cleaning_started_at: Option<Instant>,
    cleaning_duration: Option<Duration>,
}

/// Represents the authoritative simulation state.
#[derive(Clone, Debug)]
pub struct World {
    geometry: ArenaGeometry,
    tuning: Tuning,
    robot: Robot,
    hazard: f32,
    particles: Registry<ParticleId, Particle>,
    threats: Registry<ThreatId, Threat>,
}

impl World {
    /// Creates a world at its session-start values in autonomous mode.
    #[must_use]
    pub fn new(geometry: ArenaGeometry, tuning: Tuning) -> Self {
        let robot = Robot {
            position: tuning.robot_start,
            radius: tuning.robot_radius,
            lives: tuning.starting_lives,
            score: 0,
            mode: ControlMode::Auto,
            terminal: None,
            cleaning_started_at: None,
            cleaning_duration: None,
        };
        let hazard = tuning.starting_hazard.clamp(0.0, tuning.max_hazard);

        Self {
            geometry,
            tuning,
            robot,
            hazard,
            particles: Registry::new(),
            threats: Registry::new(),
        }
    }

    fn end_session(&mut self, cause: TerminalCause, out_events: &mut Vec<Event>) {
        if self.robot.terminal.is_none() {
            self.robot.terminal = Some(cause);
            out_events.push(Event::SessionEnded { cause });
        }
    }

    fn resolve_collisions(&mut self, out_events: &mut Vec<Event>) {
        let center = self.robot.position;
        let collection_reach = self.robot.radius + self.tuning.collection_margin;
        let threat_reach = self.robot.radius + self.tuning.threat_margin;

        let collected: Vec<(ParticleId, ParticleKind)> = self
            .particles
            .iter_active()
            .filter(|(_, particle)| center.distance_to(particle.position) < collection_reach)
            .map(|(id, particle)| (id, particle.kind))
            .collect();

        for (particle, kind) in collected {
            if !self.particles.deactivate(particle) {
                continue;
            }

            self.robot.score = self.robot.score.saturating_add(self.tuning.particle_reward);
            out_events.push(Event::ParticleCollected {
                particle,
                kind,
                score: self.robot.score,
            });

            if kind == ParticleKind::Beneficial {
                let from = self.hazard;
                let retained = (1.0 - self.tuning.beneficial_hazard_reduction).clamp(0.0, 1.0);
                self.hazard = (from * retained).max(0.0);
                out_events.push(Event::HazardReduced {
                    from,
                    to: self.hazard,
                });
            }
        }

        let hits: Vec<ThreatId> = self
            .threats
            .iter_active()
            .filter(|(_, threat)| center.distance_to(threat.position) < threat_reach)
            .map(|(id, _)| id)
            .collect();

        for threat in hits {
            if !self.threats.deactivate(threat) {
                continue;
            }

            self.robot.lives = self.robot.lives.saturating_sub(1);
            out_events.push(Event::ThreatCollided {
                threat,
                lives: self.robot.lives,
            });

            if self.robot.lives == 0 {
                self.end_session(TerminalCause::LivesExhausted, out_events);
                break;
            }
        }

        self.compact_if_needed(out_events);
    }

    fn compact_if_needed(&mut self, out_events: &mut Vec<Event>) {
        let inactive = self.particles.inactive_len() + self.threats.inactive_len();
        if inactive == 0 || inactive < self.tuning.compaction_threshold {
            return;
        }

        let particles = self.particles.compact();
        let threats = self.threats.compact();
        out_events.push(Event::EntitiesCompacted { particles, threats });
    }

    fn move_robot(&mut self, to: Position, mode: ControlMode, out_events: &mut Vec<Event>) {
        if mode != self.robot.mode {
            out_events.push(Event::RobotMoveRejected {
                to,
                reason: MoveRejection::ModeMismatch,
            });
        } else if !self.geometry.admits(to, self.robot.radius) {
            out_events.push(Event::RobotMoveRejected {
                to,
                reason: MoveRejection::Blocked,
            });
        } else {
            let from = self.robot.position;
            self.robot.position = to;
            out_events.push(Event::RobotMoved { from, to });
        }

        self.resolve_collisions(out_events);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(ArenaGeometry::default(), Tuning::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session is terminal only [`Command::SetControlMode`] has any effect.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.robot.terminal.is_some() && !matches!(command, Command::SetControlMode { .. }) {
        return;
    }

    match command {
        Command::SpawnParticle { position, kind } => {
            let particle = world.particles.insert(Particle { position, kind });
            out_events.push(Event::ParticleSpawned {
                particle,
                position,
                kind,
            });
        }
        Command::SpawnThreat { position } => {
            let threat = world.threats.insert(Threat { position });
            out_events.push(Event::ThreatSpawned { threat, position });
        }
        Command::RaiseHazard { amount } => {
            let amount = if amount.is_finite() {
                amount.max(0.0)
            } else {
                0.0
            };
            let max = world.tuning.max_hazard;
            world.hazard = (world.hazard + amount).min(max);
            out_events.push(Event::HazardRaised {
                level: world.hazard,
            });

            if world.hazard >= max {
                world.end_session(TerminalCause::HazardMaxed, out_events);
            }
        }
        Command::MoveRobot { to, mode } => world.move_robot(to, mode, out_events),
        Command::ResolveCollisions => world.resolve_collisions(out_events),
        Command::SetControlMode { mode } => {
            if world.robot.mode != mode {
                world.robot.mode = mode;
                out_events.push(Event::ControlModeChanged { mode });
            }
        }
        Command::BeginCleaning { at } => {
            if world.robot.cleaning_started_at.is_none() {
                world.robot.cleaning_started_at = Some(at);
                out_events.push(Event::CleaningStarted);
            }
        }
        Command::FinishCleaning { at } => {
            if let (Some(started), None) = (
                world.robot.cleaning_started_at,
                world.robot.cleaning_duration,
            ) {
                let duration = at.saturating_duration_since(started);
                world.robot.cleaning_duration = Some(duration);
                out_events.push(Event::CleaningFinished { duration });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use roomba_core::{
        ArenaGeometry, ControlMode, ParticleId, ParticleSnapshot, RobotSnapshot, TerminalCause,
        Tuning, WorldSnapshot,
    };

    use super::World;

    /// Captures the summary transmitted to remote presentation layers.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        let robot = &world.robot;
        WorldSnapshot {
            x: robot.position.x(),
            y: robot.position.y(),
            radius: robot.radius,
            lives: robot.lives,
            score: robot.score,
            hazard: world.hazard,
            terminal: robot.terminal.is_some(),
            control_mode: robot.mode,
            active_particles: world.particles.active_len(),
            active_threats: world.threats.active_len(),
            clean_time: robot.cleaning_duration.map(|duration| duration.as_secs_f64()),
        }
    }

    /// Captures the robot state required by controllers.
    #[must_use]
    pub fn robot(world: &World) -> RobotSnapshot {
        RobotSnapshot {
            position: world.robot.position,
            radius: world.robot.radius,
            mode: world.robot.mode,
            terminal: world.robot.terminal.is_some(),
        }
    }

    /// Active particles in ascending identifier order.
    #[must_use]
    pub fn active_particles(world: &World) -> Vec<ParticleSnapshot> {
        world
            .particles
            .iter_active()
            .map(|(id, particle)| ParticleSnapshot {
                id,
                position: particle.position,
                kind: particle.kind,
            })
            .collect()
    }

    /// Reports whether the particle is still awaiting collection.
    #[must_use]
    pub fn is_particle_active(world: &World, particle: ParticleId) -> bool {
        world.particles.is_active(particle)
    }

    /// Number of particles awaiting collection.
    #[must_use]
    pub fn active_particle_count(world: &World) -> usize {
        world.particles.active_len()
    }

    /// Number of threats still roaming.
    #[must_use]
    pub fn active_threat_count(world: &World) -> usize {
        world.threats.active_len()
    }

    /// Number of particle and threat entries held in memory, active or not.
    #[must_use]
    pub fn stored_entity_count(world: &World) -> usize {
        world.particles.stored_len() + world.threats.stored_len()
    }

    /// Current hazard level.
    #[must_use]
    pub fn hazard(world: &World) -> f32 {
        world.hazard
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.robot.lives
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.robot.score
    }

    /// Controller currently authoritative over movement.
    #[must_use]
    pub fn control_mode(world: &World) -> ControlMode {
        world.robot.mode
    }

    /// Cause of the terminal state, if the session has ended.
    #[must_use]
    pub fn terminal_cause(world: &World) -> Option<TerminalCause> {
        world.robot.terminal
    }

    /// Whether the session has ended.
    #[must_use]
    pub fn is_terminal(world: &World) -> bool {
        world.robot.terminal.is_some()
    }

    /// Whether the cleaning clock has started.
    #[must_use]
    pub fn cleaning_started(world: &World) -> bool {
        world.robot.cleaning_started_at.is_some()
    }

    /// Elapsed cleaning time, once every particle was collected.
    #[must_use]
    pub fn cleaning_duration(world: &World) -> Option<Duration> {
        world.robot.cleaning_duration
    }

    /// Static arena description.
    #[must_use]
    pub fn geometry(world: &World) -> &ArenaGeometry {
        &world.geometry
    }

    /// Simulation constants the world was built with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }
}
