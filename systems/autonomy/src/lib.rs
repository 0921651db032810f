#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autonomous controller that hunts the nearest reachable particle one grid step per tick.
//!
//! The controller never touches the world directly. Each tick the caller captures an
//! [`AutonomyView`] while holding the world lock, releases the lock, and hands the view
//! to [`Autonomy::handle`]. Path planning therefore runs outside the critical section;
//! the emitted commands are applied afterwards and the world re-validates them.

use std::time::Instant;

use roomba_core::{
    Command, ControlMode, ParticleId, ParticleSnapshot, Position, RobotSnapshot,
};
use roomba_world::{query, PathPlanner, World};

/// Read-only inputs the controller needs for one tick.
#[derive(Clone, Debug)]
pub struct AutonomyView {
    /// Robot state at capture time.
    pub robot: RobotSnapshot,
    /// Active particles in ascending identifier order.
    pub particles: Vec<ParticleSnapshot>,
    /// Whether the cleaning clock has started.
    pub cleaning_started: bool,
    /// Whether the cleaning duration has been recorded.
    pub cleaning_finished: bool,
}

impl AutonomyView {
    /// Captures the view from the authoritative world.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        Self {
            robot: query::robot(world),
            particles: query::active_particles(world),
            cleaning_started: query::cleaning_started(world),
            cleaning_finished: query::cleaning_duration(world).is_some(),
        }
    }
}

/// Autonomous target-selection and stepping state machine.
#[derive(Debug)]
pub struct Autonomy {
    planner: PathPlanner,
    stuck_tick_limit: u32,
    target: Option<ParticleId>,
    path: Vec<Position>,
    path_index: usize,
    last_position: Option<Position>,
    stuck_ticks: u32,
}

impl Autonomy {
    /// Creates a controller that plans with `planner` and replans after
    /// `stuck_tick_limit` motionless ticks.
    #[must_use]
    pub fn new(planner: PathPlanner, stuck_tick_limit: u32) -> Self {
        Self {
            planner,
            stuck_tick_limit: stuck_tick_limit.max(1),
            target: None,
            path: Vec::new(),
            path_index: 0,
            last_position: None,
            stuck_ticks: 0,
        }
    }

    /// Creates a controller configured from the world's geometry and tuning.
    #[must_use]
    pub fn for_world(world: &World) -> Self {
        let tuning = query::tuning(world);
        let planner = PathPlanner::new(
            query::geometry(world).clone(),
            tuning.grid_step,
            tuning.robot_radius,
        );
        Self::new(planner, tuning.stuck_tick_limit)
    }

    /// Particle currently pursued, if any.
    #[must_use]
    pub fn target(&self) -> Option<ParticleId> {
        self.target
    }

    /// Remaining nodes of the current plan, excluding those already visited.
    #[must_use]
    pub fn remaining_path(&self) -> &[Position] {
        self.path.get(self.path_index + 1..).unwrap_or(&[])
    }

    /// Runs one controller tick, pushing the resulting commands into `out`.
    pub fn handle(&mut self, view: &AutonomyView, now: Instant, out: &mut Vec<Command>) {
        if view.robot.terminal || view.robot.mode != ControlMode::Auto {
            self.drop_plan();
            self.last_position = None;
            return;
        }

        if view.particles.is_empty() {
            self.drop_plan();
            if view.cleaning_started && !view.cleaning_finished {
                out.push(Command::FinishCleaning { at: now });
            }
            return;
        }

        if !view.cleaning_started {
            out.push(Command::BeginCleaning { at: now });
        }

        self.detect_stall(view.robot.position);

        let target_active = self
            .target
            .is_some_and(|target| view.particles.iter().any(|particle| particle.id == target));
        if !target_active || !self.on_path(view.robot.position) || self.remaining_path().is_empty()
        {
            self.drop_plan();
            if !self.select_target(view) {
                return;
            }
        }

        self.path_index += 1;
        if let Some(next) = self.path.get(self.path_index).copied() {
            out.push(Command::MoveRobot {
                to: next,
                mode: ControlMode::Auto,
            });
        }
    }

    fn detect_stall(&mut self, position: Position) {
        if self.target.is_some() {
            if self.last_position == Some(position) {
                self.stuck_ticks += 1;
            } else {
                self.stuck_ticks = 0;
            }

            if self.stuck_ticks >= self.stuck_tick_limit {
                self.drop_plan();
            }
        }

        self.last_position = Some(position);
    }

    /// Whether the robot still stands on the node the plan last moved it to.
    fn on_path(&self, position: Position) -> bool {
        match self.path.get(self.path_index) {
            Some(expected) if self.path_index == 0 => self.planner.snap(position) == *expected,
            Some(expected) => *expected == position,
            None => false,
        }
    }

    fn select_target(&mut self, view: &AutonomyView) -> bool {
        let origin = view.robot.position;
        let mut best: Option<(f32, ParticleId, Vec<Position>)> = None;

        for particle in &view.particles {
            let distance = origin.distance_to(particle.position);
            if best
                .as_ref()
                .is_some_and(|(best_distance, _, _)| distance >= *best_distance)
            {
                continue;
            }

            let path = self.planner.plan(origin, particle.position);
            if path.len() < 2 {
                continue;
            }

            best = Some((distance, particle.id, path));
        }

        match best {
            Some((_, target, path)) => {
                self.target = Some(target);
                self.path = path;
                self.path_index = 0;
                true
            }
            None => false,
        }
    }

    fn drop_plan(&mut self) {
        self.target = None;
        self.path.clear();
        self.path_index = 0;
        self.stuck_ticks = 0;
    }
}
