#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Manual controller translating directional requests into single robot steps.

use roomba_core::{
    ArenaGeometry, Command, ControlMode, Direction, MoveRejection, Position, RobotSnapshot, Tuning,
};

/// Pure system that turns a direction into a bounded, pre-validated move.
#[derive(Clone, Debug)]
pub struct ManualControl {
    geometry: ArenaGeometry,
    step: f32,
}

impl ManualControl {
    /// Creates a controller that moves `step` world units per request.
    #[must_use]
    pub fn new(geometry: ArenaGeometry, step: f32) -> Self {
        Self { geometry, step }
    }

    /// Creates a controller using the step length from `tuning`.
    #[must_use]
    pub fn from_tuning(geometry: ArenaGeometry, tuning: &Tuning) -> Self {
        Self::new(geometry, tuning.manual_step)
    }

    /// Centre the robot would occupy after stepping once in `direction`.
    #[must_use]
    pub fn candidate(&self, from: Position, direction: Direction) -> Position {
        let (dx, dy) = direction.unit();
        from.offset(dx * self.step, dy * self.step)
    }

    /// Validates a step and pushes the resulting move command into `out`.
    ///
    /// Nothing is emitted when the session has ended. A step is refused with
    /// [`MoveRejection::ModeMismatch`] outside manual mode and with
    /// [`MoveRejection::Blocked`] when the candidate centre is not admissible.
    pub fn handle(
        &self,
        robot: &RobotSnapshot,
        direction: Direction,
        out: &mut Vec<Command>,
    ) -> Result<(), MoveRejection> {
        if robot.terminal {
            return Ok(());
        }

        if robot.mode != ControlMode::Manual {
            return Err(MoveRejection::ModeMismatch);
        }

        let to = self.candidate(robot.position, direction);
        if !self.geometry.admits(to, robot.radius) {
            return Err(MoveRejection::Blocked);
        }

        out.push(Command::MoveRobot {
            to,
            mode: ControlMode::Manual,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_robot(x: f32, y: f32) -> RobotSnapshot {
        RobotSnapshot {
            position: Position::new(x, y),
            radius: 10.0,
            mode: ControlMode::Manual,
            terminal: false,
        }
    }

    #[test]
    fn candidate_follows_screen_axes() {
        let control = ManualControl::new(ArenaGeometry::default(), 5.0);
        let origin = Position::new(200.0, 180.0);

        assert_eq!(control.candidate(origin, Direction::Up), Position::new(200.0, 175.0));
        assert_eq!(control.candidate(origin, Direction::Down), Position::new(200.0, 185.0));
        assert_eq!(control.candidate(origin, Direction::Left), Position::new(195.0, 180.0));
        assert_eq!(control.candidate(origin, Direction::Right), Position::new(205.0, 180.0));
    }

    #[test]
    fn auto_mode_refuses_manual_steps() {
        let control = ManualControl::new(ArenaGeometry::default(), 5.0);
        let robot = RobotSnapshot {
            mode: ControlMode::Auto,
            ..manual_robot(200.0, 180.0)
        };
        let mut out = Vec::new();

        assert_eq!(
            control.handle(&robot, Direction::Right, &mut out),
            Err(MoveRejection::ModeMismatch)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn terminal_robot_ignores_requests() {
        let control = ManualControl::new(ArenaGeometry::default(), 5.0);
        let robot = RobotSnapshot {
            terminal: true,
            ..manual_robot(200.0, 180.0)
        };
        let mut out = Vec::new();

        assert_eq!(control.handle(&robot, Direction::Right, &mut out), Ok(()));
        assert!(out.is_empty());
    }
}
