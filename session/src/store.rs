//! Mutex-guarded world shared by every session task and connection handler.

use std::sync::{Arc, Mutex, MutexGuard};

use roomba_core::{ArenaGeometry, Command, Direction, Event, Tuning, WorldSnapshot};
use roomba_system_manual::ManualControl;
use roomba_world::{self as world, query, World};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct Shared {
    world: Mutex<World>,
    geometry: ArenaGeometry,
    tuning: Tuning,
    manual: ManualControl,
}

/// Cloneable handle to the authoritative world.
///
/// The lock is only held for the duration of a single call and never across an
/// `.await`, a sleep or a path search. Every applied event is logged.
#[derive(Clone, Debug)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Wraps `world` for shared access.
    #[must_use]
    pub fn new(world: World) -> Self {
        let geometry = query::geometry(&world).clone();
        let tuning = query::tuning(&world).clone();
        let manual = ManualControl::from_tuning(geometry.clone(), &tuning);

        Self {
            shared: Arc::new(Shared {
                world: Mutex::new(world),
                geometry,
                tuning,
                manual,
            }),
        }
    }

    /// Static arena description the world was built with.
    #[must_use]
    pub fn geometry(&self) -> &ArenaGeometry {
        &self.shared.geometry
    }

    /// Simulation constants the world was built with.
    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.shared.tuning
    }

    /// Copies the summary transmitted to remote clients.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        query::snapshot(&self.lock())
    }

    /// Whether the session has ended.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        query::is_terminal(&self.lock())
    }

    /// Applies a single command atomically and returns the resulting events.
    pub fn apply(&self, command: Command) -> Vec<Event> {
        self.apply_all(std::iter::once(command))
    }

    /// Applies every command inside one critical section.
    pub fn apply_all<I>(&self, commands: I) -> Vec<Event>
    where
        I: IntoIterator<Item = Command>,
    {
        let mut events = Vec::new();
        {
            let mut world = self.lock();
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
        }
        log_events(&events);
        events
    }

    /// Runs `f` with exclusive access to the world.
    ///
    /// Mutations must still go through [`roomba_world::apply`]; events pushed into
    /// the provided buffer are logged once the lock is released.
    pub fn with_world<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut World, &mut Vec<Event>) -> R,
    {
        let mut events = Vec::new();
        let result = {
            let mut world = self.lock();
            f(&mut world, &mut events)
        };
        log_events(&events);
        result
    }

    /// Steps the robot once in `direction` on behalf of the manual controller.
    ///
    /// A refused step leaves the robot in place but still resolves collisions at
    /// its current position.
    pub fn manual_step(&self, direction: Direction) -> Vec<Event> {
        let manual = &self.shared.manual;
        let mut events = Vec::new();
        {
            let mut world = self.lock();
            let robot = query::robot(&world);
            let mut commands = Vec::new();
            match manual.handle(&robot, direction, &mut commands) {
                Ok(()) => {
                    for command in commands {
                        world::apply(&mut world, command, &mut events);
                    }
                }
                Err(reason) => {
                    events.push(Event::RobotMoveRejected {
                        to: manual.candidate(robot.position, direction),
                        reason,
                    });
                    world::apply(&mut world, Command::ResolveCollisions, &mut events);
                }
            }
        }
        log_events(&events);
        events
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        self.shared.world.lock().unwrap_or_else(|poisoned| {
            warn!("world lock was poisoned, recovering");
            self.shared.world.clear_poison();
            poisoned.into_inner()
        })
    }
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::ParticleSpawned {
                particle,
                position,
                kind,
            } => debug!(
                particle = particle.get(),
                x = position.x(),
                y = position.y(),
                ?kind,
                "particle spawned"
            ),
            Event::ThreatSpawned { threat, position } => debug!(
                threat = threat.get(),
                x = position.x(),
                y = position.y(),
                "threat spawned"
            ),
            Event::RobotMoved { to, .. } => debug!(x = to.x(), y = to.y(), "robot moved"),
            Event::RobotMoveRejected { to, reason } => {
                debug!(x = to.x(), y = to.y(), ?reason, "robot move rejected");
            }
            Event::ParticleCollected {
                particle,
                kind,
                score,
            } => info!(particle = particle.get(), ?kind, score, "particle collected"),
            Event::HazardReduced { from, to } => info!(from, to, "hazard reduced"),
            Event::ThreatCollided { threat, lives } => {
                info!(threat = threat.get(), lives, "threat collision");
            }
            Event::HazardRaised { level } => debug!(level, "hazard raised"),
            Event::ControlModeChanged { mode } => info!(%mode, "control mode changed"),
            Event::CleaningStarted => info!("cleaning started"),
            Event::CleaningFinished { duration } => {
                info!(seconds = duration.as_secs_f64(), "cleaning finished");
            }
            Event::SessionEnded { cause } => info!(?cause, "session ended"),
            Event::EntitiesCompacted { particles, threats } => {
                debug!(particles, threats, "inactive entities compacted");
            }
        }
    }
}
