#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session runtime that drives the pure systems against a shared world.
//!
//! A [`Session`] owns four Tokio tasks: the particle spawner, the threat spawner,
//! the hazard escalator and the controller loop. They all mutate the world through
//! the same [`Store`] and observe one stop signal.

mod store;

use std::time::{Duration, Instant};

use roomba_core::{ArenaGeometry, Command, ControlMode, Tuning};
use roomba_system_autonomy::{Autonomy, AutonomyView};
use roomba_system_hazard::{self as hazard, HazardEscalation};
use roomba_system_spawning::{self as spawning, Spawning};
use roomba_world::World;
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

pub use store::Store;

/// Parameters used to start a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Arena the session runs in.
    pub geometry: ArenaGeometry,
    /// Simulation constants.
    pub tuning: Tuning,
    /// Controller that is authoritative at start.
    pub mode: ControlMode,
    /// Seed shared by the spawners.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            geometry: ArenaGeometry::default(),
            tuning: Tuning::default(),
            mode: ControlMode::Auto,
            seed: 0,
        }
    }
}

/// Running simulation session.
#[derive(Debug)]
pub struct Session {
    store: Store,
    stop: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Session {
    /// Builds the world and spawns the background tasks on the current Tokio runtime.
    #[must_use]
    pub fn start(config: SessionConfig) -> Self {
        let SessionConfig {
            geometry,
            tuning,
            mode,
            seed,
        } = config;

        let mut world = World::new(geometry, tuning.clone());
        let mut events = Vec::new();
        roomba_world::apply(&mut world, Command::SetControlMode { mode }, &mut events);
        let autonomy = Autonomy::for_world(&world);
        let store = Store::new(world);

        let (stop, stop_rx) = watch::channel(false);
        let particles = Spawning::new(spawning::Config::particles(&tuning, seed));
        let threats = Spawning::new(spawning::Config::threats(&tuning, seed.wrapping_add(1)));
        let escalation = HazardEscalation::new(hazard::Config::from_tuning(&tuning));

        let tasks = vec![
            (
                "particle spawner",
                tokio::spawn(run_spawner(store.clone(), particles, stop_rx.clone())),
            ),
            (
                "threat spawner",
                tokio::spawn(run_spawner(store.clone(), threats, stop_rx.clone())),
            ),
            (
                "hazard escalator",
                tokio::spawn(run_escalator(store.clone(), escalation, stop_rx.clone())),
            ),
            (
                "controller",
                tokio::spawn(run_controller(
                    store.clone(),
                    autonomy,
                    store.tuning().tick_interval,
                    stop_rx,
                )),
            ),
        ];

        info!(%mode, seed, "session started");
        Self { store, stop, tasks }
    }

    /// Shared world handle.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Signals every task to stop and waits for them to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        for (name, task) in self.tasks {
            if let Err(error) = task.await {
                warn!(task = name, %error, "session task failed");
            }
        }
        info!("session stopped");
    }
}

/// Resolves once `stop` is raised or its sender is gone.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

async fn run_spawner(store: Store, mut spawning: Spawning, mut stop: watch::Receiver<bool>) {
    loop {
        let delay = spawning.next_delay();
        tokio::select! {
            () = stopped(&mut stop) => break,
            () = sleep(delay) => {}
        }

        let terminal = store.is_terminal();
        let mut commands = Vec::new();
        spawning.handle(terminal, store.geometry().zones(), &mut commands);
        if terminal {
            break;
        }
        let _ = store.apply_all(commands);
    }
    debug!(population = ?spawning.population(), "spawner exited");
}

async fn run_escalator(
    store: Store,
    mut escalation: HazardEscalation,
    mut stop: watch::Receiver<bool>,
) {
    let interval = escalation.interval();
    if interval.is_zero() {
        stopped(&mut stop).await;
        return;
    }

    let mut last = Instant::now();
    loop {
        tokio::select! {
            () = stopped(&mut stop) => break,
            () = sleep(interval) => {}
        }

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(last);
        last = now;

        let terminal = store.is_terminal();
        let mut commands = Vec::new();
        escalation.handle(elapsed, terminal, &mut commands);
        if terminal {
            break;
        }
        let _ = store.apply_all(commands);
    }
    debug!("hazard escalator exited");
}

async fn run_controller(
    store: Store,
    mut autonomy: Autonomy,
    tick: Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let view = store.with_world(|world, events| {
            roomba_world::apply(world, Command::ResolveCollisions, events);
            AutonomyView::capture(world)
        });

        let mut commands = Vec::new();
        autonomy.handle(&view, Instant::now(), &mut commands);
        if !commands.is_empty() {
            let _ = store.apply_all(commands);
        }

        tokio::select! {
            () = stopped(&mut stop) => break,
            () = sleep(tick) => {}
        }
    }
    debug!("controller exited");
}
