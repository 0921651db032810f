use std::time::Duration;

use roomba_core::{Command, ControlMode, Direction, IntervalRange, ParticleKind, Position, Tuning};
use roomba_session::{Session, SessionConfig, Store};
use tokio::time::{sleep, timeout, Instant};

const HOUR: Duration = Duration::from_secs(3_600);

fn quiet_tuning() -> Tuning {
    Tuning {
        particle_spawn_interval: IntervalRange::new(HOUR, HOUR),
        threat_spawn_interval: IntervalRange::new(HOUR, HOUR),
        hazard_interval: HOUR,
        tick_interval: Duration::from_millis(5),
        ..Tuning::default()
    }
}

async fn wait_until<F>(store: &Store, limit: Duration, condition: F) -> bool
where
    F: Fn(&Store) -> bool,
{
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition(store) {
            return true;
        }
        sleep(Duration::from_millis(5)).await;
    }
    condition(store)
}

#[tokio::test]
async fn autonomous_controller_collects_particle() {
    let session = Session::start(SessionConfig {
        tuning: quiet_tuning(),
        ..SessionConfig::default()
    });
    let store = session.store().clone();
    let _ = store.apply(Command::SpawnParticle {
        position: Position::new(300.0, 180.0),
        kind: ParticleKind::Neutral,
    });

    let finished = wait_until(&store, Duration::from_secs(5), |store| {
        store.snapshot().clean_time.is_some()
    })
    .await;

    assert!(finished, "particle was never collected");
    let snapshot = store.snapshot();
    assert_eq!(snapshot.score, 10);
    assert_eq!(snapshot.lives, 3);
    assert_eq!(snapshot.active_particles, 0);
    session.shutdown().await;
}

#[tokio::test]
async fn spawners_populate_the_arena() {
    let tuning = Tuning {
        particle_spawn_interval: IntervalRange::new(
            Duration::from_millis(5),
            Duration::from_millis(10),
        ),
        threat_spawn_interval: IntervalRange::new(
            Duration::from_millis(5),
            Duration::from_millis(10),
        ),
        ..quiet_tuning()
    };
    let session = Session::start(SessionConfig {
        tuning,
        mode: ControlMode::Manual,
        seed: 7,
        ..SessionConfig::default()
    });
    let store = session.store().clone();

    let populated = wait_until(&store, Duration::from_secs(5), |store| {
        let snapshot = store.snapshot();
        snapshot.active_particles >= 3 && snapshot.active_threats >= 3 || snapshot.terminal
    })
    .await;

    assert!(populated);
    session.shutdown().await;
}

#[tokio::test]
async fn hazard_escalation_ends_session_and_freezes_world() {
    let tuning = Tuning {
        hazard_interval: Duration::from_millis(5),
        hazard_increment: 30.0,
        ..quiet_tuning()
    };
    let session = Session::start(SessionConfig {
        tuning,
        ..SessionConfig::default()
    });
    let store = session.store().clone();

    assert!(wait_until(&store, Duration::from_secs(5), Store::is_terminal).await);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.hazard, 100.0);

    let _ = store.apply(Command::SpawnParticle {
        position: Position::new(300.0, 180.0),
        kind: ParticleKind::Neutral,
    });
    sleep(Duration::from_millis(50)).await;
    assert_eq!(store.snapshot(), snapshot);
    session.shutdown().await;
}

#[tokio::test]
async fn manual_mode_suspends_autonomous_movement() {
    let session = Session::start(SessionConfig {
        tuning: quiet_tuning(),
        mode: ControlMode::Manual,
        ..SessionConfig::default()
    });
    let store = session.store().clone();
    let _ = store.apply(Command::SpawnParticle {
        position: Position::new(300.0, 180.0),
        kind: ParticleKind::Neutral,
    });

    sleep(Duration::from_millis(60)).await;
    assert_eq!((store.snapshot().x, store.snapshot().y), (200.0, 180.0));

    let _ = store.manual_step(Direction::Down);
    assert_eq!((store.snapshot().x, store.snapshot().y), (200.0, 185.0));
    assert_eq!(store.snapshot().active_particles, 1);
    session.shutdown().await;
}

#[tokio::test]
async fn shutdown_interrupts_long_sleeps() {
    let session = Session::start(SessionConfig {
        tuning: quiet_tuning(),
        ..SessionConfig::default()
    });
    sleep(Duration::from_millis(20)).await;

    assert!(timeout(Duration::from_secs(1), session.shutdown())
        .await
        .is_ok());
}
