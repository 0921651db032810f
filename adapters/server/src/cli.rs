//! Command-line options of the server binary.

use std::{
    net::SocketAddr,
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use clap::Parser;
use roomba_core::{ArenaGeometry, ControlMode, Tuning};
use roomba_session::SessionConfig;

use crate::arena::{self, ArenaConfigError};

/// Runs the cleaning-robot simulation and serves its state over TCP.
#[derive(Clone, Debug, Parser)]
#[command(name = "roomba-server", version)]
pub struct Cli {
    /// Address the sync protocol listens on.
    #[arg(long, env = "ROOMBA_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,

    /// Controller that drives the robot at start (`auto` or `manual`).
    #[arg(long, default_value_t = ControlMode::Auto)]
    pub mode: ControlMode,

    /// TOML file describing zones, obstacle and boundary.
    #[arg(long)]
    pub arena: Option<PathBuf>,

    /// Seed for the spawners; drawn from the clock when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Delay between controller ticks in milliseconds.
    #[arg(long)]
    pub tick_ms: Option<u64>,
}

impl Cli {
    /// Resolves the options into a session configuration.
    pub fn session_config(&self) -> Result<SessionConfig, ArenaConfigError> {
        let geometry = match &self.arena {
            Some(path) => arena::load(path)?,
            None => ArenaGeometry::default(),
        };

        let mut tuning = Tuning::default();
        if let Some(tick_ms) = self.tick_ms {
            tuning.tick_interval = Duration::from_millis(tick_ms.max(1));
        }

        Ok(SessionConfig {
            geometry,
            tuning,
            mode: self.mode,
            seed: self.seed.unwrap_or_else(clock_seed),
        })
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
