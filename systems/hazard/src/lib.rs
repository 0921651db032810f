#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Escalation system that periodically raises the ambient hazard level.

use std::time::Duration;

use roomba_core::{Command, Tuning};

/// Configuration parameters required to construct the escalation system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    interval: Duration,
    increment: f32,
}

impl Config {
    /// Creates a configuration raising the hazard by `increment` every `interval`.
    #[must_use]
    pub const fn new(interval: Duration, increment: f32) -> Self {
        Self {
            interval,
            increment,
        }
    }

    /// Configuration derived from the simulation tuning.
    #[must_use]
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.hazard_interval, tuning.hazard_increment)
    }
}

/// Pure system that converts elapsed time into hazard raise commands.
#[derive(Debug)]
pub struct HazardEscalation {
    interval: Duration,
    increment: f32,
    accumulator: Duration,
}

impl HazardEscalation {
    /// Creates a new escalation system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            interval: config.interval,
            increment: config.increment,
            accumulator: Duration::ZERO,
        }
    }

    /// Delay between two escalations.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Accumulates `elapsed` time and emits one raise per completed interval.
    ///
    /// Nothing is emitted, and the accumulator is cleared, once the session is terminal.
    pub fn handle(&mut self, elapsed: Duration, terminal: bool, out: &mut Vec<Command>) {
        if terminal {
            self.accumulator = Duration::ZERO;
            return;
        }

        if self.interval.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            out.push(Command::RaiseHazard {
                amount: self.increment,
            });
        }
    }
}
