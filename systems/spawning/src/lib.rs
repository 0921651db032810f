#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded spawning system responsible for emitting particle and threat spawn commands.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use roomba_core::{Command, IntervalRange, ParticleKind, Position, Tuning, Zone};

/// Entity population a spawner feeds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Population {
    /// Contaminant particles, beneficial with the given probability.
    Particles {
        /// Probability in `[0, 1]` that a particle is beneficial.
        beneficial_probability: f64,
    },
    /// Hostile threats.
    Threats,
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    population: Population,
    interval: IntervalRange,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided population, cadence and seed.
    #[must_use]
    pub const fn new(population: Population, interval: IntervalRange, rng_seed: u64) -> Self {
        Self {
            population,
            interval,
            rng_seed,
        }
    }

    /// Particle spawner configuration derived from the simulation tuning.
    #[must_use]
    pub fn particles(tuning: &Tuning, rng_seed: u64) -> Self {
        Self::new(
            Population::Particles {
                beneficial_probability: tuning.beneficial_probability,
            },
            tuning.particle_spawn_interval,
            rng_seed,
        )
    }

    /// Threat spawner configuration derived from the simulation tuning.
    #[must_use]
    pub fn threats(tuning: &Tuning, rng_seed: u64) -> Self {
        Self::new(Population::Threats, tuning.threat_spawn_interval, rng_seed)
    }
}

/// Pure system that samples spawn delays, zones and positions.
#[derive(Debug)]
pub struct Spawning {
    population: Population,
    interval: IntervalRange,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            population: config.population,
            interval: config.interval,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Population this system feeds.
    #[must_use]
    pub fn population(&self) -> Population {
        self.population
    }

    /// Draws the delay to wait before the next spawn, uniform over the configured range.
    pub fn next_delay(&mut self) -> Duration {
        self.rng.gen_range(self.interval.min()..=self.interval.max())
    }

    /// Emits one spawn command in a uniformly chosen zone unless the session has ended.
    pub fn handle(&mut self, terminal: bool, zones: &[Zone], out: &mut Vec<Command>) {
        if terminal || zones.is_empty() {
            return;
        }

        let zone = &zones[self.rng.gen_range(0..zones.len())];
        let position = self.sample_position(zone);

        match self.population {
            Population::Particles {
                beneficial_probability,
            } => {
                let probability = if beneficial_probability.is_finite() {
                    beneficial_probability.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let kind = if self.rng.gen_bool(probability) {
                    ParticleKind::Beneficial
                } else {
                    ParticleKind::Neutral
                };
                out.push(Command::SpawnParticle { position, kind });
            }
            Population::Threats => out.push(Command::SpawnThreat { position }),
        }
    }

    fn sample_position(&mut self, zone: &Zone) -> Position {
        let (offset_x, offset_y) = zone.offset();
        let dx = self.rng.gen_range(0..zone.width().max(1));
        let dy = self.rng.gen_range(0..zone.height().max(1));
        Position::new(
            (i64::from(offset_x) + i64::from(dx)) as f32,
            (i64::from(offset_y) + i64::from(dy)) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_interval_yields_fixed_delay() {
        let interval = IntervalRange::new(Duration::from_secs(3), Duration::from_secs(3));
        let mut spawning = Spawning::new(Config::new(Population::Threats, interval, 7));
        assert_eq!(spawning.next_delay(), Duration::from_secs(3));
    }
}
