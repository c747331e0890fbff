use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::FlockError;
use crate::flock::{Flock, StepStats};
use crate::params::{validate_agent_count, Params};

/// Owns a flock together with the parameters and random stream that drive it.
///
/// Every repopulation (agent count change, reset) draws from the same seeded
/// stream, so a run is a pure function of the seed and the sequence of calls.
#[derive(Clone, Debug)]
pub struct Simulator {
    params: Params,
    flock: Flock,
    rng: ChaCha8Rng,
    seed: u64,
    step_count: u64,
    last_stats: StepStats,
}

impl Simulator {
    pub fn new(mut params: Params, seed: u64) -> Result<Self, FlockError> {
        params.sanitize();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let flock = Flock::populate(params.num_agents, params.min_speed, &mut rng)?;
        log::info!("initialized flock of {} agents (seed {seed})", flock.len());

        Ok(Self {
            params,
            flock,
            rng,
            seed,
            step_count: 0,
            last_stats: StepStats::default(),
        })
    }

    /// Throws away the current flock and scatters `count` fresh agents from a
    /// stream reseeded with `seed`. On error nothing changes.
    pub fn initialize(&mut self, count: usize, seed: u64) -> Result<(), FlockError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let flock = Flock::populate(count, self.params.min_speed, &mut rng)?;
        log::info!("initialized flock of {count} agents (seed {seed})");

        self.params.num_agents = count;
        self.flock = flock;
        self.rng = rng;
        self.seed = seed;
        self.last_stats = StepStats::default();
        Ok(())
    }

    /// Replaces the parameters used by the next step. A different agent count
    /// repopulates the whole flock.
    pub fn set_params(&mut self, mut params: Params) -> Result<(), FlockError> {
        validate_agent_count(params.num_agents)?;
        params.sanitize();

        if params.num_agents != self.flock.len() {
            let flock = Flock::populate(params.num_agents, params.min_speed, &mut self.rng)?;
            log::info!(
                "agent count changed {} -> {}, repopulated flock",
                self.flock.len(),
                flock.len()
            );
            self.flock = flock;
            self.last_stats = StepStats::default();
        }

        self.params = params;
        Ok(())
    }

    /// Repopulates the flock with the current agent count.
    pub fn reset(&mut self) -> Result<(), FlockError> {
        self.flock = Flock::populate(self.params.num_agents, self.params.min_speed, &mut self.rng)?;
        self.last_stats = StepStats::default();
        log::debug!("reset flock of {} agents", self.flock.len());
        Ok(())
    }

    pub fn step(&mut self) -> StepStats {
        self.last_stats = self.flock.step(&self.params);
        self.step_count += 1;
        self.last_stats
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }
}

/// Reads a fresh seed from the operating system.
pub fn entropy_seed() -> Result<u64, FlockError> {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes).map_err(FlockError::Entropy)?;
    Ok(u64::from_le_bytes(bytes))
}
