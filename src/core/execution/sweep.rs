use super::config::{ConcurrencyMode, SimulationConfig, SweepConfig};
use super::simulation::Simulation;
use crate::core::error::SimulationError;
use crate::core::results::SimulationResults;
use crate::core::topology::Topology;
use crate::core::types::SimTime;
use log::info;
use rayon::prelude::*;
use std::sync::Arc;

/// One independent run of a sweep
#[derive(Debug, Clone)]
pub struct SweepCase {
    pub topology: Arc<Topology>,
    pub config: SimulationConfig,
}

impl SweepCase {
    pub fn new(topology: Arc<Topology>, config: SimulationConfig) -> Self {
        Self { topology, config }
    }

    fn run(&self, duration: SimTime) -> Result<SimulationResults, SimulationError> {
        Simulation::new(Arc::clone(&self.topology), self.config.clone())?.run(duration)
    }
}

/// Run every case for `duration`. Results come back in case order whatever
/// the concurrency mode.
pub fn run_sweep(
    cases: &[SweepCase],
    duration: SimTime,
    sweep: &SweepConfig,
) -> Result<Vec<SimulationResults>, SimulationError> {
    info!(
        "Running sweep of {} cases ({:?}, pool size {:?})",
        cases.len(),
        sweep.concurrency_mode,
        sweep.thread_pool_size
    );

    match sweep.concurrency_mode {
        ConcurrencyMode::Sequential => cases.iter().map(|case| case.run(duration)).collect(),
        ConcurrencyMode::Rayon => match sweep.thread_pool_size {
            Some(size) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(size)
                    .build()
                    .map_err(|e| SimulationError::Config(format!("Failed to build thread pool: {}", e)))?;
                pool.install(|| cases.par_iter().map(|case| case.run(duration)).collect())
            }
            None => cases.par_iter().map(|case| case.run(duration)).collect(),
        },
    }
}

/// Same topology and settings, one run per seed
pub fn run_seed_sweep(
    topology: Arc<Topology>,
    base: &SimulationConfig,
    seeds: &[u64],
    duration: SimTime,
    sweep: &SweepConfig,
) -> Result<Vec<SimulationResults>, SimulationError> {
    let cases: Vec<SweepCase> = seeds
        .iter()
        .map(|&seed| SweepCase::new(Arc::clone(&topology), base.clone().with_seed(seed)))
        .collect();
    run_sweep(&cases, duration, sweep)
}
