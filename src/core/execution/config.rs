//! Configuration for kanban simulation runs
//!
//! `SimulationConfig` parameterizes one run; `SweepConfig` controls how a set
//! of independent runs is executed.

use crate::core::kanban::StockoutPolicy;
use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes for sweeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Runs execute one after the other on the calling thread
    #[default]
    Sequential,
    /// Runs are spread over a Rayon thread pool
    Rayon,
}

/// Configuration for a single simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated time units per wall-clock second, used when a driver paces
    /// the run in real time. Never changes simulated results.
    pub speed: f64,
    /// Seed of the run's random generator; entropy-seeded when unset
    pub seed: Option<u64>,
    /// What loops do with demand they cannot serve
    pub stockout_policy: StockoutPolicy,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration runs at speed 1, unseeded, with backorders
    pub fn new() -> Self {
        Self {
            speed: 1.0,
            seed: None,
            stockout_policy: StockoutPolicy::default(),
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_stockout_policy(mut self, policy: StockoutPolicy) -> Self {
        self.stockout_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err("Speed must be a positive number".to_string());
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for executing a set of independent runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// The concurrency mode to use for execution
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel execution
    /// Only relevant when concurrency_mode is Rayon; Rayon's global pool is used when unset
    pub thread_pool_size: Option<usize>,
}

impl SweepConfig {
    /// Sequential execution with no thread pool
    pub fn new() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.speed, 1.0);
        assert_eq!(config.seed, None);
        assert_eq!(config.stockout_policy, StockoutPolicy::Backorder);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SimulationConfig::new()
            .with_speed(60.0)
            .with_seed(42)
            .with_stockout_policy(StockoutPolicy::Drop);

        assert_eq!(config.speed, 60.0);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.stockout_policy, StockoutPolicy::Drop);
    }

    #[test]
    fn test_validation_rejects_bad_speed() {
        assert!(SimulationConfig::new().with_speed(0.0).validate().is_err());
        assert!(SimulationConfig::new().with_speed(-2.0).validate().is_err());
        assert!(SimulationConfig::new().with_speed(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_sweep_config_builder() {
        let config = SweepConfig::new()
            .with_concurrency(ConcurrencyMode::Rayon)
            .with_thread_pool_size(4);

        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
        assert_eq!(config.thread_pool_size, Some(4));
    }

    #[test]
    fn test_concurrency_mode_default() {
        assert_eq!(ConcurrencyMode::default(), ConcurrencyMode::Sequential);
        assert_eq!(SweepConfig::default().thread_pool_size, None);
    }
}
