pub mod config;
pub mod simulation;
pub mod sweep;

// Re-export commonly used types
pub use config::{ConcurrencyMode, SimulationConfig, SweepConfig};
pub use simulation::{Simulation, SimulationSnapshot};
pub use sweep::{run_seed_sweep, run_sweep, SweepCase};
