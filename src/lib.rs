pub mod core;

// Re-export commonly used types
pub use crate::core::clock::{ClockObserver, ClockState, EventHandler, SimulationClock};
pub use crate::core::error::{ConfigurationError, InvalidScheduleError, SimulationError};
pub use crate::core::event::SimEvent;
pub use crate::core::execution::{
    run_seed_sweep, run_sweep, ConcurrencyMode, Simulation, SimulationConfig, SimulationSnapshot, SweepCase,
    SweepConfig,
};
pub use crate::core::kanban::{CustomerLoop, KanbanLoop, LoopSnapshot, StockoutPolicy};
pub use crate::core::results::SimulationResults;
pub use crate::core::topology::{
    build_topology, CustomerLoopSpec, ItemSpec, KanbanLoopSpec, OperationSpec, Requirement,
    Topology, TopologyBuilder, WorkshopSpec,
};
pub use crate::core::types::{CustomerId, ItemId, LoopId, SimTime, WorkshopId};
pub use crate::core::workshop::{Workshop, WorkshopSnapshot};
