use super::types::{OrderId, SimTime};
use thiserror::Error;

/// Errors detected while building a topology. Always fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{owner} references unknown workshop '{workshop}'")]
    UnknownWorkshop { owner: String, workshop: String },

    #[error("{owner} references unknown item '{item}'")]
    UnknownItem { owner: String, item: String },

    #[error("item '{item}' consumes '{component}' which is declared after it")]
    ForwardReference { item: String, component: String },

    #[error("bill of materials is cyclic between items: {}", items.join(", "))]
    CyclicBom { items: Vec<String> },

    #[error("kanban loop '{name}': batch {batch} is not a multiple of kanbans_qty {kanbans_qty}")]
    BatchNotMultiple {
        name: String,
        batch: u32,
        kanbans_qty: u32,
    },

    #[error("kanban loop '{name}': {field} must be greater than 0")]
    NonPositive { name: String, field: &'static str },

    #[error("kanban loop '{name}': initial_full_cards {initial} exceeds kanbans_nb {kanbans_nb}")]
    InitialCardsExceedCount {
        name: String,
        initial: u32,
        kanbans_nb: u32,
    },

    #[error("kanban loop '{name}' replenishes item '{item}' which has no routing")]
    NoRouting { name: String, item: String },

    #[error("operation '{operation}' of item '{item}' requires '{component}' but no kanban loop supplies it")]
    UnsuppliedComponent {
        item: String,
        operation: String,
        component: String,
    },

    #[error("kanban loop '{kanban}' needs {needed} units of '{component}' per batch but its supplying loop holds at most {capacity}")]
    UnsatisfiableComponent {
        kanban: String,
        component: String,
        needed: u64,
        capacity: u64,
    },

    #[error("operation '{operation}' of item '{item}': {reason}")]
    InvalidOperation {
        item: String,
        operation: String,
        reason: String,
    },

    #[error("customer loop '{name}': {reason}")]
    InvalidCustomerLoop { name: String, reason: String },

    #[error("customer loop '{name}': no kanban loop supplies item '{item}' to workshop '{workshop}'")]
    UnboundCustomerLoop {
        name: String,
        item: String,
        workshop: String,
    },
}

/// Attempt to schedule an event before the current clock time.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
#[error("cannot schedule event at {at_time}: clock is already at {now}")]
pub struct InvalidScheduleError {
    pub at_time: SimTime,
    pub now: SimTime,
}

/// Errors surfaced by the run interface
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    InvalidSchedule(#[from] InvalidScheduleError),

    #[error("invalid simulation config: {0}")]
    Config(String),

    #[error("cannot run until {end_time}: end time must be finite")]
    InvalidHorizon { end_time: SimTime },

    #[error("order {order} started without {needed} units from kanban loop '{kanban}'")]
    ComponentShortage {
        order: OrderId,
        kanban: String,
        needed: u64,
    },
}
