pub mod clock;
pub mod error;
pub mod event;
pub mod event_scheduler;
pub mod execution;
pub mod kanban;
pub mod results;
pub mod scheduler_engine;
pub mod topology;
pub mod types;
pub mod workshop;

#[cfg(test)]
mod tests;
