pub mod customer_loop;
pub mod kanban_loop;

pub use customer_loop::{CustomerLoop, CustomerStats};
pub use kanban_loop::{
    Backorder, BackorderDelivery, KanbanLoop, LoopSnapshot, LoopStats, StockoutPolicy, Withdrawal,
};
