use super::types::SimTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopResult {
    pub name: String,
    pub full_cards: u32,
    pub open_card_units: u32,
    pub pending_batches: u32,
    pub produced_batches: u64,
    pub produced_units: u64,
    pub consumed_units: u64,
    pub stockouts: u64,
    pub starvations: u64,
    /// Backordered units still outstanding at the end of the run
    pub backorder_units: u64,
    pub lost_units: u64,
    pub overproduced_units: u64,
    /// Stock on hand valued at the item's unit cost, when it has one
    pub stock_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopResult {
    pub name: String,
    pub utilization: f64,
    pub busy_time: SimTime,
    pub completed_operations: u64,
    pub queued_orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerResult {
    pub name: String,
    pub withdrawals: u64,
    pub demanded_units: u64,
    pub served_units: u64,
    pub late_served_units: u64,
    pub short_units: u64,
}

/// Outcome of a run, in topology declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    pub end_time: SimTime,
    pub events_dispatched: u64,
    pub orders_issued: u64,
    pub loops: Vec<LoopResult>,
    pub workshops: Vec<WorkshopResult>,
    pub customers: Vec<CustomerResult>,
}

impl SimulationResults {
    pub fn loop_result(&self, name: &str) -> Option<&LoopResult> {
        self.loops.iter().find(|result| result.name == name)
    }

    pub fn workshop_result(&self, name: &str) -> Option<&WorkshopResult> {
        self.workshops.iter().find(|result| result.name == name)
    }

    pub fn customer_result(&self, name: &str) -> Option<&CustomerResult> {
        self.customers.iter().find(|result| result.name == name)
    }

    pub fn total_stockouts(&self) -> u64 {
        self.loops.iter().map(|result| result.stockouts).sum()
    }

    /// Units withdrawn by customers, on time or from backorders
    pub fn total_delivered_units(&self) -> u64 {
        self.customers
            .iter()
            .map(|result| result.served_units + result.late_served_units)
            .sum()
    }
}
