pub mod bom_order;
pub mod builder;
pub mod model;

pub use builder::{build_topology, TopologyBuilder};
pub use model::*;

use crate::core::types::{CustomerId, ItemId, LoopId, WorkshopId};
use serde::Serialize;

/// Validated production network. Immutable once built; share it between runs
/// behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    pub(crate) workshops: Vec<WorkshopDef>,
    pub(crate) items: Vec<ItemDef>,
    pub(crate) loops: Vec<LoopDef>,
    pub(crate) customers: Vec<CustomerDef>,
}

impl Topology {
    pub fn workshops(&self) -> &[WorkshopDef] {
        &self.workshops
    }

    pub fn items(&self) -> &[ItemDef] {
        &self.items
    }

    pub fn loops(&self) -> &[LoopDef] {
        &self.loops
    }

    pub fn customers(&self) -> &[CustomerDef] {
        &self.customers
    }

    pub fn workshop(&self, id: WorkshopId) -> &WorkshopDef {
        &self.workshops[id.0]
    }

    pub fn item(&self, id: ItemId) -> &ItemDef {
        &self.items[id.0]
    }

    pub fn kanban_loop(&self, id: LoopId) -> &LoopDef {
        &self.loops[id.0]
    }

    pub fn customer(&self, id: CustomerId) -> &CustomerDef {
        &self.customers[id.0]
    }

    pub fn workshop_id(&self, name: &str) -> Option<WorkshopId> {
        self.workshops.iter().find(|w| w.name == name).map(|w| w.id)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.items.iter().find(|i| i.name == name).map(|i| i.id)
    }

    pub fn loop_id(&self, name: &str) -> Option<LoopId> {
        self.loops.iter().find(|l| l.name == name).map(|l| l.id)
    }

    pub fn customer_id(&self, name: &str) -> Option<CustomerId> {
        self.customers.iter().find(|c| c.name == name).map(|c| c.id)
    }
}
