//! Declarative topology records (`*Spec`, referencing each other by name)
//! and their validated, index-resolved counterparts (`*Def`).

use crate::core::types::{CustomerId, ItemId, LoopId, SimTime, WorkshopId};
use serde::{Deserialize, Serialize};

/// Whether a consumed component blocks production when missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    Mandatory,
    /// Tracked and consumed when available, never blocks (e.g. purchased fasteners)
    Optional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopSpec {
    pub name: String,
}

impl WorkshopSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// BOM edge: one unit of the operation's output consumes `quantity` units of `item`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NomenclatureLink {
    pub item: String,
    pub quantity: u32,
    pub requirement: Requirement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    pub workshop: String,
    pub duration: SimTime,
    pub batch_divisor: u32,
    pub links: Vec<NomenclatureLink>,
}

impl OperationSpec {
    pub fn new(
        name: impl Into<String>,
        workshop: impl Into<String>,
        duration: SimTime,
        batch_divisor: u32,
    ) -> Self {
        Self {
            name: name.into(),
            workshop: workshop.into(),
            duration,
            batch_divisor,
            links: Vec::new(),
        }
    }

    pub fn consumes(mut self, item: impl Into<String>, quantity: u32) -> Self {
        self.links.push(NomenclatureLink {
            item: item.into(),
            quantity,
            requirement: Requirement::Mandatory,
        });
        self
    }

    pub fn consumes_optional(mut self, item: impl Into<String>, quantity: u32) -> Self {
        self.links.push(NomenclatureLink {
            item: item.into(),
            quantity,
            requirement: Requirement::Optional,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    pub operations: Vec<OperationSpec>,
    pub unit_cost: Option<f64>,
}

impl ItemSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
            unit_cost: None,
        }
    }

    /// Append an operation to the routing
    pub fn operation(mut self, operation: OperationSpec) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn with_unit_cost(mut self, cost: f64) -> Self {
        self.unit_cost = Some(cost);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanLoopSpec {
    pub name: String,
    /// Item the loop replenishes
    pub item: String,
    /// Workshop consuming the loop's cards
    pub workshop: String,
    pub batch: u32,
    pub kanbans_nb: u32,
    pub kanbans_qty: u32,
    pub red_zone: u32,
    /// Cards full at the start of a run; all of them when unset
    pub initial_full_cards: Option<u32>,
}

impl KanbanLoopSpec {
    pub fn new(
        name: impl Into<String>,
        item: impl Into<String>,
        workshop: impl Into<String>,
        batch: u32,
        kanbans_nb: u32,
        kanbans_qty: u32,
        red_zone: u32,
    ) -> Self {
        Self {
            name: name.into(),
            item: item.into(),
            workshop: workshop.into(),
            batch,
            kanbans_nb,
            kanbans_qty,
            red_zone,
            initial_full_cards: None,
        }
    }

    pub fn with_initial_full_cards(mut self, cards: u32) -> Self {
        self.initial_full_cards = Some(cards);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerLoopSpec {
    pub name: String,
    pub item: String,
    /// Consuming workshop of the terminal loop the customer draws from
    pub workshop: String,
    pub period: SimTime,
    pub qty: u32,
    pub qty_alea_range: u32,
    pub period_alea_rate: f64,
    /// Time of the first withdrawal; one period when unset
    pub start_offset: Option<SimTime>,
}

impl CustomerLoopSpec {
    pub fn new(
        name: impl Into<String>,
        item: impl Into<String>,
        workshop: impl Into<String>,
        period: SimTime,
        qty: u32,
    ) -> Self {
        Self {
            name: name.into(),
            item: item.into(),
            workshop: workshop.into(),
            period,
            qty,
            qty_alea_range: 0,
            period_alea_rate: 0.0,
            start_offset: None,
        }
    }

    pub fn with_qty_alea_range(mut self, range: u32) -> Self {
        self.qty_alea_range = range;
        self
    }

    pub fn with_period_alea_rate(mut self, rate: f64) -> Self {
        self.period_alea_rate = rate;
        self
    }

    pub fn with_start_offset(mut self, offset: SimTime) -> Self {
        self.start_offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopDef {
    pub id: WorkshopId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDef {
    pub item: ItemId,
    pub quantity: u32,
    pub requirement: Requirement,
    /// Loop the component is drawn from. Always set for mandatory links.
    pub supplier: Option<LoopId>,
}

impl LinkDef {
    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Mandatory
    }

    /// Units consumed to produce `batch` units of the parent item
    pub fn units_for(&self, batch: u32) -> u64 {
        u64::from(self.quantity) * u64::from(batch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDef {
    pub name: String,
    pub workshop: WorkshopId,
    pub duration: SimTime,
    pub batch_divisor: u32,
    pub links: Vec<LinkDef>,
}

impl OperationDef {
    /// Time to run one batch through this operation
    pub fn processing_time(&self) -> SimTime {
        self.duration / f64::from(self.batch_divisor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub routing: Vec<OperationDef>,
    pub unit_cost: Option<f64>,
}

impl ItemDef {
    /// Items without a routing are bought, not produced
    pub fn is_purchased(&self) -> bool {
        self.routing.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopDef {
    pub id: LoopId,
    pub name: String,
    pub item: ItemId,
    pub workshop: WorkshopId,
    pub batch: u32,
    pub kanbans_nb: u32,
    pub kanbans_qty: u32,
    pub red_zone: u32,
    pub initial_full_cards: u32,
}

impl LoopDef {
    pub fn cards_per_batch(&self) -> u32 {
        self.batch / self.kanbans_qty
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDef {
    pub id: CustomerId,
    pub name: String,
    pub item: ItemId,
    pub workshop: WorkshopId,
    /// Terminal loop the customer withdraws from
    pub supplier: LoopId,
    pub period: SimTime,
    pub qty: u32,
    pub qty_alea_range: u32,
    pub period_alea_rate: f64,
    pub start_offset: SimTime,
}
