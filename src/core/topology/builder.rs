use super::bom_order::BomOrderBuilder;
use super::model::*;
use super::Topology;
use crate::core::error::ConfigurationError;
use crate::core::types::{CustomerId, ItemId, LoopId, WorkshopId};
use log::debug;
use std::collections::HashMap;

/// Validate declarative records and produce an immutable topology
pub fn build_topology(
    workshops: Vec<WorkshopSpec>,
    items: Vec<ItemSpec>,
    loops: Vec<KanbanLoopSpec>,
    customers: Vec<CustomerLoopSpec>,
) -> Result<Topology, ConfigurationError> {
    TopologyBuilder {
        workshops,
        items,
        loops,
        customers,
    }
    .build()
}

/// Fluent collector for topology records; all validation happens in `build()`
#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    workshops: Vec<WorkshopSpec>,
    items: Vec<ItemSpec>,
    loops: Vec<KanbanLoopSpec>,
    customers: Vec<CustomerLoopSpec>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workshop(mut self, name: impl Into<String>) -> Self {
        self.workshops.push(WorkshopSpec::new(name));
        self
    }

    pub fn item(mut self, item: ItemSpec) -> Self {
        self.items.push(item);
        self
    }

    pub fn kanban_loop(mut self, spec: KanbanLoopSpec) -> Self {
        self.loops.push(spec);
        self
    }

    pub fn customer_loop(mut self, spec: CustomerLoopSpec) -> Self {
        self.customers.push(spec);
        self
    }

    pub fn build(self) -> Result<Topology, ConfigurationError> {
        let workshop_ids = index_names("workshop", self.workshops.iter().map(|w| &w.name))?;
        let item_ids = index_names("item", self.items.iter().map(|i| &i.name))?;
        index_names("kanban loop", self.loops.iter().map(|l| &l.name))?;
        index_names("customer loop", self.customers.iter().map(|c| &c.name))?;

        let workshops: Vec<WorkshopDef> = self
            .workshops
            .iter()
            .enumerate()
            .map(|(index, spec)| WorkshopDef {
                id: WorkshopId(index),
                name: spec.name.clone(),
            })
            .collect();

        let loops = self
            .loops
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                resolve_loop(LoopId(index), spec, &self.items, &item_ids, &workshop_ids)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let items = self.resolve_items(&item_ids, &workshop_ids, &loops)?;
        check_component_capacity(&items, &loops)?;

        let customers = self
            .customers
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                resolve_customer(CustomerId(index), spec, &item_ids, &workshop_ids, &loops)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Built topology: {} workshops, {} items, {} kanban loops, {} customer loops",
            workshops.len(),
            items.len(),
            loops.len(),
            customers.len()
        );

        Ok(Topology {
            workshops,
            items,
            loops,
            customers,
        })
    }

    fn resolve_items(
        &self,
        item_ids: &HashMap<String, usize>,
        workshop_ids: &HashMap<String, usize>,
        loops: &[LoopDef],
    ) -> Result<Vec<ItemDef>, ConfigurationError> {
        // Reference and parameter checks first, so the BOM graph is well formed
        let mut edges = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            for operation in &item.operations {
                if !workshop_ids.contains_key(&operation.workshop) {
                    return Err(ConfigurationError::UnknownWorkshop {
                        owner: format!("operation '{}' of item '{}'", operation.name, item.name),
                        workshop: operation.workshop.clone(),
                    });
                }
                if !operation.duration.is_finite() || operation.duration < 0.0 {
                    return Err(invalid_operation(item, operation, "duration must be a non-negative number"));
                }
                if operation.batch_divisor == 0 {
                    return Err(invalid_operation(item, operation, "batch_divisor must be greater than 0"));
                }
                for link in &operation.links {
                    let component = item_ids.get(&link.item).ok_or_else(|| {
                        ConfigurationError::UnknownItem {
                            owner: format!("operation '{}' of item '{}'", operation.name, item.name),
                            item: link.item.clone(),
                        }
                    })?;
                    if link.quantity == 0 {
                        return Err(invalid_operation(
                            item,
                            operation,
                            &format!("quantity of '{}' must be greater than 0", link.item),
                        ));
                    }
                    edges.push((ItemId(*component), ItemId(index)));
                }
            }
        }

        let names: Vec<String> = self.items.iter().map(|item| item.name.clone()).collect();
        BomOrderBuilder::check_acyclic(&names, &edges)?;

        // Acyclic: now every component must also be declared before its consumer
        for &(component, consumer) in &edges {
            if component.0 > consumer.0 {
                return Err(ConfigurationError::ForwardReference {
                    item: names[consumer.0].clone(),
                    component: names[component.0].clone(),
                });
            }
        }

        let mut items = Vec::with_capacity(self.items.len());
        for (index, item) in self.items.iter().enumerate() {
            let mut routing = Vec::with_capacity(item.operations.len());
            for operation in &item.operations {
                let workshop = WorkshopId(workshop_ids[&operation.workshop]);
                let mut links = Vec::with_capacity(operation.links.len());
                for link in &operation.links {
                    let component = ItemId(item_ids[&link.item]);
                    let supplier = find_supplier(loops, component, workshop);
                    if supplier.is_none() && link.requirement == Requirement::Mandatory {
                        return Err(ConfigurationError::UnsuppliedComponent {
                            item: item.name.clone(),
                            operation: operation.name.clone(),
                            component: link.item.clone(),
                        });
                    }
                    links.push(LinkDef {
                        item: component,
                        quantity: link.quantity,
                        requirement: link.requirement,
                        supplier,
                    });
                }
                routing.push(OperationDef {
                    name: operation.name.clone(),
                    workshop,
                    duration: operation.duration,
                    batch_divisor: operation.batch_divisor,
                    links,
                });
            }
            items.push(ItemDef {
                id: ItemId(index),
                name: item.name.clone(),
                routing,
                unit_cost: item.unit_cost,
            });
        }

        Ok(items)
    }
}

fn index_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a String>,
) -> Result<HashMap<String, usize>, ConfigurationError> {
    let mut index = HashMap::new();
    for (position, name) in names.enumerate() {
        if index.insert(name.clone(), position).is_some() {
            return Err(ConfigurationError::DuplicateName {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(index)
}

fn invalid_operation(item: &ItemSpec, operation: &OperationSpec, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidOperation {
        item: item.name.clone(),
        operation: operation.name.clone(),
        reason: reason.to_string(),
    }
}

/// Prefer the loop delivering to the consuming workshop, else the first loop of the item
fn find_supplier(loops: &[LoopDef], item: ItemId, workshop: WorkshopId) -> Option<LoopId> {
    loops
        .iter()
        .find(|l| l.item == item && l.workshop == workshop)
        .or_else(|| loops.iter().find(|l| l.item == item))
        .map(|l| l.id)
}

/// A batch whose mandatory components exceed what the supplying loop can ever
/// hold would starve forever. Links of one operation drawing on the same loop
/// are summed.
fn check_component_capacity(items: &[ItemDef], loops: &[LoopDef]) -> Result<(), ConfigurationError> {
    for kanban in loops {
        for operation in &items[kanban.item.0].routing {
            let mut needs: Vec<(LoopId, u64)> = Vec::new();
            for link in operation.links.iter().filter(|link| link.is_required()) {
                if let Some(supplier) = link.supplier {
                    let units = link.units_for(kanban.batch);
                    match needs.iter_mut().find(|(id, _)| *id == supplier) {
                        Some((_, total)) => *total += units,
                        None => needs.push((supplier, units)),
                    }
                }
            }

            for (supplier, needed) in needs {
                let supplier = &loops[supplier.0];
                let capacity = u64::from(supplier.kanbans_nb) * u64::from(supplier.kanbans_qty);
                if needed > capacity {
                    return Err(ConfigurationError::UnsatisfiableComponent {
                        kanban: kanban.name.clone(),
                        component: items[supplier.item.0].name.clone(),
                        needed,
                        capacity,
                    });
                }
            }
        }
    }
    Ok(())
}

fn resolve_loop(
    id: LoopId,
    spec: &KanbanLoopSpec,
    items: &[ItemSpec],
    item_ids: &HashMap<String, usize>,
    workshop_ids: &HashMap<String, usize>,
) -> Result<LoopDef, ConfigurationError> {
    let owner = || format!("kanban loop '{}'", spec.name);
    let item = *item_ids
        .get(&spec.item)
        .ok_or_else(|| ConfigurationError::UnknownItem {
            owner: owner(),
            item: spec.item.clone(),
        })?;
    let workshop = *workshop_ids
        .get(&spec.workshop)
        .ok_or_else(|| ConfigurationError::UnknownWorkshop {
            owner: owner(),
            workshop: spec.workshop.clone(),
        })?;

    for (field, value) in [
        ("kanbans_nb", spec.kanbans_nb),
        ("kanbans_qty", spec.kanbans_qty),
        ("batch", spec.batch),
    ] {
        if value == 0 {
            return Err(ConfigurationError::NonPositive {
                name: spec.name.clone(),
                field,
            });
        }
    }

    if spec.batch % spec.kanbans_qty != 0 {
        return Err(ConfigurationError::BatchNotMultiple {
            name: spec.name.clone(),
            batch: spec.batch,
            kanbans_qty: spec.kanbans_qty,
        });
    }

    let initial_full_cards = spec.initial_full_cards.unwrap_or(spec.kanbans_nb);
    if initial_full_cards > spec.kanbans_nb {
        return Err(ConfigurationError::InitialCardsExceedCount {
            name: spec.name.clone(),
            initial: initial_full_cards,
            kanbans_nb: spec.kanbans_nb,
        });
    }

    if items[item].operations.is_empty() {
        return Err(ConfigurationError::NoRouting {
            name: spec.name.clone(),
            item: spec.item.clone(),
        });
    }

    Ok(LoopDef {
        id,
        name: spec.name.clone(),
        item: ItemId(item),
        workshop: WorkshopId(workshop),
        batch: spec.batch,
        kanbans_nb: spec.kanbans_nb,
        kanbans_qty: spec.kanbans_qty,
        red_zone: spec.red_zone,
        initial_full_cards,
    })
}

fn resolve_customer(
    id: CustomerId,
    spec: &CustomerLoopSpec,
    item_ids: &HashMap<String, usize>,
    workshop_ids: &HashMap<String, usize>,
    loops: &[LoopDef],
) -> Result<CustomerDef, ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidCustomerLoop {
        name: spec.name.clone(),
        reason: reason.to_string(),
    };

    let item = ItemId(*item_ids
        .get(&spec.item)
        .ok_or_else(|| ConfigurationError::UnknownItem {
            owner: format!("customer loop '{}'", spec.name),
            item: spec.item.clone(),
        })?);
    let workshop = WorkshopId(*workshop_ids
        .get(&spec.workshop)
        .ok_or_else(|| ConfigurationError::UnknownWorkshop {
            owner: format!("customer loop '{}'", spec.name),
            workshop: spec.workshop.clone(),
        })?);

    if !spec.period.is_finite() || spec.period <= 0.0 {
        return Err(invalid("period must be greater than 0"));
    }
    if spec.qty == 0 {
        return Err(invalid("qty must be greater than 0"));
    }
    if !(0.0..1.0).contains(&spec.period_alea_rate) {
        return Err(invalid("period_alea_rate must be within [0, 1)"));
    }
    let start_offset = spec.start_offset.unwrap_or(spec.period);
    if !start_offset.is_finite() || start_offset < 0.0 {
        return Err(invalid("start_offset must be a non-negative number"));
    }

    let supplier = loops
        .iter()
        .find(|l| l.item == item && l.workshop == workshop)
        .map(|l| l.id)
        .ok_or_else(|| ConfigurationError::UnboundCustomerLoop {
            name: spec.name.clone(),
            item: spec.item.clone(),
            workshop: spec.workshop.clone(),
        })?;

    Ok(CustomerDef {
        id,
        name: spec.name.clone(),
        item,
        workshop,
        supplier,
        period: spec.period,
        qty: spec.qty,
        qty_alea_range: spec.qty_alea_range,
        period_alea_rate: spec.period_alea_rate,
        start_offset,
    })
}
