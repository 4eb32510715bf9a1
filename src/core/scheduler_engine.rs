use super::clock::SimulationClock;
use super::error::SimulationError;
use super::event::SimEvent;
use super::kanban::{BackorderDelivery, KanbanLoop, StockoutPolicy};
use super::topology::Topology;
use super::types::{LoopId, OrderId, SimTime, WorkshopId};
use super::workshop::{ProductionOrder, Workshop};
use log::{debug, info, warn};
use std::sync::Arc;

/// Owns loop card states and workshop queues, turns red-zone signals into
/// production orders and runs them through the routings.
pub struct SchedulerEngine {
    topology: Arc<Topology>,
    loops: Vec<KanbanLoop>,
    workshops: Vec<Workshop>,
    next_order_id: OrderId,
    /// Backorders served since the last `take_deliveries()`
    deliveries: Vec<BackorderDelivery>,
}

impl SchedulerEngine {
    pub fn new(topology: Arc<Topology>, policy: StockoutPolicy) -> Self {
        let loops = topology
            .loops()
            .iter()
            .map(|def| KanbanLoop::new(def, policy))
            .collect();
        let workshops = topology.workshops().iter().map(Workshop::new).collect();

        Self {
            topology,
            loops,
            workshops,
            next_order_id: 0,
            deliveries: Vec::new(),
        }
    }

    /// One scheduling pass at the current time: issue red-zone orders and start
    /// every idle workshop that has a ready order, until nothing changes.
    /// Returns the number of operations started.
    pub fn tick(&mut self, clock: &mut SimulationClock) -> Result<usize, SimulationError> {
        let mut total_started = 0;
        loop {
            let issued = self.issue_orders(clock.now());

            let mut started = 0;
            for index in 0..self.workshops.len() {
                if self.workshops[index].is_idle() && self.try_start(WorkshopId(index), clock)? {
                    started += 1;
                }
            }
            total_started += started;

            // Starting operations consumes components, which may push
            // component loops into their red zone
            if issued == 0 && started == 0 {
                break;
            }
        }
        Ok(total_started)
    }

    /// CheckReorder on every loop in declaration order
    pub fn issue_orders(&mut self, now: SimTime) -> usize {
        let mut issued = 0;
        for index in 0..self.loops.len() {
            while let Some(cards) = self.loops[index].check_reorder() {
                let kanban = &self.loops[index];
                let item = self.topology.item(kanban.item());
                let first_workshop = item.routing[0].workshop;

                let order = ProductionOrder {
                    id: self.next_order_id,
                    kanban: kanban.id(),
                    item: kanban.item(),
                    units: kanban.batch(),
                    cards,
                    step: 0,
                    issued_at: now,
                    starved: false,
                };
                self.next_order_id += 1;

                info!(
                    "t={:.3} loop '{}' at {}/{} full cards: order {} for {} x '{}' ({} cards) queued at '{}'",
                    now,
                    kanban.name(),
                    kanban.full_cards(),
                    kanban.kanbans_nb(),
                    order.id,
                    order.units,
                    item.name,
                    cards,
                    self.workshops[first_workshop.0].name()
                );

                self.workshops[first_workshop.0].enqueue(order);
                issued += 1;
            }
        }
        issued
    }

    /// Start the most urgent ready order queued at an idle workshop
    fn try_start(
        &mut self,
        workshop: WorkshopId,
        clock: &mut SimulationClock,
    ) -> Result<bool, SimulationError> {
        let now = clock.now();

        let readiness: Vec<bool> = self.workshops[workshop.0]
            .queue()
            .map(|order| self.components_ready(order))
            .collect();

        // A blocked order counts as one starvation event per blocking episode
        let mut newly_starved = Vec::new();
        for (order, ready) in self.workshops[workshop.0].queue_mut().zip(&readiness) {
            if !ready && !order.starved {
                order.starved = true;
                newly_starved.push((order.id, order.kanban));
            }
        }
        for (order_id, kanban) in newly_starved {
            self.loops[kanban.0].record_starvation();
            debug!(
                "t={:.3} order {} for loop '{}' starved at '{}'",
                now,
                order_id,
                self.loops[kanban.0].name(),
                self.workshops[workshop.0].name()
            );
        }

        let chosen = self.workshops[workshop.0]
            .queue()
            .enumerate()
            .filter(|(index, _)| readiness[*index])
            .min_by(|(_, a), (_, b)| {
                self.loops[a.kanban.0]
                    .fill_ratio()
                    .total_cmp(&self.loops[b.kanban.0].fill_ratio())
                    .then_with(|| a.kanban.cmp(&b.kanban))
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|(index, _)| index);

        let mut order = match chosen.and_then(|index| self.workshops[workshop.0].take_queued(index)) {
            Some(order) => order,
            None => return Ok(false),
        };
        order.starved = false;

        let operation = &self.topology.item(order.item).routing[order.step];

        // Readiness only covers mandatory needs, so they draw before any optional link
        for link in operation.links.iter().filter(|link| link.is_required()) {
            if let Some(supplier) = link.supplier {
                let units = link.units_for(order.units);
                if !self.loops[supplier.0].try_consume_units(units) {
                    return Err(SimulationError::ComponentShortage {
                        order: order.id,
                        kanban: self.loops[supplier.0].name().to_string(),
                        needed: units,
                    });
                }
            }
        }

        for link in operation.links.iter().filter(|link| !link.is_required()) {
            let supplier = match link.supplier {
                Some(supplier) => supplier,
                // Purchased outside the kanban network
                None => continue,
            };
            let units = link.units_for(order.units);
            let drawn = self.loops[supplier.0].consume_available(units);
            if drawn < units {
                debug!(
                    "t={:.3} optional component '{}' short by {} units for order {}",
                    now,
                    self.loops[supplier.0].name(),
                    units - drawn,
                    order.id
                );
            }
        }

        let completes_at = now + operation.processing_time();
        let handle = clock.schedule(
            SimEvent::OperationComplete {
                workshop,
                order: order.id,
            },
            completes_at,
        )?;

        debug!(
            "t={:.3} '{}' started '{}' of order {} until t={:.3}",
            now,
            self.workshops[workshop.0].name(),
            operation.name,
            order.id,
            completes_at
        );

        self.workshops[workshop.0].start(order, now, completes_at, handle);
        Ok(true)
    }

    /// Every mandatory component of the order's current operation is in stock.
    /// Needs are summed per supplying loop.
    fn components_ready(&self, order: &ProductionOrder) -> bool {
        let operation = &self.topology.item(order.item).routing[order.step];
        let mut needs: Vec<(LoopId, u64)> = Vec::new();
        for link in operation.links.iter().filter(|link| link.is_required()) {
            if let Some(supplier) = link.supplier {
                let units = link.units_for(order.units);
                match needs.iter_mut().find(|(id, _)| *id == supplier) {
                    Some((_, total)) => *total += units,
                    None => needs.push((supplier, units)),
                }
            }
        }
        needs
            .iter()
            .all(|(supplier, units)| self.loops[supplier.0].can_supply(*units))
    }

    /// Completion of the running operation at `workshop`: move the order to the
    /// next routing step or replenish its loop
    pub fn on_operation_complete(
        &mut self,
        workshop: WorkshopId,
        order_id: OrderId,
        clock: &mut SimulationClock,
    ) -> Result<(), SimulationError> {
        let now = clock.now();
        let mut order = match self.workshops[workshop.0].complete(order_id, now) {
            Some(order) => order,
            None => {
                warn!(
                    "t={:.3} completion of order {} ignored: not running at '{}'",
                    now,
                    order_id,
                    self.workshops[workshop.0].name()
                );
                return Ok(());
            }
        };

        let routing = &self.topology.item(order.item).routing;
        order.step += 1;
        if order.step < routing.len() {
            let next = routing[order.step].workshop;
            debug!(
                "t={:.3} order {} moves to '{}' for '{}'",
                now,
                order.id,
                self.workshops[next.0].name(),
                routing[order.step].name
            );
            self.workshops[next.0].enqueue(order);
        } else {
            let deliveries = self.loops[order.kanban.0].replenish(order.cards, now);
            self.deliveries.extend(deliveries);
        }
        Ok(())
    }

    pub fn take_deliveries(&mut self) -> Vec<BackorderDelivery> {
        std::mem::take(&mut self.deliveries)
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn kanban_loop(&self, id: LoopId) -> &KanbanLoop {
        &self.loops[id.0]
    }

    pub fn kanban_loop_mut(&mut self, id: LoopId) -> &mut KanbanLoop {
        &mut self.loops[id.0]
    }

    pub fn loops(&self) -> &[KanbanLoop] {
        &self.loops
    }

    pub fn workshop(&self, id: WorkshopId) -> &Workshop {
        &self.workshops[id.0]
    }

    pub fn workshops(&self) -> &[Workshop] {
        &self.workshops
    }

    /// Orders issued so far in this run
    pub fn orders_issued(&self) -> OrderId {
        self.next_order_id
    }
}
