use super::event_scheduler::EventHandle;
use super::topology::WorkshopDef;
use super::types::{ItemId, LoopId, OrderId, SimTime, WorkshopId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A batch of `units` ordered by a kanban loop, moving along its item's routing
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionOrder {
    pub id: OrderId,
    pub kanban: LoopId,
    pub item: ItemId,
    pub units: u32,
    /// Empty cards of the loop travelling with the batch
    pub cards: u32,
    /// Index of the routing operation the order waits for or runs
    pub step: usize,
    pub issued_at: SimTime,
    /// Set while the order is blocked on a missing mandatory component
    pub starved: bool,
}

#[derive(Debug, Clone)]
struct InProgress {
    order: ProductionOrder,
    started_at: SimTime,
    completes_at: SimTime,
    handle: EventHandle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopSnapshot {
    pub id: WorkshopId,
    pub name: String,
    pub busy: bool,
    pub current_order: Option<OrderId>,
    pub current_loop: Option<LoopId>,
    pub completes_at: Option<SimTime>,
    pub queued_orders: usize,
    pub starved_orders: usize,
    pub completed_operations: u64,
    pub busy_time: SimTime,
    pub utilization: f64,
}

/// Runtime state of a workshop: one order in progress at most, FIFO queue behind it
#[derive(Debug, Clone)]
pub struct Workshop {
    id: WorkshopId,
    name: String,
    queue: VecDeque<ProductionOrder>,
    in_progress: Option<InProgress>,
    busy_time: SimTime,
    completed_operations: u64,
}

impl Workshop {
    pub fn new(def: &WorkshopDef) -> Self {
        Self {
            id: def.id,
            name: def.name.clone(),
            queue: VecDeque::new(),
            in_progress: None,
            busy_time: 0.0,
            completed_operations: 0,
        }
    }

    pub fn enqueue(&mut self, order: ProductionOrder) {
        self.queue.push_back(order);
    }

    pub fn is_idle(&self) -> bool {
        self.in_progress.is_none()
    }

    pub fn queue(&self) -> impl Iterator<Item = &ProductionOrder> {
        self.queue.iter()
    }

    pub(crate) fn queue_mut(&mut self) -> impl Iterator<Item = &mut ProductionOrder> {
        self.queue.iter_mut()
    }

    pub(crate) fn take_queued(&mut self, index: usize) -> Option<ProductionOrder> {
        self.queue.remove(index)
    }

    pub(crate) fn start(
        &mut self,
        order: ProductionOrder,
        now: SimTime,
        completes_at: SimTime,
        handle: EventHandle,
    ) {
        debug_assert!(self.in_progress.is_none(), "workshop already busy");
        self.in_progress = Some(InProgress {
            order,
            started_at: now,
            completes_at,
            handle,
        });
    }

    /// Finish the order in progress if it is `order`
    pub(crate) fn complete(&mut self, order: OrderId, now: SimTime) -> Option<ProductionOrder> {
        match &self.in_progress {
            Some(running) if running.order.id == order => {}
            _ => return None,
        }
        let running = self.in_progress.take()?;
        self.busy_time += now - running.started_at;
        self.completed_operations += 1;
        Some(running.order)
    }

    pub fn current_order(&self) -> Option<&ProductionOrder> {
        self.in_progress.as_ref().map(|running| &running.order)
    }

    pub fn completion_handle(&self) -> Option<EventHandle> {
        self.in_progress.as_ref().map(|running| running.handle)
    }

    /// Busy time including the share of the running operation elapsed by `now`
    pub fn busy_time_at(&self, now: SimTime) -> SimTime {
        let running = self
            .in_progress
            .as_ref()
            .map(|running| (now - running.started_at).max(0.0))
            .unwrap_or(0.0);
        self.busy_time + running
    }

    pub fn utilization(&self, now: SimTime) -> f64 {
        if now <= 0.0 {
            return 0.0;
        }
        (self.busy_time_at(now) / now).min(1.0)
    }

    pub fn snapshot(&self, now: SimTime) -> WorkshopSnapshot {
        WorkshopSnapshot {
            id: self.id,
            name: self.name.clone(),
            busy: self.in_progress.is_some(),
            current_order: self.in_progress.as_ref().map(|running| running.order.id),
            current_loop: self.in_progress.as_ref().map(|running| running.order.kanban),
            completes_at: self.in_progress.as_ref().map(|running| running.completes_at),
            queued_orders: self.queue.len(),
            starved_orders: self.queue.iter().filter(|order| order.starved).count(),
            completed_operations: self.completed_operations,
            busy_time: self.busy_time_at(now),
            utilization: self.utilization(now),
        }
    }

    pub fn id(&self) -> WorkshopId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queued_orders(&self) -> usize {
        self.queue.len()
    }

    pub fn completed_operations(&self) -> u64 {
        self.completed_operations
    }
}
