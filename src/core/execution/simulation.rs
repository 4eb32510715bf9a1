use super::config::SimulationConfig;
use crate::core::clock::{ClockObserver, ClockState, EventHandler, SimulationClock};
use crate::core::error::SimulationError;
use crate::core::event::SimEvent;
use crate::core::kanban::{CustomerLoop, KanbanLoop, LoopSnapshot};
use crate::core::results::{CustomerResult, LoopResult, SimulationResults, WorkshopResult};
use crate::core::scheduler_engine::SchedulerEngine;
use crate::core::topology::Topology;
use crate::core::types::{CustomerId, LoopId, SimTime, WorkshopId};
use crate::core::workshop::{Workshop, WorkshopSnapshot};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Everything the clock's handlers mutate. Kept apart from the clock so both
/// can be borrowed mutably during dispatch.
struct SimulationState {
    engine: SchedulerEngine,
    customers: Vec<CustomerLoop>,
    rng: StdRng,
}

impl EventHandler for SimulationState {
    fn handle_event(
        &mut self,
        event: SimEvent,
        clock: &mut SimulationClock,
    ) -> Result<(), SimulationError> {
        match event {
            SimEvent::OperationComplete { workshop, order } => {
                self.engine.on_operation_complete(workshop, order, clock)?;
            }
            SimEvent::CustomerWithdraw { customer } => {
                let customer = &mut self.customers[customer.0];
                let kanban = self.engine.kanban_loop_mut(customer.supplier());
                customer.on_withdraw(kanban, &mut self.rng, clock)?;
            }
        }

        for delivery in self.engine.take_deliveries() {
            if let Some(customer) = delivery.customer {
                self.customers[customer.0].credit_delivery(delivery.units);
            }
        }

        self.engine.tick(clock)?;
        Ok(())
    }
}

/// Point-in-time view of a whole run for UI polling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSnapshot {
    pub time: SimTime,
    pub loops: Vec<LoopSnapshot>,
    pub workshops: Vec<WorkshopSnapshot>,
}

/// One simulation run over a shared topology. Owns all mutable state, so
/// independent instances can run on different threads.
pub struct Simulation {
    run_id: Uuid,
    topology: Arc<Topology>,
    config: SimulationConfig,
    clock: SimulationClock,
    state: SimulationState,
    started: bool,
}

impl Simulation {
    pub fn new(topology: Arc<Topology>, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate().map_err(SimulationError::Config)?;
        let state = Self::fresh_state(&topology, &config);
        Ok(Self {
            run_id: Uuid::new_v4(),
            topology,
            config,
            clock: SimulationClock::new(),
            state,
            started: false,
        })
    }

    fn fresh_state(topology: &Arc<Topology>, config: &SimulationConfig) -> SimulationState {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SimulationState {
            engine: SchedulerEngine::new(Arc::clone(topology), config.stockout_policy),
            customers: topology.customers().iter().map(CustomerLoop::new).collect(),
            rng,
        }
    }

    /// Schedule customer demand and issue orders for loops starting in their red zone
    fn start(&mut self) -> Result<(), SimulationError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        info!(
            "[run {}] starting: {} loops, {} workshops, {} customers, seed {:?}",
            self.run_id,
            self.topology.loops().len(),
            self.topology.workshops().len(),
            self.topology.customers().len(),
            self.config.seed
        );

        for customer in &mut self.state.customers {
            customer.start(&mut self.clock)?;
        }
        self.state.engine.tick(&mut self.clock)?;
        Ok(())
    }

    /// Run for `duration` time units from the current time and report results
    pub fn run(&mut self, duration: SimTime) -> Result<SimulationResults, SimulationError> {
        let end_time = self.clock.now() + duration;
        self.run_until(end_time)?;

        let results = self.results();
        info!(
            "[run {}] finished at t={:.3}: {} events, {} orders, {} stockouts",
            self.run_id,
            results.end_time,
            results.events_dispatched,
            results.orders_issued,
            results.total_stockouts()
        );
        Ok(results)
    }

    pub fn run_until(&mut self, end_time: SimTime) -> Result<SimTime, SimulationError> {
        // Checked before start() so a rejected horizon leaves the run untouched
        if !end_time.is_finite() {
            return Err(SimulationError::InvalidHorizon { end_time });
        }
        self.start()?;
        self.clock.run_until(end_time, &mut self.state)
    }

    /// Dispatch a single event. Returns its time, or None once the queue is drained.
    pub fn step(&mut self) -> Result<Option<SimTime>, SimulationError> {
        self.start()?;
        self.clock.advance(&mut self.state)
    }

    /// Advance simulated time by `elapsed` wall time scaled by the configured speed
    pub fn run_for_wall(&mut self, elapsed: Duration) -> Result<SimTime, SimulationError> {
        let end_time = self.clock.now() + elapsed.as_secs_f64() * self.config.speed;
        self.run_until(end_time)
    }

    /// Cancel a customer loop's pending withdrawal; no further demand is generated
    pub fn stop_customer(&mut self, customer: CustomerId) -> bool {
        self.state.customers[customer.0].stop(&mut self.clock)
    }

    /// Discard all run state and start over at time 0 with the same config
    pub fn reset(&mut self) {
        self.clock.reset();
        self.state = Self::fresh_state(&self.topology, &self.config);
        self.started = false;
        self.run_id = Uuid::new_v4();
    }

    pub fn add_observer(&mut self, observer: Box<dyn ClockObserver + Send>) {
        self.clock.add_observer(observer);
    }

    pub fn results(&self) -> SimulationResults {
        let now = self.clock.now();
        let engine = &self.state.engine;

        let loops = engine
            .loops()
            .iter()
            .map(|kanban| {
                let stats = kanban.stats();
                let on_hand = kanban.available_units();
                LoopResult {
                    name: kanban.name().to_string(),
                    full_cards: kanban.full_cards(),
                    open_card_units: kanban.open_card_units(),
                    pending_batches: kanban.pending_batches(),
                    produced_batches: stats.produced_batches,
                    produced_units: stats.produced_units,
                    consumed_units: stats.consumed_units,
                    stockouts: stats.stockouts,
                    starvations: stats.starvations,
                    backorder_units: kanban.backorder_units(),
                    lost_units: stats.lost_units,
                    overproduced_units: stats.overproduced_units,
                    stock_value: self
                        .topology
                        .item(kanban.item())
                        .unit_cost
                        .map(|cost| cost * on_hand as f64),
                }
            })
            .collect();

        let workshops = engine
            .workshops()
            .iter()
            .map(|workshop| WorkshopResult {
                name: workshop.name().to_string(),
                utilization: workshop.utilization(now),
                busy_time: workshop.busy_time_at(now),
                completed_operations: workshop.completed_operations(),
                queued_orders: workshop.queued_orders(),
            })
            .collect();

        let customers = self
            .state
            .customers
            .iter()
            .map(|customer| {
                let stats = customer.stats();
                CustomerResult {
                    name: customer.name().to_string(),
                    withdrawals: stats.withdrawals,
                    demanded_units: stats.demanded_units,
                    served_units: stats.served_units,
                    late_served_units: stats.late_served_units,
                    short_units: stats.short_units,
                }
            })
            .collect();

        SimulationResults {
            end_time: now,
            events_dispatched: self.clock.dispatched(),
            orders_issued: engine.orders_issued(),
            loops,
            workshops,
            customers,
        }
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        let now = self.clock.now();
        SimulationSnapshot {
            time: now,
            loops: self.state.engine.loops().iter().map(KanbanLoop::snapshot).collect(),
            workshops: self
                .state
                .engine
                .workshops()
                .iter()
                .map(|workshop| workshop.snapshot(now))
                .collect(),
        }
    }

    pub fn kanban_loop(&self, id: LoopId) -> &KanbanLoop {
        self.state.engine.kanban_loop(id)
    }

    pub fn workshop(&self, id: WorkshopId) -> &Workshop {
        self.state.engine.workshop(id)
    }

    pub fn customer(&self, id: CustomerId) -> &CustomerLoop {
        &self.state.customers[id.0]
    }

    pub fn engine(&self) -> &SchedulerEngine {
        &self.state.engine
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn pending_events(&self) -> usize {
        self.clock.pending_events()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}
