use super::kanban_loop::{KanbanLoop, Withdrawal};
use crate::core::clock::SimulationClock;
use crate::core::error::InvalidScheduleError;
use crate::core::event::SimEvent;
use crate::core::event_scheduler::EventHandle;
use crate::core::topology::CustomerDef;
use crate::core::types::{CustomerId, LoopId, SimTime};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerStats {
    pub withdrawals: u64,
    pub demanded_units: u64,
    /// Served from stock at withdrawal time
    pub served_units: u64,
    /// Served later from backorders
    pub late_served_units: u64,
    /// Not served at withdrawal time
    pub short_units: u64,
}

/// External demand generator drawing finished goods from its terminal loop
#[derive(Debug, Clone)]
pub struct CustomerLoop {
    id: CustomerId,
    name: String,
    supplier: LoopId,
    period: SimTime,
    qty: u32,
    qty_alea_range: u32,
    period_alea_rate: f64,
    start_offset: SimTime,

    next_withdrawal: Option<EventHandle>,
    stopped: bool,
    stats: CustomerStats,
}

impl CustomerLoop {
    pub fn new(def: &CustomerDef) -> Self {
        Self {
            id: def.id,
            name: def.name.clone(),
            supplier: def.supplier,
            period: def.period,
            qty: def.qty,
            qty_alea_range: def.qty_alea_range,
            period_alea_rate: def.period_alea_rate,
            start_offset: def.start_offset,
            next_withdrawal: None,
            stopped: false,
            stats: CustomerStats::default(),
        }
    }

    /// Schedule the first withdrawal `start_offset` from now
    pub fn start(&mut self, clock: &mut SimulationClock) -> Result<(), InvalidScheduleError> {
        self.stopped = false;
        let handle = clock.schedule_in(
            SimEvent::CustomerWithdraw { customer: self.id },
            self.start_offset,
        )?;
        self.next_withdrawal = Some(handle);
        Ok(())
    }

    /// Withdraw a perturbed quantity from the terminal loop and schedule the
    /// next withdrawal after a perturbed period.
    pub fn on_withdraw(
        &mut self,
        kanban: &mut KanbanLoop,
        rng: &mut StdRng,
        clock: &mut SimulationClock,
    ) -> Result<Withdrawal, InvalidScheduleError> {
        self.next_withdrawal = None;
        if self.stopped {
            return Ok(Withdrawal::default());
        }

        // Draw order is fixed (quantity, then period) for replayable runs
        let units = self.sample_quantity(rng);
        let next_period = self.sample_period(rng);

        let withdrawal = kanban.withdraw(units, clock.now(), Some(self.id));
        self.stats.withdrawals += 1;
        self.stats.demanded_units += withdrawal.requested;
        self.stats.served_units += withdrawal.served;
        self.stats.short_units += withdrawal.short;

        debug!(
            "t={:.3} customer '{}' withdrew {}/{} units from '{}', next in {:.3}",
            clock.now(),
            self.name,
            withdrawal.served,
            withdrawal.requested,
            kanban.name(),
            next_period
        );

        let handle = clock.schedule_in(SimEvent::CustomerWithdraw { customer: self.id }, next_period)?;
        self.next_withdrawal = Some(handle);
        Ok(withdrawal)
    }

    /// Cancel the pending withdrawal. Returns false if the loop was not scheduled.
    pub fn stop(&mut self, clock: &mut SimulationClock) -> bool {
        self.stopped = true;
        match self.next_withdrawal.take() {
            Some(handle) => {
                info!("customer '{}' stopped at t={:.3}", self.name, clock.now());
                clock.cancel(handle)
            }
            None => false,
        }
    }

    pub fn credit_delivery(&mut self, units: u64) {
        self.stats.late_served_units += units;
    }

    /// `qty` perturbed by a whole number of units in `[-qty_alea_range, qty_alea_range]`
    pub fn sample_quantity(&self, rng: &mut StdRng) -> u64 {
        if self.qty_alea_range == 0 {
            return u64::from(self.qty);
        }
        let range = i64::from(self.qty_alea_range);
        let delta = rng.sample(Uniform::new_inclusive(-range, range));
        (i64::from(self.qty) + delta).max(0) as u64
    }

    /// `period` perturbed by up to `period * period_alea_rate` either way
    pub fn sample_period(&self, rng: &mut StdRng) -> SimTime {
        let spread = self.period * self.period_alea_rate;
        if spread <= 0.0 {
            return self.period;
        }
        let delta = rng.sample(Uniform::new_inclusive(-spread, spread));
        (self.period + delta).max(f64::MIN_POSITIVE)
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supplier(&self) -> LoopId {
        self.supplier
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn next_withdrawal(&self) -> Option<EventHandle> {
        self.next_withdrawal
    }

    pub fn stats(&self) -> &CustomerStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ItemId, WorkshopId};
    use rand::SeedableRng;

    fn customer(qty: u32, range: u32, rate: f64) -> CustomerLoop {
        CustomerLoop::new(&CustomerDef {
            id: CustomerId(0),
            name: "client".to_string(),
            item: ItemId(0),
            workshop: WorkshopId(0),
            supplier: LoopId(0),
            period: 10.0,
            qty,
            qty_alea_range: range,
            period_alea_rate: rate,
            start_offset: 10.0,
        })
    }

    #[test]
    fn test_unperturbed_sampling_is_constant() {
        let customer = customer(9, 0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(customer.sample_quantity(&mut rng), 9);
            assert_eq!(customer.sample_period(&mut rng), 10.0);
        }
    }

    #[test]
    fn test_sampling_stays_within_bounds() {
        let customer = customer(9, 2, 0.25);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let quantity = customer.sample_quantity(&mut rng);
            assert!((7..=11).contains(&quantity));
            let period = customer.sample_period(&mut rng);
            assert!((7.5..=12.5).contains(&period));
        }
    }

    #[test]
    fn test_quantity_never_negative() {
        let customer = customer(1, 5, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let samples: Vec<u64> = (0..200).map(|_| customer.sample_quantity(&mut rng)).collect();
        assert!(samples.contains(&0));
        assert!(samples.iter().all(|&q| q <= 6));
    }

    #[test]
    fn test_same_seed_same_draws() {
        let customer = customer(20, 3, 0.5);
        let mut first = StdRng::seed_from_u64(99);
        let mut second = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            assert_eq!(customer.sample_quantity(&mut first), customer.sample_quantity(&mut second));
            assert_eq!(customer.sample_period(&mut first), customer.sample_period(&mut second));
        }
    }
}
