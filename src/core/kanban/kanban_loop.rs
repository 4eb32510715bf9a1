use crate::core::topology::LoopDef;
use crate::core::types::{CustomerId, ItemId, LoopId, SimTime, WorkshopId};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What happens to demand a loop cannot serve from stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StockoutPolicy {
    /// Queue the unserved units and serve them FIFO at every following Replenish
    #[default]
    Backorder,
    /// Discard the unserved units; they are counted as lost
    Drop,
}

/// Outcome of a withdrawal request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Withdrawal {
    pub requested: u64,
    pub served: u64,
    /// Units not served now (backordered or lost, depending on policy)
    pub short: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Backorder {
    pub customer: Option<CustomerId>,
    pub units: u64,
    pub since: SimTime,
}

/// Backordered units handed over during a Replenish
#[derive(Debug, Clone, PartialEq)]
pub struct BackorderDelivery {
    pub kanban: LoopId,
    pub customer: Option<CustomerId>,
    pub units: u64,
    pub waited: SimTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopStats {
    pub orders_issued: u64,
    pub produced_batches: u64,
    pub produced_units: u64,
    pub consumed_units: u64,
    pub stockouts: u64,
    pub starvations: u64,
    pub lost_units: u64,
    /// Units of a batch beyond the cards attached to its order
    pub overproduced_units: u64,
    /// Optional component units requested by operations but not in stock
    pub optional_shortfall_units: u64,
    pub backorder_filled_units: u64,
}

/// Read-only view of a loop, safe to hand to a UI between clock advances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSnapshot {
    pub id: LoopId,
    pub name: String,
    pub kanbans_nb: u32,
    pub kanbans_qty: u32,
    pub red_zone: u32,
    pub full_cards: u32,
    pub open_card_units: u32,
    pub pending_batches: u32,
    pub in_flight_cards: u32,
    pub backorder_units: u64,
    pub stats: LoopStats,
}

/// Live card state of a kanban loop.
///
/// Cards cycle between full (in stock at the consuming workshop) and empty.
/// An empty card is either waiting on the board or attached to a production
/// order. Withdrawals draw from the open card first; opening a full card is
/// one Consume and sends that card back into circulation.
#[derive(Debug, Clone)]
pub struct KanbanLoop {
    id: LoopId,
    name: String,
    item: ItemId,
    workshop: WorkshopId,
    batch: u32,
    kanbans_nb: u32,
    kanbans_qty: u32,
    red_zone: u32,
    policy: StockoutPolicy,

    full_cards: u32,
    open_card_units: u32,
    pending_batches: u32,
    in_flight_cards: u32,
    backorders: VecDeque<Backorder>,

    stats: LoopStats,
}

impl KanbanLoop {
    pub fn new(def: &LoopDef, policy: StockoutPolicy) -> Self {
        Self {
            id: def.id,
            name: def.name.clone(),
            item: def.item,
            workshop: def.workshop,
            batch: def.batch,
            kanbans_nb: def.kanbans_nb,
            kanbans_qty: def.kanbans_qty,
            red_zone: def.red_zone,
            policy,
            full_cards: def.initial_full_cards,
            open_card_units: 0,
            pending_batches: 0,
            in_flight_cards: 0,
            backorders: VecDeque::new(),
            stats: LoopStats::default(),
        }
    }

    /// Withdraw one full card (kanbans_qty units). False when no card is full.
    pub fn consume(&mut self) -> bool {
        if !self.open_full_card() {
            return false;
        }
        self.stats.consumed_units += u64::from(self.kanbans_qty);
        true
    }

    /// Demand from a consumer outside the production network (customer loop).
    /// Shortfalls are counted as a stockout and handled by the loop's policy.
    pub fn withdraw(
        &mut self,
        units: u64,
        now: SimTime,
        customer: Option<CustomerId>,
    ) -> Withdrawal {
        if units == 0 {
            return Withdrawal::default();
        }

        // Earlier backorders are served first
        let served = if self.backorders.is_empty() {
            self.draw(units)
        } else {
            0
        };
        let short = units - served;

        if short > 0 {
            self.stats.stockouts += 1;
            match self.policy {
                StockoutPolicy::Backorder => {
                    self.backorders.push_back(Backorder {
                        customer,
                        units: short,
                        since: now,
                    });
                }
                StockoutPolicy::Drop => {
                    self.stats.lost_units += short;
                }
            }
            warn!(
                "t={:.3} stockout on loop '{}': {} of {} units unserved ({:?})",
                now, self.name, short, units, self.policy
            );
        }

        Withdrawal {
            requested: units,
            served,
            short,
        }
    }

    /// Units that can be drawn right now
    pub fn available_units(&self) -> u64 {
        u64::from(self.open_card_units) + u64::from(self.full_cards) * u64::from(self.kanbans_qty)
    }

    pub fn can_supply(&self, units: u64) -> bool {
        self.available_units() >= units
    }

    /// All-or-nothing draw for a mandatory component. Returns false and leaves
    /// the loop untouched when stock is insufficient.
    pub fn try_consume_units(&mut self, units: u64) -> bool {
        if !self.can_supply(units) {
            return false;
        }
        self.draw(units);
        true
    }

    /// Draw as much as possible of an optional component, returning units drawn
    pub fn consume_available(&mut self, units: u64) -> u64 {
        let drawn = self.draw(units);
        self.stats.optional_shortfall_units += units - drawn;
        drawn
    }

    /// Emit at most one production order. Returns the number of empty cards
    /// attached to it, or None when the loop is above its red zone or every
    /// empty card is already on order.
    pub fn check_reorder(&mut self) -> Option<u32> {
        if self.full_cards > self.red_zone {
            return None;
        }
        let unattached = self
            .kanbans_nb
            .saturating_sub(self.full_cards + self.in_flight_cards);
        if unattached == 0 {
            return None;
        }

        let cards = self.cards_per_batch().min(unattached);
        self.pending_batches += 1;
        self.in_flight_cards += cards;
        self.stats.orders_issued += 1;
        Some(cards)
    }

    /// A batch ordered with `cards` attached cards has been produced.
    /// Returns backorders served from the new stock.
    pub fn replenish(&mut self, cards: u32, now: SimTime) -> Vec<BackorderDelivery> {
        debug_assert!(self.pending_batches > 0, "replenish without a pending batch");
        debug_assert!(cards <= self.in_flight_cards);

        self.pending_batches = self.pending_batches.saturating_sub(1);
        self.in_flight_cards = self.in_flight_cards.saturating_sub(cards);
        self.full_cards = (self.full_cards + cards).min(self.kanbans_nb);

        let carried = u64::from(cards) * u64::from(self.kanbans_qty);
        self.stats.produced_batches += 1;
        self.stats.produced_units += u64::from(self.batch);
        self.stats.overproduced_units += u64::from(self.batch).saturating_sub(carried);

        debug!(
            "t={:.3} loop '{}' replenished: {} cards full, {} batches pending",
            now, self.name, self.full_cards, self.pending_batches
        );

        self.serve_backorders(now)
    }

    pub fn record_starvation(&mut self) {
        self.stats.starvations += 1;
    }

    /// Share of cards currently full; lower means more urgent
    pub fn fill_ratio(&self) -> f64 {
        f64::from(self.full_cards) / f64::from(self.kanbans_nb)
    }

    /// Card conservation and bounds
    pub fn invariants_hold(&self) -> bool {
        self.full_cards <= self.kanbans_nb
            && self.full_cards + self.in_flight_cards <= self.kanbans_nb
            && self.pending_batches <= self.in_flight_cards
            && self.open_card_units <= self.kanbans_qty
    }

    pub fn snapshot(&self) -> LoopSnapshot {
        LoopSnapshot {
            id: self.id,
            name: self.name.clone(),
            kanbans_nb: self.kanbans_nb,
            kanbans_qty: self.kanbans_qty,
            red_zone: self.red_zone,
            full_cards: self.full_cards,
            open_card_units: self.open_card_units,
            pending_batches: self.pending_batches,
            in_flight_cards: self.in_flight_cards,
            backorder_units: self.backorder_units(),
            stats: self.stats.clone(),
        }
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn workshop(&self) -> WorkshopId {
        self.workshop
    }

    pub fn batch(&self) -> u32 {
        self.batch
    }

    pub fn kanbans_nb(&self) -> u32 {
        self.kanbans_nb
    }

    pub fn kanbans_qty(&self) -> u32 {
        self.kanbans_qty
    }

    pub fn red_zone(&self) -> u32 {
        self.red_zone
    }

    pub fn cards_per_batch(&self) -> u32 {
        self.batch / self.kanbans_qty
    }

    pub fn full_cards(&self) -> u32 {
        self.full_cards
    }

    pub fn open_card_units(&self) -> u32 {
        self.open_card_units
    }

    pub fn pending_batches(&self) -> u32 {
        self.pending_batches
    }

    pub fn in_flight_cards(&self) -> u32 {
        self.in_flight_cards
    }

    pub fn backorder_units(&self) -> u64 {
        self.backorders.iter().map(|b| b.units).sum()
    }

    pub fn backorders(&self) -> impl Iterator<Item = &Backorder> {
        self.backorders.iter()
    }

    pub fn policy(&self) -> StockoutPolicy {
        self.policy
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    fn open_full_card(&mut self) -> bool {
        if self.full_cards == 0 {
            return false;
        }
        self.full_cards -= 1;
        true
    }

    /// Take up to `units`, opening full cards as needed. Returns units taken.
    fn draw(&mut self, units: u64) -> u64 {
        let mut remaining = units;
        while remaining > 0 {
            if self.open_card_units == 0 {
                if !self.open_full_card() {
                    break;
                }
                self.open_card_units = self.kanbans_qty;
            }
            let take = remaining.min(u64::from(self.open_card_units));
            // take <= open_card_units, which is a u32
            self.open_card_units -= take as u32;
            remaining -= take;
        }
        let drawn = units - remaining;
        self.stats.consumed_units += drawn;
        drawn
    }

    fn serve_backorders(&mut self, now: SimTime) -> Vec<BackorderDelivery> {
        let mut deliveries = Vec::new();
        while let Some(front) = self.backorders.front_mut() {
            let wanted = front.units;
            let customer = front.customer;
            let since = front.since;

            let drawn = self.draw(wanted);
            if drawn == 0 {
                break;
            }
            self.stats.backorder_filled_units += drawn;
            deliveries.push(BackorderDelivery {
                kanban: self.id,
                customer,
                units: drawn,
                waited: now - since,
            });

            if drawn < wanted {
                if let Some(front) = self.backorders.front_mut() {
                    front.units -= drawn;
                }
                break;
            }
            self.backorders.pop_front();
        }
        deliveries
    }
}
