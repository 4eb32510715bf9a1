// Tests for KanbanLoop card accounting
#[cfg(test)]
mod tests {
    use crate::core::kanban::{KanbanLoop, StockoutPolicy};
    use crate::core::topology::LoopDef;
    use crate::core::types::{CustomerId, ItemId, LoopId, WorkshopId};

    fn loop_def(batch: u32, kanbans_nb: u32, kanbans_qty: u32, red_zone: u32, initial: u32) -> LoopDef {
        LoopDef {
            id: LoopId(0),
            name: "test_loop".to_string(),
            item: ItemId(0),
            workshop: WorkshopId(0),
            batch,
            kanbans_nb,
            kanbans_qty,
            red_zone,
            initial_full_cards: initial,
        }
    }

    #[test]
    fn test_red_zone_issues_single_order() {
        let mut kanban = KanbanLoop::new(&loop_def(256, 2, 128, 1, 2), StockoutPolicy::Backorder);
        assert_eq!(kanban.full_cards(), 2);
        assert_eq!(kanban.check_reorder(), None, "above the red zone");

        assert!(kanban.consume());
        assert_eq!(kanban.full_cards(), 1);
        assert_eq!(kanban.stats().consumed_units, 128);

        // Only one empty card exists, so only one order carries it
        assert_eq!(kanban.check_reorder(), Some(1));
        assert_eq!(kanban.pending_batches(), 1);
        for _ in 0..5 {
            assert_eq!(kanban.check_reorder(), None);
        }
        assert_eq!(kanban.pending_batches(), 1);

        let deliveries = kanban.replenish(1, 57.5);
        assert!(deliveries.is_empty());
        assert_eq!(kanban.full_cards(), 2);
        assert_eq!(kanban.pending_batches(), 0);
        assert_eq!(kanban.in_flight_cards(), 0);
        assert_eq!(kanban.stats().produced_batches, 1);
        assert_eq!(kanban.stats().produced_units, 256);
        assert_eq!(kanban.stats().overproduced_units, 128);
        assert!(kanban.invariants_hold());
    }

    #[test]
    fn test_order_carries_a_batch_worth_of_cards() {
        let mut kanban = KanbanLoop::new(&loop_def(20, 4, 10, 1, 0), StockoutPolicy::Backorder);

        assert_eq!(kanban.check_reorder(), Some(2));
        assert_eq!(kanban.check_reorder(), Some(2));
        assert_eq!(kanban.check_reorder(), None);
        assert_eq!(kanban.pending_batches(), 2);
        assert_eq!(kanban.in_flight_cards(), 4);

        kanban.replenish(2, 5.0);
        assert_eq!(kanban.full_cards(), 2);
        assert_eq!(kanban.stats().overproduced_units, 0);
        assert!(kanban.invariants_hold());
    }

    #[test]
    fn test_red_zone_above_card_count_is_capped() {
        let mut kanban = KanbanLoop::new(&loop_def(4, 2, 4, 5, 2), StockoutPolicy::Backorder);

        // Every card is full, nothing to attach
        assert_eq!(kanban.check_reorder(), None);

        kanban.consume();
        assert_eq!(kanban.check_reorder(), Some(1));
        assert_eq!(kanban.check_reorder(), None);

        kanban.consume();
        assert_eq!(kanban.check_reorder(), Some(1));
        assert_eq!(kanban.check_reorder(), None);
        assert_eq!(kanban.in_flight_cards(), 2);
        assert!(kanban.invariants_hold());
    }

    #[test]
    fn test_consume_on_empty_loop_fails() {
        let mut kanban = KanbanLoop::new(&loop_def(4, 2, 4, 1, 0), StockoutPolicy::Backorder);
        assert!(!kanban.consume());
        assert_eq!(kanban.stats().consumed_units, 0);
    }

    #[test]
    fn test_withdraw_draws_open_card_first() {
        let mut kanban = KanbanLoop::new(&loop_def(10, 3, 10, 0, 3), StockoutPolicy::Backorder);

        let first = kanban.withdraw(4, 1.0, None);
        assert_eq!(first.served, 4);
        assert_eq!(kanban.full_cards(), 2);
        assert_eq!(kanban.open_card_units(), 6);

        let second = kanban.withdraw(8, 2.0, None);
        assert_eq!(second.served, 8);
        assert_eq!(second.short, 0);
        assert_eq!(kanban.full_cards(), 1);
        assert_eq!(kanban.open_card_units(), 8);
        assert_eq!(kanban.available_units(), 18);
        assert_eq!(kanban.stats().consumed_units, 12);
        assert_eq!(kanban.stats().stockouts, 0);
    }

    #[test]
    fn test_backorders_served_fifo_on_replenish() {
        let mut kanban = KanbanLoop::new(&loop_def(10, 2, 5, 0, 1), StockoutPolicy::Backorder);
        let customer = Some(CustomerId(0));

        let first = kanban.withdraw(8, 1.0, customer);
        assert_eq!(first.served, 5);
        assert_eq!(first.short, 3);

        // Stock is gone and earlier demand waits, so this is short entirely
        let second = kanban.withdraw(2, 2.0, customer);
        assert_eq!(second.served, 0);
        assert_eq!(second.short, 2);

        assert_eq!(kanban.stats().stockouts, 2);
        assert_eq!(kanban.backorder_units(), 5);
        assert_eq!(kanban.available_units(), 0);

        assert_eq!(kanban.check_reorder(), Some(2));
        let deliveries = kanban.replenish(2, 12.0);

        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].units, 3);
        assert_eq!(deliveries[0].waited, 11.0);
        assert_eq!(deliveries[1].units, 2);
        assert_eq!(deliveries[1].waited, 10.0);
        assert!(deliveries.iter().all(|d| d.customer == customer));

        assert_eq!(kanban.backorder_units(), 0);
        assert_eq!(kanban.available_units(), 5);
        assert_eq!(kanban.stats().backorder_filled_units, 5);
        assert!(kanban.invariants_hold());
    }

    #[test]
    fn test_partial_backorder_stays_at_front() {
        let mut kanban = KanbanLoop::new(&loop_def(5, 2, 5, 0, 0), StockoutPolicy::Backorder);

        kanban.withdraw(7, 0.0, None);
        assert_eq!(kanban.backorder_units(), 7);

        assert_eq!(kanban.check_reorder(), Some(1));
        let deliveries = kanban.replenish(1, 3.0);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].units, 5);
        assert_eq!(kanban.backorder_units(), 2);
        assert_eq!(kanban.backorders().count(), 1);
    }

    #[test]
    fn test_drop_policy_loses_unserved_units() {
        let mut kanban = KanbanLoop::new(&loop_def(10, 2, 5, 0, 1), StockoutPolicy::Drop);

        let withdrawal = kanban.withdraw(8, 1.0, None);
        assert_eq!(withdrawal.served, 5);
        assert_eq!(withdrawal.short, 3);
        assert_eq!(kanban.stats().lost_units, 3);
        assert_eq!(kanban.stats().stockouts, 1);
        assert_eq!(kanban.backorder_units(), 0);

        // Next demand is served from new stock directly
        kanban.check_reorder();
        assert!(kanban.replenish(2, 4.0).is_empty());
        assert_eq!(kanban.withdraw(4, 5.0, None).served, 4);
    }

    #[test]
    fn test_mandatory_draw_is_all_or_nothing() {
        let mut kanban = KanbanLoop::new(&loop_def(5, 2, 5, 0, 1), StockoutPolicy::Backorder);

        assert!(!kanban.try_consume_units(6));
        assert_eq!(kanban.full_cards(), 1);
        assert_eq!(kanban.available_units(), 5);

        assert!(kanban.try_consume_units(3));
        assert_eq!(kanban.available_units(), 2);
        assert_eq!(kanban.stats().consumed_units, 3);
    }

    #[test]
    fn test_optional_draw_records_shortfall() {
        let mut kanban = KanbanLoop::new(&loop_def(5, 2, 5, 0, 1), StockoutPolicy::Backorder);

        assert_eq!(kanban.consume_available(8), 5);
        assert_eq!(kanban.available_units(), 0);
        assert_eq!(kanban.stats().optional_shortfall_units, 3);
        assert_eq!(kanban.consume_available(2), 0);
        assert_eq!(kanban.stats().optional_shortfall_units, 5);
    }

    #[test]
    fn test_fill_ratio_and_snapshot() {
        let mut kanban = KanbanLoop::new(&loop_def(4, 4, 4, 1, 3), StockoutPolicy::Backorder);
        assert_eq!(kanban.fill_ratio(), 0.75);

        kanban.withdraw(2, 0.0, None);
        let snapshot = kanban.snapshot();
        assert_eq!(snapshot.name, "test_loop");
        assert_eq!(snapshot.full_cards, 2);
        assert_eq!(snapshot.open_card_units, 2);
        assert_eq!(snapshot.kanbans_nb, 4);
        assert_eq!(snapshot.stats.consumed_units, 2);
        assert_eq!(kanban.fill_ratio(), 0.5);
    }
}
