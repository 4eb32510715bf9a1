use kanban_sim::{
    run_seed_sweep, run_sweep, ClockState, ConcurrencyMode, CustomerLoopSpec, ItemSpec,
    KanbanLoopSpec, LoopId, OperationSpec, Simulation, SimulationConfig, StockoutPolicy, SweepCase,
    SweepConfig, Topology, TopologyBuilder,
};
use std::sync::Arc;

/// Laser loop (2 cards of 128, red zone 1, batch 256) with a single customer
fn laser_network(customer: CustomerLoopSpec) -> Arc<Topology> {
    let topology = TopologyBuilder::new()
        .workshop("Laser")
        .item(ItemSpec::new("Bracket").operation(OperationSpec::new("cut", "Laser", 460.0, 8)))
        .kanban_loop(KanbanLoopSpec::new("bracket_loop", "Bracket", "Laser", 256, 2, 128, 1))
        .customer_loop(customer)
        .build()
        .unwrap();
    Arc::new(topology)
}

/// Three stage sheet metal network with optional purchased fasteners
fn sheet_metal_network() -> Arc<Topology> {
    let topology = TopologyBuilder::new()
        .workshop("Laser")
        .workshop("Pliage")
        .workshop("Assemblage")
        .item(ItemSpec::new("Tole").operation(OperationSpec::new("cut", "Laser", 40.0, 4)))
        .item(
            ItemSpec::new("Equerre")
                .operation(OperationSpec::new("bend", "Pliage", 30.0, 2).consumes("Tole", 2)),
        )
        .item(ItemSpec::new("Vis"))
        .item(
            ItemSpec::new("Armoire").operation(
                OperationSpec::new("assemble", "Assemblage", 12.0, 1)
                    .consumes("Equerre", 2)
                    .consumes_optional("Vis", 4),
            ),
        )
        .kanban_loop(KanbanLoopSpec::new("tole_loop", "Tole", "Pliage", 16, 4, 8, 1))
        .kanban_loop(KanbanLoopSpec::new("equerre_loop", "Equerre", "Assemblage", 8, 4, 4, 1))
        .kanban_loop(KanbanLoopSpec::new("armoire_loop", "Armoire", "Assemblage", 2, 3, 2, 1))
        .customer_loop(
            CustomerLoopSpec::new("client", "Armoire", "Assemblage", 15.0, 2)
                .with_qty_alea_range(1)
                .with_period_alea_rate(0.3),
        )
        .build()
        .unwrap();
    Arc::new(topology)
}

#[test]
fn test_single_withdrawal_triggers_one_batch() {
    let topology = laser_network(
        CustomerLoopSpec::new("client", "Bracket", "Laser", 1_000_000.0, 128).with_start_offset(0.0),
    );
    let mut sim = Simulation::new(topology, SimulationConfig::new().with_seed(1)).unwrap();

    assert_eq!(sim.step().unwrap(), Some(0.0));
    let loop_id: LoopId = sim.topology().loop_id("bracket_loop").unwrap();
    let kanban = sim.kanban_loop(loop_id);
    assert_eq!(kanban.full_cards(), 1);
    assert_eq!(kanban.pending_batches(), 1);

    let results = sim.run(100.0).unwrap();
    let kanban = results.loop_result("bracket_loop").unwrap();
    assert_eq!(kanban.full_cards, 2);
    assert_eq!(kanban.pending_batches, 0);
    assert_eq!(kanban.produced_batches, 1);
    assert_eq!(kanban.produced_units, 256);
    assert_eq!(kanban.stockouts, 0);
    assert_eq!(results.orders_issued, 1);

    let laser = results.workshop_result("Laser").unwrap();
    assert_eq!(laser.completed_operations, 1);
    assert_eq!(laser.busy_time, 57.5);
}

#[test]
fn test_customer_demand_follows_period_and_range() {
    let topology = laser_network(CustomerLoopSpec::new("client", "Bracket", "Laser", 8.0, 9).with_qty_alea_range(1));
    let config = SimulationConfig::new().with_seed(42);

    let results = Simulation::new(Arc::clone(&topology), config.clone())
        .unwrap()
        .run(1000.0)
        .unwrap();
    let client = results.customer_result("client").unwrap();
    assert_eq!(client.withdrawals, 125);
    assert!((1000..=1250).contains(&client.demanded_units));
    assert_eq!(
        client.demanded_units,
        client.served_units + client.short_units
    );

    let replay = Simulation::new(topology, config).unwrap().run(1000.0).unwrap();
    assert_eq!(results, replay);
}

#[test]
fn test_backorders_delivered_on_replenish() {
    let customer = CustomerLoopSpec::new("client", "Bracket", "Laser", 100.0, 300).with_start_offset(0.0);

    let results = Simulation::new(laser_network(customer.clone()), SimulationConfig::new().with_seed(5))
        .unwrap()
        .run(60.0)
        .unwrap();
    let client = results.customer_result("client").unwrap();
    assert_eq!(client.served_units, 256);
    assert_eq!(client.short_units, 44);
    assert_eq!(client.late_served_units, 44);
    let kanban = results.loop_result("bracket_loop").unwrap();
    assert_eq!(kanban.stockouts, 1);
    assert_eq!(kanban.backorder_units, 0);
    assert_eq!(kanban.lost_units, 0);
    assert_eq!(results.total_delivered_units(), 300);

    let config = SimulationConfig::new()
        .with_seed(5)
        .with_stockout_policy(StockoutPolicy::Drop);
    let results = Simulation::new(laser_network(customer), config)
        .unwrap()
        .run(60.0)
        .unwrap();
    let client = results.customer_result("client").unwrap();
    assert_eq!(client.late_served_units, 0);
    assert_eq!(results.loop_result("bracket_loop").unwrap().lost_units, 44);
    assert_eq!(results.total_delivered_units(), 256);
}

#[test]
fn test_cards_are_conserved_while_stepping() {
    let mut sim = Simulation::new(sheet_metal_network(), SimulationConfig::new().with_seed(9)).unwrap();

    for _ in 0..2_000 {
        if sim.step().unwrap().is_none() {
            break;
        }

        for kanban in sim.engine().loops() {
            assert!(kanban.invariants_hold(), "loop '{}' broke its card bounds", kanban.name());

            let attached: u32 = sim
                .engine()
                .workshops()
                .iter()
                .flat_map(|workshop| workshop.queue().chain(workshop.current_order()))
                .filter(|order| order.kanban == kanban.id())
                .map(|order| order.cards)
                .sum();
            assert_eq!(attached, kanban.in_flight_cards());
        }
    }

    let results = sim.results();
    assert!(results.orders_issued > 0);
    assert!(results.loop_result("armoire_loop").unwrap().produced_batches > 0);
}

#[test]
fn test_same_seed_is_deterministic() {
    let run = |seed: u64| {
        Simulation::new(sheet_metal_network(), SimulationConfig::new().with_seed(seed))
            .unwrap()
            .run(3_000.0)
            .unwrap()
    };

    assert_eq!(run(17), run(17));
    assert_ne!(run(17), run(18));
}

#[test]
fn test_sweep_modes_agree() {
    let topology = sheet_metal_network();
    let base = SimulationConfig::new();
    let seeds = [1, 2, 3, 4, 5];

    let sequential = run_seed_sweep(Arc::clone(&topology), &base, &seeds, 2_000.0, &SweepConfig::new()).unwrap();
    let parallel = run_seed_sweep(
        Arc::clone(&topology),
        &base,
        &seeds,
        2_000.0,
        &SweepConfig::new()
            .with_concurrency(ConcurrencyMode::Rayon)
            .with_thread_pool_size(2),
    )
    .unwrap();

    assert_eq!(sequential.len(), seeds.len());
    assert_eq!(sequential, parallel);
}

#[test]
fn test_sweep_keeps_case_order() {
    let fast = laser_network(CustomerLoopSpec::new("client", "Bracket", "Laser", 5.0, 10));
    let slow = laser_network(CustomerLoopSpec::new("client", "Bracket", "Laser", 50.0, 10));
    let config = SimulationConfig::new().with_seed(0);
    let cases = vec![
        SweepCase::new(Arc::clone(&fast), config.clone()),
        SweepCase::new(slow, config.clone()),
        SweepCase::new(fast, config),
    ];

    let results = run_sweep(
        &cases,
        500.0,
        &SweepConfig::new().with_concurrency(ConcurrencyMode::Rayon),
    )
    .unwrap();

    let withdrawals: Vec<u64> = results
        .iter()
        .map(|r| r.customer_result("client").unwrap().withdrawals)
        .collect();
    assert_eq!(withdrawals, vec![100, 10, 100]);
}

#[test]
fn test_clock_drains_without_demand() {
    let topology = Arc::new(
        TopologyBuilder::new()
            .workshop("Laser")
            .item(ItemSpec::new("Bracket").operation(OperationSpec::new("cut", "Laser", 460.0, 8)))
            .kanban_loop(KanbanLoopSpec::new("bracket_loop", "Bracket", "Laser", 256, 2, 128, 1))
            .build()
            .unwrap(),
    );
    let mut sim = Simulation::new(topology, SimulationConfig::new()).unwrap();
    assert_eq!(sim.clock_state(), ClockState::Idle);

    let results = sim.run(100.0).unwrap();
    assert_eq!(sim.clock_state(), ClockState::Drained);
    assert_eq!(results.end_time, 100.0);
    assert_eq!(results.events_dispatched, 0);
    assert_eq!(results.orders_issued, 0);
}
