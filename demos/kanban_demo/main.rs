use kanban_sim::{
    run_seed_sweep, ConcurrencyMode, CustomerLoopSpec, ItemSpec, KanbanLoopSpec, OperationSpec,
    Simulation, SimulationConfig, SimulationResults, SweepConfig, Topology, TopologyBuilder,
};
use std::sync::Arc;

fn build_network() -> Result<Topology, String> {
    TopologyBuilder::new()
        .workshop("Laser")
        .workshop("Pliage")
        .workshop("Assemblage")
        .workshop("Expedition")
        // Sheet blanks cut on the laser, bent into brackets, assembled into cabinets
        .item(
            ItemSpec::new("Tole")
                .operation(OperationSpec::new("decoupe", "Laser", 120.0, 4))
                .with_unit_cost(3.5),
        )
        .item(
            ItemSpec::new("Equerre")
                .operation(OperationSpec::new("pliage", "Pliage", 80.0, 2).consumes("Tole", 2))
                .with_unit_cost(9.0),
        )
        // Purchased fasteners, never block assembly
        .item(ItemSpec::new("Vis"))
        .item(
            ItemSpec::new("Armoire")
                .operation(
                    OperationSpec::new("montage", "Assemblage", 60.0, 1)
                        .consumes("Equerre", 4)
                        .consumes_optional("Vis", 8),
                )
                .with_unit_cost(120.0),
        )
        .kanban_loop(KanbanLoopSpec::new("tole_loop", "Tole", "Pliage", 64, 4, 32, 1))
        .kanban_loop(KanbanLoopSpec::new("equerre_loop", "Equerre", "Assemblage", 32, 4, 16, 1))
        .kanban_loop(KanbanLoopSpec::new("armoire_loop", "Armoire", "Expedition", 4, 3, 4, 1))
        .customer_loop(
            CustomerLoopSpec::new("client", "Armoire", "Expedition", 30.0, 3)
                .with_qty_alea_range(1)
                .with_period_alea_rate(0.2),
        )
        .build()
        .map_err(|e| e.to_string())
}

fn print_results(results: &SimulationResults) {
    println!(
        "t={:.1}  events={}  orders={}  stockouts={}",
        results.end_time,
        results.events_dispatched,
        results.orders_issued,
        results.total_stockouts()
    );

    println!("\nLoops:");
    for result in &results.loops {
        println!(
            "  {:<14} full={:<2} open={:<3} pending={:<2} produced={:<6} consumed={:<6} stockouts={:<4} starvations={:<4} value={}",
            result.name,
            result.full_cards,
            result.open_card_units,
            result.pending_batches,
            result.produced_units,
            result.consumed_units,
            result.stockouts,
            result.starvations,
            result
                .stock_value
                .map(|value| format!("{:.2}", value))
                .unwrap_or_else(|| "-".to_string())
        );
    }

    println!("\nWorkshops:");
    for result in &results.workshops {
        println!(
            "  {:<12} utilization={:>5.1}%  operations={:<5} queued={}",
            result.name,
            result.utilization * 100.0,
            result.completed_operations,
            result.queued_orders
        );
    }

    println!("\nCustomers:");
    for result in &results.customers {
        println!(
            "  {:<12} withdrawals={:<5} demanded={:<6} served={:<6} late={:<5} short={}",
            result.name,
            result.withdrawals,
            result.demanded_units,
            result.served_units,
            result.late_served_units,
            result.short_units
        );
    }
}

fn main() -> Result<(), String> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let duration: f64 = match args.next() {
        Some(arg) => arg.parse().map_err(|e| format!("invalid duration '{}': {}", arg, e))?,
        None => 10_000.0,
    };
    let seed: u64 = match args.next() {
        Some(arg) => arg.parse().map_err(|e| format!("invalid seed '{}': {}", arg, e))?,
        None => 42,
    };

    println!("🏭 Kanban production simulation 🏭");
    let topology = Arc::new(build_network()?);

    // =========================
    // 1. SINGLE RUN
    // =========================

    let config = SimulationConfig::new().with_seed(seed);
    let mut sim = Simulation::new(Arc::clone(&topology), config.clone()).map_err(|e| e.to_string())?;
    println!("Run {} for {} time units (seed {})\n", sim.run_id(), duration, seed);

    let results = sim.run(duration).map_err(|e| e.to_string())?;
    print_results(&results);

    // =========================
    // 2. SEED SWEEP
    // =========================

    let seeds: Vec<u64> = (0..8).map(|offset| seed + offset).collect();
    let sweep = SweepConfig::new().with_concurrency(ConcurrencyMode::Rayon);
    let runs = run_seed_sweep(topology, &config, &seeds, duration, &sweep).map_err(|e| e.to_string())?;

    println!("\nSeed sweep over {} runs:", runs.len());
    for (seed, run) in seeds.iter().zip(&runs) {
        println!(
            "  seed {:<4} stockouts={:<4} delivered={}",
            seed,
            run.total_stockouts(),
            run.total_delivered_units()
        );
    }

    let mean_stockouts =
        runs.iter().map(|run| run.total_stockouts() as f64).sum::<f64>() / runs.len() as f64;
    println!("  mean stockouts: {:.2}", mean_stockouts);

    Ok(())
}
