//! Replication dynamics CLI - Run simulations from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use replication_dynamics::{
    compute::{ReplicatorPropagator, SimulationStats, best_responses},
    schema::SimulationConfig,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [periods]", args[0]);
        eprintln!();
        eprintln!("Run a replication dynamics simulation from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to simulation configuration file");
        eprintln!("  periods      Number of periods (overrides the config)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let mut config = SimulationConfig::from_path(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    if let Some(arg) = args.get(2) {
        config.periods = arg.parse().unwrap_or_else(|_| {
            eprintln!("Invalid period count: {}", arg);
            std::process::exit(1);
        });
    }

    let propagator = ReplicatorPropagator::new(&config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });
    let initial = config.initial.generate().unwrap_or_else(|e| {
        eprintln!("Invalid initial distribution: {}", e);
        std::process::exit(1);
    });

    println!("Replication Dynamics Simulation");
    println!("===============================");
    println!("Periods: {}", config.periods);
    println!("Adjustment: {:?}", config.adjustment);
    println!(
        "Payoff range: [{:.4}, {:.4}]",
        config.payoffs.min_entry(),
        config.payoffs.max_entry()
    );
    println!();

    println!("Best responses:");
    for (strategy, best) in replication_dynamics::Strategy::ALL
        .iter()
        .zip(best_responses(&config.payoffs))
    {
        println!("  {:<12} plays best against {}", strategy, best);
    }
    println!();

    // Run simulation
    println!("Running simulation...");
    let start = Instant::now();
    let periods = config.periods;

    let history = propagator
        .run_with_callback(&initial, periods, |record| {
            // Print progress every 10%
            if record.period > 0 && record.period % (periods / 10).max(1) == 0 {
                let leader = record.probabilities.argmax();
                println!(
                    "  Period {}/{}: leader={} ({:.2}%), concentration={:.4}",
                    record.period,
                    periods,
                    leader,
                    record.probabilities[leader] * 100.0,
                    record.probabilities.herfindahl()
                );
            }
        })
        .unwrap_or_else(|e| {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        });

    let elapsed = start.elapsed();
    let stats = SimulationStats::from_history(&history);

    println!();
    println!("Final distribution:");
    println!("  {:>4}  {:<12} {:>10} {:>8}", "Rank", "Automaton", "Percent", "Share");
    for row in &stats.ranking {
        println!(
            "  {:>4}  {:<12} {:>9.2}% {:>8.4}",
            row.rank, row.strategy, row.percentage, row.probability
        );
    }
    println!();
    println!(
        "Most dominant: {} ({:.2}%)",
        stats.dominant.strategy, stats.dominant.percentage
    );
    println!(
        "Least common: {} ({:.2}%)",
        stats.least_common.strategy, stats.least_common.percentage
    );
    println!("Concentration (Herfindahl): {:.3}", stats.concentration);
    println!("Stopped: {:?} after {} periods", stats.stop_reason, stats.periods);
    println!("Time: {:.3}ms", elapsed.as_secs_f64() * 1000.0);

    let history_path = config_path.with_extension("history.json");
    match serde_json::to_string_pretty(&history) {
        Ok(json) => match fs::write(&history_path, json) {
            Ok(()) => println!("History written to {}", history_path.display()),
            Err(e) => eprintln!("Error writing history: {}", e),
        },
        Err(e) => eprintln!("Error serializing history: {}", e),
    }
}

fn print_example_config() {
    let config = SimulationConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
