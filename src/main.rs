//! Treasure Hunt CLI - Evolve a treasure-collecting program for an environment file.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;

use treasure_hunt::{
    EvolutionConfig, EvolutionEngine,
    schema::{BreedingMode, EvolutionProgress},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <environment.txt|config.json> [result.json]", args[0]);
        eprintln!();
        eprintln!("Evolve a program that collects every treasure in the environment.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  environment.txt  Grid size, start, treasure count, one treasure per line");
        eprintln!("  config.json      Full evolution configuration or bare environment (see --example)");
        eprintln!("  result.json      Optional path for the run result and fitness history");
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let result_path = args.get(2).map(PathBuf::from);

    let config = EvolutionConfig::load(&input_path).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {}", input_path.display(), e);
        std::process::exit(1);
    });

    println!("Treasure Hunt");
    println!("=============");
    println!(
        "Grid: {0}x{0}, start ({1}, {2}), {3} treasures",
        config.environment.size,
        config.environment.start.0,
        config.environment.start.1,
        config.environment.treasure_count()
    );
    println!(
        "Population: {} agents x {} genes, up to {} generations",
        config.population.size, config.population.genome_length, config.population.max_generations
    );
    println!();

    let mut engine = EvolutionEngine::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let result = engine.run_with_callback(report_progress);

    println!();
    match &result.best {
        Some(best) if result.solved() => {
            println!("Path found: {}", best.trajectory_codes());
            println!("Treasures: {}", best.treasures_found);
            println!("Steps: {}", best.steps);
            println!("Generation: {}", best.generation);
        }
        Some(best) => {
            println!("No complete path found. Best agent so far:");
            println!("  Path: {}", best.trajectory_codes());
            println!("  Treasures: {}", best.treasures_found);
            println!("  Steps: {}", best.steps);
            println!("  Fitness: {:.3}", best.fitness);
            println!("  Generation: {}", best.generation);
        }
        None => println!("No agents were evaluated."),
    }
    println!(
        "Time: {:.2}s ({} evaluations, {} over instruction budget)",
        result.stats.elapsed_seconds, result.stats.total_evaluations, result.stats.budget_exceeded
    );

    if let Some(path) = result_path {
        let json = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
            eprintln!("Error serializing result: {}", e);
            std::process::exit(1);
        });
        if let Err(e) = fs::write(&path, json) {
            eprintln!("Error writing {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!("Result written to {}", path.display());
    }
}

fn report_progress(progress: &EvolutionProgress) {
    if progress.shock {
        println!(
            "  Generation {}: diversification shock, {} extra generations",
            progress.generation, progress.diversify_remaining
        );
    }

    let interval = (progress.total_generations / 20).max(1);
    if (progress.generation + 1) % interval == 0 {
        let mode = match progress.next_mode {
            BreedingMode::Standard => "standard",
            BreedingMode::Diversify => "diversify",
        };
        println!(
            "  Generation {}/{}: best={:.3} (overall {:.3}), avg={:.3}, next={}",
            progress.generation + 1,
            progress.total_generations,
            progress.generation_best,
            progress.best_fitness,
            progress.avg_fitness,
            mode
        );
    }
}

fn print_example_config() {
    let config = EvolutionConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
    println!();
    println!("Equivalent environment file (environment.txt):");
    println!("{}", config.environment.size);
    println!("({}, {})", config.environment.start.0, config.environment.start.1);
    println!("{}", config.environment.treasure_count());
    for (x, y) in &config.environment.treasures {
        println!("({}, {})", x, y);
    }
}
