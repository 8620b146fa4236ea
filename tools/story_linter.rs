/// Story Linter — validates a domain/problem pair before it ships.
///
/// Usage: story_linter <domain.pddl> <problem.pddl> [--config <file.ron>]
///                     [--max-depth <n>] [--max-states <n>]

#[path = "flags.rs"]
mod flags;

use narrative_planner::core::config::EngineConfig;
use narrative_planner::core::validation::validate;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 || args[1] == "--help" || args[1] == "-h" {
        println!(
            "Usage: story_linter <domain.pddl> <problem.pddl> [--config <file.ron>] \
             [--max-depth <n>] [--max-states <n>]"
        );
        process::exit(0);
    }

    let domain_path = &args[1];
    let problem_path = &args[2];
    let mut config_path = None;
    let mut max_depth = None;
    let mut max_states = None;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--max-depth" if i + 1 < args.len() => {
                i += 1;
                max_depth = Some(flags::count_or_exit(&args[i], "--max-depth"));
            }
            "--max-states" if i + 1 < args.len() => {
                i += 1;
                max_states = Some(flags::count_or_exit(&args[i], "--max-states"));
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(ref path) => match EngineConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    if let Some(depth) = max_depth {
        config.search.max_depth = depth;
    }
    if let Some(states) = max_states {
        config.search.max_explored_states = states;
    }

    let domain = read_or_exit(domain_path);
    let problem = read_or_exit(problem_path);

    let report = validate(&domain, &problem, &config);

    println!("\n=== Story Lint Report ===\n");

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    for error in &report.errors {
        println!("ERROR: {}", error);
    }

    if let Some(ref reachability) = report.reachability {
        println!("\nReachability: {}", reachability.message);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    if !report.is_valid() {
        process::exit(1);
    }
}

fn read_or_exit(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("ERROR: Failed to read '{}': {}", path, e);
            process::exit(1);
        }
    }
}

