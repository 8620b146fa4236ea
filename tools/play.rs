/// Play — interactive shell for walking through a story turn by turn.
///
/// Usage: play <domain.pddl> <problem.pddl> [--config <file.ron>] [--limit <n>] [--resume <save.ron>]
///
/// Commands:
///   actions       — list available actions
///   do <n>        — take action number n from the last listing
///   facts         — show the current world facts
///   history       — show the actions taken so far
///   save <path>   — write the session to a RON file
///   load <path>   — resume a session from a RON file
///   reset         — start the story over
///   help          — list commands
///   quit          — exit

#[path = "flags.rs"]
mod flags;

use narrative_planner::core::engine::{AvailableAction, GameEngine, TurnReport};
use narrative_planner::core::state::GameState;
use std::io::{self, BufRead, Write};
use std::process;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let domain_path = &args[1];
    let problem_path = &args[2];
    let mut config_path = None;
    let mut limit = None;
    let mut resume_path = None;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--limit" if i + 1 < args.len() => {
                i += 1;
                limit = Some(flags::count_or_exit(&args[i], "--limit"));
            }
            "--resume" if i + 1 < args.len() => {
                i += 1;
                resume_path = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = GameEngine::builder()
        .domain_file(domain_path)
        .problem_file(problem_path);
    if let Some(ref path) = config_path {
        builder = builder.config_file(path);
    }
    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let mut last = match resume_path {
        Some(ref path) => match load_session(&mut engine, path, limit) {
            Ok(turn) => turn,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        },
        None => engine.initialize(),
    };

    let story = engine.story();
    println!(
        "Story: {}",
        story.problem.name.as_deref().unwrap_or("(unnamed)")
    );
    println!(
        "{} actions, {} objects",
        story.domain.actions().len(),
        story.problem.objects.len()
    );
    println!("Type 'help' for commands.\n");
    print_turn(&last);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("play> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "actions" | "a" => {
                last = engine.current_state(limit);
                print_actions(&last.available_actions);
            }
            "do" | "d" => {
                let Some(index) = parts.get(1).and_then(|s| s.parse::<usize>().ok()) else {
                    println!("Usage: do <n>");
                    continue;
                };
                let Some(chosen) = index
                    .checked_sub(1)
                    .and_then(|i| last.available_actions.get(i))
                    .cloned()
                else {
                    println!("No action numbered {}. Try 'actions'.", index);
                    continue;
                };
                match engine.execute_action(&chosen.action, &chosen.binding, limit) {
                    Ok(turn) => {
                        println!("> {}", chosen.description);
                        last = turn;
                        print_turn(&last);
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "facts" | "f" | "look" => {
                for fact in engine.state().facts().sorted() {
                    println!("  ({})", fact);
                }
            }
            "history" => {
                if engine.history().is_empty() {
                    println!("No actions taken yet.");
                }
                for entry in engine.history() {
                    println!("  {:>3}. {} {}", entry.step, entry.action, entry.binding);
                }
            }
            "save" => {
                let Some(path) = parts.get(1) else {
                    println!("Usage: save <path>");
                    continue;
                };
                let text = GameState::from_saved(engine.serialize_state()).to_ron();
                match text.map_err(|e| e.to_string()).and_then(|text| {
                    std::fs::write(path, text).map_err(|e| e.to_string())
                }) {
                    Ok(()) => println!("Saved to {}", path),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "load" => {
                let Some(path) = parts.get(1) else {
                    println!("Usage: load <path>");
                    continue;
                };
                match load_session(&mut engine, path, limit) {
                    Ok(turn) => {
                        last = turn;
                        print_turn(&last);
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "reset" => {
                last = engine.initialize();
                print_turn(&last);
            }
            _ => println!("Unknown command '{}'. Type 'help' for commands.", cmd),
        }
    }
}

fn load_session(engine: &mut GameEngine, path: &str, limit: Option<usize>) -> Result<TurnReport, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read '{path}': {e}"))?;
    let state = GameState::from_ron(&text).map_err(|e| e.to_string())?;
    engine.restore_state(state.to_saved());
    Ok(engine.current_state(limit))
}


fn print_turn(turn: &TurnReport) {
    println!("\n--- Step {} ---", turn.step);
    if turn.goal_reached {
        println!("The goal has been reached. Well done!");
        return;
    }
    if turn.dead_end {
        println!("No actions remain. This is a dead end; try 'load' or 'reset'.");
        return;
    }
    print_actions(&turn.available_actions);
}

fn print_actions(actions: &[AvailableAction]) {
    if actions.is_empty() {
        println!("No actions available.");
    }
    for (i, action) in actions.iter().enumerate() {
        let marker = if action.revisits { "  (seen)" } else { "" };
        println!("  {:>2}. {}{}", i + 1, action.display_text, marker);
    }
}

fn print_usage() {
    println!(
        "Usage: play <domain.pddl> <problem.pddl> [--config <file.ron>] [--limit <n>] [--resume <save.ron>]"
    );
}

fn print_help() {
    println!("Commands:");
    println!("  actions       list available actions");
    println!("  do <n>        take action number n from the last listing");
    println!("  facts         show the current world facts");
    println!("  history       show the actions taken so far");
    println!("  save <path>   write the session to a RON file");
    println!("  load <path>   resume a session from a RON file");
    println!("  reset         start the story over");
    println!("  quit          exit");
}
