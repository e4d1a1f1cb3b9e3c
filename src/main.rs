//! Grid Evolve CLI - Evolve move sequences from the command line.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::io;
use std::process::ExitCode;

use grid_evolve::{
    compute::evolution::{EngineError, EvolutionEngine},
    console::{CliArgs, Command, Console, ConsoleError, USAGE, render_board},
    schema::{Environment, EnvironmentError, RunConfig},
};

fn main() -> ExitCode {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("grid-evolve");

    let cli = match Command::parse(&args[1.min(args.len())..]) {
        Ok(Command::Example) => {
            print_example_config();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Run(cli)) => cli,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            eprintln!("Usage: {program} {USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CliArgs) -> Result<(), RunError> {
    let CliArgs { mut config, area } = cli;

    let env = match &area {
        Some(path) => {
            let env = Environment::load(path)?;
            if (env.width(), env.height()) != (config.width, config.height) {
                log::warn!(
                    "{} is {}x{}, overriding requested {}x{}",
                    path.display(),
                    env.width(),
                    env.height(),
                    config.width,
                    config.height
                );
                config.width = env.width();
                config.height = env.height();
            }
            env
        }
        None => Environment::open(config.width, config.height)?,
    };

    println!("Grid Evolve");
    println!("===========");
    println!("Grid: {}x{} ({} walls)", env.width(), env.height(), env.wall_count());
    println!("Start: {}  End: {}", env.start(), env.end());
    println!(
        "Creatures: {} x {} moves, {} workers",
        config.nb_creatures, config.nb_moves, config.nb_processes
    );
    println!(
        "Deletion: {}%  Mutation: {}%",
        config.deletion_percentage, config.mutation_rate
    );
    println!();
    print!("{}", render_board(&env, None));
    println!();

    let mut engine = EvolutionEngine::new(config, env)?;
    println!("Seed: {}", engine.seed());
    println!();

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    console.run(&mut engine)?;
    Ok(())
}

/// Failures that end a run after the arguments were accepted.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Console failed: {0}")]
    Console(#[from] ConsoleError),
}

fn print_example_config() {
    let config = RunConfig {
        random_seed: Some(42),
        ..RunConfig::default()
    };

    println!("Example configuration (run.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing config: {e}"),
    }
}
