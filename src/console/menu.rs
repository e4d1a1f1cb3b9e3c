//! Interactive console menu.

use std::io::{self, BufRead, Write};

use crate::compute::evolution::{EngineError, EvolutionEngine};
use crate::compute::{FitnessFunction, PathSimulator, Terminal, trace_path};
use crate::schema::GENERATIONS_RANGE;

use super::board::render_board;

/// Menu text.
pub const MENU: &str = "1 - Request the next generation\n\
                        2 - Request the next X generations, X in [1, 100]\n\
                        3 - Display the best creature and his performance\n";

/// A menu choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    NextGeneration,
    NextGenerations,
    ShowBest,
}

/// Parse one line of menu input. Anything unrecognized yields `None`.
pub fn parse_command(line: &str) -> Option<MenuCommand> {
    match line.trim() {
        "1" => Some(MenuCommand::NextGeneration),
        "2" => Some(MenuCommand::NextGenerations),
        "3" => Some(MenuCommand::ShowBest),
        _ => None,
    }
}

/// Menu loop over arbitrary input and output streams.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the console and return its output stream.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Serve menu commands until the input ends.
    ///
    /// Evaluation failures are reported and the loop continues from the last
    /// completed generation. Invariant violations end the loop with an error.
    pub fn run(&mut self, engine: &mut EvolutionEngine) -> Result<(), ConsoleError> {
        write!(self.output, "{MENU}")?;
        while let Some(line) = self.read_line()? {
            match parse_command(&line) {
                Some(MenuCommand::NextGeneration) => {
                    let result = engine.advance_one_generation().map(|()| 1);
                    self.report_advance(engine, result)?;
                }
                Some(MenuCommand::NextGenerations) => {
                    let Some(n) = self.read_generation_count()? else {
                        break;
                    };
                    let result = engine.advance_n_generations(n).map(|r| r.completed);
                    self.report_advance(engine, result)?;
                }
                Some(MenuCommand::ShowBest) => self.show_best(engine)?,
                None => write!(self.output, "{MENU}")?,
            }
        }
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Prompt until a count in range is entered. `None` on end of input.
    fn read_generation_count(&mut self) -> io::Result<Option<usize>> {
        loop {
            write!(
                self.output,
                "Number of generations [{}, {}]: ",
                GENERATIONS_RANGE.start(),
                GENERATIONS_RANGE.end()
            )?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.trim().parse::<usize>() {
                Ok(n) if GENERATIONS_RANGE.contains(&n) => return Ok(Some(n)),
                _ => writeln!(self.output, "Invalid number of generations: {}", line.trim())?,
            }
        }
    }

    fn report_advance(
        &mut self,
        engine: &EvolutionEngine,
        result: Result<usize, EngineError>,
    ) -> Result<(), ConsoleError> {
        match result {
            Ok(completed) => {
                let progress = engine.progress();
                writeln!(
                    self.output,
                    "Advanced {} generation(s), now at generation {}: best={:.3}, avg={:.3}, reached end={}",
                    completed,
                    progress.generation,
                    progress.best_fitness,
                    progress.avg_fitness,
                    progress.reached_end
                )?;
                Ok(())
            }
            Err(EngineError::Evaluation(err)) => {
                writeln!(
                    self.output,
                    "Generation failed, still at generation {}: {err}",
                    engine.current_generation()
                )?;
                Ok(())
            }
            Err(err @ (EngineError::Invariant(_) | EngineError::Faulted)) => {
                Err(ConsoleError::Engine(err))
            }
            Err(EngineError::Config(err)) => {
                writeln!(self.output, "{err}")?;
                Ok(())
            }
        }
    }

    fn show_best(&mut self, engine: &EvolutionEngine) -> io::Result<()> {
        let Some((best, fitness)) = engine.best_creature() else {
            return writeln!(self.output, "No generation has been evaluated yet.");
        };

        let env = engine.environment();
        writeln!(
            self.output,
            "Best creature after generation {}: #{} (born in generation {})",
            engine.current_generation(),
            best.id,
            best.generation
        )?;
        writeln!(self.output, "  Moves:   {}", best.moves_string())?;

        let detail = match PathSimulator.evaluate(env, &best.moves) {
            Ok(outcome) => match outcome.terminal {
                Terminal::ReachedEnd => {
                    format!("reached end, {} move(s) unused", outcome.unused_moves)
                }
                Terminal::Blocked => format!("blocked at {}", outcome.final_position),
                Terminal::Exhausted => format!("stopped at {}", outcome.final_position),
            },
            Err(err) => err.to_string(),
        };
        writeln!(self.output, "  Fitness: {fitness:.3} ({detail})")?;

        let path = trace_path(env, &best.moves);
        write!(self.output, "{}", render_board(env, Some(&path)))
    }
}

/// Errors that end the console loop.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Engine(EngineError),
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::compute::{Outcome, SimulationError};
    use crate::schema::{Environment, Move, RunConfig};

    fn engine() -> EvolutionEngine {
        let config = RunConfig {
            height: 3,
            width: 5,
            nb_processes: 2,
            nb_creatures: 100,
            nb_moves: 6,
            random_seed: Some(1),
            ..Default::default()
        };
        EvolutionEngine::new(config, Environment::open(5, 3).unwrap()).unwrap()
    }

    fn run_console(engine: &mut EvolutionEngine, input: &str) -> String {
        let mut console = Console::new(Cursor::new(input.to_string()), Vec::new());
        console.run(engine).unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("1\n"), Some(MenuCommand::NextGeneration));
        assert_eq!(parse_command(" 2 "), Some(MenuCommand::NextGenerations));
        assert_eq!(parse_command("3"), Some(MenuCommand::ShowBest));
        assert_eq!(parse_command("4"), None);
        assert_eq!(parse_command("help"), None);
    }

    #[test]
    fn test_unknown_input_redisplays_menu() {
        let mut engine = engine();
        let output = run_console(&mut engine, "x\n9\n");
        assert_eq!(output.matches("1 - Request the next generation").count(), 3);
        assert_eq!(engine.current_generation(), 0);
    }

    #[test]
    fn test_best_before_any_generation() {
        let mut engine = engine();
        let output = run_console(&mut engine, "3\n");
        assert!(output.contains("No generation has been evaluated yet."));
    }

    #[test]
    fn test_advance_and_show_best() {
        let mut engine = engine();
        let output = run_console(&mut engine, "1\n2\n0\n4\n3\n");

        assert_eq!(engine.current_generation(), 5);
        assert!(output.contains("now at generation 1"));
        assert!(output.contains("Invalid number of generations: 0"));
        assert!(output.contains("Advanced 4 generation(s), now at generation 5"));
        assert!(output.contains("Best creature after generation 5"));
        assert!(output.contains("  Moves:   "));
        assert!(output.lines().any(|l| l.starts_with('S')));
    }

    #[test]
    fn test_end_of_input_while_prompting() {
        let mut engine = engine();
        run_console(&mut engine, "2\n");
        assert_eq!(engine.current_generation(), 0);
    }

    struct AlwaysFails(AtomicUsize);

    impl FitnessFunction for AlwaysFails {
        fn evaluate(&self, _env: &Environment, _moves: &[Move]) -> Result<Outcome, SimulationError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Err(SimulationError::Failed("boom".into()))
        }

        fn name(&self) -> &str {
            "always-fails"
        }
    }

    #[test]
    fn test_evaluation_failure_is_reported_and_loop_continues() {
        let mut engine = engine().with_fitness_function(AlwaysFails(AtomicUsize::new(0)));
        let output = run_console(&mut engine, "1\n3\n");

        assert!(output.contains("Generation failed, still at generation 0"));
        assert!(output.contains("No generation has been evaluated yet."));
    }
}
