use std::path::PathBuf;
use std::time::Instant;

use befunge93::error::Result;
use befunge93::grid::Grid;
use befunge93::machine::Machine;
use befunge93::port::{Port, StdioPort};
use befunge93::trace;
use clap::{CommandFactory, Parser};

#[derive(Parser)]
#[command(name = "befunge93", about = "Befunge-93 interpreter")]
struct Cli {
    /// Program source file.
    path: Option<PathBuf>,

    /// Trace every step, and the final grid, on stderr.
    #[arg(long)]
    trace: bool,

    /// Random seed for `?` (seeded from entropy if omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many steps even if the program has not halted.
    #[arg(long)]
    step_limit: Option<usize>,

    /// Print step count and elapsed time on stderr when done.
    #[arg(long)]
    stats: bool,
}

fn main() {
    let cli = Cli::parse();

    let path = match &cli.path {
        Some(path) if path.is_file() => path,
        Some(path) => {
            eprintln!("File not found: {}", path.display());
            print_usage();
            return;
        }
        None => {
            print_usage();
            return;
        }
    };

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read {}: {e}", path.display());
            std::process::exit(1);
        }
    };
    let grid = match Grid::parse(&source) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            std::process::exit(1);
        }
    };

    let port = StdioPort::stdio();
    let mut machine = match cli.seed {
        Some(seed) => Machine::with_seed(grid, port, seed),
        None => Machine::new(grid, port),
    };

    let start = Instant::now();
    let result = if cli.trace {
        run_traced(&mut machine, cli.step_limit)
    } else {
        match cli.step_limit {
            Some(limit) => machine.run_for(limit).map(|_| ()),
            None => machine.run(),
        }
    };
    let elapsed = start.elapsed();

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
    if !machine.is_halted() {
        eprintln!("stopped after {} steps without halting", machine.steps());
    }
    if cli.stats {
        print_stats(machine.steps(), elapsed);
    }
}

fn print_usage() {
    if let Err(e) = Cli::command().print_help() {
        eprintln!("Failed to print usage: {e}");
    }
}

/// Step through the program, printing each instruction before it runs.
fn run_traced<P: Port>(machine: &mut Machine<P>, step_limit: Option<usize>) -> Result<()> {
    let limit = step_limit.unwrap_or(usize::MAX);
    let mut steps = 0;
    while !machine.is_halted() && steps < limit {
        eprintln!("{}", trace::step_line(machine));
        machine.step()?;
        // Keep program output interleaved with the trace.
        machine.flush()?;
        steps += 1;
    }
    eprintln!();
    eprint!("{}", trace::snapshot(machine));
    Ok(())
}

fn print_stats(steps: u64, elapsed: std::time::Duration) {
    let steps_per_sec = steps as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    eprintln!("Run statistics:");
    eprintln!("  Steps:      {steps}");
    eprintln!("  Elapsed:    {elapsed:.2?}");
    eprintln!("  Steps/sec:  {steps_per_sec:.0}");
}
