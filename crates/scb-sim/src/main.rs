use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    aggregate::{self, AggregateArgs},
    dispatch::{self, DispatchArgs},
    plot::{self, PlotArgs},
    points::{self, PointsArgs},
    run::{self, RunArgs},
    worker::{self, WorkerArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "scb", about = "Scaling benchmark sweeps, batch dispatch and plots")]
struct Cli {
    /// Log at debug level regardless of RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a sweep in this process and write its result file.
    Run(RunArgs),
    /// Write job files and queue descriptors for a sweep and submit them.
    Dispatch(DispatchArgs),
    /// Execute one dispatched job and write its per-point file.
    Worker(WorkerArgs),
    /// Fold per-point files into a result file.
    Aggregate(AggregateArgs),
    /// Render scaling charts from a result file.
    Plot(PlotArgs),
    /// List the points of a sweep plan.
    Points(PointsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Dispatch(args) => dispatch::run(&args),
        Command::Worker(args) => worker::run(&args),
        Command::Aggregate(args) => aggregate::run(&args),
        Command::Plot(args) => plot::run(&args),
        Command::Points(args) => points::run(&args),
    }
}
