use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use scb_batch::{JobDispatcher, QueueConfig};
use scb_core::load_plan_with;

#[derive(Args, Debug)]
pub struct DispatchArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Registered benchmark the workers run.
    #[arg(long, default_value = "synthetic")]
    pub bench: String,
    /// Working directory for jobs, descriptors and per-point files.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// YAML queue configuration; built-in defaults when omitted.
    #[arg(long)]
    pub queue: Option<PathBuf>,
    /// Walltime per job in hours.
    #[arg(long)]
    pub walltime: Option<u32>,
    /// One combined descriptor for every job.
    #[arg(long)]
    pub single_batch: bool,
    /// Write everything but do not call the submit command.
    #[arg(long)]
    pub no_submit: bool,
    /// Worker executable used in descriptors.
    #[arg(long)]
    pub worker: Option<PathBuf>,
    /// Override the plan's repetition count.
    #[arg(long)]
    pub repetitions: Option<usize>,
}

pub fn run(args: &DispatchArgs) -> Result<(), Box<dyn Error>> {
    let spec = load_plan_with(&args.plan, args.repetitions)?;
    let mut queue = match &args.queue {
        Some(path) => QueueConfig::load(path)?,
        None => QueueConfig::default(),
    };
    if args.no_submit {
        queue.submit = false;
    }
    if args.worker.is_some() {
        queue.worker = args.worker.clone();
    }

    let mut dispatcher =
        JobDispatcher::new(spec, &args.bench, queue, &args.dir).single_batch(args.single_batch);
    if let Some(hours) = args.walltime {
        dispatcher = dispatcher.walltime_hours(hours);
    }
    let report = dispatcher.dispatch()?;

    for entry in &report.entries {
        let status = if entry.submitted { "submitted" } else { "written" };
        println!("{status} {}", entry.script.display());
    }
    Ok(())
}
