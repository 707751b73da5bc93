use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use scb_batch::{load_job, load_job_list, run_job};
use scb_exp::Registry;

#[derive(Args, Debug)]
pub struct WorkerArgs {
    /// Job description written by `scb dispatch`.
    #[arg(long, conflicts_with = "jobs", required_unless_present = "jobs")]
    pub job: Option<PathBuf>,
    /// Job list of a combined batch.
    #[arg(long, requires = "index")]
    pub jobs: Option<PathBuf>,
    /// Entry of the job list to execute.
    #[arg(long)]
    pub index: Option<usize>,
}

pub fn run(args: &WorkerArgs) -> Result<(), Box<dyn Error>> {
    let job = match (&args.job, &args.jobs, args.index) {
        (Some(path), _, _) => load_job(path)?,
        (None, Some(path), Some(index)) => load_job_list(path)?.get(index)?.clone(),
        _ => return Err("either --job or --jobs with --index is required".into()),
    };
    let registry = Registry::with_builtin();
    if let Some(path) = run_job(&job, &registry)? {
        println!("{}", path.display());
    }
    Ok(())
}
