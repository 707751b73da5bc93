use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use scb_core::load_plan_with;
use scb_exp::{write_manifest, ExecutionMode, Registry, SweepManifest, SweepRunner};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Registered benchmark to time.
    #[arg(long, default_value = "synthetic")]
    pub bench: String,
    /// Directory receiving the result file and manifest.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Override the plan's repetition count.
    #[arg(long)]
    pub repetitions: Option<usize>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let spec = load_plan_with(&args.plan, args.repetitions)?;
    let registry = Registry::with_builtin();
    let bench = registry.get(&args.bench)?;
    fs::create_dir_all(&args.out)?;
    let out = args.out.canonicalize()?;

    let outcome = SweepRunner::new(spec.clone())?
        .with_output_dir(&out)
        .run(bench)?;
    let manifest = SweepManifest::new(&spec, &outcome.path, ExecutionMode::InProcess)?;
    let manifest_path = write_manifest(&out, &manifest)?;

    println!("{}", outcome.path.display());
    println!("{}", manifest_path.display());
    Ok(())
}
