use std::error::Error;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use scb_batch::{aggregate_dir, AggregateOpts, CompletenessPolicy};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolicyArg {
    Average,
    Warn,
    Fail,
}

impl From<PolicyArg> for CompletenessPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Average => CompletenessPolicy::Average,
            PolicyArg::Warn => CompletenessPolicy::Warn,
            PolicyArg::Fail => CompletenessPolicy::Fail,
        }
    }
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Directory holding the per-point files.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// Handling of points with missing repetitions.
    #[arg(long, value_enum, default_value_t = PolicyArg::Warn)]
    pub policy: PolicyArg,
    /// Repetitions every point should have.
    #[arg(long)]
    pub expected: Option<usize>,
}

pub fn run(args: &AggregateArgs) -> Result<(), Box<dyn Error>> {
    let opts = AggregateOpts {
        policy: args.policy.into(),
        expected_repetitions: args.expected,
    };
    let outcome = aggregate_dir(&args.dir, &opts)?;
    println!("{}", outcome.path.display());
    if !outcome.incomplete.is_empty() {
        println!("incomplete points: {}", outcome.incomplete.len());
    }
    Ok(())
}
