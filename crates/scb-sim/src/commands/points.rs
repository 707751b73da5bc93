use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use scb_core::{load_plan, to_canonical_json_bytes};

#[derive(Args, Debug)]
pub struct PointsArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Print the points as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &PointsArgs) -> Result<(), Box<dyn Error>> {
    let spec = load_plan(&args.plan)?;
    let points = spec.points();
    if args.json {
        let bytes = to_canonical_json_bytes(&points)?;
        print!("{}", String::from_utf8(bytes)?);
        return Ok(());
    }
    println!("{} ({} mode, {} points)", spec.stem(), spec.mode(), points.len());
    for point in &points {
        println!("{point}");
    }
    Ok(())
}
