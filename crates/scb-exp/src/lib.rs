//! In-process sweep execution for scaling benchmarks.
//!
//! User models plug in through [`BenchHooks`]; the [`SweepRunner`] times
//! every point and writes one result file, while batch workers reach the same
//! measurement path through the [`Registry`].

mod manifest;
mod model;
mod registry;
mod runner;
mod synthetic;
mod workdir;

pub use manifest::{write_manifest, SweepManifest};
pub use model::{
    measure_repetition, BenchHooks, BenchModel, Benchmark, ExecutionMode, HookError, HookResult,
    SetupContext,
};
pub use registry::Registry;
pub use runner::{SweepOutcome, SweepRunner};
pub use synthetic::{SyntheticBench, SyntheticModel};
pub use workdir::WorkdirGuard;
