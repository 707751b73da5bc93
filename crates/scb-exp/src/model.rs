use std::error::Error;
use std::path::Path;
use std::time::Instant;

use scb_core::{BenchError, ErrorInfo, Measurement, Phases, SweepPoint};
use serde::{Deserialize, Serialize};

/// Error type returned by user models and hooks.
pub type HookError = Box<dyn Error + Send + Sync>;

/// Result alias for user models and hooks.
pub type HookResult<T = ()> = Result<T, HookError>;

/// Where a measurement is being taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Sequential sweep inside the calling process.
    InProcess,
    /// One repetition inside a queued batch job, possibly under an MPI launcher.
    Batch,
}

/// Context handed to [`BenchHooks::setup`].
#[derive(Debug, Clone, Copy)]
pub struct SetupContext<'a> {
    /// Directory the sweep was started from; hooks resolve relative inputs against it.
    pub base_dir: &'a Path,
    /// In-process or batch execution.
    pub mode: ExecutionMode,
    /// Zero based repetition index.
    pub repetition: usize,
}

/// The operations the harness drives on an external model.
pub trait BenchModel {
    /// Finalizes the model after construction (allocation, partitioning, ...).
    fn finalize(&mut self) -> HookResult;

    /// Primary evaluation. Always executed.
    fn run_primary(&mut self) -> HookResult;

    /// Derivative computation.
    fn run_diff(&mut self) -> HookResult;

    /// Optimization driver.
    fn run_optimize(&mut self) -> HookResult;
}

/// Strategy object that builds and checks a model for each sweep point.
pub trait BenchHooks {
    /// Concrete model type built by [`BenchHooks::setup`].
    type Model: BenchModel;

    /// Fully constructs the model for one point.
    fn setup(&self, point: &SweepPoint, ctx: &SetupContext<'_>) -> HookResult<Self::Model>;

    /// Runs after [`BenchModel::finalize`] and before the timed region.
    fn post_setup(&self, _model: &mut Self::Model, _point: &SweepPoint) -> HookResult {
        Ok(())
    }

    /// Runs after every timed phase, typically to check results.
    fn post_run(&self, _model: &mut Self::Model, _point: &SweepPoint) -> HookResult {
        Ok(())
    }
}

/// Object safe view of a benchmark, used by the runner, the registry and batch workers.
pub trait Benchmark {
    /// Measures one repetition of one point.
    fn measure(
        &self,
        point: &SweepPoint,
        ctx: &SetupContext<'_>,
        phases: Phases,
    ) -> Result<Measurement, BenchError>;
}

impl<H: BenchHooks> Benchmark for H {
    fn measure(
        &self,
        point: &SweepPoint,
        ctx: &SetupContext<'_>,
        phases: Phases,
    ) -> Result<Measurement, BenchError> {
        measure_repetition(self, point, ctx, phases)
    }
}

fn hook_error(stage: &str, point: &SweepPoint, err: HookError) -> BenchError {
    BenchError::Hook(
        ErrorInfo::new(format!("scb_exp.{stage}"), err.to_string())
            .with_context("stage", stage)
            .with_context("point", point.to_string()),
    )
}

/// Builds, finalizes and times one repetition of `point`.
///
/// Primary evaluation always runs; its duration is kept only when
/// `phases.primary` is set. Optimization and differentiation run only when
/// enabled and report `0.0` otherwise.
pub fn measure_repetition<H: BenchHooks + ?Sized>(
    hooks: &H,
    point: &SweepPoint,
    ctx: &SetupContext<'_>,
    phases: Phases,
) -> Result<Measurement, BenchError> {
    let mut model = hooks
        .setup(point, ctx)
        .map_err(|err| hook_error("setup", point, err))?;
    model
        .finalize()
        .map_err(|err| hook_error("finalize", point, err))?;
    hooks
        .post_setup(&mut model, point)
        .map_err(|err| hook_error("post_setup", point, err))?;

    let start = Instant::now();
    model
        .run_primary()
        .map_err(|err| hook_error("run_primary", point, err))?;
    let t_primary = start.elapsed().as_secs_f64();
    tracing::debug!(%point, seconds = t_primary, "primary evaluation complete");

    let t_opt = if phases.opt {
        let start = Instant::now();
        model
            .run_optimize()
            .map_err(|err| hook_error("run_optimize", point, err))?;
        let elapsed = start.elapsed().as_secs_f64();
        tracing::debug!(%point, seconds = elapsed, "optimization complete");
        elapsed
    } else {
        0.0
    };

    let t_diff = if phases.diff {
        let start = Instant::now();
        model
            .run_diff()
            .map_err(|err| hook_error("run_diff", point, err))?;
        let elapsed = start.elapsed().as_secs_f64();
        tracing::debug!(%point, seconds = elapsed, "differentiation complete");
        elapsed
    } else {
        0.0
    };

    hooks
        .post_run(&mut model, point)
        .map_err(|err| hook_error("post_run", point, err))?;

    Ok(Measurement::new(
        if phases.primary { t_primary } else { 0.0 },
        t_diff,
        t_opt,
    ))
}
