use std::path::{Path, PathBuf};

use scb_core::{BenchError, ErrorInfo, MeasurementSum, ResultFile, ResultRow, SweepSpec};

use crate::model::{Benchmark, ExecutionMode, SetupContext};
use crate::workdir::WorkdirGuard;

/// Executes a [`SweepSpec`] sequentially in the current process.
#[derive(Debug, Clone)]
pub struct SweepRunner {
    spec: SweepSpec,
    out_dir: Option<PathBuf>,
}

/// Result of a completed in-process sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    /// Averaged rows as written.
    pub result: ResultFile,
    /// Location of the written result file.
    pub path: PathBuf,
}

impl SweepRunner {
    /// Creates a runner; multi-process sweeps are rejected here.
    pub fn new(spec: SweepSpec) -> Result<Self, BenchError> {
        spec.check_single_process()?;
        Ok(Self {
            spec,
            out_dir: None,
        })
    }

    /// Writes the result file into `dir` instead of the starting directory.
    /// Relative paths resolve against the starting directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    /// The sweep being executed.
    pub fn spec(&self) -> &SweepSpec {
        &self.spec
    }

    /// Runs every point `num_repetitions` times, averages, and writes the result file.
    ///
    /// Any hook failure aborts the sweep and nothing is written. The working
    /// directory is restored on every exit path.
    pub fn run(&self, bench: &dyn Benchmark) -> Result<SweepOutcome, BenchError> {
        let guard = WorkdirGuard::capture()?;
        let base_dir = guard.path().to_path_buf();
        let phases = self.spec.phases();
        let mut rows = Vec::with_capacity(self.spec.point_count());

        for point in self.spec.points() {
            tracing::info!("Running: {point}");
            let mut sum = MeasurementSum::default();
            for repetition in 0..self.spec.num_repetitions() {
                let ctx = SetupContext {
                    base_dir: &base_dir,
                    mode: ExecutionMode::InProcess,
                    repetition,
                };
                let sample = bench.measure(&point, &ctx, phases)?;
                sum.add(&sample);
            }
            let mean = sum.average().ok_or_else(|| {
                BenchError::Aggregate(
                    ErrorInfo::new("no_samples", "point finished without a measurement")
                        .with_context("point", point.to_string()),
                )
            })?;
            tracing::info!(
                %point,
                repetitions = sum.count(),
                t_primary = mean.t_primary,
                t_diff = mean.t_diff,
                t_opt = mean.t_opt,
                "point averaged"
            );
            rows.push(ResultRow { point, mean });
        }

        guard.restore()?;
        let result = ResultFile {
            name: self.spec.name().to_string(),
            mode: self.spec.mode(),
            phases,
            rows,
        };
        let dir = self.output_dir(&base_dir);
        let path = result.write(&dir)?;
        tracing::info!(path = %path.display(), "result file written");
        Ok(SweepOutcome { result, path })
    }

    fn output_dir(&self, base_dir: &Path) -> PathBuf {
        match &self.out_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        }
    }
}
