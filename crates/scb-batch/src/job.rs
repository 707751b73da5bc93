use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use scb_core::{
    from_json_slice, io_error, to_canonical_json_bytes, write_atomic, write_per_point, BenchError,
    ErrorInfo, PerPointName, SweepPoint, SweepSpec,
};
use scb_exp::{ExecutionMode, Registry, SetupContext, WorkdirGuard};
use serde::{Deserialize, Serialize};

/// Environment variables carrying the MPI rank, in lookup order.
const RANK_VARS: [&str; 3] = ["PMI_RANK", "OMPI_COMM_WORLD_RANK", "PMIX_RANK"];

/// Everything a worker process needs to execute one repetition of one point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescription {
    /// Registry name of the benchmark to instantiate.
    pub benchmark: String,
    /// Sweep the point belongs to.
    pub spec: SweepSpec,
    /// Coordinate to execute.
    pub point: SweepPoint,
    /// Zero based repetition index.
    pub repetition: usize,
    /// Directory receiving the per-point file.
    pub out_dir: PathBuf,
}

impl JobDescription {
    /// Name of the per-point file this job produces.
    pub fn per_point_name(&self) -> PerPointName {
        PerPointName::new(&self.spec, self.point, self.repetition)
    }

    /// `{per-point base name}.job.json`
    pub fn file_name(&self) -> String {
        format!("{}.job.json", self.per_point_name().base_name())
    }

    /// Checks that the point and repetition belong to the sweep.
    pub fn validate(&self) -> Result<(), BenchError> {
        if !self.spec.points().contains(&self.point) {
            return Err(BenchError::Config(
                ErrorInfo::new("scb_batch.foreign_point", "point is not part of the sweep")
                    .with_context("point", self.point.to_string())
                    .with_context("sweep", self.spec.stem()),
            ));
        }
        if self.repetition >= self.spec.num_repetitions() {
            return Err(BenchError::Config(
                ErrorInfo::new("scb_batch.repetition_range", "repetition index out of range")
                    .with_context("repetition", self.repetition.to_string())
                    .with_context("num_repetitions", self.spec.num_repetitions().to_string()),
            ));
        }
        Ok(())
    }
}

/// Ordered jobs of a combined batch; workers pick one by index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobList {
    /// Jobs in submission order.
    pub jobs: Vec<JobDescription>,
}

impl JobList {
    /// Job at `index`, or a configuration error when out of range.
    pub fn get(&self, index: usize) -> Result<&JobDescription, BenchError> {
        self.jobs.get(index).ok_or_else(|| {
            BenchError::Config(
                ErrorInfo::new("scb_batch.job_index", "job index out of range")
                    .with_context("index", index.to_string())
                    .with_context("jobs", self.jobs.len().to_string()),
            )
        })
    }
}

/// Writes a job description into `dir` under [`JobDescription::file_name`].
pub fn write_job(dir: &Path, job: &JobDescription) -> Result<PathBuf, BenchError> {
    let path = dir.join(job.file_name());
    write_atomic(&path, &to_canonical_json_bytes(job)?)?;
    Ok(path)
}

/// Reads and validates a job description.
pub fn load_job(path: &Path) -> Result<JobDescription, BenchError> {
    let bytes = fs::read(path).map_err(|err| io_error("job_read", path, err))?;
    let job: JobDescription = from_json_slice(&bytes)?;
    job.validate()?;
    Ok(job)
}

/// Writes a job list to `path`.
pub fn write_job_list(path: &Path, list: &JobList) -> Result<(), BenchError> {
    write_atomic(path, &to_canonical_json_bytes(list)?)
}

/// Reads a job list and validates every entry.
pub fn load_job_list(path: &Path) -> Result<JobList, BenchError> {
    let bytes = fs::read(path).map_err(|err| io_error("job_list_read", path, err))?;
    let list: JobList = from_json_slice(&bytes)?;
    for job in &list.jobs {
        job.validate()?;
    }
    Ok(list)
}

/// MPI rank of this process, `0` when no launcher variable is set.
pub fn mpi_rank() -> usize {
    RANK_VARS
        .iter()
        .find_map(|var| env::var(var).ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Executes one job and writes its per-point file.
///
/// Every rank measures; only rank 0 writes, and it returns the written path.
pub fn run_job(job: &JobDescription, registry: &Registry) -> Result<Option<PathBuf>, BenchError> {
    job.validate()?;
    let bench = registry.get(&job.benchmark)?;
    let guard = WorkdirGuard::capture()?;
    let base_dir = guard.path().to_path_buf();
    tracing::info!("Running: {}, av={}", job.point, job.repetition);
    let ctx = SetupContext {
        base_dir: &base_dir,
        mode: ExecutionMode::Batch,
        repetition: job.repetition,
    };
    let sample = bench.measure(&job.point, &ctx, job.spec.phases())?;
    guard.restore()?;

    let rank = mpi_rank();
    if rank != 0 {
        tracing::debug!(rank, "skipping per-point output on non-root rank");
        return Ok(None);
    }
    let out_dir = if job.out_dir.is_absolute() {
        job.out_dir.clone()
    } else {
        base_dir.join(&job.out_dir)
    };
    let path = write_per_point(&out_dir, &job.per_point_name(), &sample)?;
    tracing::info!(path = %path.display(), "per-point file written");
    Ok(Some(path))
}
