use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use scb_core::{
    io_error, stable_hash_string, to_canonical_json_bytes, write_atomic, BenchError, ErrorInfo,
    SweepSpec,
};
use serde::{Deserialize, Serialize};

use crate::job::{write_job, write_job_list, JobDescription, JobList};
use crate::queue::{shell_quote, QueueConfig, QueueDescriptor};

/// One generated queue descriptor and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEntry {
    /// Scheduler job name.
    pub job_name: String,
    /// Job description or job list the descriptor runs.
    pub job_file: PathBuf,
    /// Rendered queue descriptor.
    pub script: PathBuf,
    /// Requested node count.
    pub nodes: usize,
    /// Whether the descriptor was handed to the submit command.
    pub submitted: bool,
    /// Trimmed stdout of the submit command, usually the scheduler job id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// Record of a dispatch, written as `{stem}.dispatch.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub benchmark: String,
    pub spec: SweepSpec,
    pub spec_hash: String,
    pub single_batch: bool,
    pub queue: QueueConfig,
    pub entries: Vec<DispatchEntry>,
    pub created_at: String,
}

impl DispatchReport {
    /// `{stem}.dispatch.json`
    pub fn file_name(&self) -> String {
        format!("{}.dispatch.json", self.spec.stem())
    }
}

/// Generates job files and queue descriptors for a sweep and submits them.
#[derive(Debug, Clone)]
pub struct JobDispatcher {
    spec: SweepSpec,
    benchmark: String,
    queue: QueueConfig,
    dir: PathBuf,
    single_batch: bool,
}

impl JobDispatcher {
    /// Dispatcher writing into `dir`, which is also the jobs' working directory.
    pub fn new(
        spec: SweepSpec,
        benchmark: impl Into<String>,
        queue: QueueConfig,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            spec,
            benchmark: benchmark.into(),
            queue,
            dir: dir.into(),
            single_batch: false,
        }
    }

    /// Collects every job into one combined descriptor instead of one per job.
    pub fn single_batch(mut self, enabled: bool) -> Self {
        self.single_batch = enabled;
        self
    }

    /// Overrides the configured walltime.
    pub fn walltime_hours(mut self, hours: u32) -> Self {
        self.queue.walltime_hours = hours;
        self
    }

    /// Sweep being dispatched.
    pub fn spec(&self) -> &SweepSpec {
        &self.spec
    }

    /// Job descriptions in sweep order, repetitions innermost.
    pub fn jobs(&self) -> Vec<JobDescription> {
        self.build_jobs(&self.dir)
    }

    fn build_jobs(&self, out_dir: &Path) -> Vec<JobDescription> {
        let mut jobs = Vec::with_capacity(self.spec.point_count() * self.spec.num_repetitions());
        for point in self.spec.points() {
            for repetition in 0..self.spec.num_repetitions() {
                jobs.push(JobDescription {
                    benchmark: self.benchmark.clone(),
                    spec: self.spec.clone(),
                    point,
                    repetition,
                    out_dir: out_dir.to_path_buf(),
                });
            }
        }
        jobs
    }

    /// Writes every file, submits the descriptors and records the dispatch.
    ///
    /// A failed submission stops the dispatch. The report is still written so
    /// it records which descriptors were queued before the failure.
    pub fn dispatch(&self) -> Result<DispatchReport, BenchError> {
        self.queue.validate()?;
        fs::create_dir_all(&self.dir).map_err(|err| io_error("dispatch_dir", &self.dir, err))?;
        let dir = self
            .dir
            .canonicalize()
            .map_err(|err| io_error("dispatch_dir", &self.dir, err))?;
        let worker = shell_quote(&self.queue.worker_path()?.to_string_lossy());

        let mut entries = if self.single_batch {
            vec![self.prepare_combined(&dir, &worker)?]
        } else {
            self.prepare_per_point(&dir, &worker)?
        };
        tracing::info!(
            descriptors = entries.len(),
            single_batch = self.single_batch,
            "queue descriptors written"
        );

        let mut failure = None;
        if self.queue.submit {
            for entry in &mut entries {
                match self.submit(&dir, &entry.script) {
                    Ok(job_id) => {
                        entry.job_id = job_id;
                        entry.submitted = true;
                    }
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }
        }

        let report = DispatchReport {
            benchmark: self.benchmark.clone(),
            spec: self.spec.clone(),
            spec_hash: stable_hash_string(&self.spec)?,
            single_batch: self.single_batch,
            queue: self.queue.clone(),
            entries,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let path = dir.join(report.file_name());
        write_atomic(&path, &to_canonical_json_bytes(&report)?)?;
        tracing::info!(path = %path.display(), "dispatch report written");
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(report)
    }

    fn prepare_per_point(
        &self,
        dir: &Path,
        worker: &str,
    ) -> Result<Vec<DispatchEntry>, BenchError> {
        let mut entries = Vec::new();
        for job in self.build_jobs(dir) {
            let job_file = write_job(dir, &job)?;
            let job_name = job.per_point_name().base_name();
            let descriptor = QueueDescriptor {
                job_name: job_name.clone(),
                nodes: self.queue.nodes_for(job.point.nproc),
                work_dir: dir.to_path_buf(),
                commands: vec![format!(
                    "{} -n {} {} worker --job {}",
                    self.queue.launcher,
                    job.point.nproc,
                    worker,
                    shell_quote(&job_file.to_string_lossy())
                )],
            };
            let script = dir.join(format!("{job_name}.sh"));
            write_atomic(&script, descriptor.render(&self.queue).as_bytes())?;
            entries.push(DispatchEntry {
                job_name,
                job_file,
                script,
                nodes: descriptor.nodes,
                submitted: false,
                job_id: None,
            });
        }
        Ok(entries)
    }

    fn prepare_combined(&self, dir: &Path, worker: &str) -> Result<DispatchEntry, BenchError> {
        let list = JobList {
            jobs: self.build_jobs(dir),
        };
        let stem = self.spec.stem();
        let job_file = dir.join(format!("{stem}.jobs.json"));
        write_job_list(&job_file, &list)?;
        let quoted_list = shell_quote(&job_file.to_string_lossy());
        let commands = list
            .jobs
            .iter()
            .enumerate()
            .map(|(index, job)| {
                format!(
                    "{} -n {} {} worker --jobs {} --index {}",
                    self.queue.launcher, job.point.nproc, worker, quoted_list, index
                )
            })
            .collect();
        let descriptor = QueueDescriptor {
            job_name: stem.clone(),
            nodes: self.queue.nodes_for(self.spec.max_procs()),
            work_dir: dir.to_path_buf(),
            commands,
        };
        let script = dir.join(format!("{stem}.batch.sh"));
        write_atomic(&script, descriptor.render(&self.queue).as_bytes())?;
        Ok(DispatchEntry {
            job_name: stem,
            job_file,
            script,
            nodes: descriptor.nodes,
            submitted: false,
            job_id: None,
        })
    }

    fn submit(&self, dir: &Path, script: &Path) -> Result<Option<String>, BenchError> {
        let output = Command::new(&self.queue.submit_command)
            .arg(script)
            .current_dir(dir)
            .output()
            .map_err(|err| {
                BenchError::Submit(
                    ErrorInfo::new("scb_batch.submit_spawn", err.to_string())
                        .with_context("command", self.queue.submit_command.clone())
                        .with_context("script", script.display().to_string()),
                )
            })?;
        if !output.status.success() {
            return Err(BenchError::Submit(
                ErrorInfo::new(
                    "scb_batch.submit_status",
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                )
                .with_context("command", self.queue.submit_command.clone())
                .with_context("script", script.display().to_string())
                .with_context("status", output.status.to_string()),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::info!(script = %script.display(), job_id = %stdout, "submitted");
        Ok((!stdout.is_empty()).then_some(stdout))
    }
}
