use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use scb_core::{from_yaml_slice, io_error, BenchError, ErrorInfo};
use serde::{Deserialize, Serialize};

/// Scheduler settings shared by every generated queue descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Processor slots per node; node counts are rounded up to whole nodes.
    pub procs_per_node: usize,
    /// Value of the `model=` node selector.
    pub cpu_model: String,
    /// Destination queue.
    pub queue: String,
    /// Accounting group, omitted from descriptors when unset.
    pub group_list: Option<String>,
    /// Mail events requested from the scheduler.
    pub mail_events: String,
    /// Command receiving the descriptor path as its only argument.
    pub submit_command: String,
    /// MPI launcher placed in front of every worker command.
    pub launcher: String,
    /// Wall-clock limit per job, in hours.
    pub walltime_hours: u32,
    /// Worker executable; the running executable when unset.
    pub worker: Option<PathBuf>,
    /// Hand descriptors to `submit_command`; disable for dry runs.
    pub submit: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            procs_per_node: 24,
            cpu_model: "has".to_string(),
            queue: "normal".to_string(),
            group_list: None,
            mail_events: "bae".to_string(),
            submit_command: "qsub".to_string(),
            launcher: "mpiexec".to_string(),
            walltime_hours: 4,
            worker: None,
            submit: true,
        }
    }
}

impl QueueConfig {
    /// Loads and validates a YAML queue configuration.
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let bytes = fs::read(path).map_err(|err| io_error("queue_read", path, err))?;
        let config: QueueConfig = from_yaml_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that cannot produce a usable descriptor.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.procs_per_node == 0 {
            return Err(BenchError::config(
                "scb_batch.procs_per_node",
                "procs_per_node must be positive",
            ));
        }
        if self.walltime_hours == 0 {
            return Err(BenchError::config(
                "scb_batch.walltime",
                "walltime_hours must be positive",
            ));
        }
        for (field, value) in [
            ("submit_command", &self.submit_command),
            ("launcher", &self.launcher),
        ] {
            if value.trim().is_empty() {
                return Err(BenchError::Config(
                    ErrorInfo::new("scb_batch.empty_command", "command must not be empty")
                        .with_context("field", field),
                ));
            }
        }
        Ok(())
    }

    /// Worker executable written into run commands.
    pub fn worker_path(&self) -> Result<PathBuf, BenchError> {
        match &self.worker {
            Some(path) => Ok(path.clone()),
            None => std::env::current_exe()
                .map_err(|err| io_error("scb_batch.current_exe", Path::new("."), err)),
        }
    }

    /// Nodes needed for `nproc` processors under this configuration.
    pub fn nodes_for(&self, nproc: usize) -> usize {
        nodes_for(nproc, self.procs_per_node)
    }
}

/// Whole nodes needed to host `nproc` processors, never less than one.
pub fn nodes_for(nproc: usize, procs_per_node: usize) -> usize {
    nproc.div_ceil(procs_per_node.max(1)).max(1)
}

/// One scheduler submission script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDescriptor {
    /// Scheduler job name, also used for the stdout/stderr files.
    pub job_name: String,
    /// Requested node count.
    pub nodes: usize,
    /// Directory the job changes into before running its commands.
    pub work_dir: PathBuf,
    /// Shell commands executed in order.
    pub commands: Vec<String>,
}

impl QueueDescriptor {
    /// Renders the descriptor as a PBS batch script.
    pub fn render(&self, config: &QueueConfig) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "#!/bin/bash");
        let _ = writeln!(out, "#PBS -S /bin/bash");
        let _ = writeln!(out, "#PBS -N {}", self.job_name);
        let _ = writeln!(
            out,
            "#PBS -l select={}:ncpus={}:model={}",
            self.nodes, config.procs_per_node, config.cpu_model
        );
        let _ = writeln!(out, "#PBS -l walltime={}:00:00", config.walltime_hours);
        let _ = writeln!(out, "#PBS -j oe");
        if let Some(group) = &config.group_list {
            let _ = writeln!(out, "#PBS -W group_list={group}");
        }
        let _ = writeln!(out, "#PBS -m {}", config.mail_events);
        let _ = writeln!(out, "#PBS -o stdout_{}.out", self.job_name);
        let _ = writeln!(out, "#PBS -e stderr_{}.out", self.job_name);
        let _ = writeln!(out, "#PBS -q {}", config.queue);
        out.push('\n');
        let _ = writeln!(out, "unset USE_PROC_FILES");
        out.push('\n');
        let _ = writeln!(out, "cd {}", shell_quote(&self.work_dir.to_string_lossy()));
        out.push('\n');
        for command in &self.commands {
            let _ = writeln!(out, "{command}");
        }
        out
    }
}

/// Quotes a word for POSIX shells unless it only holds safe characters.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
