//! Batch execution of scaling sweeps.
//!
//! The [`JobDispatcher`] turns a sweep into serialized [`JobDescription`]s and
//! queue descriptors, a worker process executes one description through
//! [`run_job`] and leaves a per-point file behind, and [`aggregate_dir`]
//! folds those files back into a single result file.

mod aggregate;
mod dispatch;
mod job;
mod queue;

pub use aggregate::{aggregate_dir, AggregateOpts, AggregateOutcome, CompletenessPolicy};
pub use dispatch::{DispatchEntry, DispatchReport, JobDispatcher};
pub use job::{
    load_job, load_job_list, mpi_rank, run_job, write_job, write_job_list, JobDescription, JobList,
};
pub use queue::{nodes_for, shell_quote, QueueConfig, QueueDescriptor};
