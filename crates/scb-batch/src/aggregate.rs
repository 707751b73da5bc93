use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use scb_core::{
    io_error, read_per_point, BenchError, ErrorInfo, Measurement, MeasurementSum, PerPointName,
    ResultFile, ResultRow, SweepPoint, PER_POINT_GLOB,
};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// What to do with coordinates that have fewer repetitions than expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletenessPolicy {
    /// Average over whatever was found.
    Average,
    /// Average over whatever was found and log each short coordinate.
    #[default]
    Warn,
    /// Refuse to write a result.
    Fail,
}

/// Aggregation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateOpts {
    /// Handling of short coordinates.
    pub policy: CompletenessPolicy,
    /// Repetitions each coordinate should have; the largest observed count when unset.
    pub expected_repetitions: Option<usize>,
}

/// Result of folding a directory of per-point files.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome {
    /// Result as written.
    pub result: ResultFile,
    /// Location of the written result file.
    pub path: PathBuf,
    /// Number of per-point files consumed.
    pub files: usize,
    /// Coordinates averaged over fewer repetitions than expected.
    pub incomplete: Vec<SweepPoint>,
}

fn aggregate_error(code: &str, message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(format!("scb_batch.{code}"), message)
}

fn per_point_matcher() -> Result<GlobMatcher, BenchError> {
    Glob::new(PER_POINT_GLOB)
        .map(|glob| glob.compile_matcher())
        .map_err(|err| BenchError::Config(aggregate_error("glob", err.to_string())))
}

/// Per-point files directly inside `dir`, sorted by file name.
fn list_per_point_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, BenchError> {
    fs::metadata(dir).map_err(|err| io_error("aggregate_dir", dir, err))?;
    let matcher = per_point_matcher()?;
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if matcher.is_match(name) {
            files.push((name.to_string(), entry.path().to_path_buf()));
        }
    }
    Ok(files)
}

/// Rebuilds a result file from the per-point files in `dir` and writes it there.
///
/// Every file must share the stem of the first one in file-name order; a
/// mixed directory is rejected before anything is written. Rows are ordered
/// by desvar, state, proc and flag, each ascending.
pub fn aggregate_dir(dir: &Path, opts: &AggregateOpts) -> Result<AggregateOutcome, BenchError> {
    let files = list_per_point_files(dir)?;
    let Some((first_name, _)) = files.first() else {
        return Err(BenchError::Aggregate(
            aggregate_error("no_files", "no per-point files found")
                .with_context("dir", dir.display().to_string())
                .with_context("pattern", PER_POINT_GLOB),
        ));
    };
    let first = PerPointName::parse(first_name)?;
    let stem = first.stem();

    let mut groups: BTreeMap<SweepPoint, BTreeMap<usize, Measurement>> = BTreeMap::new();
    for (file_name, path) in &files {
        let name = PerPointName::parse(file_name)?;
        if name.stem() != stem {
            return Err(BenchError::Aggregate(
                aggregate_error("stem_mismatch", "per-point files from more than one sweep")
                    .with_context("expected", stem.clone())
                    .with_context("found", name.stem())
                    .with_context("path", path.display().to_string())
                    .with_hint("move each sweep's files into its own directory"),
            ));
        }
        let sample = read_per_point(path)?;
        let repetitions = groups.entry(name.point).or_default();
        if repetitions.insert(name.repetition, sample).is_some() {
            return Err(BenchError::Aggregate(
                aggregate_error("duplicate_repetition", "repetition recorded twice")
                    .with_context("point", name.point.to_string())
                    .with_context("repetition", name.repetition.to_string())
                    .with_context("path", path.display().to_string()),
            ));
        }
    }

    check_complete_grid(&groups)?;

    let expected = opts.expected_repetitions.unwrap_or_else(|| {
        groups
            .values()
            .map(BTreeMap::len)
            .max()
            .unwrap_or_default()
    });
    let mut rows = Vec::with_capacity(groups.len());
    let mut incomplete = Vec::new();
    for (point, repetitions) in &groups {
        let mut sum = MeasurementSum::default();
        for sample in repetitions.values() {
            sum.add(sample);
        }
        if sum.count() < expected {
            match opts.policy {
                CompletenessPolicy::Average => {}
                CompletenessPolicy::Warn => tracing::warn!(
                    %point,
                    found = sum.count(),
                    expected,
                    "averaging over fewer repetitions than expected"
                ),
                CompletenessPolicy::Fail => {
                    return Err(BenchError::Aggregate(
                        aggregate_error("incomplete_point", "missing repetitions")
                            .with_context("point", point.to_string())
                            .with_context("found", sum.count().to_string())
                            .with_context("expected", expected.to_string()),
                    ))
                }
            }
            incomplete.push(*point);
        }
        if let Some(mean) = sum.average() {
            rows.push(ResultRow {
                point: *point,
                mean,
            });
        }
    }

    let result = ResultFile {
        name: first.name,
        mode: first.mode,
        phases: first.phases,
        rows,
    };
    let path = result.write(dir)?;
    tracing::info!(
        path = %path.display(),
        files = files.len(),
        rows = result.rows.len(),
        "aggregated per-point files"
    );
    Ok(AggregateOutcome {
        result,
        path,
        files: files.len(),
        incomplete,
    })
}

/// Every combination of the observed axis values must have at least one file.
fn check_complete_grid(
    groups: &BTreeMap<SweepPoint, BTreeMap<usize, Measurement>>,
) -> Result<(), BenchError> {
    let ndvs: BTreeSet<usize> = groups.keys().map(|p| p.ndv).collect();
    let nstates: BTreeSet<usize> = groups.keys().map(|p| p.nstate).collect();
    let nprocs: BTreeSet<usize> = groups.keys().map(|p| p.nproc).collect();
    let flags: BTreeSet<bool> = groups.keys().map(|p| p.flag).collect();
    for &ndv in &ndvs {
        for &nstate in &nstates {
            for &nproc in &nprocs {
                for &flag in &flags {
                    let point = SweepPoint {
                        ndv,
                        nstate,
                        nproc,
                        flag,
                    };
                    if !groups.contains_key(&point) {
                        return Err(BenchError::Aggregate(
                            aggregate_error("missing_point", "no per-point files for coordinate")
                                .with_context("point", point.to_string()),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}
