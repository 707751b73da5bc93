//! Per-repetition output files written by batch workers.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ReaderBuilder, Trim};

use crate::errors::{io_error, parse_error, BenchError};
use crate::io::write_atomic;
use crate::point::{Measurement, SweepPoint};
use crate::result::{field, parse_bool, parse_number};
use crate::spec::{sweep_stem, Phases, SweepMode, SweepSpec, FIELD_SEPARATOR};

/// Glob matching per-point output files in a batch directory.
pub const PER_POINT_GLOB: &str = "_*.dat";

/// Parsed identity of a per-point file:
/// `_{name}_{mode}_{phase tags}_{ndv}_{nstate}_{nproc}_{flag}_{repetition}.dat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerPointName {
    /// Sweep identifier.
    pub name: String,
    /// Varying axis.
    pub mode: SweepMode,
    /// Recorded phases.
    pub phases: Phases,
    /// Coordinate the file belongs to.
    pub point: SweepPoint,
    /// Zero based repetition index.
    pub repetition: usize,
}

impl PerPointName {
    /// Names the file produced by one repetition of `point` in `spec`.
    pub fn new(spec: &SweepSpec, point: SweepPoint, repetition: usize) -> Self {
        Self {
            name: spec.name().to_string(),
            mode: spec.mode(),
            phases: spec.phases(),
            point,
            repetition,
        }
    }

    /// Prefix shared by every per-point file of the sweep, including the leading `_`.
    pub fn stem(&self) -> String {
        format!("_{}", sweep_stem(&self.name, self.mode, &self.phases))
    }

    /// Full file name without directory.
    pub fn file_name(&self) -> String {
        format!("{}.dat", self.base_name())
    }

    /// File name without the `.dat` extension; also names the job files.
    pub fn base_name(&self) -> String {
        let p = &self.point;
        format!(
            "{}_{}_{}_{}_{}_{}",
            self.stem(),
            p.ndv,
            p.nstate,
            p.nproc,
            p.flag,
            self.repetition
        )
    }

    /// Parses a per-point file name.
    pub fn parse(file_name: &str) -> Result<Self, BenchError> {
        let source = Path::new(file_name);
        let malformed = |message: &str| parse_error("per_point_name", source, None, message);
        let body = file_name
            .strip_suffix(".dat")
            .and_then(|rest| rest.strip_prefix(FIELD_SEPARATOR))
            .ok_or_else(|| malformed("expected `_<stem>_..._<repetition>.dat`"))?;
        let parts: Vec<&str> = body.split(FIELD_SEPARATOR).collect();
        if parts.len() < 7 || parts[0].is_empty() {
            return Err(malformed("too few `_` separated fields"));
        }
        let coords = &parts[parts.len() - 5..];
        let mode = SweepMode::from_str(parts[1]).map_err(|_| malformed("unknown sweep mode"))?;
        let phases = Phases::from_tags(&parts[2..parts.len() - 5])
            .map_err(|_| malformed("unknown phase tag"))?;
        let number = |raw: &str, what: &str| -> Result<usize, BenchError> {
            parse_number(raw).ok_or_else(|| malformed(&format!("cannot parse {what} ({raw:?})")))
        };
        Ok(PerPointName {
            name: parts[0].to_string(),
            mode,
            phases,
            point: SweepPoint {
                ndv: number(coords[0], "ndv")?,
                nstate: number(coords[1], "nstate")?,
                nproc: number(coords[2], "nproc")?,
                flag: parse_bool(coords[3]).ok_or_else(|| malformed("cannot parse flag"))?,
            },
            repetition: number(coords[4], "repetition")?,
        })
    }
}

/// Writes one repetition's raw durations as a single `t_primary, t_diff, t_opt` line.
pub fn write_per_point(
    dir: &Path,
    name: &PerPointName,
    sample: &Measurement,
) -> Result<PathBuf, BenchError> {
    let path = dir.join(name.file_name());
    let line = format!(
        "{}, {}, {}\n",
        sample.t_primary, sample.t_diff, sample.t_opt
    );
    write_atomic(&path, line.as_bytes())?;
    Ok(path)
}

/// Reads the single measurement line of a per-point file.
pub fn read_per_point(path: &Path) -> Result<Measurement, BenchError> {
    let text = fs::read_to_string(path).map_err(|err| io_error("per_point_read", path, err))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    let record = match reader.records().next() {
        Some(Ok(record)) => record,
        Some(Err(err)) => return Err(parse_error("per_point_csv", path, None, err.to_string())),
        None => return Err(parse_error("per_point_empty", path, None, "file is empty")),
    };
    if record.len() != 3 {
        return Err(parse_error(
            "per_point_fields",
            path,
            record.position().map(|pos| pos.line()),
            format!("expected 3 durations, found {} fields", record.len()),
        ));
    }
    let sample = Measurement::new(
        field(&record, 0, path, parse_number)?,
        field(&record, 1, path, parse_number)?,
        field(&record, 2, path, parse_number)?,
    );
    if !sample.is_valid() {
        return Err(parse_error(
            "per_point_value",
            path,
            Some(1),
            "durations must be finite and non-negative",
        ));
    }
    Ok(sample)
}
