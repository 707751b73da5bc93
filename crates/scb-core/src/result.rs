//! The consolidated result file of a sweep.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::errors::{io_error, parse_error, BenchError, ErrorInfo};
use crate::io::write_atomic;
use crate::point::{Measurement, SweepPoint};
use crate::spec::{sweep_stem, validate_name, Phases, SweepMode};

/// One averaged row of a result file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Coordinate the row belongs to.
    pub point: SweepPoint,
    /// Repetition-averaged durations.
    pub mean: Measurement,
}

/// Persisted aggregate of one sweep.
///
/// The text layout is three header lines (name, mode, enabled phases) followed by
/// one `ndv, nstate, nproc, flag, t_primary, t_diff, t_opt` row per sweep point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFile {
    /// Sweep identifier.
    pub name: String,
    /// Varying axis.
    pub mode: SweepMode,
    /// Phases whose durations were recorded.
    pub phases: Phases,
    /// Rows in sweep point order.
    pub rows: Vec<ResultRow>,
}

impl ResultFile {
    /// Shared stem of the sweep's files.
    pub fn stem(&self) -> String {
        sweep_stem(&self.name, self.mode, &self.phases)
    }

    /// `{name}_{mode}_{phase tags}.dat`
    pub fn file_name(&self) -> String {
        format!("{}.dat", self.stem())
    }

    /// True when any row was measured with the flag on.
    pub fn uses_flag(&self) -> bool {
        self.rows.iter().any(|row| row.point.flag)
    }

    /// Averaged measurement recorded for a coordinate.
    pub fn lookup(&self, point: &SweepPoint) -> Option<&Measurement> {
        self.rows
            .iter()
            .find(|row| &row.point == point)
            .map(|row| &row.mean)
    }

    /// Renders the text representation after validating every row.
    pub fn render(&self) -> Result<String, BenchError> {
        validate_name(&self.name)?;
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.name);
        let _ = writeln!(out, "{}", self.mode);
        let _ = writeln!(
            out,
            "{}, {}, {}",
            self.phases.primary, self.phases.diff, self.phases.opt
        );
        for (idx, row) in self.rows.iter().enumerate() {
            if !row.mean.is_valid() {
                return Err(BenchError::Config(
                    ErrorInfo::new("invalid_row", "durations must be finite and non-negative")
                        .with_context("row", idx.to_string())
                        .with_context("point", row.point.to_string()),
                ));
            }
            let p = &row.point;
            let m = &row.mean;
            let _ = writeln!(
                out,
                "{}, {}, {}, {}, {}, {}, {}",
                p.ndv, p.nstate, p.nproc, p.flag, m.t_primary, m.t_diff, m.t_opt
            );
        }
        Ok(out)
    }

    /// Writes the file into `dir` under [`ResultFile::file_name`], atomically.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, BenchError> {
        let path = dir.join(self.file_name());
        self.write_to(&path)?;
        Ok(path)
    }

    /// Writes the file to an explicit path, atomically.
    pub fn write_to(&self, path: &Path) -> Result<(), BenchError> {
        let text = self.render()?;
        write_atomic(path, text.as_bytes())
    }

    /// Reads and validates a result file.
    pub fn read(path: &Path) -> Result<Self, BenchError> {
        let text = fs::read_to_string(path).map_err(|err| io_error("result_read", path, err))?;
        Self::parse(&text, path)
    }

    /// Parses result text; `source` is only used in error context.
    pub fn parse(text: &str, source: &Path) -> Result<Self, BenchError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());
        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| {
                let line = err.position().map(|pos| pos.line());
                parse_error("result_csv", source, line, err.to_string())
            })?;
            records.push(record);
        }
        if records.len() < 3 {
            return Err(parse_error(
                "result_header",
                source,
                None,
                "result file needs name, mode and phase header lines",
            ));
        }
        let mut records = records.into_iter();
        let name = header_field(records.next(), source, "name")?;
        let mode_text = header_field(records.next(), source, "mode")?;
        let mode = SweepMode::from_str(&mode_text)
            .map_err(|_| parse_error("result_mode", source, Some(2), "unknown sweep mode"))?;
        let phases_record = records.next().unwrap_or_default();
        if phases_record.len() != 3 {
            return Err(parse_error(
                "result_phases",
                source,
                line_of(&phases_record),
                format!(
                    "expected 3 phase flags, found {} fields",
                    phases_record.len()
                ),
            ));
        }
        let phases = Phases {
            primary: field(&phases_record, 0, source, parse_bool)?,
            diff: field(&phases_record, 1, source, parse_bool)?,
            opt: field(&phases_record, 2, source, parse_bool)?,
        };

        let mut rows = Vec::new();
        for record in records {
            rows.push(parse_row(&record, source)?);
        }
        Ok(ResultFile {
            name,
            mode,
            phases,
            rows,
        })
    }
}

fn parse_row(record: &StringRecord, source: &Path) -> Result<ResultRow, BenchError> {
    // Rows written before the flag column existed carry six fields.
    let (flag, offset) = match record.len() {
        7 => (field(record, 3, source, parse_bool)?, 4),
        6 => (false, 3),
        other => {
            return Err(parse_error(
                "result_row",
                source,
                line_of(record),
                format!("expected 7 fields, found {other}"),
            ))
        }
    };
    let mean = Measurement::new(
        field(record, offset, source, parse_number)?,
        field(record, offset + 1, source, parse_number)?,
        field(record, offset + 2, source, parse_number)?,
    );
    if !mean.is_valid() {
        return Err(parse_error(
            "result_row",
            source,
            line_of(record),
            "durations must be finite and non-negative",
        ));
    }
    Ok(ResultRow {
        point: SweepPoint {
            ndv: field(record, 0, source, parse_number)?,
            nstate: field(record, 1, source, parse_number)?,
            nproc: field(record, 2, source, parse_number)?,
            flag,
        },
        mean,
    })
}

fn header_field(
    record: Option<StringRecord>,
    source: &Path,
    what: &str,
) -> Result<String, BenchError> {
    let record = record.unwrap_or_default();
    match record.get(0) {
        Some(value) if record.len() == 1 && !value.is_empty() => Ok(value.to_string()),
        _ => Err(parse_error(
            "result_header",
            source,
            line_of(&record),
            format!("expected a single {what} field"),
        )),
    }
}

fn line_of(record: &StringRecord) -> Option<u64> {
    record.position().map(|pos| pos.line())
}

/// Extracts field `idx` of a record through `parse`, reporting file and line on failure.
pub(crate) fn field<T>(
    record: &StringRecord,
    idx: usize,
    source: &Path,
    parse: fn(&str) -> Option<T>,
) -> Result<T, BenchError> {
    let raw = record.get(idx).unwrap_or_default();
    parse(raw).ok_or_else(|| {
        parse_error(
            "field",
            source,
            line_of(record),
            format!("cannot parse field {} ({raw:?})", idx + 1),
        )
    })
}

pub(crate) fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

/// Accepts `true`/`false` in any case.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
