use std::collections::BTreeMap;

use scb_core::{
    BenchError, ErrorInfo, Measurement, Phase, Phases, ResultFile, ResultRow, SweepMode,
};

/// Value every point of a series is divided by.
///
/// `Ok(None)` means the series is entirely zero (an untimed phase) and should
/// not be plotted. A zero first value followed by non-zero values is an error.
pub fn baseline(values: &[f64]) -> Result<Option<f64>, BenchError> {
    if values.iter().all(|value| *value == 0.0) {
        return Ok(None);
    }
    let first = values[0];
    if first == 0.0 || !first.is_finite() {
        return Err(BenchError::Plot(
            ErrorInfo::new("zero_baseline", "series cannot be normalized by its first value")
                .with_context("first", first.to_string())
                .with_context("len", values.len().to_string()),
        ));
    }
    Ok(Some(first))
}

/// Divides every value by `base`.
pub fn scale(values: &[f64], base: f64) -> Vec<f64> {
    values.iter().map(|value| value / base).collect()
}

/// Relative series: every value divided by the first one.
pub fn normalize(values: &[f64]) -> Result<Option<Vec<f64>>, BenchError> {
    Ok(baseline(values)?.map(|base| scale(values, base)))
}

/// Splits rows by flag value, keeping file order inside each group.
pub fn group_by_flag(rows: &[ResultRow]) -> BTreeMap<bool, Vec<ResultRow>> {
    let mut groups: BTreeMap<bool, Vec<ResultRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.point.flag).or_default().push(*row);
    }
    groups
}

/// Rows of one flag value, sorted along the sweep axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSeries {
    pub flag: bool,
    pub x: Vec<f64>,
    pub samples: Vec<Measurement>,
}

impl FlagSeries {
    /// Raw durations of one phase.
    pub fn values(&self, phase: Phase) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.get(phase)).collect()
    }
}

/// Chart-ready view of a result file.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub name: String,
    pub mode: SweepMode,
    pub phases: Phases,
    /// Flag-off series first.
    pub series: Vec<FlagSeries>,
}

impl PlotData {
    pub fn from_result(result: &ResultFile) -> Self {
        let series = group_by_flag(&result.rows)
            .into_iter()
            .map(|(flag, mut rows)| {
                rows.sort_by_key(|row| row.point.x(result.mode));
                FlagSeries {
                    flag,
                    x: rows
                        .iter()
                        .map(|row| row.point.x(result.mode) as f64)
                        .collect(),
                    samples: rows.iter().map(|row| row.mean).collect(),
                }
            })
            .collect();
        Self {
            name: result.name.clone(),
            mode: result.mode,
            phases: result.phases,
            series,
        }
    }

    /// True when the file holds both flag values.
    pub fn is_flag_split(&self) -> bool {
        self.series.len() > 1
    }

    /// Baseline of a phase across every series, flag-off first.
    pub fn phase_baseline(&self, phase: Phase) -> Result<Option<f64>, BenchError> {
        let column: Vec<f64> = self
            .series
            .iter()
            .flat_map(|series| series.values(phase))
            .collect();
        baseline(&column)
    }
}
