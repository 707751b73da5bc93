//! Chart set produced for one result file.

use std::path::{Path, PathBuf};

use scb_core::{write_atomic, BenchError, Phase, ResultFile, SweepMode};

use crate::series::{scale, PlotData};
use crate::svg::{render_loglog_svg, Chart, Curve, FigureConfig};

/// Renders normalized log-log charts from a result file.
///
/// Every enabled phase gets `{name}_{mode}_{tag}.svg`. Processor sweeps add
/// `{name}_{mode}_{tag}_per_proc.svg`, and `overlay` adds
/// `{name}_{mode}_spec1.svg` with the optimization cost drawn against the
/// differentiation baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRenderer {
    /// Chart title.
    pub title: String,
    /// Legend entry for the flag-on curve.
    pub flag_label: String,
    /// Legend entry for the flag-off curve.
    pub default_label: String,
    /// Axis title used for the optimization phase.
    pub secondary_title: String,
    /// Also draw the overlay chart.
    pub overlay: bool,
    pub figure: FigureConfig,
}

impl Default for PlotRenderer {
    fn default() -> Self {
        Self {
            title: String::new(),
            flag_label: "Flag enabled".to_string(),
            default_label: "Default".to_string(),
            secondary_title: Phase::Opt.title().to_string(),
            overlay: false,
            figure: FigureConfig::default(),
        }
    }
}

impl PlotRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn phase_title(&self, phase: Phase) -> &str {
        match phase {
            Phase::Opt => &self.secondary_title,
            other => other.title(),
        }
    }

    fn curve_label(&self, data: &PlotData, flag: bool) -> Option<String> {
        if !data.is_flag_split() {
            return None;
        }
        Some(if flag {
            self.flag_label.clone()
        } else {
            self.default_label.clone()
        })
    }

    /// Writes every chart into `out_dir` and returns the written paths.
    pub fn render(
        &self,
        result: &ResultFile,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, BenchError> {
        let data = PlotData::from_result(result);
        let mut written = Vec::new();

        for phase in data.phases.enabled_phases() {
            let Some(base) = data.phase_baseline(phase)? else {
                tracing::warn!(phase = phase.tag(), "skipping phase with no recorded time");
                continue;
            };
            let curves: Vec<Curve> = data
                .series
                .iter()
                .map(|series| Curve {
                    label: self.curve_label(&data, series.flag),
                    x: series.x.clone(),
                    y: scale(&series.values(phase), base),
                })
                .collect();
            let title = self.phase_title(phase);

            if data.mode == SweepMode::Proc {
                let per_proc = curves
                    .iter()
                    .map(|curve| Curve {
                        label: curve.label.clone(),
                        x: curve.x.clone(),
                        y: curve.y.iter().zip(&curve.x).map(|(y, x)| y / x).collect(),
                    })
                    .collect();
                let chart = self.chart(
                    &data,
                    format!("{title}: Normalized Time per Processor"),
                    per_proc,
                );
                let name = format!("{}_{}_{}_per_proc.svg", data.name, data.mode, phase.tag());
                written.push(self.write(out_dir, &name, &chart)?);
            }

            let chart = self.chart(&data, format!("{title}: Normalized Time"), curves);
            let name = format!("{}_{}_{}.svg", data.name, data.mode, phase.tag());
            written.push(self.write(out_dir, &name, &chart)?);
        }

        if self.overlay {
            if let Some(path) = self.render_overlay(&data, out_dir)? {
                written.push(path);
            }
        }
        Ok(written)
    }

    fn render_overlay(
        &self,
        data: &PlotData,
        out_dir: &Path,
    ) -> Result<Option<PathBuf>, BenchError> {
        if !(data.phases.diff && data.phases.opt) {
            tracing::warn!("overlay needs both diff and opt timings");
            return Ok(None);
        }
        let Some(base) = data.phase_baseline(Phase::Diff)? else {
            tracing::warn!("overlay skipped, differentiation was never timed");
            return Ok(None);
        };
        let diff_title = Phase::Diff.title();
        let mut curves: Vec<Curve> = data
            .series
            .iter()
            .map(|series| Curve {
                label: Some(if series.flag {
                    format!("{diff_title}: {}", self.flag_label)
                } else {
                    diff_title.to_string()
                }),
                x: series.x.clone(),
                y: scale(&series.values(Phase::Diff), base),
            })
            .collect();
        if let Some(last) = data.series.last() {
            curves.push(Curve {
                label: Some(self.secondary_title.clone()),
                x: last.x.clone(),
                y: scale(&last.values(Phase::Opt), base),
            });
        }
        let chart = self.chart(data, "Normalized Time".to_string(), curves);
        let name = format!("{}_{}_spec1.svg", data.name, data.mode);
        Ok(Some(self.write(out_dir, &name, &chart)?))
    }

    fn chart(&self, data: &PlotData, y_label: String, curves: Vec<Curve>) -> Chart {
        Chart {
            title: self.title.clone(),
            x_label: data.mode.axis_label().to_string(),
            y_label,
            curves,
        }
    }

    fn write(&self, out_dir: &Path, name: &str, chart: &Chart) -> Result<PathBuf, BenchError> {
        let path = out_dir.join(name);
        write_atomic(&path, render_loglog_svg(chart, &self.figure).as_bytes())?;
        tracing::info!(path = %path.display(), "chart written");
        Ok(path)
    }
}
