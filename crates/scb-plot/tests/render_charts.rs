use std::fs;

use scb_core::{BenchError, Measurement, Phases, ResultFile, ResultRow, SweepMode, SweepPoint};
use scb_plot::PlotRenderer;

fn proc_result() -> ResultFile {
    let rows = [1usize, 2, 4, 8]
        .iter()
        .map(|&nproc| ResultRow {
            point: SweepPoint {
                ndv: 1,
                nstate: 100,
                nproc,
                flag: false,
            },
            mean: Measurement::new(8.0 / nproc as f64, 4.0 / nproc as f64, 0.0),
        })
        .collect();
    ResultFile {
        name: "beam".to_string(),
        mode: SweepMode::Proc,
        phases: Phases::default(),
        rows,
    }
}

fn file_names(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn proc_sweeps_add_per_processor_charts() {
    let dir = tempfile::tempdir().unwrap();
    let written = PlotRenderer::new("Beam scaling")
        .render(&proc_result(), dir.path())
        .unwrap();
    assert_eq!(
        file_names(&written),
        vec![
            "beam_proc_primary_per_proc.svg",
            "beam_proc_primary.svg",
            "beam_proc_diff_per_proc.svg",
            "beam_proc_diff.svg",
        ]
    );
    let svg = fs::read_to_string(dir.path().join("beam_proc_diff.svg")).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.ends_with("</svg>"));
    assert!(svg.contains("Beam scaling"));
    assert!(svg.contains("Number of processors"));
    assert!(svg.contains("Compute Derivatives: Normalized Time"));
    assert_eq!(svg.matches("<circle").count(), 4);
}

#[test]
fn untimed_phase_is_skipped_and_overlay_drawn() {
    let dir = tempfile::tempdir().unwrap();
    let mut result = proc_result();
    result.mode = SweepMode::State;
    result.phases = Phases {
        primary: true,
        diff: true,
        opt: true,
    };
    for (idx, row) in result.rows.iter_mut().enumerate() {
        row.point.nstate = 10 * (idx + 1);
        row.point.nproc = 1;
        row.point.flag = false;
        row.mean.t_primary = 0.0;
        row.mean.t_opt = 0.5;
    }

    let renderer = PlotRenderer {
        overlay: true,
        secondary_title: "Coloring".to_string(),
        ..PlotRenderer::new("overlay")
    };
    let written = renderer.render(&result, dir.path()).unwrap();
    assert_eq!(
        file_names(&written),
        vec!["beam_state_diff.svg", "beam_state_opt.svg", "beam_state_spec1.svg"]
    );
    let overlay = fs::read_to_string(dir.path().join("beam_state_spec1.svg")).unwrap();
    assert!(overlay.contains("Coloring"));
    assert_eq!(overlay.matches("<polyline").count(), 2);
}

#[test]
fn zero_baseline_with_later_values_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut result = proc_result();
    result.rows[0].mean.t_primary = 0.0;
    let err = PlotRenderer::default()
        .render(&result, dir.path())
        .unwrap_err();
    assert!(matches!(err, BenchError::Plot(_)));
}

#[test]
fn flag_split_charts_carry_both_legends() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = Vec::new();
    for nstate in [10usize, 20, 40] {
        for flag in [false, true] {
            rows.push(ResultRow {
                point: SweepPoint {
                    ndv: 1,
                    nstate,
                    nproc: 1,
                    flag,
                },
                mean: Measurement::new(nstate as f64, if flag { 1.0 } else { 2.0 }, 0.0),
            });
        }
    }
    let result = ResultFile {
        name: "ab".to_string(),
        mode: SweepMode::State,
        phases: Phases::default(),
        rows,
    };
    let renderer = PlotRenderer {
        flag_label: "Parallel derivatives".to_string(),
        ..PlotRenderer::new("A/B")
    };
    renderer.render(&result, dir.path()).unwrap();
    let svg = fs::read_to_string(dir.path().join("ab_state_diff.svg")).unwrap();
    assert!(svg.contains(">Default<"));
    assert!(svg.contains(">Parallel derivatives<"));
    assert_eq!(svg.matches("<polyline").count(), 2);
}
