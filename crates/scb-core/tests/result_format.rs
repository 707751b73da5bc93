use std::path::Path;

use scb_core::{
    BenchError, Measurement, MeasurementSum, Phases, ResultFile, ResultRow, SweepMode, SweepPoint,
};

fn point(nstate: usize, flag: bool) -> SweepPoint {
    SweepPoint {
        ndv: 1,
        nstate,
        nproc: 1,
        flag,
    }
}

fn sample_file() -> ResultFile {
    ResultFile {
        name: "demo".into(),
        mode: SweepMode::State,
        phases: Phases::default(),
        rows: vec![
            ResultRow {
                point: point(10, false),
                mean: Measurement::new(0.5, 1.25, 0.0),
            },
            ResultRow {
                point: point(20, false),
                mean: Measurement::new(1.0, 2.5, 0.0),
            },
        ],
    }
}

#[test]
fn written_file_reads_back_to_same_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let original = sample_file();
    let path = original.write(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "demo_state_primary_diff.dat");
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("demo\nstate\ntrue, true, false\n1, 10, 1, false, 0.5, 1.25, 0\n"));
    let back = ResultFile::read(&path).unwrap();
    assert_eq!(back.name, original.name);
    assert_eq!(back.mode, original.mode);
    assert_eq!(back.phases, original.phases);
    for row in &original.rows {
        let read = back.lookup(&row.point).unwrap();
        assert!((read.t_primary - row.mean.t_primary).abs() < 1e-6);
        assert!((read.t_diff - row.mean.t_diff).abs() < 1e-6);
    }
}

#[test]
fn sub_microsecond_durations_survive_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = sample_file();
    file.rows[0].mean = Measurement::new(4e-7, 1.23456789e-3, 0.0);
    let path = file.write(dir.path()).unwrap();
    let back = ResultFile::read(&path).unwrap();
    assert_eq!(back.rows, file.rows);
    assert!(back.rows[0].mean.t_primary > 0.0);
}

#[test]
fn python_style_booleans_and_legacy_rows_parse() {
    let text = "beam\nstate\nTrue, True, False\n1, 1, 1, 0.1, 0.2, 0.0\n1, 5, 1, 0.5, 1.0, 0.0\n";
    let file = ResultFile::parse(text, Path::new("legacy.dat")).unwrap();
    assert_eq!(file.rows.len(), 2);
    assert!(!file.uses_flag());
    assert_eq!(file.rows[1].point.nstate, 5);
}

#[test]
fn malformed_row_reports_file_and_line() {
    let text = "beam\nstate\ntrue, true, false\n1, 1, 1, false, 0.1, 0.2, 0.0\n1, 5, 1, false, oops, 1.0, 0.0\n";
    let err = ResultFile::parse(text, Path::new("broken.dat")).unwrap_err();
    match err {
        BenchError::Parse(info) => {
            assert_eq!(info.context.get("path").map(String::as_str), Some("broken.dat"));
            assert_eq!(info.context.get("line").map(String::as_str), Some("5"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn wrong_field_count_is_malformed() {
    let text = "beam\nstate\ntrue, true, false\n1, 1, 1, false, 0.1\n";
    let err = ResultFile::parse(text, Path::new("short.dat")).unwrap_err();
    assert!(matches!(err, BenchError::Parse(_)));
    let err = ResultFile::parse("beam\nstate\n", Path::new("header.dat")).unwrap_err();
    assert_eq!(err.info().code, "result_header");
}

#[test]
fn invalid_durations_are_refused_on_write() {
    let mut file = sample_file();
    file.rows[0].mean.t_primary = f64::NAN;
    let dir = tempfile::tempdir().unwrap();
    assert!(file.write(dir.path()).is_err());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn averaging_uses_the_number_of_samples_added() {
    for n in 1..=7usize {
        let mut sum = MeasurementSum::default();
        let mut expected = 0.0;
        for i in 0..n {
            let value = (i + 1) as f64 * 0.5;
            expected += value;
            sum.add(&Measurement::new(value, 2.0 * value, 0.0));
        }
        expected /= n as f64;
        let mean = sum.average().unwrap();
        assert_eq!(sum.count(), n);
        assert!((mean.t_primary - expected).abs() < 1e-12);
        assert!((mean.t_diff - 2.0 * expected).abs() < 1e-12);
    }
    assert!(MeasurementSum::default().average().is_none());
}
