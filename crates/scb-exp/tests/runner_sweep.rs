mod common;

use std::sync::Mutex;

use common::{RecordingHooks, ScriptedBench};
use scb_core::{BenchError, Measurement, Phases, ResultFile, SweepPlan, SweepSpec};
use scb_exp::SweepRunner;

// Sweeps read and restore the process working directory.
static CWD_LOCK: Mutex<()> = Mutex::new(());

fn state_plan(states: Vec<usize>, repetitions: usize) -> SweepPlan {
    let mut plan = SweepPlan::new("demo", vec![1], states, vec![1]);
    plan.num_repetitions = repetitions;
    plan
}

#[test]
fn averages_exactly_the_configured_repetitions() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let out = tempfile::tempdir().unwrap();
    for n in 1..=4usize {
        let spec = state_plan(vec![10, 20], n).build().unwrap();
        let samples: Vec<Measurement> = (0..2 * n)
            .map(|i| Measurement::new(i as f64 + 1.0, 0.5 * i as f64, 0.0))
            .collect();
        let bench = ScriptedBench::new(samples.clone());
        let outcome = SweepRunner::new(spec)
            .unwrap()
            .with_output_dir(out.path())
            .run(&bench)
            .unwrap();
        assert_eq!(bench.remaining(), 0);
        assert_eq!(outcome.result.rows.len(), 2);
        for (row_idx, row) in outcome.result.rows.iter().enumerate() {
            let chunk = &samples[row_idx * n..(row_idx + 1) * n];
            let mean = chunk.iter().map(|m| m.t_primary).sum::<f64>() / n as f64;
            assert!((row.mean.t_primary - mean).abs() < 1e-12);
        }
        let written = ResultFile::read(&outcome.path).unwrap();
        assert_eq!(written.rows.len(), 2);
        assert_eq!(written.rows[0].point.nstate, 10);
        assert_eq!(written.rows[1].point.nstate, 20);
    }
}

#[test]
fn hooks_and_phases_run_in_order() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let out = tempfile::tempdir().unwrap();
    let mut plan = state_plan(vec![3], 1);
    plan.phases = Phases {
        primary: true,
        diff: true,
        opt: true,
    };
    let hooks = RecordingHooks::default();
    SweepRunner::new(plan.build().unwrap())
        .unwrap()
        .with_output_dir(out.path())
        .run(&hooks)
        .unwrap();
    assert_eq!(
        *hooks.log.borrow(),
        vec!["setup 3", "finalize", "post_setup", "primary", "opt", "diff", "post_run"]
    );
}

#[test]
fn disabled_phases_are_skipped_and_zero() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let out = tempfile::tempdir().unwrap();
    let mut plan = state_plan(vec![3], 2);
    plan.phases = Phases {
        primary: false,
        diff: false,
        opt: false,
    };
    let hooks = RecordingHooks::default();
    let outcome = SweepRunner::new(plan.build().unwrap())
        .unwrap()
        .with_output_dir(out.path())
        .run(&hooks)
        .unwrap();
    let log = hooks.log.borrow();
    assert_eq!(log.iter().filter(|call| *call == "primary").count(), 2);
    assert!(!log.iter().any(|call| call == "diff" || call == "opt"));
    assert_eq!(outcome.result.rows[0].mean, Measurement::zero());
    assert!(outcome.path.ends_with("demo_state.dat"));
}

#[test]
fn hook_failure_aborts_without_writing() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let out = tempfile::tempdir().unwrap();
    let hooks = RecordingHooks {
        fail_post_run_at: Some(20),
        ..RecordingHooks::default()
    };
    let err = SweepRunner::new(state_plan(vec![10, 20, 30], 2).build().unwrap())
        .unwrap()
        .with_output_dir(out.path())
        .run(&hooks)
        .unwrap_err();
    match &err {
        BenchError::Hook(info) => {
            assert_eq!(info.context.get("stage").map(String::as_str), Some("post_run"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!hooks.log.borrow().iter().any(|call| call == "setup 30"));
    assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
}

#[test]
fn working_directory_is_restored() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let before = std::env::current_dir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();

    let hooks = RecordingHooks {
        chdir_to: Some(elsewhere.path().to_path_buf()),
        ..RecordingHooks::default()
    };
    SweepRunner::new(state_plan(vec![1, 2], 1).build().unwrap())
        .unwrap()
        .with_output_dir(out.path())
        .run(&hooks)
        .unwrap();
    assert_eq!(std::env::current_dir().unwrap(), before);

    let failing = RecordingHooks {
        chdir_to: Some(elsewhere.path().to_path_buf()),
        fail_post_run_at: Some(1),
        ..RecordingHooks::default()
    };
    let result = SweepRunner::new(state_plan(vec![1, 2], 1).build().unwrap())
        .unwrap()
        .with_output_dir(out.path())
        .run(&failing);
    assert!(result.is_err());
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[test]
fn multi_process_sweeps_are_rejected() {
    let spec = SweepSpec::new("demo", vec![1], vec![1], vec![1, 2, 4]).unwrap();
    let err = SweepRunner::new(spec).unwrap_err();
    assert!(matches!(err, BenchError::Config(_)));
    let spec = SweepSpec::new("demo", vec![1], vec![1], vec![8]).unwrap();
    assert!(SweepRunner::new(spec).is_err());
}
