use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

const PLAN: &str = "name: smoke\ndesvars: [1]\nstates: [4, 8]\nprocs: [1]\nnum_repetitions: 2\n";

fn scb(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scb"))
        .args(args)
        .output()
        .expect("run scb")
}

fn write_plan(dir: &Path) -> String {
    let path = dir.join("plan.yaml");
    fs::write(&path, PLAN).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn points_lists_the_enumeration() {
    let dir = tempfile::tempdir().unwrap();
    let plan = write_plan(dir.path());
    let output = scb(&["points", "--plan", &plan, "--json"]);
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    let points = value.as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1]["nstate"], 8);
}

#[test]
fn run_writes_result_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let plan = write_plan(dir.path());
    let out = dir.path().join("out");
    let output = scb(&["run", "--plan", &plan, "--out", &out.to_string_lossy()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("smoke_state_primary_diff.dat").exists());
    let bytes = fs::read(out.join("smoke_state_primary_diff.manifest.json")).unwrap();
    let manifest: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(manifest["points"], 2);
    assert_eq!(manifest["execution"], "in-process");
}

#[test]
fn multi_process_plan_fails_in_process() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.yaml");
    fs::write(&path, "name: mp\ndesvars: [1]\nstates: [1]\nprocs: [1, 2]\n").unwrap();
    let plan = path.to_string_lossy().into_owned();
    let out = dir.path().to_string_lossy().into_owned();
    let output = scb(&["run", "--plan", &plan, "--out", &out]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("multi_process"));
}

#[test]
fn batch_round_trip_through_the_cli() {
    let dir = tempfile::tempdir().unwrap();
    let plan = write_plan(dir.path());
    let work = dir.path().join("work");
    let work_arg = work.to_string_lossy().into_owned();

    let output = scb(&[
        "dispatch",
        "--plan",
        &plan,
        "--dir",
        &work_arg,
        "--no-submit",
        "--single-batch",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let jobs = work.join("smoke_state_primary_diff.jobs.json");
    assert!(jobs.exists());
    assert!(work.join("smoke_state_primary_diff.batch.sh").exists());

    for index in 0..4 {
        let index = index.to_string();
        let output = scb(&["worker", "--jobs", &jobs.to_string_lossy(), "--index", &index]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    }

    let output = scb(&["aggregate", "--dir", &work_arg, "--policy", "fail"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let result = work.join("smoke_state_primary_diff.dat");
    assert!(result.exists());

    let output = scb(&["plot", "--input", &result.to_string_lossy(), "--title", "Smoke"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(work.join("smoke_state_primary.svg").exists());
    assert!(work.join("smoke_state_diff.svg").exists());
}
