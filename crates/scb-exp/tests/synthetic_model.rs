use std::path::Path;

use scb_core::{Phases, SweepPlan, SweepPoint};
use scb_exp::{
    BenchHooks, BenchModel, ExecutionMode, Registry, SetupContext, SweepManifest, SweepRunner,
    SyntheticBench,
};

fn ctx() -> SetupContext<'static> {
    SetupContext {
        base_dir: Path::new("."),
        mode: ExecutionMode::InProcess,
        repetition: 0,
    }
}

fn point(ndv: usize, flag: bool) -> SweepPoint {
    SweepPoint {
        ndv,
        nstate: 2,
        nproc: 1,
        flag,
    }
}

fn gradient(flag: bool) -> Vec<f64> {
    let bench = SyntheticBench::default();
    let p = point(4, flag);
    let mut model = bench.setup(&p, &ctx()).unwrap();
    model.finalize().unwrap();
    bench.post_setup(&mut model, &p).unwrap();
    model.run_primary().unwrap();
    model.run_diff().unwrap();
    bench.post_run(&mut model, &p).unwrap();
    model.gradient().to_vec()
}

#[test]
fn adjoint_and_finite_difference_gradients_agree() {
    let fd = gradient(false);
    let adjoint = gradient(true);
    assert_eq!(fd.len(), 4);
    for (a, b) in fd.iter().zip(&adjoint) {
        assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        assert!(*b > 0.0);
    }
}

#[test]
fn model_requires_finalize() {
    let bench = SyntheticBench::default();
    let mut model = bench.setup(&point(2, false), &ctx()).unwrap();
    assert!(model.run_primary().is_err());
}

#[test]
fn optimization_lowers_the_objective() {
    let bench = SyntheticBench::default();
    let p = point(3, true);
    let mut model = bench.setup(&p, &ctx()).unwrap();
    model.finalize().unwrap();
    bench.post_setup(&mut model, &p).unwrap();
    model.run_primary().unwrap();
    let before = model.objective();
    model.run_optimize().unwrap();
    assert!(model.objective() < before);
    assert_eq!(model.state().len(), model.unknowns());
}

#[test]
fn synthetic_sweep_writes_result_and_manifest() {
    let out = tempfile::tempdir().unwrap();
    let mut plan = SweepPlan::new("synth", vec![1], vec![1, 2], vec![1]);
    plan.use_flag = true;
    plan.num_repetitions = 2;
    plan.phases = Phases {
        primary: true,
        diff: true,
        opt: true,
    };
    let spec = plan.build().unwrap();
    let registry = Registry::with_builtin();
    let outcome = SweepRunner::new(spec.clone())
        .unwrap()
        .with_output_dir(out.path())
        .run(registry.get("synthetic").unwrap())
        .unwrap();
    assert_eq!(outcome.result.rows.len(), 4);
    assert!(outcome.result.uses_flag());
    assert!(outcome
        .path
        .ends_with("synth_state_primary_diff_opt.dat"));

    let manifest = SweepManifest::new(&spec, &outcome.path, ExecutionMode::InProcess).unwrap();
    let path = scb_exp::write_manifest(out.path(), &manifest).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let back: SweepManifest = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back.points, 4);
    assert_eq!(back.result_file, "synth_state_primary_diff_opt.dat");
    assert_eq!(back.spec_hash.len(), 64);
}

#[test]
fn registry_rejects_unknown_and_duplicate_names() {
    let mut registry = Registry::with_builtin();
    assert_eq!(registry.names(), vec!["synthetic"]);
    let err = registry.get("beam").err().unwrap();
    assert_eq!(err.info().code, "scb_exp.unknown_benchmark");
    let dup = registry
        .register("synthetic", Box::new(SyntheticBench::default()))
        .unwrap_err();
    assert_eq!(dup.info().code, "scb_exp.duplicate_benchmark");
}
