use criterion::{criterion_group, criterion_main, Criterion};
use scb_batch::{aggregate_dir, AggregateOpts, CompletenessPolicy};
use scb_core::{write_per_point, Measurement, PerPointName, SweepPlan};

fn bench_aggregate(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let states = (1..=32).map(|n| n * 10).collect();
    let mut plan = SweepPlan::new("throughput", vec![1], states, vec![1]);
    plan.use_flag = true;
    plan.num_repetitions = 5;
    let spec = plan.build().unwrap();
    for point in spec.points() {
        for repetition in 0..spec.num_repetitions() {
            let name = PerPointName::new(&spec, point, repetition);
            let sample =
                Measurement::new(point.nstate as f64 * 1e-3, repetition as f64 * 1e-4, 0.0);
            write_per_point(dir.path(), &name, &sample).unwrap();
        }
    }
    let opts = AggregateOpts {
        policy: CompletenessPolicy::Fail,
        expected_repetitions: Some(5),
    };

    c.bench_function("aggregate_320_files", |b| {
        b.iter(|| {
            let _ = aggregate_dir(dir.path(), &opts).unwrap();
        })
    });
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);
