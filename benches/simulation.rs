use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gmat_cat::{initialize_question_bank, simulate_cat_exam, CorrectnessSchedule, ThetaBounds};

fn bench_simulate(c: &mut Criterion) {
    let bank = initialize_question_bank(1000, 42).unwrap();
    let schedule = CorrectnessSchedule::from_wrong_positions([2, 4, 7, 11, 13, 19]).unwrap();

    let mut group = c.benchmark_group("simulate_cat_exam");
    for total in [5usize, 21, 23] {
        group.bench_with_input(BenchmarkId::from_parameter(total), &total, |b, &total| {
            b.iter(|| {
                simulate_cat_exam(
                    black_box(&bank),
                    total,
                    0.0,
                    &schedule,
                    ThetaBounds::default(),
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_bank(c: &mut Criterion) {
    c.bench_function("initialize_question_bank_1000", |b| {
        b.iter(|| initialize_question_bank(black_box(1000), 42).unwrap())
    });
}

criterion_group!(benches, bench_simulate, bench_bank);
criterion_main!(benches);
