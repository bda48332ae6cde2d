use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use heatquiz::{
    simulate, EnvironmentalInput, HazardAnswer, HistoryStore, QuizSession, RecordGateway,
};

fn all_inputs() -> Vec<EnvironmentalInput> {
    let mut inputs = Vec::new();
    for t in 20..=40 {
        for h in (10..=90).step_by(10) {
            inputs.push(EnvironmentalInput::new(t, h, true));
            inputs.push(EnvironmentalInput::new(t, h, false));
        }
    }
    inputs
}

fn bench_simulate(c: &mut Criterion) {
    let inputs = all_inputs();
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(inputs.len() as u64));
    group.bench_function("simulate_grid", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(simulate(black_box(input)));
            }
        });
    });
    group.finish();
}

fn bench_history(c: &mut Criterion) {
    let inputs = all_inputs();
    c.bench_function("history/append_and_view", |b| {
        b.iter(|| {
            let mut history = HistoryStore::new();
            for input in &inputs {
                history.append(simulate(input));
                black_box(history.recent_view(5));
            }
            history.len()
        });
    });
}

fn bench_submit(c: &mut Criterion) {
    // Fresh gateway per batch so the table does not grow across samples.
    let mut session = QuizSession::new();
    for input in all_inputs().into_iter().take(20) {
        session.run_simulation(input);
    }

    c.bench_function("gateway/submit_in_memory", |b| {
        b.iter_batched(
            RecordGateway::in_memory,
            |gateway| {
                session
                    .submit("bench", HazardAnswer::HeatStroke, &gateway)
                    .map(|_| gateway)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_simulate, bench_history, bench_submit);
criterion_main!(benches);
