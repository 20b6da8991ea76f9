//! Benchmarks of propagation rounds over wide and deep graphs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_core::Runtime;

/// One input feeding `n` independent negations, summed at the bottom.
fn wide_program(n: usize) -> Runtime {
    let mut runtime = Runtime::new();
    let input = runtime.graph_mut().input(0_i64).unwrap();
    let input = runtime.define("input", input).unwrap();

    let leaves: Vec<_> = (0..n)
        .map(|i| {
            let neg = runtime.call("Neg", &[input]).unwrap();
            runtime.define(&format!("leaf_{i}"), neg).unwrap()
        })
        .collect();
    let total = runtime.call("Sum", &leaves).unwrap();
    runtime.define("total", total).unwrap();
    runtime
}

/// A chain of `n` negations.
fn deep_program(n: usize) -> Runtime {
    let mut runtime = Runtime::new();
    let input = runtime.graph_mut().input(0_i64).unwrap();
    let mut last = runtime.define("input", input).unwrap();
    for i in 0..n {
        let neg = runtime.call("Neg", &[last]).unwrap();
        last = runtime.define(&format!("link_{i}"), neg).unwrap();
    }
    runtime
}

fn bench_rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("round");

    for n in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("wide", n), &n, |b, &n| {
            let mut runtime = wide_program(n);
            let mut value = 0_i64;
            b.iter(|| {
                value += 1;
                runtime.set("input", value).unwrap();
                black_box(runtime.run_round().unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("deep", n), &n, |b, &n| {
            let mut runtime = deep_program(n);
            let mut value = 0_i64;
            b.iter(|| {
                value += 1;
                runtime.set("input", value).unwrap();
                black_box(runtime.run_round().unwrap());
            });
        });
    }

    group.finish();
}

/// Building and optimizing a literal-heavy definition.
fn bench_optimize(c: &mut Criterion) {
    c.bench_function("optimize_literal_sum", |b| {
        b.iter(|| {
            let mut runtime = Runtime::new();
            let input = runtime.graph_mut().input(1_i64).unwrap();
            let input = runtime.define("input", input).unwrap();
            let mut args = vec![input];
            for value in 0..64_i64 {
                args.push(runtime.graph_mut().literal(value).unwrap());
            }
            let sum = runtime.call("Sum", &args).unwrap();
            black_box(runtime.define("total", sum).unwrap());
        });
    });
}

criterion_group!(benches, bench_rounds, bench_optimize);
criterion_main!(benches);
