use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nexcp::weighted_quantile;
use nexcp::weights::{TestContext, Weighting};

pub fn weighted_quantile_benchmark(c: &mut Criterion) {
    for n in [100, 1000, 10_000] {
        let scores: Vec<f64> = (0..n).map(|i| ((i * 7919) % n) as f64 / n as f64).collect();
        let weights: Vec<f64> = (0..n).map(|i| 0.999f64.powi(n - i)).collect();
        c.bench_function(&format!("weighted_quantile_{}", n), |b| {
            b.iter(|| weighted_quantile(black_box(&scores), black_box(&weights), 1.0, 0.9).unwrap())
        });
    }
}

pub fn weights_for_benchmark(c: &mut Criterion) {
    let indices: Vec<usize> = (0..10_000).collect();
    let scheme = Weighting::TimeDecay { rate: 0.999 };
    let test = TestContext {
        index: 10_000,
        features: &[],
    };
    c.bench_function("time_decay_weights_10000", |b| {
        b.iter(|| scheme.weights_for(black_box(&indices), &[], &test).unwrap())
    });
}

criterion_group!(benches, weighted_quantile_benchmark, weights_for_benchmark);
criterion_main!(benches);
