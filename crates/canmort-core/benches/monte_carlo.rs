use canmort_core::monte_carlo::{run_monte_carlo, RateModel, SimulationParams};
use canmort_core::EngineConfig;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn params(iterations: u32, model: RateModel) -> SimulationParams {
    SimulationParams {
        iterations: Some(iterations),
        horizon_months: Some(60),
        start_balance: 400_000.0,
        start_rate: 0.0549,
        volatility: 0.2,
        model,
        rate_floor: None,
        rate_cap: None,
        fixed_payment: None,
        amortization_months: None,
        seed: Some(42),
        investment: None,
    }
}

fn bench_iterations(c: &mut Criterion) {
    let config = EngineConfig::default();
    let mut group = c.benchmark_group("monte_carlo_gbm_60m");
    group.sample_size(10);

    for iterations in [1_000_u32, 10_000].iter() {
        let p = params(*iterations, RateModel::default());
        group.bench_with_input(BenchmarkId::from_parameter(iterations), iterations, |b, _| {
            b.iter(|| {
                let out = run_monte_carlo(black_box(&p), black_box(&config))
                    .expect("simulation should succeed");
                black_box(out.result.ending_balance.p50)
            })
        });
    }
    group.finish();
}

fn bench_vasicek(c: &mut Criterion) {
    let config = EngineConfig::default();
    let p = params(
        10_000,
        RateModel::Vasicek {
            mean_reversion_speed: 0.5,
            long_term_rate: 0.04,
        },
    );
    c.bench_function("monte_carlo_vasicek_10k_60m", |b| {
        b.iter(|| {
            let out = run_monte_carlo(black_box(&p), black_box(&config))
                .expect("simulation should succeed");
            black_box(out.result.probability_of_payoff)
        })
    });
}

criterion_group!(benches, bench_iterations, bench_vasicek);
criterion_main!(benches);
