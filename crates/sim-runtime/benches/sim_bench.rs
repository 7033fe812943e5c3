use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;

fn bench_days(c: &mut Criterion) {
    let cfg = sim_core::SimConfig {
        random_seed: Some(42),
        starting_cash: Decimal::new(5_000_000, 0),
        ..sim_core::SimConfig::default()
    };
    c.bench_function("submit_day", |b| {
        let mut engine = sim_runtime::DayCycleEngine::new(cfg.clone());
        b.iter(|| {
            let _ = black_box(engine.submit_day(Decimal::new(15, 0), 20));
        })
    });
    c.bench_function("run 365 days", |b| {
        b.iter(|| {
            let mut engine = sim_runtime::DayCycleEngine::new(cfg.clone());
            for day in 0..365u64 {
                let _ = engine.submit_day(Decimal::new(10 + (day % 8) as i64, 0), 25);
            }
            black_box(engine.get_run_snapshot())
        })
    });
}

criterion_group!(benches, bench_days);
criterion_main!(benches);
