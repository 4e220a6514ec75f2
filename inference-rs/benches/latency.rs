//! Latency benchmarks for cycle analysis.
//!
//! # Benchmarks
//!
//! ## Density Operations
//! - `pdf_uniform`: Rasterize a 500-bucket uniform rate range
//! - `pdf_decay`: One decay step over the same range
//! - `pdf_restrict`: Condition on a single observed price
//!
//! ## Analysis
//! - `analyze_base_only`: Known base price, nothing else observed
//! - `analyze_partial_week`: Base plus three half-days
//! - `analyze_unknown_base`: Every candidate base price is enumerated
//! - `analyze_first_cycle`: First-cycle enumeration
//! - `analyze_inconsistent`: Escalates through every fudge level
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench -- analyze_unknown_base
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use turnip_inference::{Pattern, Predictor, Slots, SLOT_COUNT};

fn week(base: Option<u32>, observed: &[(usize, u32)]) -> Slots {
    let mut prices = [None; SLOT_COUNT];
    prices[0] = base;
    prices[1] = base;
    for &(slot, price) in observed {
        prices[slot] = Some(price);
    }
    prices
}

fn benchmark_pdf(c: &mut Criterion) {
    use turnip_inference::math::RateRange;
    use turnip_inference::ProbabilityDensityFunction;

    c.bench_function("pdf_uniform", |b| {
        b.iter(|| ProbabilityDensityFunction::uniform(black_box(8500.0), black_box(9000.0)));
    });

    c.bench_function("pdf_decay", |b| {
        let pdf = ProbabilityDensityFunction::uniform(8500.0, 9000.0);
        b.iter(|| {
            let mut pdf = pdf.clone();
            pdf.decay(black_box(300.0), black_box(500.0));
            pdf
        });
    });

    c.bench_function("pdf_restrict", |b| {
        let pdf = ProbabilityDensityFunction::uniform(8500.0, 9000.0);
        b.iter(|| {
            let mut pdf = pdf.clone();
            pdf.restrict(black_box(RateRange::new(8700.001, 8800.001)))
        });
    });
}

fn benchmark_analyze(c: &mut Criterion) {
    let cases = [
        ("analyze_base_only", week(Some(98), &[]), false, None),
        (
            "analyze_partial_week",
            week(Some(100), &[(2, 88), (3, 84), (4, 131)]),
            false,
            Some(Pattern::Fluctuating),
        ),
        ("analyze_unknown_base", week(None, &[(2, 120)]), false, None),
        ("analyze_first_cycle", week(Some(100), &[]), true, None),
        ("analyze_inconsistent", week(Some(100), &[(2, 1000)]), false, None),
    ];

    let mut group = c.benchmark_group("analyze");
    for (name, prices, first_cycle, previous) in cases {
        let predictor = Predictor::new(prices, first_cycle, previous).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &predictor, |b, p| {
            b.iter(|| p.analyze());
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_pdf, benchmark_analyze);
criterion_main!(benches);
