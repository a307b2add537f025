//! Criterion benchmarks for resoscope-analysis
//!
//! Run with: cargo bench -p resoscope-analysis
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use resoscope_analysis::{
    AdaptiveBandpass, BatchAnalyzer, ResonanceParameters, SearchPolicy, SpectralAnalyzer,
};
use resoscope_core::{Sample, apply_sos};
use std::f64::consts::PI;

const SAMPLE_RATE: f64 = 1000.0;

/// 2.5 Hz oscillation with white noise
fn generate_signal(size: usize) -> Vec<f64> {
    let mut state = 0x12345678u32;
    (0..size)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = f64::from(state as i32) / f64::from(i32::MAX);
            let t = i as f64 / SAMPLE_RATE;
            (2.0 * PI * 2.5 * t).sin() + 0.05 * noise
        })
        .collect()
}

// ============================================================================
// Spectral analysis
// ============================================================================

fn bench_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpectralAnalyzer");

    // 20 s windows at the rates seen in practice; 20004 is a typical
    // non-power-of-two calibrated length
    for &size in &[16_384usize, 20_000, 20_004] {
        let signal = generate_signal(size);
        group.bench_with_input(BenchmarkId::new("live", size), &size, |b, _| {
            let mut analyzer = SpectralAnalyzer::new();
            b.iter(|| {
                black_box(analyzer.analyze(black_box(&signal), SAMPLE_RATE, SearchPolicy::live()))
            });
        });
    }

    group.finish();
}

// ============================================================================
// Full slow tick
// ============================================================================

fn bench_slow_tick(c: &mut Criterion) {
    let window = generate_signal(20_000);
    let model = ResonanceParameters::default();
    let adaptive = AdaptiveBandpass::default();

    c.bench_function("slow_tick_20s", |b| {
        let mut analyzer = SpectralAnalyzer::new();
        b.iter(|| {
            let f = model.frequencies(black_box(120.0));
            let Ok(spec) = adaptive.design(f.f_loaded, SAMPLE_RATE) else {
                return;
            };
            let filtered = apply_sos(&spec, &window);
            black_box(analyzer.analyze(&filtered, SAMPLE_RATE, SearchPolicy::live()).ok());
        });
    });
}

// ============================================================================
// Batch
// ============================================================================

fn bench_batch(c: &mut Criterion) {
    let samples: Vec<Sample> = generate_signal(60_000)
        .into_iter()
        .enumerate()
        .map(|(i, v)| Sample::new(i as f64 / SAMPLE_RATE, v + 2.2))
        .collect();

    c.bench_function("batch_60s", |b| {
        let mut analyzer = BatchAnalyzer::default();
        b.iter(|| black_box(analyzer.analyze(black_box(&samples)).ok()));
    });
}

criterion_group!(benches, bench_spectrum, bench_slow_tick, bench_batch);
criterion_main!(benches);
