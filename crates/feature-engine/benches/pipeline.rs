use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::{Pipeline, Waveform};

fn waveform(n: usize) -> Waveform {
    let channel = |freq: f64| -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / 100.0).sin())
            .collect()
    };
    Waveform::from_channels(vec![channel(2.0), channel(5.0), channel(11.0)])
        .expect("valid waveform")
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = Pipeline::with_defaults().expect("default config");
    let input = waveform(6000);

    c.bench_function("log_spectrogram_6000", |b| {
        b.iter(|| pipeline.log_spectrogram(black_box(&input)))
    });
    c.bench_function("features_6000", |b| {
        b.iter(|| pipeline.features(black_box(&input)))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
