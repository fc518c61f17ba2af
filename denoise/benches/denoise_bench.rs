use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clearwave_denoise::{Reconstructor, Segmenter};

fn bench_segmentation(c: &mut Criterion) {
    // Ten seconds of 16 kHz audio.
    let samples: Vec<f32> = (0..160_000).map(|i| ((i % 320) as f32 / 320.0) - 0.5).collect();
    let segmenter = Segmenter::new(16000, 0.1).unwrap();

    c.bench_function("segment_10s", |b| {
        b.iter(|| {
            let segments = segmenter.split(black_box(&samples));
            black_box(segments.len());
        });
    });
}

fn bench_overlap_add(c: &mut Criterion) {
    let samples: Vec<f32> = (0..160_000).map(|i| ((i % 320) as f32 / 320.0) - 0.5).collect();
    let segmenter = Segmenter::new(16000, 0.1).unwrap();
    let segments = segmenter.split(&samples);
    let reconstructor = Reconstructor::new(0.1).unwrap();

    c.bench_function("overlap_add_10s", |b| {
        b.iter(|| {
            let out = reconstructor.overlap_add(black_box(&segments)).unwrap();
            black_box(out.len());
        });
    });
}

criterion_group!(benches, bench_segmentation, bench_overlap_add);
criterion_main!(benches);
