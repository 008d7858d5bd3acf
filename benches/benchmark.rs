use cimgres::engine::{detect, resolve, Scheduler, Transformer};
use cimgres::EngineConfig;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::json;
use std::hint::black_box;
use std::io::Cursor;

fn create_input(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn transform_benchmark(c: &mut Criterion) {
    let transformer = Transformer::native(EngineConfig::default());
    let mut group = c.benchmark_group("transform");
    group.sample_size(20);

    for (name, format) in [("jpeg", ImageFormat::Jpeg), ("png", ImageFormat::Png)] {
        let input = create_input(1024, 768, format);
        let request = resolve(&json!({ "width": 256, "height": 192 })).unwrap();
        group.bench_with_input(BenchmarkId::new("thumbnail", name), &input, |b, input| {
            b.iter(|| transformer.transform(black_box(input), &request).unwrap())
        });
    }
    group.finish();
}

pub fn scheduler_benchmark(c: &mut Criterion) {
    let scheduler = Scheduler::with_config(EngineConfig::default()).unwrap();
    let input = create_input(512, 512, ImageFormat::Jpeg);
    let options = json!({ "percent": 50 });

    let mut group = c.benchmark_group("scheduler");
    group.sample_size(20);
    group.bench_function("sync", |b| {
        b.iter(|| scheduler.run_sync(black_box(&input), &options).unwrap())
    });
    // Eight requests in flight, then wait for all of them
    group.bench_function("async_x8", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..8)
                .map(|_| scheduler.submit(input.as_slice(), &options).unwrap())
                .collect();
            for handle in handles {
                black_box(handle.wait().unwrap());
            }
        })
    });
    group.finish();
}

pub fn detect_benchmark(c: &mut Criterion) {
    let jpeg = create_input(16, 16, ImageFormat::Jpeg);
    let svg = b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_vec();
    c.bench_function("detect jpeg", |b| b.iter(|| detect(black_box(&jpeg))));
    c.bench_function("detect svg", |b| b.iter(|| detect(black_box(&svg))));
}

criterion_group!(benches, transform_benchmark, scheduler_benchmark, detect_benchmark);
criterion_main!(benches);
