use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};

use photomorph::config::LimitsConfig;
use photomorph::morph::interpolator::{blend, Interpolator};

fn bench_blend(c: &mut Criterion) {
    let a = RgbImage::from_pixel(640, 480, Rgb([200, 40, 40]));
    let b = RgbImage::from_pixel(640, 480, Rgb([40, 40, 200]));

    c.bench_function("blend 640x480", |bencher| {
        bencher.iter(|| blend(black_box(&a), black_box(&b), black_box(0.5)))
    });
}

fn bench_interpolate(c: &mut Criterion) {
    let a = RgbImage::from_pixel(320, 240, Rgb([200, 40, 40]));
    let b = RgbImage::from_pixel(320, 240, Rgb([40, 40, 200]));
    let interpolator = Interpolator::new(&LimitsConfig::default());

    c.bench_function("interpolate 60 frames 320x240", |bencher| {
        bencher.iter(|| {
            interpolator
                .interpolate(black_box(&a), black_box(&b), 60, |_, _| {})
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_blend, bench_interpolate);
criterion_main!(benches);
