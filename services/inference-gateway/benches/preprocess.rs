use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use inference_gateway::preprocess;
use std::io::Cursor;

fn photo(side: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(side, side, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Jpeg(90)).unwrap();
    buf
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("image_to_input");
    for side in [224u32, 640, 1280] {
        let bytes = photo(side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &bytes, |b, bytes| {
            b.iter(|| preprocess::image_to_input(black_box(bytes), 224).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_preprocess);
criterion_main!(benches);
