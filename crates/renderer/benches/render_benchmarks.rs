//! Benchmarks for the renderer crate - map drawing and PNG encoding.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use projection::ProjectionKind;
use renderer::{png, MapDrawer, MapStyle};

/// Smooth global field on a Driscoll-Healy style grid.
fn synthetic_grid(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, 2 * n), |(i, j)| {
        let theta = std::f64::consts::PI * i as f64 / n as f64;
        let phi = std::f64::consts::PI * j as f64 / n as f64;
        theta.cos() * 30.0 + (3.0 * phi).sin() * theta.sin() * 10.0
    })
}

fn bench_draw(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_map");
    group.sample_size(20);
    let data = synthetic_grid(182);
    for projection in [ProjectionKind::Cylindrical, ProjectionKind::Mollweide] {
        for width in [360usize, 720] {
            let style = MapStyle {
                projection,
                width,
                ..Default::default()
            };
            let drawer = MapDrawer::new(style).unwrap();
            group.throughput(Throughput::Elements((width * width / 2) as u64));
            group.bench_with_input(BenchmarkId::new(projection.as_str(), width), &data, |b, data| {
                b.iter(|| black_box(drawer.draw(data).unwrap()));
            });
        }
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encode");
    let drawer = MapDrawer::new(MapStyle::default()).unwrap();
    let map = drawer.draw(&synthetic_grid(182)).unwrap();
    group.throughput(Throughput::Bytes(map.pixels.len() as u64));
    group.bench_function("auto", |b| {
        b.iter(|| black_box(png::encode_png(&map.pixels, map.width, map.height, &[]).unwrap()));
    });
    group.bench_function("rgba", |b| {
        b.iter(|| black_box(png::encode_rgba(&map.pixels, map.width, map.height, &[]).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_draw, bench_encode);
criterion_main!(benches);
