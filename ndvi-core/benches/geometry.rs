//! Benchmarks pour la géométrie et la timeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndvi_core::geometry::{bounds_center, polygon_center, to_geojson};
use ndvi_core::{LatLng, TimelineController, TimelineFrame};

/// Polygone régulier de `n` sommets autour de Paris
fn polygon(n: usize) -> Vec<LatLng> {
    (0..n)
        .map(|i| {
            let angle = i as f64 / n as f64 * std::f64::consts::TAU;
            LatLng::new(48.85 + 0.05 * angle.sin(), 2.35 + 0.05 * angle.cos())
        })
        .collect()
}

fn bench_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry");

    for n in [4usize, 64, 1024] {
        let vertices = polygon(n);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("to_geojson", n), &vertices, |b, v| {
            b.iter(|| black_box(to_geojson(black_box(v))))
        });
        group.bench_with_input(BenchmarkId::new("bounds_center", n), &vertices, |b, v| {
            b.iter(|| black_box(bounds_center(black_box(v))))
        });
        group.bench_with_input(BenchmarkId::new("polygon_center", n), &vertices, |b, v| {
            b.iter(|| black_box(polygon_center(black_box(v))))
        });
    }

    group.finish();
}

fn bench_timeline_loop(c: &mut Criterion) {
    let frames: Vec<TimelineFrame> = (0..365)
        .map(|i| TimelineFrame::new(format!("2024-{:03}", i), 0.5, "tile"))
        .collect();

    c.bench_function("timeline_full_loop", |b| {
        b.iter(|| {
            let mut timeline = TimelineController::new();
            timeline.load(frames.clone());
            timeline.play();
            while timeline.is_playing() {
                timeline.next();
            }
            black_box(timeline.current_index())
        })
    });
}

criterion_group!(benches, bench_geometry, bench_timeline_loop);
criterion_main!(benches);
