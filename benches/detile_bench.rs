// Detile Benchmarks
// Performance benchmarks for address translation and CPU conversion

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use xenos_fb::framebuffer::tiled_test_pattern;
use xenos_fb::{translate, ChannelOrder, CpuConverter, FrameConverter, FrameGeometry, Resolution};

/// Benchmark the raw address translation over one 720p surface
fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    let padded = Resolution::new(1280, 720).padded();
    group.throughput(Throughput::Elements(padded.area() as u64));

    group.bench_function("full_surface_1280x736", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for offset in (0..padded.area() as u32 * 4).step_by(4) {
                acc ^= translate(black_box(padded.width), offset);
            }
            black_box(acc)
        });
    });

    group.finish();
}

/// Benchmark full CPU conversion at common output sizes
/// This is the per-frame cost of the CPU strategy
fn bench_cpu_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_convert");
    group.sample_size(20); // Reduce sample size for full-frame benchmarks

    let internal = Resolution::new(1280, 720);
    let tiled = tiled_test_pattern(internal, ChannelOrder::Brga);
    let mut converter = CpuConverter::new(ChannelOrder::Brga, true);

    for output in [
        Resolution::new(640, 360),
        Resolution::new(1280, 720),
        Resolution::new(1920, 1080),
    ] {
        let geometry = FrameGeometry::new(internal, output).expect("valid geometry");
        group.throughput(Throughput::Elements(output.area() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(output),
            &geometry,
            |b, geometry| {
                b.iter(|| black_box(converter.convert(&tiled, geometry)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_translate, bench_cpu_convert);
criterion_main!(benches);
