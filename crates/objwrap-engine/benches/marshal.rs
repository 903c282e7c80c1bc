use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use objwrap_engine::marshal::{from_native, sample_to_dynamic, to_native};
use objwrap_engine::Value;
use objwrap_sdk::{Caps, NativeBuffer, Sample, ValueType};

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");

    let cases = [
        ("int", Value::from(1234), ValueType::Int),
        ("uint64", Value::Number(9_007_199_254_740_000.0), ValueType::UInt64),
        ("double", Value::from(0.125), ValueType::Double),
        ("string", Value::from("appsink0"), ValueType::String),
    ];
    for (name, value, ty) in cases.iter() {
        group.bench_with_input(BenchmarkId::new("round_trip", name), value, |b, value| {
            b.iter(|| from_native(&to_native(black_box(value), *ty)));
        });
    }

    group.finish();
}

fn bench_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("samples");
    let caps = Caps::from_string(
        "video/x-raw, format=(string)I420, width=(int)1920, height=(int)1080, framerate=30/1",
    );

    for size in [1024usize, 64 * 1024, 1920 * 1080 * 3 / 2] {
        let buffer = NativeBuffer::copy_from_slice(&vec![0x80; size]);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("to_dynamic", size), &buffer, |b, buffer| {
            b.iter(|| sample_to_dynamic(Sample::new(buffer.clone(), caps.clone())));
        });
    }

    group.finish();
}

fn bench_caps_parse(c: &mut Criterion) {
    let text = "audio/x-raw, format=(string)S16LE, layout=interleaved, rate=(int)48000, channels=(int)2";
    c.bench_function("caps_from_string", |b| {
        b.iter(|| Caps::from_string(black_box(text)));
    });
}

criterion_group!(benches, bench_primitives, bench_samples, bench_caps_parse);
criterion_main!(benches);
