// ABOUTME: Benchmark suite for frame decoding, dispatch, and encoding
// ABOUTME: Measures resynchronization cost, per-type payload parsing, and buffer pool contention

use std::time::Duration;

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fastsock::buffer::BufferPool;
use fastsock::decoder::FrameDecoder;
use fastsock::dispatch::dispatch;
use fastsock::encoder::FrameEncoder;
use fastsock::frame::{Message, START_MARKER};

fn frame_bytes(marker: u8, payload: &[u8]) -> Vec<u8> {
    let frame_length = 1 + payload.len() as u32;
    let mut out = vec![START_MARKER];
    out.extend_from_slice(&frame_length.to_be_bytes());
    out.push(marker);
    out.extend_from_slice(payload);
    out
}

fn bench_decode(c: &mut Criterion) {
    let decoder = FrameDecoder::new(16 * 1024 * 1024);
    let mut group = c.benchmark_group("decode");
    group.measurement_time(Duration::from_secs(10));

    let int32 = frame_bytes(0x02, &42i32.to_be_bytes());
    group.bench_function("int32", |b| {
        b.iter(|| {
            let mut buf = BytesMut::from(black_box(int32.as_slice()));
            decoder.decode_from(&mut buf)
        })
    });

    let mut string_payload = 11u32.to_be_bytes().to_vec();
    string_payload.extend_from_slice(b"hello world");
    let string_frame = frame_bytes(0x01, &string_payload);
    group.bench_function("string", |b| {
        b.iter(|| {
            let mut buf = BytesMut::from(black_box(string_frame.as_slice()));
            decoder.decode_from(&mut buf)
        })
    });

    let mut large_payload = (60_000u32).to_be_bytes().to_vec();
    large_payload.extend(std::iter::repeat(0xAB).take(60_000));
    let byte_array_frame = frame_bytes(0x06, &large_payload);
    group.bench_function("byte_array_60k", |b| {
        b.iter(|| {
            let mut buf = BytesMut::from(black_box(byte_array_frame.as_slice()));
            decoder.decode_from(&mut buf)
        })
    });

    group.finish();
}

fn bench_resync(c: &mut Criterion) {
    let decoder = FrameDecoder::new(16 * 1024 * 1024);
    let mut group = c.benchmark_group("resync");
    group.measurement_time(Duration::from_secs(10));

    for garbage_len in [0usize, 1024, 8192] {
        let mut bytes = vec![0xFFu8; garbage_len];
        bytes.extend(frame_bytes(0x00, &[]));
        group.bench_with_input(BenchmarkId::from_parameter(garbage_len), &bytes, |b, bytes| {
            b.iter(|| {
                let mut buf = BytesMut::from(black_box(bytes.as_slice()));
                decoder.decode_from(&mut buf)
            })
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let decoder = FrameDecoder::new(16 * 1024 * 1024);
    let mut group = c.benchmark_group("dispatch");

    let int32 = frame_bytes(0x02, &42i32.to_be_bytes());
    let mut buf = BytesMut::from(&int32[..]);
    let outcome = decoder.decode_from(&mut buf);
    let frame = outcome.frames.into_iter().next().unwrap();

    group.bench_function("int32", |b| b.iter(|| dispatch(black_box(&frame))));
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pool = BufferPool::new(32);
    let encoder = FrameEncoder::new(pool);
    let mut group = c.benchmark_group("encode");

    group.bench_function("string", |b| {
        b.iter(|| rt.block_on(encoder.encode(black_box(&Message::String("hello world".to_string())))))
    });

    group.bench_function("int32", |b| {
        b.iter(|| rt.block_on(encoder.encode(black_box(&Message::Int32(42)))))
    });

    group.finish();
}

fn bench_buffer_pool_roundtrip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pool = BufferPool::new(32);
    let mut group = c.benchmark_group("buffer_pool");

    group.bench_function("acquire_release_small", |b| {
        b.iter(|| rt.block_on(async { pool.acquire(black_box(64)).await.unwrap() }))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_decode,
    bench_resync,
    bench_dispatch,
    bench_encode,
    bench_buffer_pool_roundtrip
);
criterion_main!(benches);
