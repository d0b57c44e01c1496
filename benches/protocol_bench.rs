//! Benchmarks for the request framer and codec

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use filevault::protocol::{decode_command, encode_command, encode_response, Command, FrameReader, Response};

fn upload_request(size: usize) -> Vec<u8> {
    encode_command(&Command::Upload {
        filename: "bench.bin".to_string(),
        data: vec![0xAB; size],
    })
}

fn framing_benchmarks(c: &mut Criterion) {
    let request = upload_request(1024 * 1024);

    c.bench_function("frame 1MB upload in 8KB chunks", |b| {
        b.iter(|| {
            let mut reader = FrameReader::new(16 * 1024 * 1024);
            let mut frame = None;
            for chunk in request.chunks(8 * 1024) {
                if let Some(f) = reader.push(black_box(chunk)).unwrap() {
                    frame = Some(f);
                }
            }
            frame
        })
    });
}

fn codec_benchmarks(c: &mut Criterion) {
    let request = upload_request(64 * 1024);
    let frame = &request[..request.len() - 4];

    c.bench_function("decode 64KB upload", |b| {
        b.iter(|| decode_command(black_box(frame)).unwrap())
    });

    let response = Response::file("bench.bin", &vec![0xCD; 64 * 1024]);
    c.bench_function("encode 64KB file response", |b| {
        b.iter(|| encode_response(black_box(&response)).unwrap())
    });
}

criterion_group!(benches, framing_benchmarks, codec_benchmarks);
criterion_main!(benches);
