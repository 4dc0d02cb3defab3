//! Performance benchmarks for the per-line console path.
//!
//! Every byte the central prints goes through the codec, escape stripping and
//! the classifier, so these are the only hot paths in the controller.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench console_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use keykeeper_protocol::{ConsoleCodec, classify, strip_ansi};
use std::hint::black_box;
use tokio_util::codec::Decoder;

const COLORED_LINE: &str =
    "\x1b[1;32m[00:00:10.000,000] <inf> app: Connected: [C4:8B:42:80:CC:CA]\x1b[0m";

const SAMPLE_LINES: [(&str, &str); 4] = [
    ("noise", "[00:00:01.000,000] <dbg> bt_conn: conn state changed"),
    ("battery", "[00:00:02.000,000] <inf> app: Battery Level: 87%"),
    ("authenticated", "[00:00:03.000,000] <inf> app: KEY AUTHENTICATED. OPEN DOOR PLEASE."),
    ("disconnected", "[00:00:04.000,000] <inf> app: Disconnected: [C4:8B:42:80:CC:CA] (reason 19)"),
];

/// Benchmark stripping escapes from colored and plain lines.
fn bench_strip_ansi(c: &mut Criterion) {
    let mut group = c.benchmark_group("strip_ansi");
    group.throughput(Throughput::Elements(1));

    group.bench_function("colored", |b| {
        b.iter(|| black_box(strip_ansi(black_box(COLORED_LINE))));
    });
    group.bench_function("plain", |b| {
        b.iter(|| black_box(strip_ansi(black_box(SAMPLE_LINES[0].1))));
    });

    group.finish();
}

/// Benchmark classification; unrecognized lines walk the whole table.
fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(1));

    for (name, line) in SAMPLE_LINES {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| black_box(classify(black_box(line))));
        });
    }

    group.finish();
}

/// Benchmark decoding a burst of log output.
fn bench_decode_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_burst");

    let mut burst = Vec::new();
    for _ in 0..100 {
        burst.extend_from_slice(COLORED_LINE.as_bytes());
        burst.extend_from_slice(b"\r\n");
    }
    group.throughput(Throughput::Bytes(burst.len() as u64));

    group.bench_function("100_lines", |b| {
        b.iter(|| {
            let mut codec = ConsoleCodec::new();
            let mut buffer = BytesMut::from(burst.as_slice());
            let mut count = 0;
            while let Some(line) = codec.decode(&mut buffer).unwrap() {
                black_box(line);
                count += 1;
            }
            assert_eq!(count, 100);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_strip_ansi, bench_classify, bench_decode_burst);
criterion_main!(benches);
