//! Criterion benchmarks for the decoder hot paths.
//!
//! Key metrics:
//! - CRC throughput over payload-sized messages
//! - Whole-stream decode throughput for clean and fully merged files
//!
//! Run with: cargo bench --bench decode

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use cs135_decode::{checksum, decode_reader};

/// Render one synthetic message 002 record with `samples` range gates.
fn render_record(timestamp: &str, samples: usize) -> String {
    let payload: String = (0..samples).map(|i| format!("{:05x}", i & 0xFFFFF)).collect();
    let params = format!("100 50 {samples} 005 +34 00 0100 00 0012 00003F");
    let status = "00 0100 05500 ///// ///// ///// 000";
    let body = format!("CS0001002\u{02}\r\n{status}\r\n{params}\r\n{payload}\r\n\u{03}");
    let crc = checksum::crc_message(body.as_bytes());
    format!(
        "{timestamp},\u{01}CS0001002\u{02}\r\n{status}\r\n{params}\r\n{payload}\r\n\u{03}{crc:04x}\n"
    )
}

fn render_stream(records: usize, samples: usize, merged: bool) -> String {
    let mut stream = String::new();
    for i in 0..records {
        let timestamp = format!("2018-09-10T11:{:02}:{:02}.000000", i / 60, i % 60);
        let record = render_record(&timestamp, samples);
        if merged && i + 1 < records {
            stream.push_str(record.trim_end_matches('\n'));
        } else {
            stream.push_str(&record);
        }
    }
    stream
}

fn crc_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc");
    // A full 2048-gate payload is 10240 hex characters.
    let message = vec![0x41u8; 10_240];
    group.throughput(Throughput::Bytes(message.len() as u64));
    group.bench_function("crc_message_10k", |b| {
        b.iter(|| checksum::crc_message(black_box(&message)));
    });
    group.finish();
}

fn stream_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for (name, merged) in [("clean_stream", false), ("merged_stream", true)] {
        let stream = render_stream(100, 512, merged);
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let output = decode_reader(black_box(stream.as_bytes())).unwrap();
                assert_eq!(output.records.len(), 100);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, crc_throughput, stream_decode);
criterion_main!(benches);
