//! Performance benchmarks for the pass-through frame codec.
//!
//! The relay sits on the latency path between the terminal and the card, so
//! wrapping and unwrapping must stay well under the transport round-trip
//! time.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use relaykit_core::{CardIdentity, constants::{DEFAULT_ATQA, DEFAULT_SAK}};
use relaykit_protocol::{
    ControllerCommand, InitTargetBuilder, Opcode, PassThroughFrame, strip_target_data_header,
};
use std::hint::black_box;

/// A minimal get-data poll, the command sent most often.
fn create_poll_command() -> ControllerCommand {
    ControllerCommand::new(Opcode::GetData, vec![])
}

/// A set-data command carrying a typical card response.
fn create_response_command() -> ControllerCommand {
    let mut payload = vec![0x6F, 0x1A, 0x84, 0x0E];
    payload.extend_from_slice(&[0xA5; 24]);
    payload.extend_from_slice(&[0x90, 0x00]);
    ControllerCommand::new(Opcode::SetData, payload)
}

fn bench_wrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrap");
    group.throughput(Throughput::Elements(1));

    let poll = create_poll_command();
    group.bench_function("wrap_poll", |b| {
        b.iter(|| black_box(PassThroughFrame::wrap(black_box(&poll)).unwrap()));
    });

    let response = create_response_command();
    group.bench_function("wrap_response", |b| {
        b.iter(|| black_box(PassThroughFrame::wrap(black_box(&response)).unwrap()));
    });

    group.finish();
}

fn bench_unwrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("unwrap");
    group.throughput(Throughput::Elements(1));

    let frame = PassThroughFrame::wrap(&create_response_command()).unwrap();
    let raw = frame.as_bytes().to_vec();

    group.bench_function("unwrap_response", |b| {
        b.iter(|| black_box(PassThroughFrame::unwrap(black_box(&raw)).unwrap()));
    });

    group.finish();
}

fn bench_strip_header(c: &mut Criterion) {
    let mut group = c.benchmark_group("strip_header");
    group.throughput(Throughput::Elements(1));

    let mut framed = vec![0xD5, 0x87, 0x00];
    framed.extend_from_slice(&[0x00, 0xA4, 0x04, 0x00, 0x0E]);
    framed.extend_from_slice(&[0x31; 14]);

    group.bench_function("strip_framed_reply", |b| {
        b.iter(|| black_box(strip_target_data_header(black_box(&framed))));
    });

    group.finish();
}

fn bench_init_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("init_builder");
    group.throughput(Throughput::Elements(1));

    group.bench_function("build_init_command", |b| {
        b.iter(|| {
            let identity =
                CardIdentity::new(DEFAULT_ATQA, vec![0x88, 0x04, 0xE1, 0x5C], DEFAULT_SAK)
                    .unwrap();
            black_box(InitTargetBuilder::new(identity).build().unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_wrap,
    bench_unwrap,
    bench_strip_header,
    bench_init_builder
);
criterion_main!(benches);
