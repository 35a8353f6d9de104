//! Performance benchmarks for the wire codec.
//!
//! Inbound handling decodes every payload before touching hardware, and
//! every edge or sample is encoded before publication, so both directions
//! sit on the hot path.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pinbridge_core::{Action, Direction, PeripheralClass, PinLevel, Property};
use pinbridge_protocol::{Message, MessageBuilder, WireCodec, decode, encode};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

/// Edge event published for an input line.
fn create_edge_event() -> Message {
    Message::pin_state_event("BCM4", PinLevel::High)
}

/// Duty cycle update for a pulse output.
fn create_pulse_update() -> Message {
    MessageBuilder::new(PeripheralClass::PulseOutput, Action::Event, "PWM_1")
        .property(Property::DutyCycle)
        .value(42.5)
        .build()
        .unwrap()
}

fn create_line_register(name: &str) -> Message {
    MessageBuilder::new(PeripheralClass::DigitalLine, Action::Register, name)
        .direction(Direction::In)
        .value(PinLevel::Low)
        .build()
        .unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));

    let edge = create_edge_event();
    group.bench_function("edge_event", |b| {
        b.iter(|| black_box(encode(black_box(&edge)).unwrap()));
    });

    let sample = Message::temperature_event("TEMP_1", 21.8125);
    group.bench_function("temperature_event", |b| {
        b.iter(|| black_box(encode(black_box(&sample)).unwrap()));
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(1));

    let line = encode(&create_line_register("BCM17")).unwrap();
    group.bench_function("line_register", |b| {
        b.iter(|| black_box(decode(black_box(&line)).unwrap()));
    });

    let pulse = encode(&create_pulse_update()).unwrap();
    group.bench_function("pulse_update", |b| {
        b.iter(|| black_box(decode(black_box(&pulse)).unwrap()));
    });

    // Unknown keys are skipped, not rejected.
    let padded = br#"{"peripheral":"PWM","action":"EVENT","name":"PWM_1","property":"FREQUENCY","value":50.0,"sequence":1234,"sent_at":"2025-10-05T12:46:06Z"}"#;
    group.bench_function("extra_keys", |b| {
        b.iter(|| black_box(decode(black_box(padded)).unwrap()));
    });

    group.finish();
}

fn bench_malformed(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_malformed");

    let unknown_class = br#"{"peripheral":"SERVO","action":"EVENT","name":"S1","property":"PIN_STATE","value":"HIGH"}"#;
    group.bench_function("unknown_class", |b| {
        b.iter(|| black_box(decode(black_box(unknown_class)).is_err()));
    });

    let truncated = br#"{"peripheral":"GPIO","action":"EVE"#;
    group.bench_function("truncated", |b| {
        b.iter(|| black_box(decode(black_box(truncated)).is_err()));
    });

    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip");
    group.throughput(Throughput::Elements(1));

    let msg = create_pulse_update();
    group.bench_function("pulse_update", |b| {
        b.iter(|| {
            let bytes = encode(black_box(&msg)).unwrap();
            black_box(decode(&bytes).unwrap());
        });
    });

    group.finish();
}

/// Decode a burst of register messages from one buffer, the way a captured
/// controller session restoring a board's configuration is replayed.
fn bench_codec_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_burst");

    for burst in [8, 32, 128] {
        let mut stream = BytesMut::new();
        let mut codec = WireCodec::new();
        for i in 0..burst {
            codec
                .encode(create_line_register(&format!("BCM{i}")), &mut stream)
                .unwrap();
        }

        group.throughput(Throughput::Elements(burst as u64));
        group.bench_with_input(BenchmarkId::from_parameter(burst), &stream, |b, stream| {
            b.iter(|| {
                let mut codec = WireCodec::new();
                let mut buf = stream.clone();
                while let Some(msg) = codec.decode(&mut buf).unwrap() {
                    black_box(msg);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_malformed,
    bench_roundtrip,
    bench_codec_burst
);
criterion_main!(benches);
