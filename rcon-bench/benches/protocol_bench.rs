//! Protocol encoding/decoding benchmarks.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rcon_protocol::packet::{Envelope, Packet};
use rcon_protocol::{frame, FrameDecoder, PacketCodec, RegistryPair, MAX_FRAME_LEN};

fn response_envelope(payload_size: usize) -> Envelope {
    Envelope::new(
        1,
        Packet::Response {
            text: Some("x".repeat(payload_size)),
        },
    )
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");

    for size in [100, 1000, 10000] {
        let payload = vec![0x42u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| black_box(frame::encode(payload, MAX_FRAME_LEN).unwrap()));
        });
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for size in [100, 1000, 10000] {
        let encoded = frame::encode(&vec![0x42u8; size], MAX_FRAME_LEN).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                decoder.extend(encoded);
                black_box(decoder.decode().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_packet_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_encode");
    let codec = PacketCodec::new(RegistryPair::server());

    for size in [100, 1000, 4096] {
        let envelope = response_envelope(size);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &envelope,
            |b, envelope| {
                b.iter(|| black_box(codec.encode(envelope.clone()).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_packet_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_decode");
    let server = PacketCodec::new(RegistryPair::server());
    let client = PacketCodec::new(RegistryPair::client());

    for size in [100, 1000, 4096] {
        let payload: Bytes = server
            .encode(response_envelope(size))
            .unwrap()
            .unwrap()
            .freeze();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| black_box(client.decode(payload.clone()).unwrap()));
        });
    }

    group.finish();
}

fn bench_response_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("response_split");

    for size in [8192, 65536, 262144] {
        let packet = Packet::Response {
            text: Some("x".repeat(size)),
        };

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &packet, |b, packet| {
            b.iter(|| black_box(packet.split().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_encode,
    bench_frame_decode,
    bench_packet_encode,
    bench_packet_decode,
    bench_response_split,
);

criterion_main!(benches);
