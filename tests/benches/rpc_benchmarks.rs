//! # Proto-RPC Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Envelope | bincode encode/decode of a request |
//! | Correlation | register then resolve a pending call |
//! | End to end | request/response over the channel transport |
//! | End to end | notification throughput over the channel transport |

// Allow excessive nesting in benchmark code
#![allow(clippy::excessive_nesting)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use proto_rpc::{encode_payload, CorrelationTable, ResultHandles, RpcMessage};
use rpc_tests::fixtures::{
    register_dht_methods, ClosestPeersRequest, ClosestPeersResponse, LeaveNotice, PeerPair,
    PingRequest, PingResponse, METHOD_CLOSEST_PEERS, METHOD_LEAVE, METHOD_PING,
};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Envelope codec
// ============================================================================

fn bench_envelope_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope-codec");

    for size in [16usize, 256, 4096] {
        let message = RpcMessage::request("bench-id", METHOD_PING, vec![0xAB; size]);
        let bytes = message.to_bytes().unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encode", size), &message, |b, m| {
            b.iter(|| black_box(m.to_bytes().unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &bytes, |b, raw| {
            b.iter(|| black_box(RpcMessage::from_bytes(raw).unwrap()))
        });
    }

    group.finish();
}

// ============================================================================
// Correlation table
// ============================================================================

fn bench_correlation_table(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("correlation-table");
    let body = encode_payload(&PingResponse { nonce: 1 }).unwrap();

    group.bench_function("register_resolve", |b| {
        let table = Arc::new(CorrelationTable::new());
        let mut n = 0u64;
        b.iter(|| {
            let _guard = runtime.enter();
            n += 1;
            let id = n.to_string();
            let (handles, _pending) = ResultHandles::typed::<PingResponse>(id.clone());
            table.register(id.clone(), handles, Duration::from_secs(30));
            black_box(table.resolve(&id, Some(body.clone())))
        })
    });

    group.finish();
}

// ============================================================================
// End to end
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pair = runtime.block_on(async {
        let pair = PeerPair::new();
        register_dht_methods(&pair.remote);
        pair
    });
    let client = pair.local.client();

    let mut group = c.benchmark_group("round-trip");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("ping", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let pong: PingResponse = client
                    .request(METHOD_PING, &PingRequest { nonce: 7 }, None)
                    .await
                    .unwrap();
                black_box(pong)
            })
        })
    });

    for limit in [1u32, 20] {
        group.bench_with_input(
            BenchmarkId::new("closest_peers", limit),
            &limit,
            |b, &limit| {
                b.iter(|| {
                    runtime.block_on(async {
                        let peers: ClosestPeersResponse = client
                            .request(
                                METHOD_CLOSEST_PEERS,
                                &ClosestPeersRequest {
                                    target: [1; 32],
                                    limit,
                                },
                                None,
                            )
                            .await
                            .unwrap();
                        black_box(peers)
                    })
                })
            },
        );
    }

    for batch in [10u64, 100] {
        group.throughput(Throughput::Elements(batch));
        group.bench_with_input(BenchmarkId::new("notify", batch), &batch, |b, &batch| {
            b.iter(|| {
                runtime.block_on(async {
                    for i in 0..batch {
                        client
                            .notify(METHOD_LEAVE, &LeaveNotice { node_id: [i as u8; 32] }, None)
                            .await
                            .await
                            .unwrap();
                    }
                })
            })
        });
    }

    group.finish();
    runtime.block_on(pair.shutdown());
}

criterion_group!(
    benches,
    bench_envelope_codec,
    bench_correlation_table,
    bench_round_trip
);
criterion_main!(benches);
