//! Benchmarks for decoding and book reconstruction.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use itch_lob_reconstructor::itch::fields::pad_alpha;
use itch_lob_reconstructor::itch::{
    AddOrder, FeedWriter, ItchEvent, MessageHeader, OrderCancel, OrderDelete, OrderExecuted,
};
use itch_lob_reconstructor::{
    EventKind, FeedDecoder, MessageDecoder, OrderBookEngine, ReconstructionConfig,
    ReconstructionDriver, Side, SnapshotPolicy,
};

/// Adds around $100.00 with a cancel, execution and delete cycle mixed in.
fn create_test_events(count: usize) -> Vec<ItchEvent> {
    let mut events = Vec::with_capacity(count);
    let base_price: u32 = 1_000_000; // $100.0000
    let stock = pad_alpha::<8>("AAPL");

    for i in 0..count {
        let ts = i as u64 * 1_000;
        let header = MessageHeader::new(1, 0, ts);
        let order_ref = (i / 4 + 1) as u64;

        let event = match i % 4 {
            0 => {
                let is_bid = order_ref % 2 == 0;
                let offset = (order_ref % 10) as u32 * 100; // $0.01 increments
                ItchEvent::AddOrder(AddOrder {
                    header,
                    order_ref,
                    side: if is_bid { Side::Bid } else { Side::Ask },
                    shares: 300,
                    stock,
                    price: if is_bid {
                        base_price - offset
                    } else {
                        base_price + 100 + offset
                    },
                    attribution: None,
                })
            }
            1 => ItchEvent::CancelOrder(OrderCancel {
                header,
                order_ref,
                cancelled_shares: 100,
            }),
            2 => ItchEvent::ExecuteOrder(OrderExecuted {
                header,
                order_ref,
                executed_shares: 100,
                match_number: i as u64,
                with_price: None,
            }),
            _ => ItchEvent::DeleteOrder(OrderDelete { header, order_ref }),
        };
        events.push(event);
    }

    events
}

fn create_test_feed(count: usize) -> Vec<u8> {
    let mut writer = FeedWriter::new();
    for event in create_test_events(count) {
        writer.push(&event);
    }
    writer.into_bytes()
}

fn bench_decoding(c: &mut Criterion) {
    let bytes = create_test_feed(10_000);
    let decoder = MessageDecoder::new();

    let mut group = c.benchmark_group("decoding");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("feed_decoder", |b| {
        b.iter(|| {
            for record in FeedDecoder::new(&decoder, &bytes) {
                let _ = black_box(record);
            }
        })
    });

    group.finish();
}

fn bench_reconstruction(c: &mut Criterion) {
    let events = create_test_events(10_000);
    let bytes = create_test_feed(10_000);

    let mut group = c.benchmark_group("reconstruction");
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("engine_apply", |b| {
        b.iter(|| {
            let mut book = OrderBookEngine::new(1);
            for event in &events {
                let _ = black_box(book.apply(event));
            }
        })
    });

    for (name, policy) in [
        ("replay_every_event", SnapshotPolicy::EveryEvent),
        ("replay_on_trade", SnapshotPolicy::OnTrade),
    ] {
        let driver =
            ReconstructionDriver::new(ReconstructionConfig::default().with_snapshot_policy(policy));
        group.bench_function(name, |b| b.iter(|| black_box(driver.run(&bytes))));
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    // Populated book: ten levels per side, adds only
    let mut book = OrderBookEngine::new(1);
    for event in create_test_events(400).iter().step_by(4) {
        let _ = book.apply(event);
    }

    let mut group = c.benchmark_group("snapshot");

    for depth in [1, 5, 10] {
        group.bench_function(format!("depth_{depth}"), |b| {
            b.iter(|| black_box(book.snapshot(depth, EventKind::Add, Side::Bid)))
        });
    }

    group.bench_function("check_invariants", |b| {
        b.iter(|| black_box(book.check_invariants()))
    });

    group.finish();
}

criterion_group!(benches, bench_decoding, bench_reconstruction, bench_snapshot);
criterion_main!(benches);
