//! End-to-end replay tests over hand-built ITCH 5.0 feeds.
//!
//! Every feed here goes through the full path: typed events are framed into
//! bytes, decoded back and replayed by the driver.
//!
//! Run with:
//! ```bash
//! cargo test --test scenarios
//! ```

use itch_lob_reconstructor::itch::fields::pad_alpha;
use itch_lob_reconstructor::itch::{
    AddOrder, AdminMessage, CrossTrade, ExecutionPrice, FeedWriter, ItchEvent, MessageHeader,
    NonCrossTrade, OrderCancel, OrderDelete, OrderExecuted, OrderReplace, TradeMessage,
};
use itch_lob_reconstructor::{
    export, FeedDecoder, IntegrityError, LobError, MessageDecoder, ReconstructionConfig,
    ReconstructionDriver, Side, TradeKind, WarningCategory, WarningTrackerConfig,
};

const LOCATE: u16 = 7;
const P100: u32 = 1_000_000; // $100.0000
const P101: u32 = 1_010_000; // $101.0000

// ============================================================================
// Feed builders
// ============================================================================

fn header(ts: u64) -> MessageHeader {
    MessageHeader::new(LOCATE, 0, ts)
}

fn directory(symbol: &str) -> ItchEvent {
    let mut body = pad_alpha::<8>(symbol).to_vec();
    body.resize(28, b' ');
    ItchEvent::Administrative(AdminMessage {
        tag: b'R',
        header: header(0),
        body,
    })
}

fn add(ts: u64, id: u64, side: Side, price: u32, shares: u32) -> ItchEvent {
    ItchEvent::AddOrder(AddOrder {
        header: header(ts),
        order_ref: id,
        side,
        shares,
        stock: pad_alpha("AAPL"),
        price,
        attribution: None,
    })
}

fn execute(ts: u64, id: u64, shares: u32) -> ItchEvent {
    ItchEvent::ExecuteOrder(OrderExecuted {
        header: header(ts),
        order_ref: id,
        executed_shares: shares,
        match_number: ts,
        with_price: None,
    })
}

fn replace(ts: u64, old: u64, new: u64, price: u32, shares: u32) -> ItchEvent {
    ItchEvent::ReplaceOrder(OrderReplace {
        header: header(ts),
        original_order_ref: old,
        new_order_ref: new,
        shares,
        price,
    })
}

fn feed(events: &[ItchEvent]) -> Vec<u8> {
    let mut writer = FeedWriter::new();
    for event in events {
        writer.push(event);
    }
    writer.into_bytes()
}

fn quiet() -> ReconstructionConfig {
    ReconstructionConfig::default()
        .with_warning_config(WarningTrackerConfig::default().with_logging(false))
}

// ============================================================================
// Book scenarios
// ============================================================================

#[test]
fn test_execution_leaves_remaining_order_at_level() {
    let bytes = feed(&[
        directory("AAPL"),
        add(1, 1, Side::Bid, P100, 10),
        add(2, 2, Side::Bid, P100, 5),
        execute(3, 1, 10),
    ]);
    let result = ReconstructionDriver::new(quiet()).run(&bytes).unwrap();
    let history = result.by_symbol("AAPL").unwrap();
    let book = &history.book;

    let level = book.bids().level(P100).unwrap();
    assert_eq!(level.total_size(), 5);
    assert_eq!(level.order_count(), 1);
    assert_eq!(level.front(), Some((2, 5)));
    assert!(book.order(1).is_none());
    assert!(book.registry().is_retired(1));

    assert_eq!(history.trades.len(), 1);
    let trade = &history.trades[0];
    assert_eq!(trade.price, P100);
    assert_eq!(trade.size, 10);
    assert_eq!(trade.passive_side, Side::Bid);
    assert_eq!(trade.sequence, 1);
    assert_eq!(trade.kind, TradeKind::Execution);

    // One snapshot per applied book event
    assert_eq!(history.snapshots.len(), 3);
    assert_eq!(history.snapshots[2].best_bid().unwrap().size, 5);
}

#[test]
fn test_replace_moves_order_to_new_level() {
    let bytes = feed(&[
        add(1, 1, Side::Bid, P100, 10),
        replace(2, 1, 2, P101, 20),
    ]);
    let result = ReconstructionDriver::new(quiet()).run(&bytes).unwrap();
    let book = &result.get(LOCATE).unwrap().book;

    assert!(book.bids().level(P100).is_none());
    let level = book.bids().level(P101).unwrap();
    assert_eq!(level.total_size(), 20);
    assert_eq!(level.front(), Some((2, 20)));
    assert_eq!(book.order(2).unwrap().side, Side::Bid);
    assert_eq!(book.best_bid(), Some(P101));
    assert!(book.check_invariants().is_ok());
}

#[test]
fn test_unknown_order_lenient_skips_without_mutation() {
    let bytes = feed(&[add(1, 1, Side::Ask, P100, 10), execute(2, 42, 3)]);
    let result = ReconstructionDriver::new(quiet()).run(&bytes).unwrap();
    let history = result.get(LOCATE).unwrap();

    assert_eq!(result.stats.events_skipped, 1);
    assert_eq!(history.book.best_ask(), Some(P100));
    assert_eq!(history.book.order(1).unwrap().size, 10);
    assert!(history.trades.is_empty());
    assert_eq!(history.snapshots.len(), 1);
    assert_eq!(
        result
            .warnings
            .count_by_category(WarningCategory::UnknownOrder),
        1
    );
}

#[test]
fn test_unknown_order_strict_halts_at_record() {
    let events = [
        directory("AAPL"),
        add(1, 1, Side::Ask, P100, 10),
        execute(2, 42, 3),
        add(3, 2, Side::Ask, P100, 10),
    ];
    let offset: u64 = events[..2].iter().map(|e| e.encode().len() as u64).sum();
    let bytes = feed(&events);

    match ReconstructionDriver::new(quiet().strict()).run(&bytes) {
        Err(LobError::Halted {
            record,
            offset: at,
            source,
        }) => {
            assert_eq!(record, 2);
            assert_eq!(at, offset);
            assert_eq!(source, IntegrityError::UnknownOrderId(42));
        }
        other => panic!("expected a halt, got {other:?}"),
    }
}

#[test]
fn test_over_cancel_rejected_atomically() {
    let bytes = feed(&[
        add(1, 1, Side::Bid, P100, 10),
        ItchEvent::CancelOrder(OrderCancel {
            header: header(2),
            order_ref: 1,
            cancelled_shares: 11,
        }),
    ]);
    let result = ReconstructionDriver::new(quiet()).run(&bytes).unwrap();
    let book = &result.get(LOCATE).unwrap().book;
    assert_eq!(book.order(1).unwrap().size, 10);
    assert_eq!(book.bids().total_size(), 10);
    assert_eq!(
        result
            .warnings
            .count_by_category(WarningCategory::OverReduction),
        1
    );
}

#[test]
fn test_reused_identifier_is_rejected() {
    let bytes = feed(&[
        add(1, 1, Side::Bid, P100, 10),
        ItchEvent::DeleteOrder(OrderDelete {
            header: header(2),
            order_ref: 1,
        }),
        add(3, 1, Side::Bid, P100, 10),
    ]);
    let result = ReconstructionDriver::new(quiet()).run(&bytes).unwrap();
    let book = &result.get(LOCATE).unwrap().book;
    assert!(book.bids().is_empty());
    assert_eq!(
        result
            .warnings
            .count_by_category(WarningCategory::RetiredOrder),
        1
    );
}

#[test]
fn test_hidden_and_cross_trades_leave_book_alone() {
    let bytes = feed(&[
        add(1, 1, Side::Bid, P100, 10),
        ItchEvent::Trade(TradeMessage::NonCross(NonCrossTrade {
            header: header(2),
            order_ref: 0,
            side: Side::Bid,
            shares: 300,
            stock: pad_alpha("AAPL"),
            price: P101,
            match_number: 9,
        })),
        ItchEvent::Trade(TradeMessage::Cross(CrossTrade {
            header: header(3),
            shares: 1_000,
            stock: pad_alpha("AAPL"),
            cross_price: P100,
            match_number: 10,
            cross_type: b'C',
        })),
        ItchEvent::ExecuteOrder(OrderExecuted {
            header: header(4),
            order_ref: 1,
            executed_shares: 4,
            match_number: 11,
            with_price: Some(ExecutionPrice {
                printable: false,
                price: 999_900,
            }),
        }),
    ]);
    let result = ReconstructionDriver::new(quiet()).run(&bytes).unwrap();
    let history = result.get(LOCATE).unwrap();

    let kinds: Vec<TradeKind> = history.trades.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TradeKind::Hidden,
            TradeKind::Cross,
            TradeKind::ExecutionWithPrice
        ]
    );
    let sequences: Vec<u64> = history.trades.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(history.trades[0].order_id, None);
    assert_eq!(history.trades[1].passive_side, Side::None);
    assert_eq!(history.trades[2].price, 999_900);
    assert!(!history.trades[2].printable);

    assert_eq!(history.book.order(1).unwrap().size, 6);
    assert_eq!(history.traded_volume(), 1_300);
}

// ============================================================================
// Wire format
// ============================================================================

#[test]
fn test_every_message_type_round_trips() {
    let decoder = MessageDecoder::new();
    let mut writer = FeedWriter::new();

    // Administrative messages: header plus a body of the registered width
    for tag in *b"SRHYLVWKJhBIN" {
        let layout = decoder.layout(tag).unwrap();
        let mut record = vec![0u8; 2];
        record.push(tag);
        record.extend_from_slice(&LOCATE.to_be_bytes());
        record.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0x30, 0x39]);
        record.resize(3 + layout.payload_len, b'X');
        let len = (record.len() - 2) as u16;
        record[..2].copy_from_slice(&len.to_be_bytes());
        writer.push_raw(&record);
    }

    writer
        .push(&add(1, 1, Side::Bid, P100, 10))
        .push(&ItchEvent::AddOrder(AddOrder {
            header: header(2),
            order_ref: 2,
            side: Side::Ask,
            shares: 5,
            stock: pad_alpha("AAPL"),
            price: P101,
            attribution: Some(*b"GSCO"),
        }))
        .push(&execute(3, 1, 4))
        .push(&ItchEvent::ExecuteOrder(OrderExecuted {
            header: header(4),
            order_ref: 1,
            executed_shares: 1,
            match_number: 5,
            with_price: Some(ExecutionPrice {
                printable: true,
                price: P100,
            }),
        }))
        .push(&ItchEvent::CancelOrder(OrderCancel {
            header: header(5),
            order_ref: 1,
            cancelled_shares: 1,
        }))
        .push(&replace(6, 2, 3, P100, 8))
        .push(&ItchEvent::DeleteOrder(OrderDelete {
            header: header(7),
            order_ref: 3,
        }));

    let original = writer.into_bytes();
    let mut rebuilt = Vec::with_capacity(original.len());
    let mut count = 0;
    for record in FeedDecoder::new(&decoder, &original) {
        rebuilt.extend_from_slice(&record.unwrap().event.encode());
        count += 1;
    }
    assert_eq!(count, 13 + 7);
    assert_eq!(rebuilt, original);
}

#[test]
fn test_unknown_tag_skipped_and_replay_continues() {
    let mut writer = FeedWriter::new();
    writer
        .push(&add(1, 1, Side::Bid, P100, 10))
        .push_raw(&[0, 5, b'z', 1, 2, 3, 4])
        .push(&add(2, 2, Side::Bid, P100, 5));

    let result = ReconstructionDriver::new(quiet())
        .run(writer.as_bytes())
        .unwrap();
    assert_eq!(result.stats.records_read, 3);
    assert_eq!(result.stats.unknown_messages, 1);
    assert_eq!(result.get(LOCATE).unwrap().book.order_count(), 2);
}

#[test]
fn test_truncated_tail_keeps_prefix_state() {
    let mut bytes = feed(&[
        add(1, 1, Side::Bid, P100, 10),
        add(2, 2, Side::Ask, P101, 10),
    ]);
    let last = add(3, 3, Side::Bid, P100, 10).encode();
    bytes.extend_from_slice(&last[..last.len() - 4]);

    let result = ReconstructionDriver::new(quiet()).run(&bytes).unwrap();
    assert!(result.stats.framing_error_at.is_some());
    let book = &result.get(LOCATE).unwrap().book;
    assert_eq!(book.order_count(), 2);
    assert!(book.check_invariants().is_ok());
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_writes_per_symbol_files() {
    let bytes = feed(&[
        directory("AAPL"),
        add(1, 1, Side::Bid, P100, 10),
        add(2, 2, Side::Ask, P101, 5),
        execute(3, 2, 5),
    ]);
    let result = ReconstructionDriver::new(quiet()).run(&bytes).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let dirs = export::export_all(dir.path(), &result, 2).unwrap();
    assert_eq!(dirs, vec![dir.path().join("AAPL")]);
    assert!(dir.path().join("warnings.json").is_file());

    let trades = std::fs::read_to_string(dir.path().join("AAPL/AAPL_trades.csv")).unwrap();
    assert_eq!(trades, "timestamp,shares,price\n3,5,101.0000\n");

    let events = std::fs::read_to_string(dir.path().join("AAPL/AAPL_events.csv")).unwrap();
    let lines: Vec<&str> = events.lines().collect();
    assert_eq!(lines.len(), 1 + 3 + 1);
    assert_eq!(lines[1], "1,AAPL,bid,100.0000,10,add");
    assert_eq!(lines[4], "3,AAPL,ask,101.0000,5,trade");
}
