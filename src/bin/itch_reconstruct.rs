//! Replay an ITCH 5.0 session file and export per-symbol book history.
//!
//! # Usage
//!
//! ```bash
//! # Reconstruct three symbols, 5 levels deep
//! cargo run --release --bin itch_reconstruct -- \
//!     -i data/01302019.NASDAQ_ITCH50 -o output/ -s AAPL,MSFT,GOOGL -d 5
//!
//! # Compressed feed, snapshot only on trades, stop at the first bad event
//! cargo run --release --bin itch_reconstruct -- \
//!     -i data/01302019.NASDAQ_ITCH50.zst -o output/ --on-trade --strict
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use itch_lob_reconstructor::driver::{DEFAULT_DEPTH, IntegrityMode, SnapshotPolicy};
use itch_lob_reconstructor::{
    export, FeedLoader, LobError, ReconstructionConfig, ReconstructionDriver, Result,
};

/// Command-line arguments
struct Args {
    input: PathBuf,
    output: PathBuf,
    /// Symbols to reconstruct; empty means all
    symbols: Vec<String>,
    depth: usize,
    policy: SnapshotPolicy,
    strict: bool,
    max_records: Option<u64>,
    verbose: bool,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> std::result::Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn number<T: std::str::FromStr>(text: &str, flag: &str) -> std::result::Result<T, String> {
    text.parse()
        .map_err(|_| format!("{flag} expects a number, got {text:?}"))
}

fn parse_args() -> std::result::Result<Args, String> {
    let args: Vec<String> = env::args().collect();

    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut symbols = Vec::new();
    let mut depth = DEFAULT_DEPTH;
    let mut policy = SnapshotPolicy::EveryEvent;
    let mut strict = false;
    let mut max_records = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--input" | "-i" => {
                i += 1;
                input = Some(PathBuf::from(value(&args, i, flag)?));
            }
            "--output" | "-o" => {
                i += 1;
                output = Some(PathBuf::from(value(&args, i, flag)?));
            }
            "--symbols" | "-s" => {
                i += 1;
                symbols = value(&args, i, flag)?
                    .split(',')
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "--depth" | "-d" => {
                i += 1;
                depth = number(value(&args, i, flag)?, flag)?;
                if depth == 0 {
                    return Err("--depth must be at least 1".to_string());
                }
            }
            "--every" => {
                i += 1;
                let n: u64 = number(value(&args, i, flag)?, flag)?;
                policy = if n == 0 {
                    SnapshotPolicy::Never
                } else {
                    SnapshotPolicy::EveryNth(n)
                };
            }
            "--on-trade" => policy = SnapshotPolicy::OnTrade,
            "--strict" => strict = true,
            "--max-records" => {
                i += 1;
                max_records = Some(number(value(&args, i, flag)?, flag)?);
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg => {
                if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else if output.is_none() {
                    output = Some(PathBuf::from(arg));
                } else {
                    return Err(format!("Unknown argument: {arg}"));
                }
            }
        }
        i += 1;
    }

    Ok(Args {
        input: input.ok_or("Input feed is required")?,
        output: output.unwrap_or_else(|| PathBuf::from("output")),
        symbols,
        depth,
        policy,
        strict,
        max_records,
        verbose,
    })
}

fn print_help() {
    eprintln!(
        r#"
ITCH 5.0 Order Book Reconstruction

Replays a NASDAQ TotalView-ITCH 5.0 session file and writes, per symbol,
the book depth history, the trade tape and a tabular event log.

USAGE:
    itch_reconstruct [OPTIONS] --input <FEED>
    itch_reconstruct <FEED> [OUTPUT]

OPTIONS:
    -i, --input <FEED>       Feed file (raw or .zst)
    -o, --output <DIR>       Output directory [default: output]
    -s, --symbols <LIST>     Comma-separated symbols [default: all]
    -d, --depth <N>          Levels per side in snapshots [default: 3]
        --every <N>          Snapshot every Nth event per symbol (0 = never)
        --on-trade           Snapshot only after trades
        --strict             Stop at the first event the book rejects
        --max-records <N>    Stop after N records
    -v, --verbose            Debug logging
    -h, --help               Print this help message

OUTPUT:
    <DIR>/<SYMBOL>/<SYMBOL>_order_book_history.csv
    <DIR>/<SYMBOL>/<SYMBOL>_trades.csv
    <DIR>/<SYMBOL>/<SYMBOL>_events.csv
    <DIR>/warnings.json
"#
    );
}

fn run(args: &Args) -> Result<()> {
    let loader = FeedLoader::new(&args.input)?;
    println!(
        "Reading {} ({:.1} MB, {:?})",
        args.input.display(),
        loader.file_size() as f64 / (1024.0 * 1024.0),
        loader.compression()
    );

    let mut config = ReconstructionConfig::default()
        .with_depth(args.depth)
        .with_snapshot_policy(args.policy)
        .with_integrity_mode(if args.strict {
            IntegrityMode::Strict
        } else {
            IntegrityMode::Lenient
        });
    if !args.symbols.is_empty() {
        config = config.with_symbols(args.symbols.iter().cloned());
    }
    if let Some(max) = args.max_records {
        config = config.with_max_records(max);
    }

    let start = Instant::now();
    let driver = ReconstructionDriver::new(config);
    let result = driver.run_reader(loader.open()?)?;
    let elapsed = start.elapsed().as_secs_f64();

    if result.instrument_count() == 0 {
        return Err(LobError::generic("no matching instruments found in feed"));
    }

    let dirs = export::export_all(&args.output, &result, args.depth)?;

    let stats = &result.stats;
    println!("\n{}", "=".repeat(60));
    println!("Reconstruction Complete!");
    println!("  Records read: {}", stats.records_read);
    println!("  Events applied: {}", stats.events_applied);
    println!("  Events skipped: {}", stats.events_skipped);
    println!("  Unknown / undecodable: {} / {}", stats.unknown_messages, stats.decode_failures);
    if let Some(offset) = stats.framing_error_at {
        println!("  Framing error at byte {offset}; output covers the feed up to there");
    }
    println!("  Instruments: {}", dirs.len());
    for history in result.iter() {
        let book = &history.book;
        println!(
            "    {:<8} {:>9} snapshots {:>8} trades  crossed={} locked={}",
            history.label(),
            history.snapshots.len(),
            history.trades.len(),
            book.stats().crossed_books,
            book.stats().locked_books
        );
    }
    println!(
        "  Time: {:.1}s ({:.0} records/s)",
        elapsed,
        stats.records_read as f64 / elapsed.max(1e-9)
    );
    println!("  Output: {}", args.output.display());
    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
