//! CSV export of replay results.
//!
//! Three per-instrument files under `<out>/<SYMBOL>/`:
//!
//! | File | Columns |
//! |------|---------|
//! | `<SYMBOL>_events.csv` | `timestamp,instrument,side,price,size,event_type` (one row per snapshot or trade) |
//! | `<SYMBOL>_order_book_history.csv` | `timestamp,buy_price_1,buy_shares_1,sell_price_1,sell_shares_1,...` |
//! | `<SYMBOL>_trades.csv` | `timestamp,shares,price` (printable trades only) |
//!
//! plus `warnings.json` at the top level. Prices are written in dollars with
//! four decimals, straight from the fixed-point value.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::driver::{InstrumentHistory, Reconstruction};
use crate::error::{LobError, Result};
use crate::types::{Price, Side, PRICE_SCALE};

/// Header of the tabular event export.
pub const TABULAR_HEADER: &str = "timestamp,instrument,side,price,size,event_type";

/// One row of the tabular export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub timestamp: u64,
    pub instrument: String,
    pub side: Side,
    /// Empty when the snapshot's side has no levels left
    pub price: Option<Price>,
    pub size: Option<u64>,
    pub event_type: &'static str,
}

/// Format a fixed-point price as dollars with four decimals.
pub fn format_price(price: Price) -> String {
    format!("{}.{:04}", price / PRICE_SCALE, price % PRICE_SCALE)
}

/// Snapshot and trade rows of one instrument, merged in feed order.
///
/// A snapshot row reports the best level on the side its event touched; a
/// trade row reports the trade itself. Rows are keyed by the book's event
/// ordinal, so a trade directly follows the snapshot of the event that
/// produced it even when many events share a timestamp.
pub fn tabular_rows(history: &InstrumentHistory) -> Vec<ExportRow> {
    let label = history.label();

    let snapshots = history.snapshots.iter().map(|snap| {
        let level = snap.best(snap.trigger_side);
        let row = ExportRow {
            timestamp: snap.timestamp,
            instrument: label.clone(),
            side: snap.trigger_side,
            price: level.map(|l| l.price),
            size: level.map(|l| l.size),
            event_type: snap.trigger.as_str(),
        };
        ((snap.sequence, 0u8), row)
    });
    let trades = history.trades.iter().map(|trade| {
        let row = ExportRow {
            timestamp: trade.timestamp,
            instrument: label.clone(),
            side: trade.passive_side,
            price: Some(trade.price),
            size: Some(trade.size),
            event_type: "trade",
        };
        ((trade.event_sequence, 1u8), row)
    });

    let mut rows: Vec<((u64, u8), ExportRow)> = snapshots.chain(trades).collect();
    // snapshot before trade within one event
    rows.sort_by_key(|(key, _)| *key);
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Write tabular rows with header.
pub fn write_rows<W: Write>(writer: &mut W, rows: &[ExportRow]) -> std::io::Result<()> {
    writeln!(writer, "{TABULAR_HEADER}")?;
    for row in rows {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            row.timestamp,
            row.instrument,
            row.side.as_str(),
            row.price.map(format_price).unwrap_or_default(),
            row.size.map(|s| s.to_string()).unwrap_or_default(),
            row.event_type
        )?;
    }
    Ok(())
}

/// Write the depth history: one row per snapshot, `depth` levels per side.
pub fn write_depth_history<W: Write>(
    writer: &mut W,
    history: &InstrumentHistory,
    depth: usize,
) -> std::io::Result<()> {
    let mut header = String::from("timestamp");
    for i in 1..=depth {
        header.push_str(&format!(
            ",buy_price_{i},buy_shares_{i},sell_price_{i},sell_shares_{i}"
        ));
    }
    writeln!(writer, "{header}")?;

    for snap in &history.snapshots {
        write!(writer, "{}", snap.timestamp)?;
        for i in 0..depth {
            for level in [snap.bids.get(i), snap.asks.get(i)] {
                match level {
                    Some(l) => write!(writer, ",{},{}", format_price(l.price), l.size)?,
                    None => write!(writer, ",,")?,
                }
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write printable trades.
pub fn write_trades<W: Write>(writer: &mut W, history: &InstrumentHistory) -> std::io::Result<()> {
    writeln!(writer, "timestamp,shares,price")?;
    for trade in history.trades.iter().filter(|t| t.printable) {
        writeln!(
            writer,
            "{},{},{}",
            trade.timestamp,
            trade.size,
            format_price(trade.price)
        )?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .map_err(|e| LobError::generic(format!("Failed to create {}: {e}", path.display())))?;
    Ok(BufWriter::new(file))
}

/// Write the three CSV files of one instrument into `<dir>/<label>/`.
pub fn export_instrument(dir: &Path, history: &InstrumentHistory, depth: usize) -> Result<PathBuf> {
    let label = history.label();
    let out = dir.join(&label);
    fs::create_dir_all(&out)?;

    let mut w = create(&out.join(format!("{label}_events.csv")))?;
    write_rows(&mut w, &tabular_rows(history))?;
    w.flush()?;

    let mut w = create(&out.join(format!("{label}_order_book_history.csv")))?;
    write_depth_history(&mut w, history, depth)?;
    w.flush()?;

    let mut w = create(&out.join(format!("{label}_trades.csv")))?;
    write_trades(&mut w, history)?;
    w.flush()?;

    log::debug!(
        "exported {label}: {} snapshots, {} trades",
        history.snapshots.len(),
        history.trades.len()
    );
    Ok(out)
}

/// Export every instrument plus `warnings.json`. Returns the instrument directories.
pub fn export_all(dir: &Path, result: &Reconstruction, depth: usize) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let dirs = result
        .iter()
        .map(|history| export_instrument(dir, history, depth))
        .collect::<Result<Vec<_>>>()?;
    result.warnings.export_to_file(dir.join("warnings.json"))?;
    log::info!("exported {} instruments to {}", dirs.len(), dir.display());
    Ok(dirs)
}
