//! Ledger of records the replay skipped or dropped.
//!
//! In lenient mode the driver never stops on a bad record; it logs the problem
//! and files a [`Warning`] here with the record index, byte offset and the
//! instrument/order involved, so every gap in the reconstruction can be traced
//! back to the feed.
//!
//! # Example
//!
//! ```
//! use itch_lob_reconstructor::warnings::{Warning, WarningCategory, WarningTracker};
//!
//! let mut tracker = WarningTracker::new();
//! tracker.record(
//!     Warning::new(WarningCategory::UnknownOrder, "unknown order id: 42")
//!         .with_record(7)
//!         .with_order_id(42),
//! );
//!
//! assert_eq!(tracker.count_by_category(WarningCategory::UnknownOrder), 1);
//! assert_eq!(tracker.summary().total, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ahash::{AHashMap, AHashSet};

use crate::error::{IntegrityError, LobError};
use crate::types::InstrumentId;

/// Category of warning for classification and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningCategory {
    /// Execute/cancel/delete/replace for an order that is not resting
    UnknownOrder,

    /// Add for an order id that is already resting
    DuplicateOrder,

    /// Add or replace onto an id that already left the book
    RetiredOrder,

    /// Execution or cancellation larger than the order
    OverReduction,

    /// Zero-share add, execution, cancellation or replacement
    ZeroQuantity,

    /// Add without a buy/sell side
    MissingSide,

    /// Payload did not match its layout; record dropped
    DecodeFailure,

    /// Unregistered type tag; record skipped
    UnknownMessageType,

    /// Broken length framing; replay stopped early
    Framing,
}

impl WarningCategory {
    /// Get a human-readable name for the category.
    pub fn name(&self) -> &'static str {
        match self {
            WarningCategory::UnknownOrder => "UNKNOWN_ORDER",
            WarningCategory::DuplicateOrder => "DUPLICATE_ORDER",
            WarningCategory::RetiredOrder => "RETIRED_ORDER",
            WarningCategory::OverReduction => "OVER_REDUCTION",
            WarningCategory::ZeroQuantity => "ZERO_QUANTITY",
            WarningCategory::MissingSide => "MISSING_SIDE",
            WarningCategory::DecodeFailure => "DECODE_FAILURE",
            WarningCategory::UnknownMessageType => "UNKNOWN_MESSAGE_TYPE",
            WarningCategory::Framing => "FRAMING",
        }
    }

    /// Get severity level (1=low, 2=medium, 3=high).
    pub fn severity(&self) -> u8 {
        match self {
            WarningCategory::UnknownMessageType => 1,
            WarningCategory::ZeroQuantity => 1,
            WarningCategory::MissingSide => 2,
            WarningCategory::UnknownOrder => 2,
            WarningCategory::OverReduction => 2,
            WarningCategory::DecodeFailure => 2,
            WarningCategory::DuplicateOrder => 3,
            WarningCategory::RetiredOrder => 3,
            WarningCategory::Framing => 3,
        }
    }

    pub fn from_integrity(err: &IntegrityError) -> Self {
        match err {
            IntegrityError::DuplicateOrderId(_) => WarningCategory::DuplicateOrder,
            IntegrityError::RetiredOrderId(_) => WarningCategory::RetiredOrder,
            IntegrityError::UnknownOrderId(_) => WarningCategory::UnknownOrder,
            IntegrityError::OverReduction { .. } => WarningCategory::OverReduction,
            IntegrityError::ZeroQuantity(_) => WarningCategory::ZeroQuantity,
            IntegrityError::MissingSide(_) => WarningCategory::MissingSide,
        }
    }

    /// Category for a decoder error; `None` for errors the decoder never yields.
    pub fn from_decode_error(err: &LobError) -> Option<Self> {
        match err {
            LobError::Framing { .. } => Some(WarningCategory::Framing),
            LobError::UnknownMessageType { .. } => Some(WarningCategory::UnknownMessageType),
            LobError::Decode { .. } => Some(WarningCategory::DecodeFailure),
            LobError::DataIntegrity(e) | LobError::Halted { source: e, .. } => {
                Some(Self::from_integrity(e))
            }
            LobError::Generic(_) => None,
        }
    }
}

fn integrity_order_id(err: &IntegrityError) -> u64 {
    match err {
        IntegrityError::DuplicateOrderId(id)
        | IntegrityError::RetiredOrderId(id)
        | IntegrityError::UnknownOrderId(id)
        | IntegrityError::ZeroQuantity(id)
        | IntegrityError::MissingSide(id) => *id,
        IntegrityError::OverReduction { order_id, .. } => *order_id,
    }
}

/// A single warning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Sequential id, assigned by the tracker
    pub id: u64,

    pub category: WarningCategory,

    /// Human-readable message
    pub message: String,

    /// Ordinal of the framed record in the feed
    pub record: Option<u64>,

    /// Byte offset of the record in the feed
    pub offset: Option<u64>,

    /// Feed timestamp (nanoseconds since midnight)
    pub timestamp: Option<u64>,

    pub instrument: Option<InstrumentId>,

    pub order_id: Option<u64>,

    /// Message type tag, when known
    pub tag: Option<char>,
}

impl Warning {
    pub fn new(category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            category,
            message: message.into(),
            record: None,
            offset: None,
            timestamp: None,
            instrument: None,
            order_id: None,
            tag: None,
        }
    }

    pub fn with_record(mut self, record: u64) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_instrument(mut self, instrument: InstrumentId) -> Self {
        self.instrument = Some(instrument);
        self
    }

    pub fn with_order_id(mut self, order_id: u64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_tag(mut self, tag: u8) -> Self {
        self.tag = Some(char::from(tag));
        self
    }

    /// Warning for an event the book refused.
    pub fn from_integrity(err: &IntegrityError) -> Self {
        Self::new(WarningCategory::from_integrity(err), err.to_string())
            .with_order_id(integrity_order_id(err))
    }

    /// Warning for a record the decoder could not turn into an event.
    pub fn from_decode_error(err: &LobError) -> Option<Self> {
        let category = WarningCategory::from_decode_error(err)?;
        let mut warning = Self::new(category, err.to_string());
        if let Some(offset) = err.offset() {
            warning = warning.with_offset(offset);
        }
        if let LobError::UnknownMessageType { tag, .. } | LobError::Decode { tag, .. } = err {
            warning = warning.with_tag(*tag);
        }
        Some(warning)
    }
}

/// Summary statistics for warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningSummary {
    /// Total number of warnings, including those past the storage cap
    pub total: u64,

    /// Count by category name
    pub by_category: BTreeMap<String, u64>,

    /// Count by severity
    pub by_severity: BTreeMap<u8, u64>,

    /// Number of distinct instruments involved
    pub unique_instruments: u64,

    /// Number of distinct order ids involved
    pub unique_orders: u64,
}

/// Configuration for warning tracker.
#[derive(Debug, Clone)]
pub struct WarningTrackerConfig {
    /// Maximum number of warnings kept in memory; counts continue past it
    pub max_warnings: usize,

    /// Whether to emit each warning through `log`
    pub log_warnings: bool,

    /// Minimum severity logged at `warn` level; lower ones go to `debug`
    pub min_log_severity: u8,
}

impl Default for WarningTrackerConfig {
    fn default() -> Self {
        Self {
            max_warnings: 100_000,
            log_warnings: true,
            min_log_severity: 2,
        }
    }
}

impl WarningTrackerConfig {
    pub fn with_max_warnings(mut self, max: usize) -> Self {
        self.max_warnings = max;
        self
    }

    pub fn with_logging(mut self, log: bool) -> Self {
        self.log_warnings = log;
        self
    }
}

#[derive(Serialize)]
struct WarningExport<'a> {
    summary: WarningSummary,
    warnings: &'a [Warning],
}

/// Categorized, capped warning ledger.
#[derive(Debug, Clone)]
pub struct WarningTracker {
    config: WarningTrackerConfig,
    warnings: Vec<Warning>,
    next_id: u64,
    category_counts: AHashMap<WarningCategory, u64>,
    instruments: AHashSet<InstrumentId>,
    orders: AHashSet<u64>,
}

impl WarningTracker {
    pub fn new() -> Self {
        Self::with_config(WarningTrackerConfig::default())
    }

    pub fn with_config(config: WarningTrackerConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
            next_id: 1,
            category_counts: AHashMap::new(),
            instruments: AHashSet::new(),
            orders: AHashSet::new(),
        }
    }

    /// Record a warning. Returns the id assigned to it.
    pub fn record(&mut self, mut warning: Warning) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        warning.id = id;

        if self.config.log_warnings {
            if warning.category.severity() >= self.config.min_log_severity {
                log::warn!("[{}] {}", warning.category.name(), describe(&warning));
            } else {
                log::debug!("[{}] {}", warning.category.name(), describe(&warning));
            }
        }

        if let Some(instrument) = warning.instrument {
            self.instruments.insert(instrument);
        }
        if let Some(order_id) = warning.order_id {
            self.orders.insert(order_id);
        }
        *self.category_counts.entry(warning.category).or_insert(0) += 1;

        if self.warnings.len() < self.config.max_warnings {
            self.warnings.push(warning);
        }
        id
    }

    /// Record a warning with just category and message.
    pub fn record_simple(&mut self, category: WarningCategory, message: impl Into<String>) -> u64 {
        self.record(Warning::new(category, message))
    }

    /// Number of stored warnings (capped).
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Total count, including warnings past the storage cap.
    pub fn total_count(&self) -> u64 {
        self.category_counts.values().sum()
    }

    pub fn count_by_category(&self, category: WarningCategory) -> u64 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn warnings_by_category(&self, category: WarningCategory) -> Vec<&Warning> {
        self.warnings
            .iter()
            .filter(|w| w.category == category)
            .collect()
    }

    pub fn summary(&self) -> WarningSummary {
        let mut by_category = BTreeMap::new();
        let mut by_severity = BTreeMap::new();

        for (cat, count) in &self.category_counts {
            by_category.insert(cat.name().to_string(), *count);
            *by_severity.entry(cat.severity()).or_insert(0) += *count;
        }

        WarningSummary {
            total: self.total_count(),
            by_category,
            by_severity,
            unique_instruments: self.instruments.len() as u64,
            unique_orders: self.orders.len() as u64,
        }
    }

    /// Export summary and stored warnings as pretty-printed JSON.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let export = WarningExport {
            summary: self.summary(),
            warnings: &self.warnings,
        };
        serde_json::to_writer_pretty(&mut writer, &export)?;
        writeln!(writer)?;
        writer.flush()
    }

    /// Export stored warnings as CSV.
    pub fn export_to_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "id,category,severity,message,record,offset,timestamp,instrument,order_id,tag"
        )?;

        for w in &self.warnings {
            writeln!(
                writer,
                "{},{},{},{:?},{},{},{},{},{},{}",
                w.id,
                w.category.name(),
                w.category.severity(),
                w.message,
                opt(w.record),
                opt(w.offset),
                opt(w.timestamp),
                opt(w.instrument),
                opt(w.order_id),
                opt(w.tag),
            )?;
        }

        writer.flush()
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
        self.category_counts.clear();
        self.instruments.clear();
        self.orders.clear();
    }
}

impl Default for WarningTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn describe(w: &Warning) -> String {
    let mut text = w.message.clone();
    if let Some(record) = w.record {
        text.push_str(&format!(" (record {record}"));
        if let Some(offset) = w.offset {
            text.push_str(&format!(", byte {offset}"));
        }
        text.push(')');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> WarningTracker {
        WarningTracker::with_config(WarningTrackerConfig::default().with_logging(false))
    }

    #[test]
    fn test_category_names_and_severity() {
        assert_eq!(WarningCategory::UnknownOrder.name(), "UNKNOWN_ORDER");
        assert_eq!(WarningCategory::Framing.severity(), 3);
        assert_eq!(WarningCategory::UnknownMessageType.severity(), 1);
    }

    #[test]
    fn test_from_integrity_error() {
        let err = IntegrityError::OverReduction {
            order_id: 9,
            requested: 20,
            remaining: 10,
        };
        let warning = Warning::from_integrity(&err);
        assert_eq!(warning.category, WarningCategory::OverReduction);
        assert_eq!(warning.order_id, Some(9));
        assert!(warning.message.contains("only 10 remaining"));
    }

    #[test]
    fn test_from_decode_error() {
        let err = LobError::UnknownMessageType {
            tag: b'Z',
            offset: 128,
        };
        let warning = Warning::from_decode_error(&err).unwrap();
        assert_eq!(warning.category, WarningCategory::UnknownMessageType);
        assert_eq!(warning.offset, Some(128));
        assert_eq!(warning.tag, Some('Z'));
        assert!(Warning::from_decode_error(&LobError::generic("io")).is_none());
    }

    #[test]
    fn test_tracker_counts_and_ids() {
        let mut tracker = quiet();
        let a = tracker.record(
            Warning::new(WarningCategory::UnknownOrder, "a")
                .with_instrument(1)
                .with_order_id(5),
        );
        let b = tracker.record(
            Warning::new(WarningCategory::UnknownOrder, "b")
                .with_instrument(2)
                .with_order_id(5),
        );
        tracker.record_simple(WarningCategory::DecodeFailure, "c");
        assert_eq!((a, b), (1, 2));
        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.count_by_category(WarningCategory::UnknownOrder), 2);

        let summary = tracker.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.unique_instruments, 2);
        assert_eq!(summary.unique_orders, 1);
        assert_eq!(summary.by_category.get("UNKNOWN_ORDER"), Some(&2));
        assert_eq!(summary.by_severity.get(&2), Some(&3));
    }

    #[test]
    fn test_cap_keeps_counting() {
        let mut tracker =
            WarningTracker::with_config(WarningTrackerConfig::default().with_max_warnings(2).with_logging(false));
        for i in 0..5 {
            tracker.record_simple(WarningCategory::ZeroQuantity, format!("w{i}"));
        }
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.total_count(), 5);
    }

    #[test]
    fn test_export_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = quiet();
        tracker.record(
            Warning::new(WarningCategory::UnknownOrder, "unknown order id: 3")
                .with_record(4)
                .with_offset(100)
                .with_order_id(3),
        );

        let json_path = dir.path().join("warnings.json");
        tracker.export_to_file(&json_path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["warnings"][0]["order_id"], 3);
        assert_eq!(value["warnings"][0]["category"], "UnknownOrder");

        let csv_path = dir.path().join("warnings.csv");
        tracker.export_to_csv(&csv_path).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("1,UNKNOWN_ORDER,2,"));
        assert!(lines[1].ends_with(",4,100,,,3,"));
    }
}
