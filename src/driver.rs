//! Feed replay: decoded records in, per-instrument histories out.
//!
//! Records are applied strictly in feed order. Each instrument (stock locate)
//! gets its own [`OrderBookEngine`] on first reference; snapshots and trades
//! are appended to that instrument's [`InstrumentHistory`] as events apply.
//!
//! Failure handling:
//!
//! | Error | Strict | Lenient (default) |
//! |-------|--------|-------------------|
//! | framing | replay ends, result kept | replay ends, result kept |
//! | unknown tag / decode | record skipped | record skipped |
//! | integrity | [`LobError::Halted`] | event skipped and logged |
//!
//! Every skipped or dropped record is filed in the result's [`WarningTracker`].

use std::collections::BTreeMap;
use std::io::Read;

use ahash::{AHashMap, AHashSet};

use crate::error::{IntegrityError, LobError, Result};
use crate::itch::{DecodedRecord, FeedDecoder, ItchEvent, MessageDecoder, StreamDecoder};
use crate::lob::{Applied, OrderBookEngine};
use crate::types::{InstrumentId, Snapshot, Trade};
use crate::warnings::{Warning, WarningTracker, WarningTrackerConfig};

/// Default number of levels captured per side.
pub const DEFAULT_DEPTH: usize = 3;

/// When to capture a snapshot after an applied event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotPolicy {
    /// After every applied book event
    #[default]
    EveryEvent,

    /// After every Nth applied event of an instrument
    EveryNth(u64),

    /// Only after events that produced a trade
    OnTrade,

    /// Never; only trades are recorded
    Never,
}

impl SnapshotPolicy {
    #[inline]
    fn wants(&self, events_applied: u64, applied: &Applied) -> bool {
        match *self {
            SnapshotPolicy::EveryEvent => true,
            SnapshotPolicy::EveryNth(n) => n > 0 && events_applied % n == 0,
            SnapshotPolicy::OnTrade => applied.trade.is_some(),
            SnapshotPolicy::Never => false,
        }
    }
}

/// What to do with an event the book refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityMode {
    /// Stop the replay and report the offending record
    Strict,

    /// Log, record a warning and continue with the next record
    #[default]
    Lenient,
}

/// Configuration for a replay.
#[derive(Debug, Clone)]
pub struct ReconstructionConfig {
    /// Levels per side in each snapshot
    pub depth: usize,

    pub snapshot_policy: SnapshotPolicy,

    pub integrity_mode: IntegrityMode,

    /// Restrict the replay to these symbols; `None` reconstructs everything
    pub symbols: Option<AHashSet<String>>,

    /// Stop after this many framed records
    pub max_records: Option<u64>,

    pub warnings: WarningTrackerConfig,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            snapshot_policy: SnapshotPolicy::default(),
            integrity_mode: IntegrityMode::default(),
            symbols: None,
            max_records: None,
            warnings: WarningTrackerConfig::default(),
        }
    }
}

impl ReconstructionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_snapshot_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.snapshot_policy = policy;
        self
    }

    pub fn with_integrity_mode(mut self, mode: IntegrityMode) -> Self {
        self.integrity_mode = mode;
        self
    }

    /// Shorthand for `with_integrity_mode(IntegrityMode::Strict)`.
    pub fn strict(self) -> Self {
        self.with_integrity_mode(IntegrityMode::Strict)
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_records(mut self, max: u64) -> Self {
        self.max_records = Some(max);
        self
    }

    pub fn with_warning_config(mut self, config: WarningTrackerConfig) -> Self {
        self.warnings = config;
        self
    }
}

/// Everything recorded for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentHistory {
    pub instrument: InstrumentId,
    pub symbol: Option<String>,
    /// Book state at the end of the replay
    pub book: OrderBookEngine,
    pub snapshots: Vec<Snapshot>,
    pub trades: Vec<Trade>,
}

impl InstrumentHistory {
    fn new(instrument: InstrumentId, symbol: Option<String>) -> Self {
        let mut book = OrderBookEngine::new(instrument);
        if let Some(symbol) = &symbol {
            book.set_symbol(symbol.clone());
        }
        Self {
            instrument,
            symbol,
            book,
            snapshots: Vec::new(),
            trades: Vec::new(),
        }
    }

    /// Symbol, or the locate code when no symbol was ever seen.
    pub fn label(&self) -> String {
        self.symbol
            .clone()
            .unwrap_or_else(|| format!("locate-{}", self.instrument))
    }

    /// Printable shares traded (all trade kinds).
    pub fn traded_volume(&self) -> u64 {
        self.trades
            .iter()
            .filter(|t| t.printable)
            .map(|t| t.size)
            .sum()
    }
}

/// Counters for one replay.
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    /// Framed records consumed (including skipped ones)
    pub records_read: u64,

    /// Book events applied successfully
    pub events_applied: u64,

    /// Book events refused in lenient mode
    pub events_skipped: u64,

    /// Events for instruments outside the symbol selection
    pub events_filtered: u64,

    pub administrative: u64,

    pub unknown_messages: u64,

    pub decode_failures: u64,

    /// Byte offset where framing broke, if it did
    pub framing_error_at: Option<u64>,

    /// Replay stopped at `max_records`
    pub truncated: bool,

    pub snapshots: u64,

    pub trades: u64,
}

/// Result of a replay, owned by the caller.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub instruments: BTreeMap<InstrumentId, InstrumentHistory>,
    pub warnings: WarningTracker,
    pub stats: ReplayStats,
}

impl Reconstruction {
    pub fn get(&self, instrument: InstrumentId) -> Option<&InstrumentHistory> {
        self.instruments.get(&instrument)
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&InstrumentHistory> {
        self.instruments
            .values()
            .find(|h| h.symbol.as_deref() == Some(symbol))
    }

    /// Histories in locate order.
    pub fn iter(&self) -> impl Iterator<Item = &InstrumentHistory> {
        self.instruments.values()
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }
}

/// Mutable state of one replay.
struct Replay<'c> {
    config: &'c ReconstructionConfig,
    directory: AHashMap<InstrumentId, String>,
    instruments: BTreeMap<InstrumentId, InstrumentHistory>,
    warnings: WarningTracker,
    stats: ReplayStats,
}

impl<'c> Replay<'c> {
    fn new(config: &'c ReconstructionConfig) -> Self {
        Self {
            config,
            directory: AHashMap::new(),
            instruments: BTreeMap::new(),
            warnings: WarningTracker::with_config(config.warnings.clone()),
            stats: ReplayStats::default(),
        }
    }

    fn bind_symbol(&mut self, instrument: InstrumentId, symbol: &str) {
        if symbol.is_empty() || self.directory.get(&instrument).is_some_and(|s| s == symbol) {
            return;
        }
        self.directory.insert(instrument, symbol.to_string());
        if let Some(history) = self.instruments.get_mut(&instrument) {
            history.symbol = Some(symbol.to_string());
            history.book.set_symbol(symbol);
        }
    }

    fn is_selected(&self, instrument: InstrumentId) -> bool {
        match &self.config.symbols {
            None => true,
            Some(selected) => self
                .directory
                .get(&instrument)
                .is_some_and(|symbol| selected.contains(symbol)),
        }
    }

    fn on_decode_error(&mut self, err: LobError) -> Result<()> {
        match &err {
            LobError::Framing { offset, .. } => {
                log::warn!("{err}; replay stops here");
                self.stats.framing_error_at = Some(*offset);
            }
            LobError::UnknownMessageType { .. } => {
                self.stats.unknown_messages += 1;
            }
            LobError::Decode { .. } => {
                self.stats.decode_failures += 1;
            }
            _ => return Err(err),
        }
        if let Some(warning) = Warning::from_decode_error(&err) {
            self.warnings.record(warning);
        }
        Ok(())
    }

    fn on_record(&mut self, record: DecodedRecord) -> Result<()> {
        let event = &record.event;
        let instrument = event.instrument();

        if let Some(symbol) = event.symbol() {
            self.bind_symbol(instrument, symbol);
        }

        if let ItchEvent::Administrative(_) = event {
            self.stats.administrative += 1;
            return Ok(());
        }

        if !self.is_selected(instrument) {
            self.stats.events_filtered += 1;
            return Ok(());
        }

        // A history exists only once its instrument has an accepted event
        let outcome = match self.instruments.get_mut(&instrument) {
            Some(history) => history.book.apply(event),
            None => {
                let symbol = self.directory.get(&instrument).cloned();
                let mut history = InstrumentHistory::new(instrument, symbol);
                let outcome = history.book.apply(event);
                if outcome.is_ok() {
                    self.instruments.insert(instrument, history);
                }
                outcome
            }
        };

        match outcome {
            Ok(applied) => {
                let Some(history) = self.instruments.get_mut(&instrument) else {
                    return Ok(());
                };
                self.stats.events_applied += 1;
                let applied_count = history.book.stats().events_applied;
                if self.config.snapshot_policy.wants(applied_count, &applied) {
                    history.snapshots.push(history.book.snapshot(
                        self.config.depth,
                        applied.kind,
                        applied.side,
                    ));
                    self.stats.snapshots += 1;
                }
                if let Some(trade) = applied.trade {
                    history.trades.push(trade);
                    self.stats.trades += 1;
                }
                Ok(())
            }
            Err(err) => self.on_integrity_error(&record, err),
        }
    }

    fn on_integrity_error(&mut self, record: &DecodedRecord, err: IntegrityError) -> Result<()> {
        match self.config.integrity_mode {
            IntegrityMode::Strict => {
                log::error!(
                    "record {} (byte {}): {err}; halting",
                    record.index,
                    record.offset
                );
                Err(LobError::Halted {
                    record: record.index,
                    offset: record.offset,
                    source: err,
                })
            }
            IntegrityMode::Lenient => {
                self.stats.events_skipped += 1;
                self.warnings.record(
                    Warning::from_integrity(&err)
                        .with_record(record.index)
                        .with_offset(record.offset)
                        .with_timestamp(record.event.timestamp())
                        .with_instrument(record.event.instrument())
                        .with_tag(record.event.tag()),
                );
                Ok(())
            }
        }
    }

    fn finish(self) -> Reconstruction {
        log::info!(
            "replayed {} records: {} instruments, {} events applied, {} skipped, {} trades, {} snapshots",
            self.stats.records_read,
            self.instruments.len(),
            self.stats.events_applied,
            self.stats.events_skipped,
            self.stats.trades,
            self.stats.snapshots
        );
        Reconstruction {
            instruments: self.instruments,
            warnings: self.warnings,
            stats: self.stats,
        }
    }
}

/// Replays a feed into per-instrument books.
///
/// # Example
///
/// ```
/// use itch_lob_reconstructor::driver::{ReconstructionConfig, ReconstructionDriver};
///
/// let driver = ReconstructionDriver::new(ReconstructionConfig::default().with_depth(5));
/// let result = driver.run(&[]).unwrap();
/// assert_eq!(result.instrument_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReconstructionDriver {
    config: ReconstructionConfig,
    decoder: MessageDecoder,
}

impl ReconstructionDriver {
    pub fn new(config: ReconstructionConfig) -> Self {
        Self::with_decoder(config, MessageDecoder::new())
    }

    /// Use a decoder with extra registered layouts.
    pub fn with_decoder(config: ReconstructionConfig, decoder: MessageDecoder) -> Self {
        Self { config, decoder }
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Replay an in-memory feed.
    pub fn run(&self, bytes: &[u8]) -> Result<Reconstruction> {
        self.run_records(FeedDecoder::new(&self.decoder, bytes))
    }

    /// Replay a feed pulled from a reader.
    pub fn run_reader<R: Read>(&self, reader: R) -> Result<Reconstruction> {
        self.run_records(StreamDecoder::new(self.decoder.clone(), reader))
    }

    /// Replay an already-decoded record sequence.
    pub fn run_records<I>(&self, records: I) -> Result<Reconstruction>
    where
        I: IntoIterator<Item = Result<DecodedRecord>>,
    {
        let mut replay = Replay::new(&self.config);

        for item in records {
            if let Some(max) = self.config.max_records {
                if replay.stats.records_read >= max {
                    replay.stats.truncated = true;
                    log::info!("stopping after {max} records");
                    break;
                }
            }
            replay.stats.records_read += 1;

            match item {
                Ok(record) => replay.on_record(record)?,
                Err(err) => replay.on_decode_error(err)?,
            }
        }

        Ok(replay.finish())
    }
}
