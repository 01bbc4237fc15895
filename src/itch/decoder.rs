//! Length-framed record decoding.
//!
//! A feed is a sequence of `[u16 BE length][u8 tag][payload]` records where
//! `length` counts the tag plus the payload. Dispatch goes through a
//! registration table (tag → [`RecordLayout`]) so unknown tags fall out of the
//! table lookup and are skipped without special-casing.
//!
//! | Failure | Error | Effect |
//! |---------|-------|--------|
//! | length prefix invalid or past end of input | [`LobError::Framing`] | iteration ends |
//! | tag not registered | [`LobError::UnknownMessageType`] | record skipped |
//! | payload does not fit the layout | [`LobError::Decode`] | record dropped |
//!
//! # Example
//!
//! ```
//! use itch_lob_reconstructor::itch::{FeedDecoder, MessageDecoder};
//!
//! let decoder = MessageDecoder::new();
//! let bytes: Vec<u8> = Vec::new();
//! let records: Vec<_> = FeedDecoder::new(&decoder, &bytes).collect();
//! assert!(records.is_empty());
//! ```

use std::fmt;
use std::io::{ErrorKind, Read};

use super::fields::{FieldReader, FieldResult};
use super::messages::{
    AddOrder, AdminMessage, CrossTrade, ItchEvent, NonCrossTrade, OrderCancel, OrderDelete,
    OrderExecuted, OrderReplace, TradeMessage,
};
use crate::error::{LobError, Result};

/// Size of the big-endian length prefix.
pub const LENGTH_PREFIX: usize = 2;

/// Decode function for one tag: receives the tag and a reader over the payload.
pub type DecodeFn = fn(u8, &mut FieldReader<'_>) -> FieldResult<ItchEvent>;

/// Fixed layout registered for one type tag.
#[derive(Clone, Copy)]
pub struct RecordLayout {
    pub tag: u8,
    pub name: &'static str,
    /// Payload length, excluding the tag byte
    pub payload_len: usize,
    pub decode: DecodeFn,
}

impl RecordLayout {
    pub const fn new(tag: u8, name: &'static str, payload_len: usize, decode: DecodeFn) -> Self {
        Self {
            tag,
            name,
            payload_len,
            decode,
        }
    }
}

impl fmt::Debug for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLayout")
            .field("tag", &char::from(self.tag))
            .field("name", &self.name)
            .field("payload_len", &self.payload_len)
            .finish_non_exhaustive()
    }
}

fn admin(tag: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::Administrative(AdminMessage::decode(tag, r)?))
}

fn add_order(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::AddOrder(AddOrder::decode(r, false)?))
}

fn add_order_mpid(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::AddOrder(AddOrder::decode(r, true)?))
}

fn order_executed(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::ExecuteOrder(OrderExecuted::decode(r, false)?))
}

fn order_executed_price(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::ExecuteOrder(OrderExecuted::decode(r, true)?))
}

fn order_cancel(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::CancelOrder(OrderCancel::decode(r)?))
}

fn order_delete(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::DeleteOrder(OrderDelete::decode(r)?))
}

fn order_replace(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::ReplaceOrder(OrderReplace::decode(r)?))
}

fn non_cross_trade(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::Trade(TradeMessage::NonCross(NonCrossTrade::decode(r)?)))
}

fn cross_trade(_: u8, r: &mut FieldReader<'_>) -> FieldResult<ItchEvent> {
    Ok(ItchEvent::Trade(TradeMessage::Cross(CrossTrade::decode(r)?)))
}

/// ITCH 5.0 message set.
pub const ITCH50_LAYOUTS: &[RecordLayout] = &[
    RecordLayout::new(b'S', "system event", 11, admin),
    RecordLayout::new(b'R', "stock directory", 38, admin),
    RecordLayout::new(b'H', "stock trading action", 24, admin),
    RecordLayout::new(b'Y', "reg sho restriction", 19, admin),
    RecordLayout::new(b'L', "market participant position", 25, admin),
    RecordLayout::new(b'V', "mwcb decline level", 34, admin),
    RecordLayout::new(b'W', "mwcb status", 11, admin),
    RecordLayout::new(b'K', "ipo quoting period update", 27, admin),
    RecordLayout::new(b'J', "luld auction collar", 34, admin),
    RecordLayout::new(b'h', "operational halt", 20, admin),
    RecordLayout::new(b'A', "add order", 35, add_order),
    RecordLayout::new(b'F', "add order with mpid", 39, add_order_mpid),
    RecordLayout::new(b'E', "order executed", 30, order_executed),
    RecordLayout::new(b'C', "order executed with price", 35, order_executed_price),
    RecordLayout::new(b'X', "order cancel", 22, order_cancel),
    RecordLayout::new(b'D', "order delete", 18, order_delete),
    RecordLayout::new(b'U', "order replace", 34, order_replace),
    RecordLayout::new(b'P', "trade", 43, non_cross_trade),
    RecordLayout::new(b'Q', "cross trade", 39, cross_trade),
    RecordLayout::new(b'B', "broken trade", 18, admin),
    RecordLayout::new(b'I', "net order imbalance indicator", 49, admin),
    RecordLayout::new(b'N', "retail price improvement indicator", 19, admin),
];

/// Stateless tag → layout dispatcher.
#[derive(Debug, Clone)]
pub struct MessageDecoder {
    table: [Option<RecordLayout>; 256],
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageDecoder {
    /// Decoder for the full ITCH 5.0 message set.
    pub fn new() -> Self {
        let mut decoder = Self::empty();
        for layout in ITCH50_LAYOUTS {
            decoder.register(*layout);
        }
        decoder
    }

    /// Decoder with nothing registered.
    pub fn empty() -> Self {
        Self { table: [None; 256] }
    }

    /// Register (or replace) the layout for a tag. Returns the previous layout.
    pub fn register(&mut self, layout: RecordLayout) -> Option<RecordLayout> {
        self.table[layout.tag as usize].replace(layout)
    }

    /// Layout registered for a tag.
    #[inline]
    pub fn layout(&self, tag: u8) -> Option<&RecordLayout> {
        self.table[tag as usize].as_ref()
    }

    /// Decode one record's payload. `offset` is only used for error reporting.
    pub fn decode_record(&self, tag: u8, payload: &[u8], offset: u64) -> Result<ItchEvent> {
        let layout = self
            .layout(tag)
            .ok_or(LobError::UnknownMessageType { tag, offset })?;

        if payload.len() != layout.payload_len {
            return Err(LobError::Decode {
                tag,
                offset,
                reason: format!(
                    "{} payload is {} bytes, expected {}",
                    layout.name,
                    payload.len(),
                    layout.payload_len
                ),
            });
        }

        let mut reader = FieldReader::new(payload);
        let event = (layout.decode)(tag, &mut reader).map_err(|reason| LobError::Decode {
            tag,
            offset,
            reason,
        })?;

        if reader.remaining() != 0 {
            return Err(LobError::Decode {
                tag,
                offset,
                reason: format!("{} trailing bytes after {}", reader.remaining(), layout.name),
            });
        }

        Ok(event)
    }
}

/// A decoded event and its position in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    /// Zero-based ordinal of the framed record (skipped records included)
    pub index: u64,
    /// Byte offset of the record's length prefix
    pub offset: u64,
    pub event: ItchEvent,
}

/// Iterator over the records of an in-memory feed.
pub struct FeedDecoder<'a> {
    decoder: &'a MessageDecoder,
    buf: &'a [u8],
    pos: usize,
    index: u64,
    finished: bool,
}

impl<'a> FeedDecoder<'a> {
    pub fn new(decoder: &'a MessageDecoder, buf: &'a [u8]) -> Self {
        Self {
            decoder,
            buf,
            pos: 0,
            index: 0,
            finished: false,
        }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Framed records consumed so far.
    #[inline]
    pub fn records_read(&self) -> u64 {
        self.index
    }

    fn framing_error(&mut self, reason: String) -> LobError {
        self.finished = true;
        LobError::Framing {
            offset: self.pos as u64,
            reason,
        }
    }
}

impl Iterator for FeedDecoder<'_> {
    type Item = Result<DecodedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let remaining = self.buf.len() - self.pos;
        if remaining == 0 {
            self.finished = true;
            return None;
        }
        if remaining < LENGTH_PREFIX {
            return Some(Err(
                self.framing_error(format!("truncated length prefix ({remaining} bytes left)"))
            ));
        }

        let len = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]) as usize;
        if len == 0 {
            return Some(Err(self.framing_error("zero-length record".to_string())));
        }
        if LENGTH_PREFIX + len > remaining {
            return Some(Err(self.framing_error(format!(
                "record of {len} bytes overruns input ({} bytes left)",
                remaining - LENGTH_PREFIX
            ))));
        }

        let offset = self.pos as u64;
        let start = self.pos + LENGTH_PREFIX;
        let tag = self.buf[start];
        let payload = &self.buf[start + 1..start + len];

        let index = self.index;
        self.pos = start + len;
        self.index += 1;

        Some(
            self.decoder
                .decode_record(tag, payload, offset)
                .map(|event| DecodedRecord {
                    index,
                    offset,
                    event,
                }),
        )
    }
}

/// Iterator over records pulled from any reader (files, decompressors).
pub struct StreamDecoder<R> {
    decoder: MessageDecoder,
    reader: R,
    scratch: Vec<u8>,
    pos: u64,
    index: u64,
    finished: bool,
}

impl<R: Read> StreamDecoder<R> {
    pub fn new(decoder: MessageDecoder, reader: R) -> Self {
        Self {
            decoder,
            reader,
            scratch: Vec::with_capacity(64),
            pos: 0,
            index: 0,
            finished: false,
        }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    fn stop(&mut self, err: LobError) -> Option<Result<DecodedRecord>> {
        self.finished = true;
        Some(Err(err))
    }

    fn framing(&self, reason: String) -> LobError {
        LobError::Framing {
            offset: self.pos,
            reason,
        }
    }
}

impl<R: Read> Iterator for StreamDecoder<R> {
    type Item = Result<DecodedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut prefix = [0u8; LENGTH_PREFIX];
        let mut filled = 0;
        while filled < LENGTH_PREFIX {
            match self.reader.read(&mut prefix[filled..]) {
                Ok(0) if filled == 0 => {
                    self.finished = true;
                    return None;
                }
                Ok(0) => {
                    let err = self.framing(format!("truncated length prefix ({filled} bytes left)"));
                    return self.stop(err);
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return self.stop(e.into()),
            }
        }

        let len = u16::from_be_bytes(prefix) as usize;
        if len == 0 {
            let err = self.framing("zero-length record".to_string());
            return self.stop(err);
        }

        self.scratch.resize(len, 0);
        if let Err(e) = self.reader.read_exact(&mut self.scratch) {
            let err = if e.kind() == ErrorKind::UnexpectedEof {
                self.framing(format!("record of {len} bytes overruns input"))
            } else {
                e.into()
            };
            return self.stop(err);
        }

        let offset = self.pos;
        let index = self.index;
        self.pos += (LENGTH_PREFIX + len) as u64;
        self.index += 1;

        let tag = self.scratch[0];
        Some(
            self.decoder
                .decode_record(tag, &self.scratch[1..], offset)
                .map(|event| DecodedRecord {
                    index,
                    offset,
                    event,
                }),
        )
    }
}

/// Builds a framed feed from typed events.
#[derive(Debug, Clone, Default)]
pub struct FeedWriter {
    buf: Vec<u8>,
}

impl FeedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one framed record.
    pub fn push(&mut self, event: &ItchEvent) -> &mut Self {
        self.buf.extend_from_slice(&event.encode());
        self
    }

    /// Append raw bytes (e.g. records of tags this crate does not model).
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
