//! Typed ITCH 5.0 messages and the closed event set handed to the book.
//!
//! Every struct keeps all wire fields (including the ones the book ignores,
//! like tracking numbers and MPID attribution) so that re-encoding reproduces
//! the original bytes exactly.

use super::fields::{alpha_str, FieldReader, FieldResult, FieldWriter};
use crate::types::{EventKind, InstrumentId, Price, Side};

/// Length of the header shared by every message (locate, tracking, timestamp).
pub const HEADER_LEN: usize = 10;

/// Header shared by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    /// Instrument locate code
    pub stock_locate: u16,
    /// Exchange-internal tracking number
    pub tracking_number: u16,
    /// Nanoseconds since midnight
    pub timestamp: u64,
}

impl MessageHeader {
    pub fn new(stock_locate: u16, tracking_number: u16, timestamp: u64) -> Self {
        Self {
            stock_locate,
            tracking_number,
            timestamp,
        }
    }

    pub(crate) fn decode(r: &mut FieldReader<'_>) -> FieldResult<Self> {
        Ok(Self {
            stock_locate: r.u16()?,
            tracking_number: r.u16()?,
            timestamp: r.timestamp()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut FieldWriter<'_>) {
        w.u16(self.stock_locate)
            .u16(self.tracking_number)
            .timestamp(self.timestamp);
    }
}

fn decode_side(r: &mut FieldReader<'_>) -> FieldResult<Side> {
    let byte = r.one_of(b"BS", "buy/sell indicator")?;
    Side::from_byte(byte).ok_or_else(|| format!("invalid buy/sell indicator {byte}"))
}

/// Add Order (`A`) and Add Order with MPID attribution (`F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOrder {
    pub header: MessageHeader,
    pub order_ref: u64,
    pub side: Side,
    pub shares: u32,
    pub stock: [u8; 8],
    pub price: Price,
    /// Market participant id; present only on `F` messages
    pub attribution: Option<[u8; 4]>,
}

impl AddOrder {
    pub(crate) fn decode(r: &mut FieldReader<'_>, with_mpid: bool) -> FieldResult<Self> {
        let header = MessageHeader::decode(r)?;
        let order_ref = r.u64()?;
        let side = decode_side(r)?;
        let shares = r.u32()?;
        let stock = r.alpha::<8>()?;
        let price = r.u32()?;
        let attribution = if with_mpid { Some(r.alpha::<4>()?) } else { None };
        Ok(Self {
            header,
            order_ref,
            side,
            shares,
            stock,
            price,
            attribution,
        })
    }

    fn encode(&self, w: &mut FieldWriter<'_>) {
        self.header.encode(w);
        w.u64(self.order_ref)
            .u8(self.side.to_byte())
            .u32(self.shares)
            .bytes(&self.stock)
            .u32(self.price);
        if let Some(mpid) = &self.attribution {
            w.bytes(mpid);
        }
    }

    /// Symbol with padding removed.
    pub fn symbol(&self) -> &str {
        alpha_str(&self.stock)
    }
}

/// Price carried by an Order Executed with Price (`C`) message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPrice {
    /// `Y` in the feed; non-printable executions are excluded from volume
    pub printable: bool,
    pub price: Price,
}

/// Order Executed (`E`) and Order Executed with Price (`C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderExecuted {
    pub header: MessageHeader,
    pub order_ref: u64,
    pub executed_shares: u32,
    pub match_number: u64,
    /// Present only on `C` messages
    pub with_price: Option<ExecutionPrice>,
}

impl OrderExecuted {
    pub(crate) fn decode(r: &mut FieldReader<'_>, with_price: bool) -> FieldResult<Self> {
        let header = MessageHeader::decode(r)?;
        let order_ref = r.u64()?;
        let executed_shares = r.u32()?;
        let match_number = r.u64()?;
        let with_price = if with_price {
            let printable = r.one_of(b"YN", "printable flag")? == b'Y';
            Some(ExecutionPrice {
                printable,
                price: r.u32()?,
            })
        } else {
            None
        };
        Ok(Self {
            header,
            order_ref,
            executed_shares,
            match_number,
            with_price,
        })
    }

    fn encode(&self, w: &mut FieldWriter<'_>) {
        self.header.encode(w);
        w.u64(self.order_ref)
            .u32(self.executed_shares)
            .u64(self.match_number);
        if let Some(p) = &self.with_price {
            w.u8(if p.printable { b'Y' } else { b'N' }).u32(p.price);
        }
    }
}

/// Order Cancel (`X`): partial cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCancel {
    pub header: MessageHeader,
    pub order_ref: u64,
    pub cancelled_shares: u32,
}

impl OrderCancel {
    pub(crate) fn decode(r: &mut FieldReader<'_>) -> FieldResult<Self> {
        Ok(Self {
            header: MessageHeader::decode(r)?,
            order_ref: r.u64()?,
            cancelled_shares: r.u32()?,
        })
    }

    fn encode(&self, w: &mut FieldWriter<'_>) {
        self.header.encode(w);
        w.u64(self.order_ref).u32(self.cancelled_shares);
    }
}

/// Order Delete (`D`): full removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderDelete {
    pub header: MessageHeader,
    pub order_ref: u64,
}

impl OrderDelete {
    pub(crate) fn decode(r: &mut FieldReader<'_>) -> FieldResult<Self> {
        Ok(Self {
            header: MessageHeader::decode(r)?,
            order_ref: r.u64()?,
        })
    }

    fn encode(&self, w: &mut FieldWriter<'_>) {
        self.header.encode(w);
        w.u64(self.order_ref);
    }
}

/// Order Replace (`U`): cancel-replace onto a new reference number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderReplace {
    pub header: MessageHeader,
    pub original_order_ref: u64,
    pub new_order_ref: u64,
    pub shares: u32,
    pub price: Price,
}

impl OrderReplace {
    pub(crate) fn decode(r: &mut FieldReader<'_>) -> FieldResult<Self> {
        Ok(Self {
            header: MessageHeader::decode(r)?,
            original_order_ref: r.u64()?,
            new_order_ref: r.u64()?,
            shares: r.u32()?,
            price: r.u32()?,
        })
    }

    fn encode(&self, w: &mut FieldWriter<'_>) {
        self.header.encode(w);
        w.u64(self.original_order_ref)
            .u64(self.new_order_ref)
            .u32(self.shares)
            .u32(self.price);
    }
}

/// Trade (`P`): execution against a non-displayed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonCrossTrade {
    pub header: MessageHeader,
    pub order_ref: u64,
    pub side: Side,
    pub shares: u32,
    pub stock: [u8; 8],
    pub price: Price,
    pub match_number: u64,
}

impl NonCrossTrade {
    pub(crate) fn decode(r: &mut FieldReader<'_>) -> FieldResult<Self> {
        Ok(Self {
            header: MessageHeader::decode(r)?,
            order_ref: r.u64()?,
            side: decode_side(r)?,
            shares: r.u32()?,
            stock: r.alpha::<8>()?,
            price: r.u32()?,
            match_number: r.u64()?,
        })
    }

    fn encode(&self, w: &mut FieldWriter<'_>) {
        self.header.encode(w);
        w.u64(self.order_ref)
            .u8(self.side.to_byte())
            .u32(self.shares)
            .bytes(&self.stock)
            .u32(self.price)
            .u64(self.match_number);
    }
}

/// Cross Trade (`Q`): opening, closing, halt or intraday cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossTrade {
    pub header: MessageHeader,
    pub shares: u64,
    pub stock: [u8; 8],
    pub cross_price: Price,
    pub match_number: u64,
    pub cross_type: u8,
}

impl CrossTrade {
    pub(crate) fn decode(r: &mut FieldReader<'_>) -> FieldResult<Self> {
        Ok(Self {
            header: MessageHeader::decode(r)?,
            shares: r.u64()?,
            stock: r.alpha::<8>()?,
            cross_price: r.u32()?,
            match_number: r.u64()?,
            cross_type: r.one_of(b"OCHI", "cross type")?,
        })
    }

    fn encode(&self, w: &mut FieldWriter<'_>) {
        self.header.encode(w);
        w.u64(self.shares)
            .bytes(&self.stock)
            .u32(self.cross_price)
            .u64(self.match_number)
            .u8(self.cross_type);
    }
}

/// Trades that never touch the visible book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMessage {
    NonCross(NonCrossTrade),
    Cross(CrossTrade),
}

impl TradeMessage {
    pub fn header(&self) -> &MessageHeader {
        match self {
            TradeMessage::NonCross(t) => &t.header,
            TradeMessage::Cross(t) => &t.header,
        }
    }

    /// Symbol with padding removed.
    pub fn symbol(&self) -> &str {
        match self {
            TradeMessage::NonCross(t) => alpha_str(&t.stock),
            TradeMessage::Cross(t) => alpha_str(&t.stock),
        }
    }
}

/// Any non-order message, passed through with its body untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminMessage {
    pub tag: u8,
    pub header: MessageHeader,
    /// Payload after the common header
    pub body: Vec<u8>,
}

impl AdminMessage {
    pub(crate) fn decode(tag: u8, r: &mut FieldReader<'_>) -> FieldResult<Self> {
        Ok(Self {
            tag,
            header: MessageHeader::decode(r)?,
            body: r.rest().to_vec(),
        })
    }

    fn encode(&self, w: &mut FieldWriter<'_>) {
        self.header.encode(w);
        w.bytes(&self.body);
    }

    /// Symbol announced by a Stock Directory (`R`) message.
    pub fn directory_symbol(&self) -> Option<&str> {
        if self.tag != b'R' {
            return None;
        }
        let raw = self.body.get(..8)?;
        let symbol = alpha_str(raw);
        (!symbol.is_empty()).then_some(symbol)
    }
}

/// Closed set of decoded events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItchEvent {
    AddOrder(AddOrder),
    ExecuteOrder(OrderExecuted),
    CancelOrder(OrderCancel),
    DeleteOrder(OrderDelete),
    ReplaceOrder(OrderReplace),
    Trade(TradeMessage),
    Administrative(AdminMessage),
}

impl ItchEvent {
    /// Wire type tag this event encodes to.
    pub fn tag(&self) -> u8 {
        match self {
            ItchEvent::AddOrder(m) if m.attribution.is_some() => b'F',
            ItchEvent::AddOrder(_) => b'A',
            ItchEvent::ExecuteOrder(m) if m.with_price.is_some() => b'C',
            ItchEvent::ExecuteOrder(_) => b'E',
            ItchEvent::CancelOrder(_) => b'X',
            ItchEvent::DeleteOrder(_) => b'D',
            ItchEvent::ReplaceOrder(_) => b'U',
            ItchEvent::Trade(TradeMessage::NonCross(_)) => b'P',
            ItchEvent::Trade(TradeMessage::Cross(_)) => b'Q',
            ItchEvent::Administrative(m) => m.tag,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            ItchEvent::AddOrder(m) => &m.header,
            ItchEvent::ExecuteOrder(m) => &m.header,
            ItchEvent::CancelOrder(m) => &m.header,
            ItchEvent::DeleteOrder(m) => &m.header,
            ItchEvent::ReplaceOrder(m) => &m.header,
            ItchEvent::Trade(m) => m.header(),
            ItchEvent::Administrative(m) => &m.header,
        }
    }

    /// Instrument the event belongs to (stock locate).
    #[inline]
    pub fn instrument(&self) -> InstrumentId {
        self.header().stock_locate
    }

    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.header().timestamp
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ItchEvent::AddOrder(_) => EventKind::Add,
            ItchEvent::ExecuteOrder(_) => EventKind::Execute,
            ItchEvent::CancelOrder(_) => EventKind::Cancel,
            ItchEvent::DeleteOrder(_) => EventKind::Delete,
            ItchEvent::ReplaceOrder(_) => EventKind::Replace,
            ItchEvent::Trade(_) => EventKind::Trade,
            ItchEvent::Administrative(_) => EventKind::Administrative,
        }
    }

    /// Symbol carried by the message itself, if any.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            ItchEvent::AddOrder(m) => Some(m.symbol()),
            ItchEvent::Trade(m) => Some(m.symbol()),
            ItchEvent::Administrative(m) => m.directory_symbol(),
            _ => None,
        }
    }

    /// Append the payload (everything after the type tag).
    pub fn encode_payload(&self, out: &mut Vec<u8>) {
        let mut w = FieldWriter::new(out);
        match self {
            ItchEvent::AddOrder(m) => m.encode(&mut w),
            ItchEvent::ExecuteOrder(m) => m.encode(&mut w),
            ItchEvent::CancelOrder(m) => m.encode(&mut w),
            ItchEvent::DeleteOrder(m) => m.encode(&mut w),
            ItchEvent::ReplaceOrder(m) => m.encode(&mut w),
            ItchEvent::Trade(TradeMessage::NonCross(m)) => m.encode(&mut w),
            ItchEvent::Trade(TradeMessage::Cross(m)) => m.encode(&mut w),
            ItchEvent::Administrative(m) => m.encode(&mut w),
        }
    }

    /// Encode as a complete framed record: length, tag, payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&[0, 0]);
        out.push(self.tag());
        self.encode_payload(&mut out);
        let len = (out.len() - 2) as u16;
        out[..2].copy_from_slice(&len.to_be_bytes());
        out
    }
}
