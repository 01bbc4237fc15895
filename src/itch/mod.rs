//! ITCH 5.0 binary feed: field access, typed messages and record framing.
//!
//! Decoding is split into three layers:
//! - [`fields`]: bounds-checked big-endian readers/writers
//! - [`messages`]: one struct per message type and the closed [`ItchEvent`] set
//! - [`decoder`]: length framing and the tag → layout registration table

pub mod decoder;
pub mod fields;
pub mod messages;

pub use decoder::{
    DecodeFn, DecodedRecord, FeedDecoder, FeedWriter, MessageDecoder, RecordLayout,
    StreamDecoder, ITCH50_LAYOUTS, LENGTH_PREFIX,
};
pub use fields::{FieldReader, FieldResult, FieldWriter};
pub use messages::{
    AddOrder, AdminMessage, CrossTrade, ExecutionPrice, ItchEvent, MessageHeader, NonCrossTrade,
    OrderCancel, OrderDelete, OrderExecuted, OrderReplace, TradeMessage, HEADER_LEN,
};
