//! Error types for ITCH replay and order book reconstruction.
//!
//! Two layers, both built with `thiserror`:
//! - [`IntegrityError`]: an event is semantically invalid against the current
//!   book (unknown identifier, duplicate add, over-reduction). Raised by the
//!   registry and the engine, never after a partial mutation.
//! - [`LobError`]: everything a caller of the decoder or the driver can see,
//!   including framing and layout failures of the binary feed.

use thiserror::Error;

/// Result type alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, LobError>;

/// An event that cannot be applied to the current book state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Add for an identifier that is currently resting
    #[error("duplicate order id: {0}")]
    DuplicateOrderId(u64),

    /// Add for an identifier that was already removed from the book
    #[error("order id {0} was already removed and cannot be reused")]
    RetiredOrderId(u64),

    /// Execute/cancel/delete/replace for an identifier that is not resting
    #[error("unknown order id: {0}")]
    UnknownOrderId(u64),

    /// Execution or cancellation larger than the remaining size
    #[error("order {order_id}: cannot reduce by {requested}, only {remaining} remaining")]
    OverReduction {
        order_id: u64,
        requested: u32,
        remaining: u32,
    },

    /// Zero-share add, execution, cancellation or replacement
    #[error("order {0}: zero quantity")]
    ZeroQuantity(u64),

    /// Add without a buy/sell side
    #[error("order {0}: no book side")]
    MissingSide(u64),
}

/// Main error type for decoding and reconstruction.
#[derive(Error, Debug, Clone)]
pub enum LobError {
    /// Length prefix invalid or stream truncated mid-record; decoding stops here.
    #[error("framing error at byte {offset}: {reason}")]
    Framing { offset: u64, reason: String },

    /// Unregistered type tag; the record was skipped.
    #[error("unknown message type {:?} at byte {offset}", tag_char(.tag))]
    UnknownMessageType { tag: u8, offset: u64 },

    /// Payload does not match its type's fixed layout; the record was dropped.
    #[error("cannot decode {:?} record at byte {offset}: {reason}", tag_char(.tag))]
    Decode {
        tag: u8,
        offset: u64,
        reason: String,
    },

    /// Event rejected by the book without a known feed position
    #[error(transparent)]
    DataIntegrity(#[from] IntegrityError),

    /// Strict mode stopped the replay at this record
    #[error("replay halted at record {record} (byte {offset}): {source}")]
    Halted {
        record: u64,
        offset: u64,
        #[source]
        source: IntegrityError,
    },

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

fn tag_char(tag: &u8) -> char {
    char::from(*tag)
}

impl LobError {
    /// Create a generic error from any string-like type.
    pub fn generic(msg: impl Into<String>) -> Self {
        LobError::Generic(msg.into())
    }

    /// Whether decoding can continue with the next record after this error.
    ///
    /// Framing errors end the stream; layout and unknown-tag errors only lose
    /// the record they were raised for.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LobError::UnknownMessageType { .. } | LobError::Decode { .. }
        )
    }

    /// Byte offset of the record that raised this error, when known.
    pub fn offset(&self) -> Option<u64> {
        match self {
            LobError::Framing { offset, .. }
            | LobError::UnknownMessageType { offset, .. }
            | LobError::Decode { offset, .. }
            | LobError::Halted { offset, .. } => Some(*offset),
            LobError::DataIntegrity(_) | LobError::Generic(_) => None,
        }
    }
}

impl From<std::io::Error> for LobError {
    fn from(err: std::io::Error) -> Self {
        LobError::Generic(format!("IO error: {err}"))
    }
}

impl From<String> for LobError {
    fn from(err: String) -> Self {
        LobError::Generic(err)
    }
}

impl From<&str> for LobError {
    fn from(err: &str) -> Self {
        LobError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LobError::UnknownMessageType {
            tag: b'Z',
            offset: 42,
        };
        assert_eq!(err.to_string(), "unknown message type 'Z' at byte 42");

        let err = IntegrityError::OverReduction {
            order_id: 7,
            requested: 20,
            remaining: 10,
        };
        assert_eq!(
            err.to_string(),
            "order 7: cannot reduce by 20, only 10 remaining"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(LobError::Decode {
            tag: b'A',
            offset: 0,
            reason: "bad side".into()
        }
        .is_recoverable());
        assert!(!LobError::Framing {
            offset: 0,
            reason: "truncated".into()
        }
        .is_recoverable());
        assert!(!LobError::from(IntegrityError::UnknownOrderId(1)).is_recoverable());
    }

    #[test]
    fn test_halted_keeps_position() {
        let err = LobError::Halted {
            record: 3,
            offset: 120,
            source: IntegrityError::UnknownOrderId(99),
        };
        assert_eq!(err.offset(), Some(120));
        assert!(err.to_string().contains("unknown order id: 99"));
    }
}
