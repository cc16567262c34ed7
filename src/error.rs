use thiserror::Error;

use crate::column::MysqlType;

/// Every failure the core can surface, from opening a session to decoding a
/// single cell. Per-event errors abort that event's decode but never
/// invalidate the session's index; `BadMagic` and `UnsupportedLogVersion` are
/// fatal to the whole session.
#[derive(Error, Debug)]
pub enum BinlogError {
    #[error("bad magic value at start of binlog: got {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported binlog log version: {0} (only v4 is supported)")]
    UnsupportedLogVersion(u8),

    #[error("short read: wanted {want} bytes, got {got}")]
    ShortRead { want: usize, got: usize },

    #[error("malformed packed integer marker byte: {0:#04x}")]
    MalformedPackedInt(u8),

    #[error("physical type {0:?} can never appear in a binlog row image")]
    ImpossiblePhysicalType(MysqlType),

    #[error("physical type {0:?} is not supported by this decoder")]
    UnsupportedPhysicalType(MysqlType),

    #[error("metadata accessor mismatch: expected {expected}, got {got}")]
    MetadataKindMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("table-map metadata length mismatch: off by {0} bytes")]
    MetadataLengthMismatch(i64),

    #[error("used-columns bitset and null bitset widths disagree")]
    UsedNullBitsetLengthMismatch,

    #[error("table-map column count {table_map} disagrees with rows event column count {rows_event}")]
    ColumnCountMismatch { table_map: u64, rows_event: u64 },

    #[error("no table-map event found for table id {0}")]
    UnknownTableId(u64),

    #[error("rows event decode overran its bounds by {0} bytes")]
    EventOverrun(i64),

    #[error("seek/index out of range")]
    OutOfRange,

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BinlogError>;
