//! Physical column types and their on-wire metadata, as carried by a
//! table-map event.
//!
//! Byte values are MySQL's canonical `enum_field_types` codes.

use std::io::Read;

use crate::error::{BinlogError, Result};
use crate::primitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde_derive::Serialize)]
pub enum MysqlType {
    Decimal,
    Tiny,
    Short,
    Long,
    Float,
    Double,
    Null,
    Timestamp,
    LongLong,
    Int24,
    Date,
    Time,
    DateTime,
    Year,
    NewDate,
    VarChar,
    Bit,
    Timestamp2,
    DateTime2,
    Time2,
    Json,
    NewDecimal,
    Enum,
    Set,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    VarString,
    String,
    Geometry,
    /// Any byte not in MySQL's current `enum_field_types`.
    Other(u8),
}

impl MysqlType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => MysqlType::Decimal,
            1 => MysqlType::Tiny,
            2 => MysqlType::Short,
            3 => MysqlType::Long,
            4 => MysqlType::Float,
            5 => MysqlType::Double,
            6 => MysqlType::Null,
            7 => MysqlType::Timestamp,
            8 => MysqlType::LongLong,
            9 => MysqlType::Int24,
            10 => MysqlType::Date,
            11 => MysqlType::Time,
            12 => MysqlType::DateTime,
            13 => MysqlType::Year,
            14 => MysqlType::NewDate,
            15 => MysqlType::VarChar,
            16 => MysqlType::Bit,
            17 => MysqlType::Timestamp2,
            18 => MysqlType::DateTime2,
            19 => MysqlType::Time2,
            245 => MysqlType::Json,
            246 => MysqlType::NewDecimal,
            247 => MysqlType::Enum,
            248 => MysqlType::Set,
            249 => MysqlType::TinyBlob,
            250 => MysqlType::MediumBlob,
            251 => MysqlType::LongBlob,
            252 => MysqlType::Blob,
            253 => MysqlType::VarString,
            254 => MysqlType::String,
            255 => MysqlType::Geometry,
            other => MysqlType::Other(other),
        }
    }

    /// True for column types that never appear directly in a row image
    /// (they are always transported as one of their row-image equivalents).
    pub fn is_impossible_in_binlog(self) -> bool {
        matches!(
            self,
            MysqlType::Enum
                | MysqlType::NewDate
                | MysqlType::Set
                | MysqlType::TinyBlob
                | MysqlType::MediumBlob
                | MysqlType::LongBlob
        )
    }
}

/// Per-column metadata, tagged by the physical type it was decoded for.
#[derive(Debug, Clone, PartialEq, Eq, serde_derive::Serialize)]
pub enum ColumnMetadata {
    None,
    PackSize(u8),
    FractionalSecondsPrecision(u8),
    VarcharMaxLength(u16),
    StringType { real_type: MysqlType, pack_size: u8 },
    Bit { bit_count: u8, pack_size: u8 },
    NewDecimal { precision: u8, scale: u8 },
}

impl ColumnMetadata {
    /// Decodes the metadata for one column, given its physical type. The
    /// number of bytes consumed is determined solely by `physical_type`
    /// (§4.3).
    pub fn decode<R: Read>(r: &mut R, physical_type: MysqlType) -> Result<Self> {
        use MysqlType::*;
        Ok(match physical_type {
            Float | Double | Blob | Geometry => ColumnMetadata::PackSize(primitive::read_u8(r)?),
            Timestamp2 | Time2 | DateTime2 => {
                ColumnMetadata::FractionalSecondsPrecision(primitive::read_u8(r)?)
            }
            VarChar => ColumnMetadata::VarcharMaxLength(primitive::read_u16(r)?),
            Bit => {
                let bit_count = primitive::read_u8(r)?;
                let pack_size = primitive::read_u8(r)?;
                ColumnMetadata::Bit {
                    bit_count,
                    pack_size,
                }
            }
            NewDecimal => {
                let precision = primitive::read_u8(r)?;
                let scale = primitive::read_u8(r)?;
                ColumnMetadata::NewDecimal { precision, scale }
            }
            VarString | String => {
                let real_type = MysqlType::from_byte(primitive::read_u8(r)?);
                let pack_size = primitive::read_u8(r)?;
                ColumnMetadata::StringType {
                    real_type,
                    pack_size,
                }
            }
            _ => ColumnMetadata::None,
        })
    }

    /// The number of bytes this variant's on-wire form occupies.
    pub fn wire_len(&self) -> usize {
        match self {
            ColumnMetadata::None => 0,
            ColumnMetadata::PackSize(_) => 1,
            ColumnMetadata::FractionalSecondsPrecision(_) => 1,
            ColumnMetadata::VarcharMaxLength(_) => 2,
            ColumnMetadata::StringType { .. } => 2,
            ColumnMetadata::Bit { .. } => 2,
            ColumnMetadata::NewDecimal { .. } => 2,
        }
    }

    pub fn pack_size(&self) -> Result<u8> {
        match self {
            ColumnMetadata::PackSize(v) => Ok(*v),
            ColumnMetadata::StringType { pack_size, .. } => Ok(*pack_size),
            ColumnMetadata::Bit { pack_size, .. } => Ok(*pack_size),
            _ => Err(BinlogError::MetadataKindMismatch {
                expected: "pack_size",
                got: self.kind_name(),
            }),
        }
    }

    pub fn varchar_max_length(&self) -> Result<u16> {
        match self {
            ColumnMetadata::VarcharMaxLength(v) => Ok(*v),
            _ => Err(BinlogError::MetadataKindMismatch {
                expected: "varchar_max_length",
                got: self.kind_name(),
            }),
        }
    }

    pub fn real_type(&self) -> Result<MysqlType> {
        match self {
            ColumnMetadata::StringType { real_type, .. } => Ok(*real_type),
            _ => Err(BinlogError::MetadataKindMismatch {
                expected: "real_type",
                got: self.kind_name(),
            }),
        }
    }

    pub fn fractional_seconds_precision(&self) -> Result<u8> {
        match self {
            ColumnMetadata::FractionalSecondsPrecision(v) => Ok(*v),
            _ => Err(BinlogError::MetadataKindMismatch {
                expected: "fractional_seconds_precision",
                got: self.kind_name(),
            }),
        }
    }

    pub fn new_decimal_precision_scale(&self) -> Result<(u8, u8)> {
        match self {
            ColumnMetadata::NewDecimal { precision, scale } => Ok((*precision, *scale)),
            _ => Err(BinlogError::MetadataKindMismatch {
                expected: "new_decimal",
                got: self.kind_name(),
            }),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ColumnMetadata::None => "none",
            ColumnMetadata::PackSize(_) => "pack_size",
            ColumnMetadata::FractionalSecondsPrecision(_) => "fractional_seconds_precision",
            ColumnMetadata::VarcharMaxLength(_) => "varchar_max_length",
            ColumnMetadata::StringType { .. } => "string_type",
            ColumnMetadata::Bit { .. } => "bit",
            ColumnMetadata::NewDecimal { .. } => "new_decimal",
        }
    }
}
