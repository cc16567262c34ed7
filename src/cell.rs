//! Row-image cell decoding.
//!
//! `CellValue` is a closed tagged enum: one variant per physical type this
//! decoder understands, built from a column's `MysqlType` and its table-map
//! `ColumnMetadata`. Types the wire format can never carry in a row image
//! (§4.3's impossible set) and types this decoder doesn't implement both
//! produce errors rather than a variant, so callers can't silently mishandle
//! an unsupported column.

use std::io::Read;

use crate::column::{ColumnMetadata, MysqlType};
use crate::error::{BinlogError, Result};
use crate::primitive;
use crate::temporal::{self, Date, DateTime, TimeOfDay, TimestampInstant};

#[derive(Debug, Clone, PartialEq, serde_derive::Serialize)]
pub enum CellValue {
    Null,
    Tiny(i8),
    Short(i16),
    Long(i32),
    LongLong(i64),
    Int24(i32),
    Year(u16),
    Float(f32),
    Double(f64),
    Date(Date),
    Time(TimeOfDay),
    Timestamp(TimestampInstant),
    DateTime(DateTime),
    /// VARCHAR, VAR_STRING and STRING all land here: raw bytes, charset-naive.
    Text(Vec<u8>),
    Blob(Vec<u8>),
}

/// Reads `n` bytes as a little-endian unsigned length, `n` in `1..=4`.
fn read_length_le<R: Read>(r: &mut R, n: u8) -> Result<usize> {
    let bytes = primitive::read_exact(r, n as usize)?;
    let mut value: u32 = 0;
    for (i, b) in bytes.iter().enumerate() {
        value |= u32::from(*b) << (8 * i);
    }
    Ok(value as usize)
}

/// Decodes one non-null cell for a column of the given physical type and
/// metadata. Callers are expected to have already consulted the row image's
/// null bitset; this function never produces `CellValue::Null` itself except
/// for the field type `NULL`, which never appears in a populated row.
pub fn decode<R: Read>(
    r: &mut R,
    physical_type: MysqlType,
    metadata: &ColumnMetadata,
) -> Result<CellValue> {
    use MysqlType::*;

    if physical_type.is_impossible_in_binlog() {
        return Err(BinlogError::ImpossiblePhysicalType(physical_type));
    }

    Ok(match physical_type {
        Null => CellValue::Null,
        Tiny => CellValue::Tiny(primitive::read_u8(r)? as i8),
        Short => CellValue::Short(primitive::read_u16(r)? as i16),
        Long => CellValue::Long(primitive::read_u32(r)? as i32),
        LongLong => CellValue::LongLong(primitive::read_u64(r)? as i64),
        Int24 => {
            let raw = primitive::read_u24(r)?;
            let signed = if raw & 0x80_0000 != 0 {
                (raw | 0xFF00_0000) as i32
            } else {
                raw as i32
            };
            CellValue::Int24(signed)
        }
        Year => CellValue::Year(1900 + u16::from(primitive::read_u8(r)?)),
        Float => CellValue::Float(f32::from_bits(primitive::read_u32(r)?)),
        Double => CellValue::Double(f64::from_bits(primitive::read_u64(r)?)),
        Date => CellValue::Date(temporal::read_date(r)?),
        Time2 => {
            let fsp = metadata.fractional_seconds_precision()?;
            CellValue::Time(temporal::read_time_v2(r, fsp)?)
        }
        Timestamp2 => {
            let fsp = metadata.fractional_seconds_precision()?;
            CellValue::Timestamp(temporal::read_timestamp_v2(r, fsp)?)
        }
        DateTime2 => {
            let fsp = metadata.fractional_seconds_precision()?;
            CellValue::DateTime(temporal::read_datetime_v2(r, fsp)?)
        }
        VarChar => {
            let max_length = metadata.varchar_max_length()?;
            let len = if max_length > 255 {
                primitive::read_u16(r)? as usize
            } else {
                primitive::read_u8(r)? as usize
            };
            CellValue::Text(primitive::read_exact(r, len)?)
        }
        VarString | String => {
            let pack_size = metadata.pack_size()?;
            if metadata.real_type()? == Enum {
                let index = read_length_le(r, pack_size)?;
                CellValue::Text(index.to_string().into_bytes())
            } else {
                // Same rule as VARCHAR's length prefix, applied to `pack_size`
                // instead of `max_length`; since `pack_size` is a `u8` it can
                // never exceed 255, so the "else" (2-byte) branch is dead.
                let len = if pack_size <= 255 {
                    primitive::read_u8(r)? as usize
                } else {
                    primitive::read_u16(r)? as usize
                };
                CellValue::Text(primitive::read_exact(r, len)?)
            }
        }
        Blob => {
            let pack_size = metadata.pack_size()?;
            let len = read_length_le(r, pack_size)?;
            CellValue::Blob(primitive::read_exact(r, len)?)
        }
        other => return Err(BinlogError::UnsupportedPhysicalType(other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tiny_signed_round_trip() {
        let mut c = Cursor::new(vec![0xFFu8]); // -1 as i8
        let v = decode(&mut c, MysqlType::Tiny, &ColumnMetadata::None).unwrap();
        assert_eq!(v, CellValue::Tiny(-1));
    }

    #[test]
    fn int24_sign_extends() {
        let mut c = Cursor::new(vec![0xFF, 0xFF, 0xFF]); // -1
        let v = decode(&mut c, MysqlType::Int24, &ColumnMetadata::None).unwrap();
        assert_eq!(v, CellValue::Int24(-1));
    }

    #[test]
    fn year_is_offset_from_1900() {
        let mut c = Cursor::new(vec![125]);
        let v = decode(&mut c, MysqlType::Year, &ColumnMetadata::None).unwrap();
        assert_eq!(v, CellValue::Year(2025));
    }

    #[test]
    fn varchar_with_short_length_prefix() {
        let meta = ColumnMetadata::VarcharMaxLength(100);
        let mut c = Cursor::new(vec![5, b'h', b'e', b'l', b'l', b'o']);
        let v = decode(&mut c, MysqlType::VarChar, &meta).unwrap();
        assert_eq!(v, CellValue::Text(b"hello".to_vec()));
    }

    #[test]
    fn varchar_with_long_length_prefix() {
        let meta = ColumnMetadata::VarcharMaxLength(1000);
        let mut c = Cursor::new(vec![3, 0, b'h', b'i', b'!']);
        let v = decode(&mut c, MysqlType::VarChar, &meta).unwrap();
        assert_eq!(v, CellValue::Text(b"hi!".to_vec()));
    }

    #[test]
    fn string_with_enum_real_type_renders_index_as_decimal_text() {
        let meta = ColumnMetadata::StringType {
            real_type: MysqlType::Enum,
            pack_size: 1,
        };
        let mut c = Cursor::new(vec![3u8]);
        let v = decode(&mut c, MysqlType::String, &meta).unwrap();
        assert_eq!(v, CellValue::Text(b"3".to_vec()));
    }

    #[test]
    fn string_with_non_enum_real_type_uses_one_byte_prefix() {
        // CHAR(5) stored as a STRING-typed column: pack_size 5, not 1.
        let meta = ColumnMetadata::StringType {
            real_type: MysqlType::String,
            pack_size: 5,
        };
        let mut c = Cursor::new(vec![3, b'h', b'i', b'!']);
        let v = decode(&mut c, MysqlType::String, &meta).unwrap();
        assert_eq!(v, CellValue::Text(b"hi!".to_vec()));
    }

    #[test]
    fn blob_length_prefix_matches_pack_size() {
        let meta = ColumnMetadata::PackSize(2);
        let mut c = Cursor::new(vec![4, 0, 1, 2, 3, 4]);
        let v = decode(&mut c, MysqlType::Blob, &meta).unwrap();
        assert_eq!(v, CellValue::Blob(vec![1, 2, 3, 4]));
    }

    #[test]
    fn impossible_types_error_before_consuming_bytes() {
        let mut c = Cursor::new(Vec::<u8>::new());
        match decode(&mut c, MysqlType::Enum, &ColumnMetadata::None) {
            Err(BinlogError::ImpossiblePhysicalType(MysqlType::Enum)) => {}
            other => panic!("expected ImpossiblePhysicalType(Enum), got {other:?}"),
        }
    }

    #[test]
    fn unsupported_types_are_reported_distinctly() {
        let mut c = Cursor::new(vec![0u8; 16]);
        match decode(&mut c, MysqlType::NewDecimal, &ColumnMetadata::NewDecimal { precision: 10, scale: 2 }) {
            Err(BinlogError::UnsupportedPhysicalType(MysqlType::NewDecimal)) => {}
            other => panic!("expected UnsupportedPhysicalType(NewDecimal), got {other:?}"),
        }
    }
}
