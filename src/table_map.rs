//! Table-map event decoding and the session's table-map cache (§4.7 of
//! table-map cache.

use std::collections::HashMap;
use std::io::Read;

use crate::bitset::Bitset;
use crate::column::{ColumnMetadata, MysqlType};
use crate::error::{BinlogError, Result};
use crate::primitive;

/// A schema descriptor issued before the row events that reference it.
#[derive(Debug, Clone, PartialEq, serde_derive::Serialize)]
pub struct TableMapEvent {
    pub table_id: u64,
    pub database_name: String,
    pub table_name: String,
    pub column_types: Vec<MysqlType>,
    pub column_metadata: Vec<ColumnMetadata>,
    pub nullable_bitset: Bitset,
}

impl TableMapEvent {
    pub fn column_count(&self) -> u64 {
        self.column_types.len() as u64
    }

    pub fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let table_id = read_table_id(r)?;
        primitive::read_exact(r, 2)?; // reserved

        primitive::read_u8(r)?; // database name length (redundant: null-terminated)
        let database_name = primitive::read_null_terminated_string(r)?;

        primitive::read_u8(r)?; // table name length (redundant)
        let table_name = primitive::read_null_terminated_string(r)?;

        let column_count = primitive::read_packed_int(r)?;
        let type_bytes = primitive::read_exact(r, column_count as usize)?;
        let column_types: Vec<MysqlType> =
            type_bytes.iter().map(|&b| MysqlType::from_byte(b)).collect();

        let metadata_length = primitive::read_packed_int(r)?;
        let mut column_metadata = Vec::with_capacity(column_types.len());
        let mut consumed: i64 = 0;
        for &t in &column_types {
            let meta = ColumnMetadata::decode(r, t)?;
            consumed += meta.wire_len() as i64;
            column_metadata.push(meta);
        }
        if consumed != metadata_length as i64 {
            return Err(BinlogError::MetadataLengthMismatch(
                consumed - metadata_length as i64,
            ));
        }

        let null_bytes = primitive::read_exact(r, Bitset::byte_width(column_count as usize))?;
        let nullable_bitset = Bitset::from_bytes(null_bytes, column_count as usize);

        Ok(TableMapEvent {
            table_id,
            database_name,
            table_name,
            column_types,
            column_metadata,
            nullable_bitset,
        })
    }
}

/// Reads a 6-byte little-endian table id, zero-extended to u64.
pub fn read_table_id<R: Read>(r: &mut R) -> Result<u64> {
    let b = primitive::read_exact(r, 6)?;
    Ok(b.iter().enumerate().fold(0u64, |acc, (i, &byte)| acc | (u64::from(byte) << (8 * i))))
}

/// The session's table-map cache, keyed by `table_id` and populated as
/// table-map events are decoded. Entries persist for the life of the session.
#[derive(Debug, Default)]
pub struct TableMapCache {
    tables: HashMap<u64, TableMapEvent>,
}

impl TableMapCache {
    pub fn new() -> Self {
        TableMapCache {
            tables: HashMap::new(),
        }
    }

    pub fn insert(&mut self, event: TableMapEvent) {
        self.tables.insert(event.table_id, event);
    }

    pub fn get(&self, table_id: u64) -> Result<&TableMapEvent> {
        self.tables
            .get(&table_id)
            .ok_or(BinlogError::UnknownTableId(table_id))
    }

    pub fn contains(&self, table_id: u64) -> bool {
        self.tables.contains_key(&table_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_table_map(
        table_id: u64,
        db: &str,
        table: &str,
        types: &[MysqlType],
        metadata_bytes: &[u8],
        null_bitset_bytes: &[u8],
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&table_id.to_le_bytes()[..6]);
        out.extend_from_slice(&[0, 0]); // reserved
        out.push(db.len() as u8);
        out.extend_from_slice(db.as_bytes());
        out.push(0);
        out.push(table.len() as u8);
        out.extend_from_slice(table.as_bytes());
        out.push(0);
        out.push(types.len() as u8); // packed int, small
        for t in types {
            out.push(type_to_byte(*t));
        }
        out.push(metadata_bytes.len() as u8); // packed int, small
        out.extend_from_slice(metadata_bytes);
        out.extend_from_slice(null_bitset_bytes);
        out
    }

    fn type_to_byte(t: MysqlType) -> u8 {
        match t {
            MysqlType::Long => 3,
            MysqlType::VarChar => 15,
            _ => unimplemented!(),
        }
    }

    #[test]
    fn decodes_names_types_and_metadata() {
        let bytes = encode_table_map(
            42,
            "mydb",
            "mytable",
            &[MysqlType::Long, MysqlType::VarChar],
            &[200, 0], // VarChar max-length metadata (Long has none)
            &[0b0000_0010],
        );
        let mut c = Cursor::new(bytes);
        let tm = TableMapEvent::decode(&mut c).unwrap();
        assert_eq!(tm.table_id, 42);
        assert_eq!(tm.database_name, "mydb");
        assert_eq!(tm.table_name, "mytable");
        assert_eq!(tm.column_types, vec![MysqlType::Long, MysqlType::VarChar]);
        assert_eq!(
            tm.column_metadata[1].varchar_max_length().unwrap(),
            200
        );
        assert!(!tm.nullable_bitset.bit(0));
        assert!(tm.nullable_bitset.bit(1));
    }

    #[test]
    fn metadata_length_mismatch_is_reported() {
        let mut bytes = encode_table_map(
            1,
            "d",
            "t",
            &[MysqlType::VarChar],
            &[200, 0],
            &[0b0000_0000],
        );
        // lie about the metadata length prefix: find the packed-int byte just
        // before the 2 metadata bytes and shrink it.
        let metadata_len_pos = bytes.len() - 1 /* null bitset */ - 2 /* metadata */ - 1;
        bytes[metadata_len_pos] = 1;
        let mut c = Cursor::new(bytes);
        match TableMapEvent::decode(&mut c) {
            Err(BinlogError::MetadataLengthMismatch(_)) => {}
            other => panic!("expected MetadataLengthMismatch, got {other:?}"),
        }
    }

    #[test]
    fn cache_round_trips_by_table_id() {
        let mut cache = TableMapCache::new();
        let bytes = encode_table_map(7, "d", "t", &[MysqlType::Long], &[], &[0]);
        let mut c = Cursor::new(bytes);
        let tm = TableMapEvent::decode(&mut c).unwrap();
        cache.insert(tm);
        assert!(cache.contains(7));
        assert_eq!(cache.get(7).unwrap().table_name, "t");
        match cache.get(99) {
            Err(BinlogError::UnknownTableId(99)) => {}
            other => panic!("expected UnknownTableId(99), got {other:?}"),
        }
    }
}
