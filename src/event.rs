//! Binlog magic bytes, the fixed event header, and the closed event-type
//! enumeration.

use std::io::Read;

use crate::error::{BinlogError, Result};
use crate::primitive;

pub const MAGIC: [u8; 4] = [0xFE, b'b', b'i', b'n'];

/// Reads and validates the 4-byte binlog magic prefix.
pub fn read_magic<R: Read>(r: &mut R) -> Result<()> {
    let bytes = primitive::read_exact(r, 4)?;
    if bytes.as_slice() == MAGIC {
        Ok(())
    } else {
        let mut got = [0u8; 4];
        got.copy_from_slice(&bytes);
        Err(BinlogError::BadMagic(got))
    }
}

/// https://dev.mysql.com/doc/internals/en/event-classes-and-types.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde_derive::Serialize)]
pub enum EventType {
    UnknownEvent,
    StartEventV3,
    QueryEvent,
    StopEvent,
    RotateEvent,
    IntvarEvent,
    LoadEvent,
    SlaveEvent,
    CreateFileEvent,
    AppendBlockEvent,
    ExecLoadEvent,
    DeleteFileEvent,
    NewLoadEvent,
    RandEvent,
    UserVarEvent,
    FormatDescriptionEvent,
    XidEvent,
    BeginLoadQueryEvent,
    ExecuteLoadQueryEvent,
    TableMapEvent,
    PreGaWriteRowsEvent,
    PreGaUpdateRowsEvent,
    PreGaDeleteRowsEvent,
    WriteRowsEventV1,
    UpdateRowsEventV1,
    DeleteRowsEventV1,
    IncidentEvent,
    HeartbeatLogEvent,
    IgnorableLogEvent,
    RowsQueryLogEvent,
    WriteRowsEventV2,
    UpdateRowsEventV2,
    DeleteRowsEventV2,
    GtidLogEvent,
    AnonymousGtidLogEvent,
    PreviousGtidsLogEvent,
    /// Any type code MySQL's binlog protocol hasn't assigned (yet).
    Other(u8),
}

impl EventType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => EventType::UnknownEvent,
            1 => EventType::StartEventV3,
            2 => EventType::QueryEvent,
            3 => EventType::StopEvent,
            4 => EventType::RotateEvent,
            5 => EventType::IntvarEvent,
            6 => EventType::LoadEvent,
            7 => EventType::SlaveEvent,
            8 => EventType::CreateFileEvent,
            9 => EventType::AppendBlockEvent,
            10 => EventType::ExecLoadEvent,
            11 => EventType::DeleteFileEvent,
            12 => EventType::NewLoadEvent,
            13 => EventType::RandEvent,
            14 => EventType::UserVarEvent,
            15 => EventType::FormatDescriptionEvent,
            16 => EventType::XidEvent,
            17 => EventType::BeginLoadQueryEvent,
            18 => EventType::ExecuteLoadQueryEvent,
            19 => EventType::TableMapEvent,
            20 => EventType::PreGaWriteRowsEvent,
            21 => EventType::PreGaUpdateRowsEvent,
            22 => EventType::PreGaDeleteRowsEvent,
            23 => EventType::WriteRowsEventV1,
            24 => EventType::UpdateRowsEventV1,
            25 => EventType::DeleteRowsEventV1,
            26 => EventType::IncidentEvent,
            27 => EventType::HeartbeatLogEvent,
            28 => EventType::IgnorableLogEvent,
            29 => EventType::RowsQueryLogEvent,
            30 => EventType::WriteRowsEventV2,
            31 => EventType::UpdateRowsEventV2,
            32 => EventType::DeleteRowsEventV2,
            33 => EventType::GtidLogEvent,
            34 => EventType::AnonymousGtidLogEvent,
            35 => EventType::PreviousGtidsLogEvent,
            other => EventType::Other(other),
        }
    }
}

/// The fixed 19-byte v4 event header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde_derive::Serialize)]
pub struct EventHeader {
    pub timestamp: u32,
    pub event_type: EventType,
    pub server_id: u32,
    pub length: u32,
    pub next_position: u32,
    pub flags: u16,
    pub start_offset: u64,
}

pub const HEADER_LEN: u32 = 19;

impl EventHeader {
    pub fn read<R: Read>(r: &mut R, start_offset: u64) -> Result<Self> {
        let timestamp = primitive::read_u32(r)?;
        let event_type = EventType::from_byte(primitive::read_u8(r)?);
        let server_id = primitive::read_u32(r)?;
        let length = primitive::read_u32(r)?;
        let next_position = primitive::read_u32(r)?;
        let flags = primitive::read_u16(r)?;
        Ok(EventHeader {
            timestamp,
            event_type,
            server_id,
            length,
            next_position,
            flags,
            start_offset,
        })
    }

    /// Bytes remaining in this event's body after the fixed header, not
    /// counting the trailing checksum slot.
    pub fn body_len(&self) -> u32 {
        self.length.saturating_sub(HEADER_LEN)
    }
}

/// Determines the binlog log version from the first event's type and
/// length. Only version 4 is supported beyond this point; callers are
/// expected to turn anything else into `UnsupportedLogVersion`.
pub fn probe_log_version(event_type: EventType, length: u32) -> u8 {
    match event_type {
        EventType::StartEventV3 => {
            if length < 75 {
                1
            } else {
                3
            }
        }
        EventType::FormatDescriptionEvent => 4,
        _ => 3,
    }
}
