//! The `Session`: event indexing, lazy body decode, random access and
//! follow mode.

use std::io::Cursor;

use crate::byte_source::{ByteSource, Follower, Whence};
use crate::config::SessionConfig;
use crate::error::{BinlogError, Result};
use crate::event::{self, EventHeader, EventType, HEADER_LEN};
use crate::rows::{self, RowsEvent};
use crate::table_map::{self, TableMapCache, TableMapEvent};

/// Where a session is in its lifecycle. `Event(i)` is only meaningful from
/// `Indexed`; `Following`'s index grows monotonically as new bytes arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Indexed,
    Following,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedEvent {
    pub event_type: EventType,
    pub start_offset: u64,
}

#[derive(Debug, Clone, serde_derive::Serialize)]
pub enum EventBody {
    TableMap(TableMapEvent),
    Rows(RowsEvent),
    /// A recognised-but-not-decoded body: everything but `TABLE_MAP` and the
    /// rows-event family.
    Opaque,
}

#[derive(Debug, Clone, serde_derive::Serialize)]
pub struct DecodedEvent {
    pub header: EventHeader,
    pub body: EventBody,
}

pub struct Session<S> {
    source: S,
    config: SessionConfig,
    log_version: u8,
    events: Vec<IndexedEvent>,
    table_maps: TableMapCache,
    state: SessionState,
    /// Index of the next event `next_followed` hasn't yet returned.
    followed_index: usize,
}

impl<S: ByteSource> Session<S> {
    /// Verifies the magic prefix, probes the log version (must be 4), then
    /// indexes the remainder of the byte source.
    pub fn open(mut source: S, config: SessionConfig) -> Result<Self> {
        let magic_bytes = source.read_exact(4)?;
        event::read_magic(&mut Cursor::new(magic_bytes))?;

        let first_header = Self::read_header_at(&mut source, 4)?;
        let log_version = event::probe_log_version(first_header.event_type, first_header.length);
        if log_version != 4 {
            return Err(BinlogError::UnsupportedLogVersion(log_version));
        }
        if first_header.length > config.max_event_length {
            return Err(BinlogError::EventOverrun(
                (first_header.length - config.max_event_length) as i64,
            ));
        }
        log::info!(
            "binlog session opened: version {}, first event length {}",
            log_version,
            first_header.length
        );

        source.seek(first_header.next_position as i64, Whence::Start)?;

        let mut session = Session {
            source,
            config,
            log_version,
            events: vec![IndexedEvent {
                event_type: first_header.event_type,
                start_offset: 4,
            }],
            table_maps: TableMapCache::new(),
            state: SessionState::Indexed,
            followed_index: 0,
        };
        session.index_available()?;
        Ok(session)
    }

    pub fn log_version(&self) -> u8 {
        self.log_version
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn events_len(&self) -> usize {
        self.events.len()
    }

    /// Ordered sequence of indexed events; lazily decoded one at a time.
    pub fn events(&mut self) -> Events<'_, S> {
        Events {
            session: self,
            index: 0,
        }
    }

    /// Random access by index.
    pub fn event(&mut self, i: usize) -> Result<DecodedEvent> {
        let indexed = *self.events.get(i).ok_or(BinlogError::OutOfRange)?;
        self.source.seek(indexed.start_offset as i64, Whence::Start)?;
        let header = Self::read_header_at(&mut self.source, indexed.start_offset)?;
        let body_bytes = self.source.read_exact(header.body_len() as usize)?;
        let body = self.decode_body(&header, &body_bytes)?;
        Ok(DecodedEvent { header, body })
    }

    fn read_header_at(source: &mut S, start_offset: u64) -> Result<EventHeader> {
        let header_bytes = source.read_exact(HEADER_LEN as usize)?;
        EventHeader::read(&mut Cursor::new(header_bytes), start_offset)
    }

    /// Indexes every complete event from the source's current position up to
    /// its currently known length (header only; bodies stay on disk/in the
    /// buffer until a caller asks for them).
    fn index_available(&mut self) -> Result<()> {
        loop {
            let pos = self.source.position()?;
            match self.source.length()? {
                Some(len) if pos < len => {}
                _ => break,
            }
            let header = Self::read_header_at(&mut self.source, pos)?;
            if header.length > self.config.max_event_length {
                return Err(BinlogError::EventOverrun(
                    (header.length - self.config.max_event_length) as i64,
                ));
            }
            log::debug!("indexed event at {}: {:?}", pos, header.event_type);
            self.events.push(IndexedEvent {
                event_type: header.event_type,
                start_offset: pos,
            });
            self.source.seek(header.next_position as i64, Whence::Start)?;
        }
        Ok(())
    }

    fn decode_body(&mut self, header: &EventHeader, body_bytes: &[u8]) -> Result<EventBody> {
        match header.event_type {
            EventType::TableMapEvent => {
                let mut cursor = Cursor::new(body_bytes);
                let result = TableMapEvent::decode(&mut cursor);
                match &result {
                    Ok(tm) => {
                        log::debug!("table-map cached for table_id {}", tm.table_id);
                        self.table_maps.insert(tm.clone());
                    }
                    Err(e) => log::warn!("table-map decode failed at {}: {e}", header.start_offset),
                }
                Ok(EventBody::TableMap(result?))
            }
            t if rows::is_rows_event_type(t) => {
                let mut peek = Cursor::new(body_bytes);
                let table_id = table_map::read_table_id(&mut peek)?;
                self.ensure_table_map(table_id, header.start_offset)?;
                let table_map = self.table_maps.get(table_id)?.clone();
                let body_len = (body_bytes.len() as u64).saturating_sub(4);
                let mut cursor = Cursor::new(body_bytes);
                match rows::decode(&mut cursor, t, body_len, &table_map) {
                    Ok(decoded) => Ok(EventBody::Rows(decoded)),
                    Err(e) => {
                        log::warn!("rows event decode failed at {}: {e}", header.start_offset);
                        Err(e)
                    }
                }
            }
            _ => Ok(EventBody::Opaque),
        }
    }

    /// Locates and decodes a table-map earlier in the indexed event list
    /// whose `table_id` matches, without disturbing the caller's position.
    fn ensure_table_map(&mut self, table_id: u64, before_offset: u64) -> Result<()> {
        if self.table_maps.contains(table_id) {
            return Ok(());
        }
        let candidates: Vec<u64> = self
            .events
            .iter()
            .filter(|e| e.start_offset < before_offset && e.event_type == EventType::TableMapEvent)
            .map(|e| e.start_offset)
            .collect();

        let saved_position = self.source.position()?;
        for offset in candidates {
            self.source.seek(offset as i64, Whence::Start)?;
            let header = Self::read_header_at(&mut self.source, offset)?;
            let body_bytes = self.source.read_exact(header.body_len() as usize)?;
            let tm = TableMapEvent::decode(&mut Cursor::new(body_bytes))?;
            let found = tm.table_id == table_id;
            self.table_maps.insert(tm);
            if found {
                break;
            }
        }
        self.source.seek(saved_position as i64, Whence::Start)?;

        if self.table_maps.contains(table_id) {
            Ok(())
        } else {
            Err(BinlogError::UnknownTableId(table_id))
        }
    }
}

/// Lazy iterator over a session's indexed events, decoding each header+body
/// only when `next()` is called.
pub struct Events<'a, S> {
    session: &'a mut Session<S>,
    index: usize,
}

impl<'a, S: ByteSource> Iterator for Events<'a, S> {
    type Item = Result<DecodedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.session.events.len() {
            return None;
        }
        let result = self.session.event(self.index);
        self.index += 1;
        Some(result)
    }
}

impl<S: Follower> Session<S> {
    /// Opens an append-aware source, indexing whatever is available up to
    /// `preload_until` before returning.
    pub fn follow(source: S, config: SessionConfig, preload_until: u64) -> Result<Self> {
        let mut session = Self::open(source, config)?;
        session.state = SessionState::Following;
        while session.source.position()? < preload_until {
            if !session.index_one_more()? {
                break;
            }
        }
        session.followed_index = session.events.len();
        Ok(session)
    }

    /// Attempts to index (and leave decodable) one further event. Returns
    /// `Ok(false)` when the source is closed with nothing left to index.
    fn index_one_more(&mut self) -> Result<bool> {
        let pos = self.source.position()?;
        match self.source.length()? {
            Some(len) if pos < len => {
                self.index_available()?;
                Ok(true)
            }
            _ if self.source.is_closed() => Ok(false),
            _ => {
                std::thread::sleep(self.config.follow_poll_interval);
                Ok(true)
            }
        }
    }

    /// Blocks (subject to `follow_poll_interval`) until one more event is
    /// indexed and returns it decoded, or `Ok(None)` once the source is
    /// closed and fully drained.
    pub fn next_followed(&mut self) -> Result<Option<DecodedEvent>> {
        loop {
            if self.followed_index < self.events.len() {
                let index = self.followed_index;
                self.followed_index += 1;
                return Ok(Some(self.event(index)?));
            }
            if !self.index_one_more()? {
                return Ok(None);
            }
        }
    }
}
