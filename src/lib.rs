//! A MySQL v4 binlog reader: parses the event stream into a typed `Session`
//! that supports full-scan, random-access and follow (tailing) consumption.
//!
//! ```no_run
//! use mysql_binlog_reader::{ByteSource, ReadSeekSource, Session, SessionConfig};
//! use std::fs::File;
//!
//! # fn main() -> mysql_binlog_reader::Result<()> {
//! let file = File::open("binlog.000001")?;
//! let mut session = Session::open(ReadSeekSource::new(file), SessionConfig::default())?;
//! for event in session.events() {
//!     let event = event?;
//!     println!("{:?}", event.header.event_type);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bitset;
pub mod byte_source;
pub mod cell;
pub mod column;
pub mod config;
pub mod error;
pub mod event;
pub mod primitive;
pub mod rows;
pub mod session;
pub mod table_map;
pub mod temporal;

pub use byte_source::{AppendableBuffer, ByteSource, Follower, ReadSeekSource, Whence};
pub use cell::CellValue;
pub use column::{ColumnMetadata, MysqlType};
pub use config::SessionConfig;
pub use error::{BinlogError, Result};
pub use event::{EventHeader, EventType};
pub use rows::{RowCell, RowImage, RowsEvent};
pub use session::{DecodedEvent, EventBody, Session, SessionState};
pub use table_map::{TableMapCache, TableMapEvent};
