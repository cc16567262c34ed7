//! The `ByteSource` / `Follower` contracts a `Session` is built against.
//! File-system tailing itself is out of scope; this module only ships the
//! trait and an in-memory adapter sufficient to drive and test follow mode.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{BinlogError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// A seekable, length-known byte stream a `Session` reads from.
pub trait ByteSource {
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>>;
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;
    fn position(&mut self) -> Result<u64>;
    /// `None` when the total length isn't knowable up front (e.g. a growing file).
    fn length(&mut self) -> Result<Option<u64>>;
}

/// Follow-mode sources additionally block on empty reads until either more
/// bytes are appended or the source is closed.
pub trait Follower: ByteSource {
    /// True once the source has been closed and no more bytes will arrive.
    fn is_closed(&self) -> bool;
}

/// Blanket adapter over any `Read + Seek`, for file-mode sessions.
pub struct ReadSeekSource<T> {
    inner: T,
}

impl<T: Read + Seek> ReadSeekSource<T> {
    pub fn new(inner: T) -> Self {
        ReadSeekSource { inner }
    }
}

impl<T: Read + Seek> ByteSource for ReadSeekSource<T> {
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => BinlogError::ShortRead { want: n, got: 0 },
                _ => BinlogError::Io(e),
            })?;
        Ok(buf)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let from = match whence {
            Whence::Start => SeekFrom::Start(offset as u64),
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        self.inner
            .seek(from)
            .map_err(|_| BinlogError::OutOfRange)
    }

    fn position(&mut self) -> Result<u64> {
        self.inner
            .seek(SeekFrom::Current(0))
            .map_err(BinlogError::Io)
    }

    fn length(&mut self) -> Result<Option<u64>> {
        let current = self.position()?;
        let end = self
            .inner
            .seek(SeekFrom::End(0))
            .map_err(BinlogError::Io)?;
        self.inner
            .seek(SeekFrom::Start(current))
            .map_err(BinlogError::Io)?;
        Ok(Some(end))
    }
}

/// An in-memory, append-only byte buffer for follow mode: bytes can be
/// appended from outside while a `Session` is reading from it, and `close()`
/// causes pending/future reads past the end to fail with `Cancelled` rather
/// than block forever.
#[derive(Debug, Default)]
pub struct AppendableBuffer {
    buf: Vec<u8>,
    offset: usize,
    closed: bool,
}

impl AppendableBuffer {
    pub fn new() -> Self {
        AppendableBuffer {
            buf: Vec::new(),
            offset: 0,
            closed: false,
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl ByteSource for AppendableBuffer {
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        if self.offset + n > self.buf.len() {
            if self.closed {
                return Err(BinlogError::Cancelled);
            }
            return Err(BinlogError::ShortRead {
                want: n,
                got: self.buf.len() - self.offset,
            });
        }
        let out = self.buf[self.offset..self.offset + n].to_vec();
        self.offset += n;
        Ok(out)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let base = match whence {
            Whence::Start => 0i64,
            Whence::Current => self.offset as i64,
            Whence::End => self.buf.len() as i64,
        };
        let new_offset = base + offset;
        if new_offset < 0 || new_offset as usize > self.buf.len() {
            return Err(BinlogError::OutOfRange);
        }
        self.offset = new_offset as usize;
        Ok(self.offset as u64)
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.offset as u64)
    }

    fn length(&mut self) -> Result<Option<u64>> {
        Ok(Some(self.buf.len() as u64))
    }
}

impl Follower for AppendableBuffer {
    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_seek_source_reads_and_seeks() {
        let mut src = ReadSeekSource::new(Cursor::new(vec![1, 2, 3, 4, 5]));
        assert_eq!(src.read_exact(2).unwrap(), vec![1, 2]);
        assert_eq!(src.position().unwrap(), 2);
        src.seek(0, Whence::Start).unwrap();
        assert_eq!(src.read_exact(1).unwrap(), vec![1]);
        assert_eq!(src.length().unwrap(), Some(5));
    }

    #[test]
    fn appendable_buffer_short_read_before_close() {
        let mut buf = AppendableBuffer::new();
        buf.append(&[1, 2]);
        match buf.read_exact(5) {
            Err(BinlogError::ShortRead { want: 5, got: 2 }) => {}
            other => panic!("expected ShortRead, got {other:?}"),
        }
    }

    #[test]
    fn appendable_buffer_reads_after_more_bytes_arrive() {
        let mut buf = AppendableBuffer::new();
        buf.append(&[1, 2]);
        assert!(buf.read_exact(3).is_err());
        buf.append(&[3]);
        assert_eq!(buf.read_exact(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn appendable_buffer_cancelled_once_closed() {
        let mut buf = AppendableBuffer::new();
        buf.append(&[1]);
        buf.close();
        match buf.read_exact(2) {
            Err(BinlogError::Cancelled) => {}
            other => panic!("expected Cancelled, got {other:?}"),
        }
        assert!(buf.is_closed());
    }
}
