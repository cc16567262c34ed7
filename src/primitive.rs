//! Little-endian primitive readers and the MySQL packed-integer format.
//!
//! https://dev.mysql.com/doc/internals/en/integer.html

use std::io::Read;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::error::{BinlogError, Result};

fn short_read(want: usize, err: std::io::Error) -> BinlogError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        BinlogError::ShortRead { want, got: 0 }
    } else {
        BinlogError::Io(err)
    }
}

/// Reads exactly `n` bytes, failing with `ShortRead` on a truncated stream.
pub fn read_exact<R: Read>(r: &mut R, n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf).map_err(|e| short_read(n, e))?;
    Ok(buf)
}

pub fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    r.read_u8().map_err(|e| short_read(1, e))
}

pub fn read_u16<R: Read>(r: &mut R) -> Result<u16> {
    r.read_u16::<LittleEndian>().map_err(|e| short_read(2, e))
}

/// Reads a 24-bit little-endian integer, zero-extended into a u32.
pub fn read_u24<R: Read>(r: &mut R) -> Result<u32> {
    let b = read_exact(r, 3)?;
    Ok(u32::from(b[0]) | (u32::from(b[1]) << 8) | (u32::from(b[2]) << 16))
}

pub fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    r.read_u32::<LittleEndian>().map_err(|e| short_read(4, e))
}

/// Reads a 24-bit big-endian integer, zero-extended into a u32.
pub fn read_u24_be<R: Read>(r: &mut R) -> Result<u32> {
    r.read_u24::<BigEndian>().map_err(|e| short_read(3, e))
}

pub fn read_u32_be<R: Read>(r: &mut R) -> Result<u32> {
    r.read_u32::<BigEndian>().map_err(|e| short_read(4, e))
}

pub fn read_u64<R: Read>(r: &mut R) -> Result<u64> {
    r.read_u64::<LittleEndian>().map_err(|e| short_read(8, e))
}

/// Reads a null-terminated string, consuming and discarding the terminator.
pub fn read_null_terminated_string<R: Read>(r: &mut R) -> Result<String> {
    let mut buf = Vec::new();
    loop {
        let b = read_u8(r)?;
        if b == 0 {
            break;
        }
        buf.push(b);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Wraps a reader and counts bytes consumed through it, so a caller can tell
/// how far into a fixed-length body a sequence of reads has advanced without
/// the underlying reader supporting `Seek`/`position()`.
pub struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        CountingReader { inner, count: 0 }
    }

    pub fn bytes_read(&self) -> u64 {
        self.count
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Reads a MySQL "packed" (length-encoded) integer.
///
/// `0xFB` and `0xFF` are reserved/error markers and never valid in a binlog.
pub fn read_packed_int<R: Read>(r: &mut R) -> Result<u64> {
    let marker = read_u8(r)?;
    match marker {
        0x00..=0xFA => Ok(u64::from(marker)),
        0xFB | 0xFF => Err(BinlogError::MalformedPackedInt(marker)),
        0xFC => Ok(u64::from(read_u16(r)?)),
        0xFD => {
            let b = read_exact(r, 3)?;
            Ok(u64::from(b[0]) | (u64::from(b[1]) << 8) | (u64::from(b[2]) << 16))
        }
        0xFE => read_u64(r),
    }
}
