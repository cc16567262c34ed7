//! Bit-packed date/time column decoding.
//!
//! Unlike most of the wire format, these fields are loaded as a single
//! big-endian integer of the payload width and then bit-unpacked; fractional
//! seconds follow the payload as a separately-sized, left-padded field.

use std::io::Read;

use crate::error::Result;
use crate::primitive;

/// A calendar date. `{0,0,0}` is MySQL's "zero date" sentinel and is passed
/// through unchanged rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde_derive::Serialize)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// A TIME value: a signed duration, not a time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde_derive::Serialize)]
pub struct TimeOfDay {
    pub negative: bool,
    pub hours: u16,
    pub minutes: u8,
    pub seconds: u8,
    pub microseconds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde_derive::Serialize)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microseconds: i32,
}

/// A TIMESTAMP value: seconds since the Unix epoch in UTC, plus fractional
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde_derive::Serialize)]
pub struct TimestampInstant {
    pub unix_seconds: u32,
    pub microseconds: i32,
}

/// fsp 0 -> 0 bytes, 1-2 -> 1, 3-4 -> 2, 5-6 -> 3.
fn fractional_seconds_pack_size(fsp: u8) -> usize {
    match fsp {
        1 | 2 => 1,
        3 | 4 => 2,
        5 | 6 => 3,
        _ => 0,
    }
}

/// Reads the fractional-seconds suffix for a given fsp, left-padding the
/// big-endian payload to 4 bytes and sign-extending into a signed microsecond
/// count.
fn read_fractional_seconds<R: Read>(r: &mut R, fsp: u8) -> Result<i32> {
    let pack_size = fractional_seconds_pack_size(fsp);
    if pack_size == 0 {
        return Ok(0);
    }
    let payload = primitive::read_exact(r, pack_size)?;
    let sign_byte = if payload[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut padded = [sign_byte; 4];
    padded[4 - pack_size..].copy_from_slice(&payload);
    Ok(i32::from_be_bytes(padded))
}

/// DATE: 3 bytes, little-endian. year[9..23](15) | month[5..8](4) | day[0..4](5).
pub fn read_date<R: Read>(r: &mut R) -> Result<Date> {
    let value = primitive::read_u24(r)?;
    Ok(Date {
        year: ((value >> 9) & 0x7FFF) as u16,
        month: ((value >> 5) & 0xF) as u8,
        day: (value & 0x1F) as u8,
    })
}

/// TIME_V2: 3 bytes, big-endian. sign(1) | reserved(1) | hour(10) | minute(6) | second(6).
///
/// A set sign bit (bit 23) means non-negative, stored with an additive bias;
/// a clear sign bit means the magnitude was stored inverted and the value is
/// negative (see DESIGN.md's open-question resolutions).
pub fn read_time_v2<R: Read>(r: &mut R, fsp: u8) -> Result<TimeOfDay> {
    let raw = primitive::read_u24_be(r)?;
    let negative = raw & 0x800000 == 0;
    let magnitude = if negative { (!raw) & 0x7FFFFF } else { raw & 0x7FFFFF };
    let hours = ((magnitude >> 12) & 0x3FF) as u16;
    let minutes = ((magnitude >> 6) & 0x3F) as u8;
    let seconds = (magnitude & 0x3F) as u8;
    let microseconds = read_fractional_seconds(r, fsp)?;
    Ok(TimeOfDay {
        negative,
        hours,
        minutes,
        seconds,
        microseconds,
    })
}

/// TIMESTAMP_V2: 4 bytes, big-endian seconds since the Unix epoch, then fsp bytes.
pub fn read_timestamp_v2<R: Read>(r: &mut R, fsp: u8) -> Result<TimestampInstant> {
    let unix_seconds = primitive::read_u32_be(r)?;
    let microseconds = read_fractional_seconds(r, fsp)?;
    Ok(TimestampInstant {
        unix_seconds,
        microseconds,
    })
}

/// DATETIME_V2: 5 bytes, big-endian.
/// sign(1) | year*13+month(17) | day(5) | hour(5) | minute(6) | second(6).
pub fn read_datetime_v2<R: Read>(r: &mut R, fsp: u8) -> Result<DateTime> {
    let payload = primitive::read_exact(r, 5)?;
    let mut buf = [0u8; 8];
    buf[3..].copy_from_slice(&payload);
    let value = u64::from_be_bytes(buf);

    let magnitude = value & 0x7F_FFFF_FFFF; // clear the sign bit (bit 39)
    let year_month = (magnitude >> 22) & 0x1FFFF;
    let day = (magnitude >> 17) & 0x1F;
    let hour = (magnitude >> 12) & 0x1F;
    let minute = (magnitude >> 6) & 0x3F;
    let second = magnitude & 0x3F;

    let microseconds = read_fractional_seconds(r, fsp)?;

    Ok(DateTime {
        year: (year_month / 13) as u16,
        month: (year_month % 13) as u8,
        day: day as u8,
        hour: hour as u8,
        minute: minute as u8,
        second: second as u8,
        microseconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn date_decodes_year_month_day() {
        // 2015-06-04 encodes to 84 C5 0F little-endian.
        let mut c = Cursor::new(vec![0x84, 0xC5, 0x0F]);
        let date = read_date(&mut c).unwrap();
        assert_eq!(date.year, 2015);
        assert_eq!(date.month, 6);
        assert_eq!(date.day, 4);
    }

    #[test]
    fn zero_date_passes_through() {
        let mut c = Cursor::new(vec![0x00, 0x00, 0x00]);
        let date = read_date(&mut c).unwrap();
        assert_eq!(date, Date { year: 0, month: 0, day: 0 });
    }

    #[test]
    fn time_v2_positive() {
        // sign bit set (bit23), hour=12, minute=30, second=5
        let magnitude: u32 = (12u32 << 12) | (30u32 << 6) | 5u32;
        let raw = magnitude | 0x800000;
        let mut c = Cursor::new(raw.to_be_bytes()[1..].to_vec());
        let t = read_time_v2(&mut c, 0).unwrap();
        assert!(!t.negative);
        assert_eq!(t.hours, 12);
        assert_eq!(t.minutes, 30);
        assert_eq!(t.seconds, 5);
    }

    #[test]
    fn time_v2_negative() {
        let magnitude: u32 = (1u32 << 12) | (2u32 << 6) | 3u32;
        let raw = (!magnitude) & 0x7FFFFF; // sign bit clear => negative
        let mut c = Cursor::new(raw.to_be_bytes()[1..].to_vec());
        let t = read_time_v2(&mut c, 0).unwrap();
        assert!(t.negative);
        assert_eq!(t.hours, 1);
        assert_eq!(t.minutes, 2);
        assert_eq!(t.seconds, 3);
    }

    #[test]
    fn timestamp_v2_no_fsp() {
        let mut c = Cursor::new(vec![0x5C, 0x6D, 0x1A, 0x00]); // arbitrary big-endian u32
        let ts = read_timestamp_v2(&mut c, 0).unwrap();
        assert_eq!(ts.unix_seconds, 0x5C6D1A00);
        assert_eq!(ts.microseconds, 0);
    }

    #[test]
    fn datetime_v2_decomposes_year_month() {
        // year=2015, month=6 => year*13+month = 26201
        let year_month: u64 = 2015 * 13 + 6;
        let day = 4u64;
        let hour = 10u64;
        let minute = 20u64;
        let second = 30u64;
        let magnitude = (year_month << 22) | (day << 17) | (hour << 12) | (minute << 6) | second;
        let sign_bit = 1u64 << 39;
        let value = magnitude | sign_bit;
        let bytes = value.to_be_bytes();
        let mut c = Cursor::new(bytes[3..].to_vec());
        let dt = read_datetime_v2(&mut c, 0).unwrap();
        assert_eq!(dt.year, 2015);
        assert_eq!(dt.month, 6);
        assert_eq!(dt.day, 4);
        assert_eq!(dt.hour, 10);
        assert_eq!(dt.minute, 20);
        assert_eq!(dt.second, 30);
    }

    #[test]
    fn fractional_seconds_pack_sizes() {
        assert_eq!(fractional_seconds_pack_size(0), 0);
        assert_eq!(fractional_seconds_pack_size(1), 1);
        assert_eq!(fractional_seconds_pack_size(2), 1);
        assert_eq!(fractional_seconds_pack_size(3), 2);
        assert_eq!(fractional_seconds_pack_size(4), 2);
        assert_eq!(fractional_seconds_pack_size(5), 3);
        assert_eq!(fractional_seconds_pack_size(6), 3);
    }
}
