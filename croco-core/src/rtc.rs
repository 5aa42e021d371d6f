//! Real-time-clock record codec.
//!
//! The cartridge keeps clock state for MBC3 games in a 48-byte record. Only
//! one field is interpreted on the host: an 8-byte little-endian Unix
//! timestamp at offset 40. Everything else is carried through untouched.
//!
//! The device stores that timestamp as *local wall-clock* seconds, while save
//! files on the host carry UTC. [`RtcRecord::to_utc`] and
//! [`RtcRecord::to_device_local`] convert between the two using a chrono
//! [`TimeZone`], resolving the offset at the instant being converted so the
//! pair round-trips across DST changes.

use std::fmt;

use chrono::offset::LocalResult;
use chrono::{DateTime, TimeZone};

use crate::error::RtcError;

/// Size of one RTC record in bytes.
pub const RTC_RECORD_SIZE: usize = 48;

/// Byte offset of the little-endian timestamp within the record.
const TIMESTAMP_OFFSET: usize = 40;

/// A 48-byte RTC record as exchanged with the cartridge.
#[derive(Clone, PartialEq, Eq)]
pub struct RtcRecord([u8; RTC_RECORD_SIZE]);

impl RtcRecord {
    pub fn from_bytes(bytes: [u8; RTC_RECORD_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copy a record out of a slice, which must be exactly 48 bytes long.
    pub fn from_slice(buf: &[u8]) -> Result<Self, RtcError> {
        let bytes: [u8; RTC_RECORD_SIZE] =
            buf.try_into().map_err(|_| RtcError::InvalidLength {
                expected: RTC_RECORD_SIZE,
                actual: buf.len(),
            })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; RTC_RECORD_SIZE] {
        &self.0
    }

    /// The timestamp field exactly as stored, without range checking.
    pub fn raw_timestamp(&self) -> u64 {
        let mut field = [0u8; 8];
        field.copy_from_slice(&self.0[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8]);
        u64::from_le_bytes(field)
    }

    /// The stored timestamp in seconds, range-checked against `i64::MAX`.
    pub fn timestamp(&self) -> Result<i64, RtcError> {
        decode_timestamp(self)
    }

    /// A copy of this record with the timestamp field replaced.
    pub fn with_timestamp(&self, secs: i64) -> Result<Self, RtcError> {
        encode_timestamp(self, secs)
    }

    /// Convert a record fetched from the device (local wall-clock seconds)
    /// into one carrying UTC seconds.
    pub fn to_utc<Tz: TimeZone>(&self, tz: &Tz) -> Result<Self, RtcError> {
        let local = self.timestamp()?;
        self.with_timestamp(device_local_to_utc(local, tz))
    }

    /// Convert a record carrying UTC seconds into the device's local
    /// wall-clock representation.
    pub fn to_device_local<Tz: TimeZone>(&self, tz: &Tz) -> Result<Self, RtcError> {
        let utc = self.timestamp()?;
        self.with_timestamp(utc_to_device_local(utc, tz))
    }
}

impl fmt::Debug for RtcRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcRecord")
            .field("timestamp", &self.raw_timestamp())
            .finish_non_exhaustive()
    }
}

/// Read the timestamp at offset 40 as UTC epoch seconds.
///
/// Values above `i64::MAX` are refused rather than wrapped, since every
/// downstream calculation (zone offsets, chrono conversions) is signed.
pub fn decode_timestamp(record: &RtcRecord) -> Result<i64, RtcError> {
    let raw = record.raw_timestamp();
    i64::try_from(raw).map_err(|_| RtcError::TimestampOutOfRange(raw))
}

/// Return a copy of `record` with bytes 40..48 replaced by `secs`.
pub fn encode_timestamp(record: &RtcRecord, secs: i64) -> Result<RtcRecord, RtcError> {
    let value = u64::try_from(secs).map_err(|_| RtcError::NegativeTimestamp(secs))?;
    let mut bytes = record.0;
    bytes[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8].copy_from_slice(&value.to_le_bytes());
    Ok(RtcRecord(bytes))
}

/// Interpret `local_secs` as a wall-clock time in `tz` and return the UTC
/// instant it names.
///
/// Ambiguous wall-clock times (DST fold) resolve to the earlier instant.
/// Times that do not exist in `tz` (DST gap) are returned unchanged.
pub fn device_local_to_utc<Tz: TimeZone>(local_secs: i64, tz: &Tz) -> i64 {
    let Some(wall) = DateTime::from_timestamp(local_secs, 0).map(|dt| dt.naive_utc()) else {
        log::warn!("RTC timestamp {} is outside the calendar range", local_secs);
        return local_secs;
    };
    match tz.from_local_datetime(&wall) {
        LocalResult::Single(dt) => dt.timestamp(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp(),
        LocalResult::None => {
            log::warn!("RTC wall-clock time {} does not exist in the host zone", wall);
            local_secs
        }
    }
}

/// Express the UTC instant `utc_secs` as wall-clock seconds in `tz`.
pub fn utc_to_device_local<Tz: TimeZone>(utc_secs: i64, tz: &Tz) -> i64 {
    match tz.timestamp_opt(utc_secs, 0) {
        LocalResult::Single(dt) => dt.naive_local().and_utc().timestamp(),
        _ => {
            log::warn!("RTC timestamp {} is outside the calendar range", utc_secs);
            utc_secs
        }
    }
}

#[cfg(test)]
#[path = "tests/rtc_tests.rs"]
mod tests;
