//! Decoding of fixed-size `input_event` records.
//!
//! A record is 24 bytes: a 16-byte timestamp followed by `type: u16`,
//! `code: u16` and `value: i32`. Only the last three fields are decoded.

use std::num::NonZeroUsize;

use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;

use crate::stream::{records, StreamError};

/// Size of one record in bytes.
pub const EVENT_SIZE: usize = 24;

/// [`EVENT_SIZE`] as a reframer record size.
pub const EVENT_RECORD_SIZE: NonZeroUsize = match NonZeroUsize::new(EVENT_SIZE) {
    Some(size) => size,
    None => panic!("record size must be non-zero"),
};

pub const OFFSET_TYPE: usize = 16;
pub const OFFSET_CODE: usize = 18;
pub const OFFSET_VALUE: usize = 20;

/// Absolute axis event type.
pub const EV_ABS: u16 = 3;
pub const ABS_HAT0X: u16 = 16;
pub const ABS_HAT0Y: u16 = 17;
pub const ABS_HAT1X: u16 = 18;
pub const ABS_HAT1Y: u16 = 19;

/// One decoded input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputEvent {
    #[serde(rename = "type")]
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    /// Decode the type, code and value fields of `record`.
    #[must_use]
    pub fn decode(record: &[u8; EVENT_SIZE], little_endian: bool) -> Self {
        let u16_at = |at: usize| {
            let bytes = [record[at], record[at + 1]];
            if little_endian {
                u16::from_le_bytes(bytes)
            } else {
                u16::from_be_bytes(bytes)
            }
        };
        let bytes = [
            record[OFFSET_VALUE],
            record[OFFSET_VALUE + 1],
            record[OFFSET_VALUE + 2],
            record[OFFSET_VALUE + 3],
        ];
        let value = if little_endian {
            i32::from_le_bytes(bytes)
        } else {
            i32::from_be_bytes(bytes)
        };
        Self {
            kind: u16_at(OFFSET_TYPE),
            code: u16_at(OFFSET_CODE),
            value,
        }
    }

    /// Decode a record given as a slice.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::RecordSize` unless `record` is exactly
    /// [`EVENT_SIZE`] bytes long.
    pub fn from_slice(record: &[u8], little_endian: bool) -> Result<Self, StreamError> {
        let record: &[u8; EVENT_SIZE] = record.try_into().map_err(|_| StreamError::RecordSize {
            expected: EVENT_SIZE,
            actual: record.len(),
        })?;
        Ok(Self::decode(record, little_endian))
    }

    #[must_use]
    pub fn is_abs(&self) -> bool {
        self.kind == EV_ABS
    }

    /// Balance-board sensor index carried by a hat axis event.
    ///
    /// The four hat axes map to sensors 0 to 3 in the order
    /// `HAT0X`, `HAT1X`, `HAT0Y`, `HAT1Y`.
    #[must_use]
    pub fn weight_index(&self) -> Option<usize> {
        if !self.is_abs() {
            return None;
        }
        match self.code {
            ABS_HAT0X => Some(0),
            ABS_HAT1X => Some(1),
            ABS_HAT0Y => Some(2),
            ABS_HAT1Y => Some(3),
            _ => None,
        }
    }
}

/// Decode input events from a stream of arbitrary byte chunks.
///
/// A partial record at end of input is dropped.
pub fn input_events<S, B>(chunks: S, little_endian: bool) -> impl Stream<Item = Result<InputEvent, StreamError>>
where
    S: Stream<Item = Result<B, StreamError>>,
    B: AsRef<[u8]>,
{
    records(EVENT_RECORD_SIZE, chunks)
        .map(move |record| record.and_then(|record| InputEvent::from_slice(&record, little_endian)))
}
