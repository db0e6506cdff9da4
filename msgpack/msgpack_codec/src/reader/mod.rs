// Copyright 2015-2024 Swim Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::borrow::Cow;
use std::str::Utf8Error;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::code::{self, extension, MessagePackType};
use crate::ext::{ExtensionHeader, ExtensionResult};
use crate::sequence::{SequenceReader, SequenceSlice};
use crate::timestamp::{Timestamp, NANOS_PER_SECOND};


/// Errors that can occur decoding MessagePack data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MsgPackReadError {
    #[error("Unexpected code {code:#04x} ({name}).")]
    InvalidCode { code: u8, name: &'static str },
    #[error("The input ended before the value was complete.")]
    EndOfStream,
    #[error("The maximum object graph depth of {max_depth} was exceeded.")]
    DepthExceeded { max_depth: usize },
    #[error("The value with code {code:#04x} does not fit in a {target}.")]
    NumericOverflow { code: u8, target: &'static str },
    #[error("A string contained invalid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
    #[error("{0:#x} is not a valid character.")]
    InvalidChar(u32),
    #[error("Expected an extension of type {expected} but found type {actual}.")]
    UnexpectedExtension { expected: i8, actual: i8 },
    #[error("Invalid timestamp extension.")]
    InvalidTimestamp,
}

impl MsgPackReadError {
    /// A lead byte that is not valid in the current context.
    pub fn invalid_code(code: u8) -> Self {
        MsgPackReadError::InvalidCode {
            code,
            name: code::format_name(code),
        }
    }
}

macro_rules! require {
    ($e:expr) => {
        match $e {
            Some(value) => value,
            None => return Err(MsgPackReadError::EndOfStream),
        }
    };
}

macro_rules! or_incomplete {
    ($e:expr) => {
        match $e {
            Some(value) => value,
            None => return Ok(false),
        }
    };
}

macro_rules! integer_readers {
    ($($name:ident => $t:ty),*) => {
        $(
            #[doc = concat!("Read an integer of any encoding that fits in a `", stringify!($t), "`.")]
            pub fn $name(&mut self) -> Result<$t, MsgPackReadError> {
                let (code, value) = self.read_integer()?;
                <$t>::try_from(value).map_err(|_| MsgPackReadError::NumericOverflow {
                    code,
                    target: stringify!($t),
                })
            }
        )*
    };
}

/// Reads MessagePack tokens from a sequence of bytes. Each operation consumes exactly one
/// complete token and leaves the reader at the start of the next.
///
/// Cloning the reader produces an independent cursor over the same data which can be used
/// to look ahead.
///
/// When an operation fails the position of the reader is unspecified unless stated
/// otherwise and a new reader should be created to retry.
#[derive(Debug, Clone)]
pub struct MessagePackReader<'a> {
    cursor: SequenceReader<'a>,
    pub(crate) depth: usize,
}

impl<'a> MessagePackReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        MessagePackReader {
            cursor: SequenceReader::new(bytes),
            depth: 0,
        }
    }

    /// Read from a sequence that is split across several buffers.
    pub fn from_segments(chunks: &'a [Bytes]) -> Self {
        MessagePackReader {
            cursor: SequenceReader::from_segments(chunks),
            depth: 0,
        }
    }

    pub fn consumed(&self) -> usize {
        self.cursor.consumed()
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub fn end(&self) -> bool {
        self.cursor.end()
    }

    /// The number of containers that have been entered through a depth step.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The lead byte of the next token.
    pub fn next_code(&self) -> Result<u8, MsgPackReadError> {
        self.cursor.try_peek().ok_or(MsgPackReadError::EndOfStream)
    }

    pub fn next_type(&self) -> Result<MessagePackType, MsgPackReadError> {
        self.next_code().map(code::type_of)
    }

    pub fn is_nil(&self) -> Result<bool, MsgPackReadError> {
        Ok(self.next_code()? == code::NIL)
    }

    fn read_code(&mut self) -> Result<u8, MsgPackReadError> {
        self.cursor.try_read().ok_or(MsgPackReadError::EndOfStream)
    }

    /// Consume the next token if it is nil.
    pub fn try_read_nil(&mut self) -> Result<bool, MsgPackReadError> {
        if self.is_nil()? {
            self.cursor.advance(1).map_err(|_| MsgPackReadError::EndOfStream)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn read_nil(&mut self) -> Result<(), MsgPackReadError> {
        match self.read_code()? {
            code::NIL => Ok(()),
            ow => Err(MsgPackReadError::invalid_code(ow)),
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, MsgPackReadError> {
        match self.read_code()? {
            code::FALSE => Ok(false),
            code::TRUE => Ok(true),
            ow => Err(MsgPackReadError::invalid_code(ow)),
        }
    }

    // Read any integer encoding, widened so that every value can be represented.
    fn read_integer(&mut self) -> Result<(u8, i128), MsgPackReadError> {
        let code = self.read_code()?;
        let cursor = &mut self.cursor;
        let value = match code {
            code::MIN_FIX_INT..=code::MAX_FIX_INT => i128::from(code),
            code::MIN_NEGATIVE_FIX_INT..=code::MAX_NEGATIVE_FIX_INT => i128::from(code as i8),
            code::UINT8 => i128::from(require!(cursor.try_read_big_endian::<u8>())),
            code::UINT16 => i128::from(require!(cursor.try_read_big_endian::<u16>())),
            code::UINT32 => i128::from(require!(cursor.try_read_big_endian::<u32>())),
            code::UINT64 => i128::from(require!(cursor.try_read_big_endian::<u64>())),
            code::INT8 => i128::from(require!(cursor.try_read_big_endian::<i8>())),
            code::INT16 => i128::from(require!(cursor.try_read_big_endian::<i16>())),
            code::INT32 => i128::from(require!(cursor.try_read_big_endian::<i32>())),
            code::INT64 => i128::from(require!(cursor.try_read_big_endian::<i64>())),
            ow => return Err(MsgPackReadError::invalid_code(ow)),
        };
        Ok((code, value))
    }

    integer_readers! {
        read_u8 => u8,
        read_u16 => u16,
        read_u32 => u32,
        read_u64 => u64,
        read_i8 => i8,
        read_i16 => i16,
        read_i32 => i32,
        read_i64 => i64
    }

    /// Read a character, encoded as its scalar value.
    pub fn read_char(&mut self) -> Result<char, MsgPackReadError> {
        let value = self.read_u32()?;
        char::from_u32(value).ok_or(MsgPackReadError::InvalidChar(value))
    }

    /// Read any integer or floating point encoding as an `f32`. This may lose precision.
    pub fn read_f32(&mut self) -> Result<f32, MsgPackReadError> {
        match self.next_code()? {
            code::FLOAT32 => {
                self.read_code()?;
                Ok(require!(self.cursor.try_read_big_endian::<f32>()))
            }
            code::FLOAT64 => {
                self.read_code()?;
                Ok(require!(self.cursor.try_read_big_endian::<f64>()) as f32)
            }
            _ => self.read_integer().map(|(_, value)| value as f32),
        }
    }

    /// Read any integer or floating point encoding as an `f64`.
    pub fn read_f64(&mut self) -> Result<f64, MsgPackReadError> {
        match self.next_code()? {
            code::FLOAT32 => {
                self.read_code()?;
                Ok(f64::from(require!(self.cursor.try_read_big_endian::<f32>())))
            }
            code::FLOAT64 => {
                self.read_code()?;
                Ok(require!(self.cursor.try_read_big_endian::<f64>()))
            }
            _ => self.read_integer().map(|(_, value)| value as f64),
        }
    }

    /// Decode an array header. If the header is incomplete, nothing is consumed and `None`
    /// is returned. The count is not checked against the available data.
    pub fn try_read_array_header(&mut self) -> Result<Option<u32>, MsgPackReadError> {
        let mut cursor = self.cursor;
        let Some(code) = cursor.try_read() else {
            return Ok(None);
        };
        let count = match code {
            code::MIN_FIX_ARRAY..=code::MAX_FIX_ARRAY => Some(u32::from(code & 0x0f)),
            code::ARRAY16 => cursor.try_read_big_endian::<u16>().map(u32::from),
            code::ARRAY32 => cursor.try_read_big_endian::<u32>(),
            ow => return Err(MsgPackReadError::invalid_code(ow)),
        };
        if count.is_some() {
            self.cursor = cursor;
        }
        Ok(count)
    }

    /// Read an array header. Fails if the input could not possibly contain the number of
    /// elements that the header declares.
    pub fn read_array_header(&mut self) -> Result<u32, MsgPackReadError> {
        let count = require!(self.try_read_array_header()?);
        if count as usize > self.remaining() {
            Err(MsgPackReadError::EndOfStream)
        } else {
            Ok(count)
        }
    }

    /// Decode a map header (the number of entries). If the header is incomplete, nothing is
    /// consumed and `None` is returned. The count is not checked against the available data.
    pub fn try_read_map_header(&mut self) -> Result<Option<u32>, MsgPackReadError> {
        let mut cursor = self.cursor;
        let Some(code) = cursor.try_read() else {
            return Ok(None);
        };
        let count = match code {
            code::MIN_FIX_MAP..=code::MAX_FIX_MAP => Some(u32::from(code & 0x0f)),
            code::MAP16 => cursor.try_read_big_endian::<u16>().map(u32::from),
            code::MAP32 => cursor.try_read_big_endian::<u32>(),
            ow => return Err(MsgPackReadError::invalid_code(ow)),
        };
        if count.is_some() {
            self.cursor = cursor;
        }
        Ok(count)
    }

    /// Read a map header. Fails if the input could not possibly contain the number of
    /// entries that the header declares.
    pub fn read_map_header(&mut self) -> Result<u32, MsgPackReadError> {
        let count = require!(self.try_read_map_header()?);
        if 2 * u64::from(count) > self.remaining() as u64 {
            Err(MsgPackReadError::EndOfStream)
        } else {
            Ok(count)
        }
    }

    fn try_read_str_header(
        cursor: &mut SequenceReader<'a>,
    ) -> Result<Option<u32>, MsgPackReadError> {
        let code = match cursor.try_read() {
            Some(code) => code,
            None => return Ok(None),
        };
        Ok(match code {
            code::MIN_FIX_STR..=code::MAX_FIX_STR => Some(u32::from(code & 0x1f)),
            code::STR8 => cursor.try_read_big_endian::<u8>().map(u32::from),
            code::STR16 => cursor.try_read_big_endian::<u16>().map(u32::from),
            code::STR32 => cursor.try_read_big_endian::<u32>(),
            ow => return Err(MsgPackReadError::invalid_code(ow)),
        })
    }

    /// Read the header of a string, giving its length in bytes.
    pub fn read_str_header(&mut self) -> Result<u32, MsgPackReadError> {
        Ok(require!(Self::try_read_str_header(&mut self.cursor)?))
    }

    /// Read a string that lies within a single buffer, without copying. If the next token
    /// is nil or the string is split across buffers, `None` is returned and nothing is
    /// consumed.
    pub fn try_read_string_span(&mut self) -> Result<Option<&'a [u8]>, MsgPackReadError> {
        if self.is_nil()? {
            return Ok(None);
        }
        let mut cursor = self.cursor;
        let len = require!(Self::try_read_str_header(&mut cursor)?);
        let slice = require!(cursor.take(len as usize));
        Ok(slice.as_contiguous().map(|span| {
            self.cursor = cursor;
            span
        }))
    }

    /// Read the bytes of a string as a view that may span several buffers.
    pub fn read_string_sequence(&mut self) -> Result<Option<SequenceSlice<'a>>, MsgPackReadError> {
        if self.try_read_nil()? {
            return Ok(None);
        }
        let len = self.read_str_header()?;
        Ok(Some(require!(self.cursor.take(len as usize))))
    }

    /// Read a string, borrowing it from the input if it is contiguous.
    pub fn read_str(&mut self) -> Result<Option<Cow<'a, str>>, MsgPackReadError> {
        let Some(slice) = self.read_string_sequence()? else {
            return Ok(None);
        };
        let string = match slice.as_contiguous() {
            Some(span) => Cow::Borrowed(std::str::from_utf8(span)?),
            None => Cow::Owned(String::from_utf8(slice.to_vec()).map_err(|e| e.utf8_error())?),
        };
        Ok(Some(string))
    }

    pub fn read_string(&mut self) -> Result<Option<String>, MsgPackReadError> {
        Ok(self.read_str()?.map(Cow::into_owned))
    }

    fn try_read_bin_header(cursor: &mut SequenceReader<'a>) -> Result<Option<u32>, MsgPackReadError> {
        let code = match cursor.try_peek() {
            Some(code) => code,
            None => return Ok(None),
        };
        match code {
            code::BIN8 => {
                cursor.try_read();
                Ok(cursor.try_read_big_endian::<u8>().map(u32::from))
            }
            code::BIN16 => {
                cursor.try_read();
                Ok(cursor.try_read_big_endian::<u16>().map(u32::from))
            }
            code::BIN32 => {
                cursor.try_read();
                Ok(cursor.try_read_big_endian::<u32>())
            }
            //Data written under the old specification stores binary as strings.
            _ => Self::try_read_str_header(cursor),
        }
    }

    /// Read the header of a binary blob, giving its length. String codes are also accepted.
    pub fn read_bin_header(&mut self) -> Result<u32, MsgPackReadError> {
        Ok(require!(Self::try_read_bin_header(&mut self.cursor)?))
    }

    /// Read a binary blob as a view that may span several buffers.
    pub fn read_bytes(&mut self) -> Result<Option<SequenceSlice<'a>>, MsgPackReadError> {
        if self.try_read_nil()? {
            return Ok(None);
        }
        let len = self.read_bin_header()?;
        Ok(Some(require!(self.cursor.take(len as usize))))
    }

    /// Decode an extension header. If the header is incomplete, nothing is consumed and
    /// `None` is returned. The length is not checked against the available data.
    pub fn try_read_ext_header(&mut self) -> Result<Option<ExtensionHeader>, MsgPackReadError> {
        let mut cursor = self.cursor;
        let Some(code) = cursor.try_read() else {
            return Ok(None);
        };
        let length = match code {
            code::FIX_EXT1 => Some(1),
            code::FIX_EXT2 => Some(2),
            code::FIX_EXT4 => Some(4),
            code::FIX_EXT8 => Some(8),
            code::FIX_EXT16 => Some(16),
            code::EXT8 => cursor.try_read_big_endian::<u8>().map(u32::from),
            code::EXT16 => cursor.try_read_big_endian::<u16>().map(u32::from),
            code::EXT32 => cursor.try_read_big_endian::<u32>(),
            ow => return Err(MsgPackReadError::invalid_code(ow)),
        };
        let header = match (length, cursor.try_read_big_endian::<i8>()) {
            (Some(length), Some(type_code)) => ExtensionHeader::new(type_code, length),
            _ => return Ok(None),
        };
        self.cursor = cursor;
        Ok(Some(header))
    }

    /// Read an extension header. Fails if the declared payload is longer than the
    /// remaining input.
    pub fn read_ext_header(&mut self) -> Result<ExtensionHeader, MsgPackReadError> {
        let header = require!(self.try_read_ext_header()?);
        if header.length as usize > self.remaining() {
            Err(MsgPackReadError::EndOfStream)
        } else {
            Ok(header)
        }
    }

    /// Read an extension, leaving its payload uninterpreted.
    pub fn read_ext(&mut self) -> Result<ExtensionResult<'a>, MsgPackReadError> {
        let ExtensionHeader { type_code, length } = self.read_ext_header()?;
        let data = require!(self.cursor.take(length as usize));
        Ok(ExtensionResult { type_code, data })
    }

    /// Read a timestamp extension in any of its three layouts.
    pub fn read_timestamp(&mut self) -> Result<Timestamp, MsgPackReadError> {
        let header = self.read_ext_header()?;
        if header.type_code != extension::TIMESTAMP {
            return Err(MsgPackReadError::UnexpectedExtension {
                expected: extension::TIMESTAMP,
                actual: header.type_code,
            });
        }
        let cursor = &mut self.cursor;
        let (seconds, nanoseconds) = match header.length {
            4 => (i64::from(require!(cursor.try_read_big_endian::<u32>())), 0),
            8 => {
                let packed = require!(cursor.try_read_big_endian::<u64>());
                ((packed & 0x3_ffff_ffff) as i64, (packed >> 34) as u32)
            }
            12 => {
                let nanoseconds = require!(cursor.try_read_big_endian::<u32>());
                let seconds = require!(cursor.try_read_big_endian::<i64>());
                (seconds, nanoseconds)
            }
            _ => return Err(MsgPackReadError::InvalidTimestamp),
        };
        if nanoseconds >= NANOS_PER_SECOND {
            return Err(MsgPackReadError::InvalidTimestamp);
        }
        Timestamp::new(seconds, nanoseconds).map_err(|_| MsgPackReadError::InvalidTimestamp)
    }

    pub fn read_datetime(&mut self) -> Result<DateTime<Utc>, MsgPackReadError> {
        self.read_timestamp()?
            .to_datetime()
            .ok_or(MsgPackReadError::InvalidTimestamp)
    }

    /// Attempt to move past the next complete token, including any nested values. If the
    /// input ends before the token is complete, nothing is consumed and `false` is returned.
    ///
    /// Nested values are tracked with a counter rather than by recursion so arbitrarily
    /// deep input can be skipped.
    pub fn try_skip(&mut self) -> Result<bool, MsgPackReadError> {
        let mut cursor = self.cursor;
        let mut pending: u64 = 1;
        while pending > 0 {
            //Every token needs at least one byte.
            if pending > cursor.remaining() as u64 {
                return Ok(false);
            }
            let code = or_incomplete!(cursor.try_read());
            pending -= 1;
            let (children, length) = match code {
                code::MIN_FIX_INT..=code::MAX_FIX_INT
                | code::MIN_NEGATIVE_FIX_INT..=code::MAX_NEGATIVE_FIX_INT
                | code::NIL
                | code::FALSE
                | code::TRUE => (0, 0),
                code::MIN_FIX_MAP..=code::MAX_FIX_MAP => (2 * u64::from(code & 0x0f), 0),
                code::MIN_FIX_ARRAY..=code::MAX_FIX_ARRAY => (u64::from(code & 0x0f), 0),
                code::MIN_FIX_STR..=code::MAX_FIX_STR => (0, usize::from(code & 0x1f)),
                code::UINT8 | code::INT8 => (0, 1),
                code::UINT16 | code::INT16 => (0, 2),
                code::UINT32 | code::INT32 | code::FLOAT32 => (0, 4),
                code::UINT64 | code::INT64 | code::FLOAT64 => (0, 8),
                code::STR8 | code::BIN8 => {
                    (0, usize::from(or_incomplete!(cursor.try_read_big_endian::<u8>())))
                }
                code::STR16 | code::BIN16 => {
                    (0, usize::from(or_incomplete!(cursor.try_read_big_endian::<u16>())))
                }
                code::STR32 | code::BIN32 => {
                    (0, or_incomplete!(cursor.try_read_big_endian::<u32>()) as usize)
                }
                code::ARRAY16 => (
                    u64::from(or_incomplete!(cursor.try_read_big_endian::<u16>())),
                    0,
                ),
                code::ARRAY32 => (
                    u64::from(or_incomplete!(cursor.try_read_big_endian::<u32>())),
                    0,
                ),
                code::MAP16 => (
                    2 * u64::from(or_incomplete!(cursor.try_read_big_endian::<u16>())),
                    0,
                ),
                code::MAP32 => (
                    2 * u64::from(or_incomplete!(cursor.try_read_big_endian::<u32>())),
                    0,
                ),
                //Extension payloads are preceded by the type byte.
                code::FIX_EXT1 => (0, 2),
                code::FIX_EXT2 => (0, 3),
                code::FIX_EXT4 => (0, 5),
                code::FIX_EXT8 => (0, 9),
                code::FIX_EXT16 => (0, 17),
                code::EXT8 => (
                    0,
                    usize::from(or_incomplete!(cursor.try_read_big_endian::<u8>())) + 1,
                ),
                code::EXT16 => (
                    0,
                    usize::from(or_incomplete!(cursor.try_read_big_endian::<u16>())) + 1,
                ),
                code::EXT32 => (
                    0,
                    or_incomplete!(cursor.try_read_big_endian::<u32>()) as usize + 1,
                ),
                ow => return Err(MsgPackReadError::invalid_code(ow)),
            };
            if cursor.advance(length).is_err() {
                return Ok(false);
            }
            pending += children;
        }
        self.cursor = cursor;
        Ok(true)
    }

    /// Move past the next complete token, including any nested values.
    pub fn skip(&mut self) -> Result<(), MsgPackReadError> {
        if self.try_skip()? {
            Ok(())
        } else {
            Err(MsgPackReadError::EndOfStream)
        }
    }

    /// Take the next `len` bytes without interpreting them.
    pub fn read_raw(&mut self, len: usize) -> Result<SequenceSlice<'a>, MsgPackReadError> {
        Ok(require!(self.cursor.take(len)))
    }

    /// Take the encoded bytes of the next complete token.
    pub fn read_raw_value(&mut self) -> Result<SequenceSlice<'a>, MsgPackReadError> {
        let start = self.cursor;
        self.skip()?;
        let len = self.cursor.consumed() - start.consumed();
        Ok(require!(start.peek_slice(len)))
    }
}
