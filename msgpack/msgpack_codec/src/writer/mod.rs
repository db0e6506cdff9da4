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

use chrono::{DateTime, TimeZone};
use thiserror::Error;

use crate::buffer::WriteBuffer;
use crate::ext::ExtensionHeader;
use crate::primitives::{self, InsufficientSpace, WriteResult};
use crate::timestamp::Timestamp;


/// Errors that can occur encoding MessagePack data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MsgPackWriteError {
    #[error("A length of {0} cannot be represented (the maximum is 2^32 - 1).")]
    LengthOverflow(usize),
    #[error("Timestamps cannot be written in old specification mode.")]
    OldSpecTimestamp,
}

fn checked_len(len: usize) -> Result<u32, MsgPackWriteError> {
    u32::try_from(len).map_err(|_| MsgPackWriteError::LengthOverflow(len))
}

fn str_header(old_spec: bool, len: u32) -> impl Fn(&mut [u8]) -> WriteResult {
    move |dst| {
        if old_spec {
            primitives::write_str_header_old_spec(dst, len)
        } else {
            primitives::write_str_header(dst, len)
        }
    }
}

macro_rules! token_writers {
    ($($(#[$meta:meta])* $name:ident($t:ty);)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, value: $t) {
                self.write_token(|dst| primitives::$name(dst, value))
            }
        )*
    };
}

/// Writes MessagePack tokens to a [`WriteBuffer`]. Integers are always written in their most
/// compact form unless one of the `write_explicit_*` methods is used.
///
/// # Panics
/// If the [`WriteBuffer`] does not provide at least the space that is requested of it.
#[derive(Debug)]
pub struct MessagePackWriter<'w, W: WriteBuffer> {
    sink: &'w mut W,
    old_spec: bool,
}

impl<'w, W: WriteBuffer> MessagePackWriter<'w, W> {
    pub fn new(sink: &'w mut W) -> Self {
        MessagePackWriter {
            sink,
            old_spec: false,
        }
    }

    /// Produce output that can be read by implementations of the old specification (with no
    /// binary, `str 8` or timestamp formats).
    pub fn with_old_spec(mut self, old_spec: bool) -> Self {
        self.old_spec = old_spec;
        self
    }

    pub fn old_spec(&self) -> bool {
        self.old_spec
    }

    /// Direct access to the underlying sink.
    pub fn sink(&mut self) -> &mut W {
        &mut *self.sink
    }

    fn write_token<F>(&mut self, encode: F)
    where
        F: Fn(&mut [u8]) -> WriteResult,
    {
        let required = match encode(self.sink.writable(0)) {
            Ok(count) => {
                self.sink.commit(count);
                return;
            }
            Err(InsufficientSpace { required }) => required,
        };
        match encode(self.sink.writable(required)) {
            Ok(count) => self.sink.commit(count),
            Err(_) => panic!(
                "The write buffer provided less than the {} bytes that were requested.",
                required
            ),
        }
    }

    // Write a header followed by its body in a single reservation.
    fn write_with_body<F>(&mut self, header_len: usize, header: F, body: &[u8])
    where
        F: Fn(&mut [u8]) -> WriteResult,
    {
        let total = header_len + body.len();
        self.write_token(|dst| {
            if dst.len() < total {
                return Err(InsufficientSpace { required: total });
            }
            let offset = header(dst)?;
            dst[offset..offset + body.len()].copy_from_slice(body);
            Ok(offset + body.len())
        })
    }

    pub fn write_nil(&mut self) {
        self.write_token(primitives::write_nil)
    }

    token_writers! {
        write_bool(bool);
        write_u8(u8);
        write_u16(u16);
        write_u32(u32);
        write_u64(u64);
        write_i8(i8);
        write_i16(i16);
        write_i32(i32);
        write_i64(i64);
        write_explicit_u8(u8);
        write_explicit_u16(u16);
        write_explicit_u32(u32);
        write_explicit_u64(u64);
        write_explicit_i8(i8);
        write_explicit_i16(i16);
        write_explicit_i32(i32);
        write_explicit_i64(i64);
        write_f32(f32);
        write_f64(f64);
        /// Write the number of elements in an array. The elements must follow.
        write_array_header(u32);
        /// Write the number of entries in a map. The keys and values must follow, alternating.
        write_map_header(u32);
    }

    /// Write a character as its scalar value.
    pub fn write_char(&mut self, value: char) {
        self.write_u32(u32::from(value))
    }

    /// Write the header for a string of `len` bytes. The UTF-8 bytes must follow.
    pub fn write_str_header(&mut self, len: usize) -> Result<(), MsgPackWriteError> {
        let len = checked_len(len)?;
        let header = str_header(self.old_spec, len);
        self.write_token(header);
        Ok(())
    }

    pub fn write_str(&mut self, value: &str) -> Result<(), MsgPackWriteError> {
        self.write_str_bytes(value.as_bytes())
    }

    /// Write a string from bytes that are already known to be valid UTF-8.
    pub fn write_str_bytes(&mut self, utf8: &[u8]) -> Result<(), MsgPackWriteError> {
        let len = checked_len(utf8.len())?;
        let header = str_header(self.old_spec, len);
        self.write_with_body(primitives::str_header_len(len, self.old_spec), header, utf8);
        Ok(())
    }

    /// Write the header for a binary blob of `len` bytes. The bytes must follow. In old
    /// specification mode this is a string header.
    pub fn write_bin_header(&mut self, len: usize) -> Result<(), MsgPackWriteError> {
        let len = checked_len(len)?;
        if self.old_spec {
            self.write_token(|dst| primitives::write_str_header_old_spec(dst, len));
        } else {
            self.write_token(|dst| primitives::write_bin_header(dst, len));
        }
        Ok(())
    }

    pub fn write_bin(&mut self, bytes: &[u8]) -> Result<(), MsgPackWriteError> {
        let len = checked_len(bytes.len())?;
        if self.old_spec {
            self.write_with_body(
                primitives::str_header_len(len, true),
                |dst| primitives::write_str_header_old_spec(dst, len),
                bytes,
            );
        } else {
            self.write_with_body(
                primitives::bin_header_len(len),
                |dst| primitives::write_bin_header(dst, len),
                bytes,
            );
        }
        Ok(())
    }

    /// Write the header of an extension. The payload must follow.
    pub fn write_ext_header(&mut self, header: ExtensionHeader) {
        self.write_token(|dst| primitives::write_ext_header(dst, header))
    }

    pub fn write_ext(&mut self, type_code: i8, data: &[u8]) -> Result<(), MsgPackWriteError> {
        let header = ExtensionHeader::new(type_code, checked_len(data.len())?);
        let header_len = match primitives::write_ext_header(&mut [], header) {
            Ok(len) => len,
            Err(InsufficientSpace { required }) => required,
        };
        self.write_with_body(
            header_len,
            |dst| primitives::write_ext_header(dst, header),
            data,
        );
        Ok(())
    }

    pub fn write_timestamp(&mut self, timestamp: Timestamp) -> Result<(), MsgPackWriteError> {
        if self.old_spec {
            Err(MsgPackWriteError::OldSpecTimestamp)
        } else {
            self.write_token(|dst| primitives::write_timestamp(dst, timestamp));
            Ok(())
        }
    }

    /// Write a date-time as a timestamp. Date-times in other zones are converted to UTC.
    pub fn write_datetime<Tz: TimeZone>(
        &mut self,
        datetime: &DateTime<Tz>,
    ) -> Result<(), MsgPackWriteError> {
        self.write_timestamp(Timestamp::from(datetime.clone()))
    }

    /// Copy bytes to the output without validation. The bytes must be well formed
    /// MessagePack.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.write_with_body(0, |_| Ok(0), bytes);
        }
    }
}
