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

//! Encoders for single MessagePack tokens into fixed size regions of memory.
//!
//! Each function attempts to write one token at the start of `dst`. If `dst` is large
//! enough, the token is written and the number of bytes used is returned. Otherwise nothing
//! is written and the error reports exactly how many bytes the token requires so that the
//! caller can provide a larger region and try again.

use crate::code::{self, extension, range};
use crate::ext::ExtensionHeader;
use crate::timestamp::Timestamp;


/// The destination region was too small to hold the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientSpace {
    /// The number of bytes required to write the token.
    pub required: usize,
}

impl InsufficientSpace {
    /// The required size as the bitwise complement convention (always negative).
    pub fn sentinel(&self) -> isize {
        !(self.required as isize)
    }
}

/// Number of bytes written or the space that would be required.
pub type WriteResult = Result<usize, InsufficientSpace>;

#[inline]
fn put(dst: &mut [u8], token: &[u8]) -> WriteResult {
    let required = token.len();
    match dst.get_mut(..required) {
        Some(target) => {
            target.copy_from_slice(token);
            Ok(required)
        }
        None => Err(InsufficientSpace { required }),
    }
}

#[inline]
fn put_prefixed<const N: usize>(dst: &mut [u8], code: u8, body: [u8; N]) -> WriteResult {
    let required = N + 1;
    match dst.get_mut(..required) {
        Some(target) => {
            target[0] = code;
            target[1..].copy_from_slice(&body);
            Ok(required)
        }
        None => Err(InsufficientSpace { required }),
    }
}

pub fn write_nil(dst: &mut [u8]) -> WriteResult {
    put(dst, &[code::NIL])
}

pub fn write_bool(dst: &mut [u8], value: bool) -> WriteResult {
    put(dst, &[if value { code::TRUE } else { code::FALSE }])
}

fn write_collection_header(dst: &mut [u8], count: u32, fix: u8, c16: u8, c32: u8) -> WriteResult {
    if count <= range::MAX_FIX_ARRAY_COUNT {
        put(dst, &[fix | count as u8])
    } else if count <= u16::MAX as u32 {
        put_prefixed(dst, c16, (count as u16).to_be_bytes())
    } else {
        put_prefixed(dst, c32, count.to_be_bytes())
    }
}

/// Write the header of an array with `count` elements.
pub fn write_array_header(dst: &mut [u8], count: u32) -> WriteResult {
    write_collection_header(dst, count, code::MIN_FIX_ARRAY, code::ARRAY16, code::ARRAY32)
}

/// Write the header of a map with `count` key/value pairs.
pub fn write_map_header(dst: &mut [u8], count: u32) -> WriteResult {
    write_collection_header(dst, count, code::MIN_FIX_MAP, code::MAP16, code::MAP32)
}

/// Write an unsigned integer in the most compact form.
pub fn write_u64(dst: &mut [u8], value: u64) -> WriteResult {
    if value <= range::MAX_FIX_POSITIVE_INT as u64 {
        put(dst, &[value as u8])
    } else if value <= u8::MAX as u64 {
        put(dst, &[code::UINT8, value as u8])
    } else if value <= u16::MAX as u64 {
        put_prefixed(dst, code::UINT16, (value as u16).to_be_bytes())
    } else if value <= u32::MAX as u64 {
        put_prefixed(dst, code::UINT32, (value as u32).to_be_bytes())
    } else {
        put_prefixed(dst, code::UINT64, value.to_be_bytes())
    }
}

pub fn write_u8(dst: &mut [u8], value: u8) -> WriteResult {
    write_u64(dst, value as u64)
}

pub fn write_u16(dst: &mut [u8], value: u16) -> WriteResult {
    write_u64(dst, value as u64)
}

pub fn write_u32(dst: &mut [u8], value: u32) -> WriteResult {
    write_u64(dst, value as u64)
}

/// Write a signed integer in the most compact form. Non-negative values use the unsigned
/// codes as these are never longer than the signed equivalents.
pub fn write_i64(dst: &mut [u8], value: i64) -> WriteResult {
    if value >= 0 {
        write_u64(dst, value as u64)
    } else if value >= range::MIN_FIX_NEGATIVE_INT as i64 {
        put(dst, &[value as i8 as u8])
    } else if value >= i8::MIN as i64 {
        put(dst, &[code::INT8, value as i8 as u8])
    } else if value >= i16::MIN as i64 {
        put_prefixed(dst, code::INT16, (value as i16).to_be_bytes())
    } else if value >= i32::MIN as i64 {
        put_prefixed(dst, code::INT32, (value as i32).to_be_bytes())
    } else {
        put_prefixed(dst, code::INT64, value.to_be_bytes())
    }
}

pub fn write_i8(dst: &mut [u8], value: i8) -> WriteResult {
    write_i64(dst, value as i64)
}

pub fn write_i16(dst: &mut [u8], value: i16) -> WriteResult {
    write_i64(dst, value as i64)
}

pub fn write_i32(dst: &mut [u8], value: i32) -> WriteResult {
    write_i64(dst, value as i64)
}

macro_rules! explicit_writers {
    ($($(#[$meta:meta])* $name:ident($t:ty) => $code:expr;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(dst: &mut [u8], value: $t) -> WriteResult {
                put_prefixed(dst, $code, value.to_be_bytes())
            }
        )*
    };
}

explicit_writers! {
    /// Write a `uint 8` regardless of the magnitude of the value.
    write_explicit_u8(u8) => code::UINT8;
    /// Write a `uint 16` regardless of the magnitude of the value.
    write_explicit_u16(u16) => code::UINT16;
    /// Write a `uint 32` regardless of the magnitude of the value.
    write_explicit_u32(u32) => code::UINT32;
    /// Write a `uint 64` regardless of the magnitude of the value.
    write_explicit_u64(u64) => code::UINT64;
    /// Write an `int 8` regardless of the magnitude of the value.
    write_explicit_i8(i8) => code::INT8;
    /// Write an `int 16` regardless of the magnitude of the value.
    write_explicit_i16(i16) => code::INT16;
    /// Write an `int 32` regardless of the magnitude of the value.
    write_explicit_i32(i32) => code::INT32;
    /// Write an `int 64` regardless of the magnitude of the value.
    write_explicit_i64(i64) => code::INT64;
    write_f32(f32) => code::FLOAT32;
    write_f64(f64) => code::FLOAT64;
}

/// The size of the header of a string of `len` bytes.
pub fn str_header_len(len: u32, old_spec: bool) -> usize {
    if len <= range::MAX_FIX_STRING_LENGTH {
        1
    } else if len <= u8::MAX as u32 && !old_spec {
        2
    } else if len <= u16::MAX as u32 {
        3
    } else {
        5
    }
}

/// The size of the header of a binary blob of `len` bytes.
pub fn bin_header_len(len: u32) -> usize {
    if len <= u8::MAX as u32 {
        2
    } else if len <= u16::MAX as u32 {
        3
    } else {
        5
    }
}

/// Write the header of a string with a body of `len` bytes.
pub fn write_str_header(dst: &mut [u8], len: u32) -> WriteResult {
    if len <= range::MAX_FIX_STRING_LENGTH {
        put(dst, &[code::MIN_FIX_STR | len as u8])
    } else if len <= u8::MAX as u32 {
        put(dst, &[code::STR8, len as u8])
    } else if len <= u16::MAX as u32 {
        put_prefixed(dst, code::STR16, (len as u16).to_be_bytes())
    } else {
        put_prefixed(dst, code::STR32, len.to_be_bytes())
    }
}

/// Write the header of a string using only the codes available in the old specification
/// (which has no `str 8`).
pub fn write_str_header_old_spec(dst: &mut [u8], len: u32) -> WriteResult {
    if len <= range::MAX_FIX_STRING_LENGTH {
        put(dst, &[code::MIN_FIX_STR | len as u8])
    } else if len <= u16::MAX as u32 {
        put_prefixed(dst, code::STR16, (len as u16).to_be_bytes())
    } else {
        put_prefixed(dst, code::STR32, len.to_be_bytes())
    }
}

/// Write the header of a binary blob with a body of `len` bytes.
pub fn write_bin_header(dst: &mut [u8], len: u32) -> WriteResult {
    if len <= u8::MAX as u32 {
        put(dst, &[code::BIN8, len as u8])
    } else if len <= u16::MAX as u32 {
        put_prefixed(dst, code::BIN16, (len as u16).to_be_bytes())
    } else {
        put_prefixed(dst, code::BIN32, len.to_be_bytes())
    }
}

/// Write the header of an extension value. Payloads of exactly 1, 2, 4, 8 or 16 bytes use
/// the `fixext` codes.
pub fn write_ext_header(dst: &mut [u8], header: ExtensionHeader) -> WriteResult {
    let ExtensionHeader { type_code, length } = header;
    let type_byte = type_code as u8;
    match length {
        1 => put(dst, &[code::FIX_EXT1, type_byte]),
        2 => put(dst, &[code::FIX_EXT2, type_byte]),
        4 => put(dst, &[code::FIX_EXT4, type_byte]),
        8 => put(dst, &[code::FIX_EXT8, type_byte]),
        16 => put(dst, &[code::FIX_EXT16, type_byte]),
        n if n <= u8::MAX as u32 => put(dst, &[code::EXT8, n as u8, type_byte]),
        n if n <= u16::MAX as u32 => {
            let [b0, b1] = (n as u16).to_be_bytes();
            put(dst, &[code::EXT16, b0, b1, type_byte])
        }
        n => {
            let [b0, b1, b2, b3] = n.to_be_bytes();
            put(dst, &[code::EXT32, b0, b1, b2, b3, type_byte])
        }
    }
}

const TS32_LEN: usize = 6;
const TS64_LEN: usize = 10;
const TS96_LEN: usize = 15;

/// Write a timestamp extension using the smallest of the three timestamp formats that can
/// hold it.
pub fn write_timestamp(dst: &mut [u8], timestamp: Timestamp) -> WriteResult {
    let seconds = timestamp.seconds();
    let nanoseconds = timestamp.nanoseconds();
    let type_byte = extension::TIMESTAMP as u8;
    if seconds >= 0 && (seconds as u64) >> 34 == 0 {
        let packed = ((nanoseconds as u64) << 34) | seconds as u64;
        if packed >> 32 == 0 {
            let mut token = [0u8; TS32_LEN];
            token[0] = code::FIX_EXT4;
            token[1] = type_byte;
            token[2..].copy_from_slice(&(packed as u32).to_be_bytes());
            put(dst, &token)
        } else {
            let mut token = [0u8; TS64_LEN];
            token[0] = code::FIX_EXT8;
            token[1] = type_byte;
            token[2..].copy_from_slice(&packed.to_be_bytes());
            put(dst, &token)
        }
    } else {
        let mut token = [0u8; TS96_LEN];
        token[0] = code::EXT8;
        token[1] = 12;
        token[2] = type_byte;
        token[3..7].copy_from_slice(&nanoseconds.to_be_bytes());
        token[7..].copy_from_slice(&seconds.to_be_bytes());
        put(dst, &token)
    }
}
