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

//! Lead byte constants and the lookup tables that classify them.

use std::fmt::{Display, Formatter};


pub const MIN_FIX_INT: u8 = 0x00;
pub const MAX_FIX_INT: u8 = 0x7f;
pub const MIN_FIX_MAP: u8 = 0x80;
pub const MAX_FIX_MAP: u8 = 0x8f;
pub const MIN_FIX_ARRAY: u8 = 0x90;
pub const MAX_FIX_ARRAY: u8 = 0x9f;
pub const MIN_FIX_STR: u8 = 0xa0;
pub const MAX_FIX_STR: u8 = 0xbf;
pub const NIL: u8 = 0xc0;
pub const NEVER_USED: u8 = 0xc1;
pub const FALSE: u8 = 0xc2;
pub const TRUE: u8 = 0xc3;
pub const BIN8: u8 = 0xc4;
pub const BIN16: u8 = 0xc5;
pub const BIN32: u8 = 0xc6;
pub const EXT8: u8 = 0xc7;
pub const EXT16: u8 = 0xc8;
pub const EXT32: u8 = 0xc9;
pub const FLOAT32: u8 = 0xca;
pub const FLOAT64: u8 = 0xcb;
pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;
pub const INT8: u8 = 0xd0;
pub const INT16: u8 = 0xd1;
pub const INT32: u8 = 0xd2;
pub const INT64: u8 = 0xd3;
pub const FIX_EXT1: u8 = 0xd4;
pub const FIX_EXT2: u8 = 0xd5;
pub const FIX_EXT4: u8 = 0xd6;
pub const FIX_EXT8: u8 = 0xd7;
pub const FIX_EXT16: u8 = 0xd8;
pub const STR8: u8 = 0xd9;
pub const STR16: u8 = 0xda;
pub const STR32: u8 = 0xdb;
pub const ARRAY16: u8 = 0xdc;
pub const ARRAY32: u8 = 0xdd;
pub const MAP16: u8 = 0xde;
pub const MAP32: u8 = 0xdf;
pub const MIN_NEGATIVE_FIX_INT: u8 = 0xe0;
pub const MAX_NEGATIVE_FIX_INT: u8 = 0xff;

/// Value ranges that can be embedded directly in a lead byte.
pub mod range {
    pub const MIN_FIX_NEGATIVE_INT: i8 = -32;
    pub const MAX_FIX_NEGATIVE_INT: i8 = -1;
    pub const MAX_FIX_POSITIVE_INT: u8 = 127;
    pub const MAX_FIX_STRING_LENGTH: u32 = 31;
    pub const MAX_FIX_MAP_COUNT: u32 = 15;
    pub const MAX_FIX_ARRAY_COUNT: u32 = 15;
}

/// Extension type codes with a fixed meaning.
pub mod extension {
    /// Reserved by the MessagePack specification for timestamps.
    pub const TIMESTAMP: i8 = -1;
    /// Private to this library. A compressed block holding a complete MessagePack document.
    pub const COMPRESSED_BLOCK: i8 = 99;
}

/// The category of value introduced by a lead byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagePackType {
    Unknown,
    Integer,
    Nil,
    Boolean,
    Float,
    String,
    Binary,
    Array,
    Map,
    Extension,
}

impl Display for MessagePackType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessagePackType::Unknown => "Unknown",
            MessagePackType::Integer => "Integer",
            MessagePackType::Nil => "Nil",
            MessagePackType::Boolean => "Boolean",
            MessagePackType::Float => "Float",
            MessagePackType::String => "String",
            MessagePackType::Binary => "Binary",
            MessagePackType::Array => "Array",
            MessagePackType::Map => "Map",
            MessagePackType::Extension => "Extension",
        };
        f.write_str(name)
    }
}

const fn classify(code: u8) -> MessagePackType {
    match code {
        MIN_FIX_INT..=MAX_FIX_INT => MessagePackType::Integer,
        MIN_FIX_MAP..=MAX_FIX_MAP => MessagePackType::Map,
        MIN_FIX_ARRAY..=MAX_FIX_ARRAY => MessagePackType::Array,
        MIN_FIX_STR..=MAX_FIX_STR => MessagePackType::String,
        NIL => MessagePackType::Nil,
        NEVER_USED => MessagePackType::Unknown,
        FALSE | TRUE => MessagePackType::Boolean,
        BIN8 | BIN16 | BIN32 => MessagePackType::Binary,
        EXT8 | EXT16 | EXT32 => MessagePackType::Extension,
        FLOAT32 | FLOAT64 => MessagePackType::Float,
        UINT8 | UINT16 | UINT32 | UINT64 | INT8 | INT16 | INT32 | INT64 => {
            MessagePackType::Integer
        }
        FIX_EXT1 | FIX_EXT2 | FIX_EXT4 | FIX_EXT8 | FIX_EXT16 => MessagePackType::Extension,
        STR8 | STR16 | STR32 => MessagePackType::String,
        ARRAY16 | ARRAY32 => MessagePackType::Array,
        MAP16 | MAP32 => MessagePackType::Map,
        MIN_NEGATIVE_FIX_INT..=MAX_NEGATIVE_FIX_INT => MessagePackType::Integer,
    }
}

const fn name_of(code: u8) -> &'static str {
    match code {
        MIN_FIX_INT..=MAX_FIX_INT => "positive fixint",
        MIN_FIX_MAP..=MAX_FIX_MAP => "fixmap",
        MIN_FIX_ARRAY..=MAX_FIX_ARRAY => "fixarray",
        MIN_FIX_STR..=MAX_FIX_STR => "fixstr",
        NIL => "nil",
        NEVER_USED => "(never used)",
        FALSE => "false",
        TRUE => "true",
        BIN8 => "bin 8",
        BIN16 => "bin 16",
        BIN32 => "bin 32",
        EXT8 => "ext 8",
        EXT16 => "ext 16",
        EXT32 => "ext 32",
        FLOAT32 => "float 32",
        FLOAT64 => "float 64",
        UINT8 => "uint 8",
        UINT16 => "uint 16",
        UINT32 => "uint 32",
        UINT64 => "uint 64",
        INT8 => "int 8",
        INT16 => "int 16",
        INT32 => "int 32",
        INT64 => "int 64",
        FIX_EXT1 => "fixext 1",
        FIX_EXT2 => "fixext 2",
        FIX_EXT4 => "fixext 4",
        FIX_EXT8 => "fixext 8",
        FIX_EXT16 => "fixext 16",
        STR8 => "str 8",
        STR16 => "str 16",
        STR32 => "str 32",
        ARRAY16 => "array 16",
        ARRAY32 => "array 32",
        MAP16 => "map 16",
        MAP32 => "map 32",
        MIN_NEGATIVE_FIX_INT..=MAX_NEGATIVE_FIX_INT => "negative fixint",
    }
}

const TYPE_TABLE: [MessagePackType; 256] = {
    let mut table = [MessagePackType::Unknown; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = classify(i as u8);
        i += 1;
    }
    table
};

const NAME_TABLE: [&str; 256] = {
    let mut table = [""; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = name_of(i as u8);
        i += 1;
    }
    table
};

/// The category of value that a lead byte introduces.
#[inline]
pub fn type_of(code: u8) -> MessagePackType {
    TYPE_TABLE[code as usize]
}

/// The name that the MessagePack specification gives to the format of a lead byte.
#[inline]
pub fn format_name(code: u8) -> &'static str {
    NAME_TABLE[code as usize]
}

/// Whether the lead byte is one of the signed integer codes (including negative fixints).
#[inline]
pub fn is_signed_integer(code: u8) -> bool {
    matches!(code, INT8 | INT16 | INT32 | INT64 | MIN_NEGATIVE_FIX_INT..=MAX_NEGATIVE_FIX_INT)
}
