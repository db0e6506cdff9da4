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

use std::fmt::{Display, Formatter};

use bytes::Bytes;
use msgpack_codec::code::{self, extension};
use msgpack_codec::{
    MessagePackReader, MessagePackType, MessagePackWriter, MsgPackReadError, Timestamp,
    WriteBuffer,
};

use crate::formatter::collection_len;
use crate::{MsgPackReadable, MsgPackWritable, SerializationError, SerializerOptions};


/// A dynamically typed MessagePack value. Integers are split by sign so that every value of
/// `i64` and `u64` can be represented: non-negative integers are always held as
/// [`Value::UInteger`]. Map entries are kept in their encoded order, including any entries
/// with duplicate keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    /// A negative integer.
    Integer(i64),
    /// A non-negative integer.
    UInteger(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Binary(Bytes),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Timestamp(Timestamp),
    Extension(i8, Bytes),
}

impl Value {
    pub fn kind(&self) -> MessagePackType {
        match self {
            Value::Nil => MessagePackType::Nil,
            Value::Boolean(_) => MessagePackType::Boolean,
            Value::Integer(_) | Value::UInteger(_) => MessagePackType::Integer,
            Value::Float32(_) | Value::Float64(_) => MessagePackType::Float,
            Value::String(_) => MessagePackType::String,
            Value::Binary(_) => MessagePackType::Binary,
            Value::Array(_) => MessagePackType::Array,
            Value::Map(_) => MessagePackType::Map,
            Value::Timestamp(_) | Value::Extension(..) => MessagePackType::Extension,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// The first value associated with a key, if this is a map.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        if value < 0 {
            Value::Integer(value)
        } else {
            Value::UInteger(value as u64)
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::from(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInteger(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInteger(u64::from(value))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Binary(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::UInteger(n) => write!(f, "{}", n),
            Value::Float32(x) => write!(f, "{}", x),
            Value::Float64(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Extension(type_code, data) => {
                write!(f, "ext({}, <{} bytes>)", type_code, data.len())
            }
        }
    }
}

impl MsgPackWritable for Value {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        match self {
            Value::Nil => writer.write_nil(),
            Value::Boolean(b) => writer.write_bool(*b),
            Value::Integer(n) => writer.write_i64(*n),
            Value::UInteger(n) => writer.write_u64(*n),
            Value::Float32(x) => writer.write_f32(*x),
            Value::Float64(x) => writer.write_f64(*x),
            Value::String(s) => writer.write_str(s)?,
            Value::Binary(b) => writer.write_bin(b)?,
            Value::Array(items) => {
                writer.write_array_header(collection_len(items.len())?);
                for item in items {
                    item.write_to(writer, options)?;
                }
            }
            Value::Map(entries) => {
                writer.write_map_header(collection_len(entries.len())?);
                for (key, value) in entries {
                    key.write_to(writer, options)?;
                    value.write_to(writer, options)?;
                }
            }
            Value::Timestamp(ts) => writer.write_timestamp(*ts)?,
            Value::Extension(type_code, data) => writer.write_ext(*type_code, data)?,
        }
        Ok(())
    }
}

impl MsgPackReadable for Value {
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        let lead = reader.next_code()?;
        let value = match code::type_of(lead) {
            MessagePackType::Nil => {
                reader.read_nil()?;
                Value::Nil
            }
            MessagePackType::Boolean => Value::Boolean(reader.read_bool()?),
            MessagePackType::Integer if code::is_signed_integer(lead) => {
                Value::from(reader.read_i64()?)
            }
            MessagePackType::Integer => Value::UInteger(reader.read_u64()?),
            MessagePackType::Float if lead == code::FLOAT32 => Value::Float32(reader.read_f32()?),
            MessagePackType::Float => Value::Float64(reader.read_f64()?),
            MessagePackType::String => {
                Value::String(reader.read_string()?.ok_or(SerializationError::UnexpectedNil)?)
            }
            MessagePackType::Binary => {
                let data = reader.read_bytes()?.ok_or(SerializationError::UnexpectedNil)?;
                Value::Binary(data.to_bytes())
            }
            MessagePackType::Array => {
                let mut reader = options.security().depth_step(reader)?;
                let len = reader.read_array_header()?;
                let mut items = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    items.push(Value::read_from(&mut reader, options)?);
                }
                Value::Array(items)
            }
            MessagePackType::Map => {
                let mut reader = options.security().depth_step(reader)?;
                let len = reader.read_map_header()?;
                let mut entries = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    let key = Value::read_from(&mut reader, options)?;
                    let value = Value::read_from(&mut reader, options)?;
                    entries.push((key, value));
                }
                Value::Map(entries)
            }
            MessagePackType::Extension => {
                let header = reader.clone().read_ext_header()?;
                if header.type_code == extension::TIMESTAMP {
                    Value::Timestamp(reader.read_timestamp()?)
                } else {
                    let ext = reader.read_ext()?;
                    Value::Extension(ext.type_code, ext.data.to_bytes())
                }
            }
            MessagePackType::Unknown => return Err(MsgPackReadError::invalid_code(lead).into()),
        };
        Ok(value)
    }
}
