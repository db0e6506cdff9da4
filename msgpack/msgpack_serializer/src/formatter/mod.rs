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

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use msgpack_codec::{
    KeyHasher, MessagePackReader, MessagePackWriter, MsgPackWriteError, Timestamp, WriteBuffer,
};
use uuid::Uuid;

use crate::{SerializationError, SerializerOptions};

#[cfg(test)]
mod tests;

/// Types that can be written as MessagePack.
pub trait MsgPackWritable {
    /// Write the value as a sequence of tokens.
    ///
    /// # Arguments
    /// * `writer` - The destination for the tokens.
    /// * `options` - Options for the complete document.
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError>;
}

/// Types that can be read from MessagePack.
pub trait MsgPackReadable: Sized {
    /// Read a value, consuming exactly the tokens that make it up. Implementations that
    /// read nested values should enter them with the depth step of the security policy in
    /// `options`.
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        options: &SerializerOptions,
    ) -> Result<Self, SerializationError>;
}

pub(crate) fn collection_len(len: usize) -> Result<u32, MsgPackWriteError> {
    u32::try_from(len).map_err(|_| MsgPackWriteError::LengthOverflow(len))
}

macro_rules! primitive_formatters {
    ($($t:ty => $write:ident, $read:ident;)*) => {
        $(
            impl MsgPackWritable for $t {
                fn write_to<W: WriteBuffer>(
                    &self,
                    writer: &mut MessagePackWriter<'_, W>,
                    _options: &SerializerOptions,
                ) -> Result<(), SerializationError> {
                    writer.$write(*self);
                    Ok(())
                }
            }

            impl MsgPackReadable for $t {
                fn read_from(
                    reader: &mut MessagePackReader<'_>,
                    _options: &SerializerOptions,
                ) -> Result<Self, SerializationError> {
                    Ok(reader.$read()?)
                }
            }
        )*
    };
}

primitive_formatters! {
    bool => write_bool, read_bool;
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
    char => write_char, read_char;
}

impl<T: MsgPackWritable + ?Sized> MsgPackWritable for &T {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        (**self).write_to(writer, options)
    }
}

impl MsgPackWritable for str {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        _options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        Ok(writer.write_str(self)?)
    }
}

impl MsgPackWritable for String {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        self.as_str().write_to(writer, options)
    }
}

impl MsgPackReadable for String {
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        _options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        reader.read_string()?.ok_or(SerializationError::UnexpectedNil)
    }
}

impl MsgPackWritable for Bytes {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        _options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        Ok(writer.write_bin(self)?)
    }
}

impl MsgPackReadable for Bytes {
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        _options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        reader
            .read_bytes()?
            .map(|slice| slice.to_bytes())
            .ok_or(SerializationError::UnexpectedNil)
    }
}

impl<T: MsgPackWritable> MsgPackWritable for Option<T> {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        match self {
            Some(value) => value.write_to(writer, options),
            None => {
                writer.write_nil();
                Ok(())
            }
        }
    }
}

impl<T: MsgPackReadable> MsgPackReadable for Option<T> {
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        if reader.try_read_nil()? {
            Ok(None)
        } else {
            T::read_from(reader, options).map(Some)
        }
    }
}

impl<T: MsgPackWritable> MsgPackWritable for [T] {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        writer.write_array_header(collection_len(self.len())?);
        for item in self {
            item.write_to(writer, options)?;
        }
        Ok(())
    }
}

impl<T: MsgPackWritable> MsgPackWritable for Vec<T> {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        self.as_slice().write_to(writer, options)
    }
}

impl<T: MsgPackReadable> MsgPackReadable for Vec<T> {
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        let mut reader = options.security().depth_step(reader)?;
        let len = reader.read_array_header()?;
        let mut items = Vec::with_capacity(len as usize);
        for _ in 0..len {
            items.push(T::read_from(&mut reader, options)?);
        }
        Ok(items)
    }
}

fn write_entries<'a, W, K, V, I>(
    writer: &mut MessagePackWriter<'_, W>,
    options: &SerializerOptions,
    len: usize,
    entries: I,
) -> Result<(), SerializationError>
where
    W: WriteBuffer,
    K: MsgPackWritable + 'a,
    V: MsgPackWritable + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    writer.write_map_header(collection_len(len)?);
    for (key, value) in entries {
        key.write_to(writer, options)?;
        value.write_to(writer, options)?;
    }
    Ok(())
}

impl<K, V, S> MsgPackWritable for HashMap<K, V, S>
where
    K: MsgPackWritable,
    V: MsgPackWritable,
    S: BuildHasher,
{
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        write_entries(writer, options, self.len(), self.iter())
    }
}

/// Maps are read with the key hasher selected by the security policy.
impl<K, V> MsgPackReadable for HashMap<K, V, KeyHasher>
where
    K: MsgPackReadable + Eq + Hash + 'static,
    V: MsgPackReadable,
{
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        let security = options.security();
        let hasher = security.key_hasher::<K>()?;
        let mut reader = security.depth_step(reader)?;
        let len = reader.read_map_header()?;
        let mut map = HashMap::with_capacity_and_hasher(len as usize, hasher);
        for _ in 0..len {
            let key = K::read_from(&mut reader, options)?;
            let value = V::read_from(&mut reader, options)?;
            if map.insert(key, value).is_some() {
                return Err(SerializationError::DuplicateKey);
            }
        }
        Ok(map)
    }
}

impl<K, V> MsgPackWritable for BTreeMap<K, V>
where
    K: MsgPackWritable,
    V: MsgPackWritable,
{
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        write_entries(writer, options, self.len(), self.iter())
    }
}

impl<K, V> MsgPackReadable for BTreeMap<K, V>
where
    K: MsgPackReadable + Ord,
    V: MsgPackReadable,
{
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        let mut reader = options.security().depth_step(reader)?;
        let len = reader.read_map_header()?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = K::read_from(&mut reader, options)?;
            let value = V::read_from(&mut reader, options)?;
            if map.insert(key, value).is_some() {
                return Err(SerializationError::DuplicateKey);
            }
        }
        Ok(map)
    }
}

impl MsgPackWritable for Timestamp {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        _options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        Ok(writer.write_timestamp(*self)?)
    }
}

impl MsgPackReadable for Timestamp {
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        _options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        Ok(reader.read_timestamp()?)
    }
}

impl MsgPackWritable for DateTime<Utc> {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        _options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        Ok(writer.write_datetime(self)?)
    }
}

impl MsgPackReadable for DateTime<Utc> {
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        _options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        Ok(reader.read_datetime()?)
    }
}

/// UUIDs are written as strings in the hyphenated form.
impl MsgPackWritable for Uuid {
    fn write_to<W: WriteBuffer>(
        &self,
        writer: &mut MessagePackWriter<'_, W>,
        _options: &SerializerOptions,
    ) -> Result<(), SerializationError> {
        let mut buffer = Uuid::encode_buffer();
        let text = self.hyphenated().encode_lower(&mut buffer);
        Ok(writer.write_str(text)?)
    }
}

impl MsgPackReadable for Uuid {
    fn read_from(
        reader: &mut MessagePackReader<'_>,
        _options: &SerializerOptions,
    ) -> Result<Self, SerializationError> {
        let text = reader
            .read_str()?
            .ok_or(SerializationError::UnexpectedNil)?;
        Ok(Uuid::parse_str(&text)?)
    }
}
