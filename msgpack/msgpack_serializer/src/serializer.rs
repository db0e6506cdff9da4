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

use bytes::Bytes;
use msgpack_codec::{MessagePackReader, MessagePackWriter, WriteBuffer};
use tracing::trace;

use crate::compression::{is_compressed_block, read_compressed, write_compressed};
use crate::{
    BufferPool, Compression, DeflateCompressor, MsgPackReadable, MsgPackWritable,
    SerializationError, SerializerOptions,
};

/// Serialize a value as a complete document. The document is encoded in a buffer rented
/// from the shared [`BufferPool`] and then copied out.
pub fn serialize<T>(value: &T, options: &SerializerOptions) -> Result<Bytes, SerializationError>
where
    T: MsgPackWritable + ?Sized,
{
    serialize_pooled(BufferPool::shared(), value, options)
}

pub(crate) fn serialize_pooled<T>(
    pool: &BufferPool,
    value: &T,
    options: &SerializerOptions,
) -> Result<Bytes, SerializationError>
where
    T: MsgPackWritable + ?Sized,
{
    let mut buffer = pool.rent();
    serialize_into(&mut *buffer, value, options)?;
    Ok(buffer.to_bytes())
}

/// Serialize a value as a complete document, appending it to `sink`. If compression is
/// enabled and the encoded document is at least the minimum length, it is written as a
/// compressed block.
///
/// # Arguments
/// * `sink` - The destination for the document.
/// * `value` - The value to serialize.
/// * `options` - Serialization options.
pub fn serialize_into<W, T>(
    sink: &mut W,
    value: &T,
    options: &SerializerOptions,
) -> Result<(), SerializationError>
where
    W: WriteBuffer,
    T: MsgPackWritable + ?Sized,
{
    let old_spec = options.old_spec();
    match options.compression() {
        Compression::None => {
            let mut writer = MessagePackWriter::new(sink).with_old_spec(old_spec);
            value.write_to(&mut writer, options)
        }
        Compression::Deflate => {
            let mut scratch = BufferPool::shared().rent();
            {
                let mut writer = MessagePackWriter::new(&mut *scratch).with_old_spec(old_spec);
                value.write_to(&mut writer, options)?;
            }
            let document = scratch.as_slice();
            let mut writer = MessagePackWriter::new(sink).with_old_spec(old_spec);
            if document.len() < options.compression_min_length() {
                trace!(
                    len = document.len(),
                    "Document is too short to be worth compressing."
                );
                writer.write_raw(document);
                Ok(())
            } else {
                trace!(len = document.len(), "Compressing document.");
                write_compressed(&mut writer, document, &DeflateCompressor::default())
            }
        }
    }
}

/// Deserialize a value from a complete document.
pub fn deserialize<T: MsgPackReadable>(
    bytes: &[u8],
    options: &SerializerOptions,
) -> Result<T, SerializationError> {
    let mut reader = MessagePackReader::new(bytes);
    read_document(&mut reader, options)
}

/// Deserialize a value from a document that is split across several buffers.
pub fn deserialize_segments<T: MsgPackReadable>(
    chunks: &[Bytes],
    options: &SerializerOptions,
) -> Result<T, SerializationError> {
    let mut reader = MessagePackReader::from_segments(chunks);
    read_document(&mut reader, options)
}

fn read_document<T: MsgPackReadable>(
    reader: &mut MessagePackReader<'_>,
    options: &SerializerOptions,
) -> Result<T, SerializationError> {
    match options.compression() {
        Compression::Deflate if is_compressed_block(reader) => {
            let document = read_compressed(reader, &DeflateCompressor::default())?;
            trace!(len = document.len(), "Decompressed document.");
            let mut inner = MessagePackReader::new(&document);
            T::read_from(&mut inner, options)
        }
        _ => T::read_from(reader, options),
    }
}
