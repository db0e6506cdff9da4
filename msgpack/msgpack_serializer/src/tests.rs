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

use std::collections::BTreeMap;

use bytes::Bytes;
use msgpack_codec::{code, MessagePackReader, OutputBuffer};

use crate::serializer::serialize_pooled;
use crate::{
    deserialize, deserialize_segments, serialize, serialize_into, BufferPool, Compression,
    SerializationError, SerializerOptions, Value,
};

fn records() -> BTreeMap<String, Vec<u32>> {
    (0..50u32)
        .map(|i| (format!("record-{:03}", i), (0..i % 7).collect()))
        .collect()
}

#[test]
fn serialize_and_deserialize() {
    let options = SerializerOptions::default();
    let value = records();
    let bytes = serialize(&value, &options).unwrap();
    let restored: BTreeMap<String, Vec<u32>> = deserialize(&bytes, &options).unwrap();
    assert_eq!(restored, value);
}

#[test]
fn serialize_into_appends() {
    let options = SerializerOptions::default();
    let mut buffer = OutputBuffer::new();
    serialize_into(&mut buffer, &1u8, &options).unwrap();
    serialize_into(&mut buffer, "two", &options).unwrap();
    assert_eq!(buffer.as_slice(), &[0x01, 0xa3, b't', b'w', b'o']);
}

#[test]
fn deserialize_from_segments() {
    let options = SerializerOptions::default();
    let value = records();
    let bytes = serialize(&value, &options).unwrap();
    let chunks = bytes
        .chunks(13)
        .map(Bytes::copy_from_slice)
        .collect::<Vec<_>>();
    let restored: BTreeMap<String, Vec<u32>> = deserialize_segments(&chunks, &options).unwrap();
    assert_eq!(restored, value);
}

#[test]
fn compressed_round_trip() {
    let options = SerializerOptions::default().with_compression(Compression::Deflate);
    let value = records();
    let plain = serialize(&value, &SerializerOptions::default()).unwrap();
    let compressed = serialize(&value, &options).unwrap();
    assert!(compressed.len() < plain.len());

    let mut reader = MessagePackReader::new(&compressed);
    let ext = reader.read_ext().unwrap();
    assert_eq!(ext.type_code, code::extension::COMPRESSED_BLOCK);
    assert!(reader.end());

    let restored: BTreeMap<String, Vec<u32>> = deserialize(&compressed, &options).unwrap();
    assert_eq!(restored, value);

    let chunks = compressed
        .chunks(7)
        .map(Bytes::copy_from_slice)
        .collect::<Vec<_>>();
    let restored: BTreeMap<String, Vec<u32>> = deserialize_segments(&chunks, &options).unwrap();
    assert_eq!(restored, value);
}

#[test]
fn short_documents_are_not_compressed() {
    let options = SerializerOptions::default().with_compression(Compression::Deflate);
    let bytes = serialize("short", &options).unwrap();
    assert_eq!(bytes, serialize("short", &SerializerOptions::default()).unwrap());
    let restored: String = deserialize(&bytes, &options).unwrap();
    assert_eq!(restored, "short");
}

#[test]
fn compression_threshold() {
    let value = "x".repeat(20);
    let options = SerializerOptions::default()
        .with_compression(Compression::Deflate)
        .with_compression_min_length(10);
    let bytes = serialize(&value, &options).unwrap();
    let mut reader = MessagePackReader::new(&bytes);
    assert_eq!(
        reader.read_ext_header().unwrap().type_code,
        code::extension::COMPRESSED_BLOCK
    );
    let restored: String = deserialize(&bytes, &options).unwrap();
    assert_eq!(restored, value);
}

#[test]
fn compressed_blocks_are_opaque_without_compression() {
    let value = records();
    let compressed = serialize(
        &value,
        &SerializerOptions::default().with_compression(Compression::Deflate),
    )
    .unwrap();
    let as_value: Value = deserialize(&compressed, &SerializerOptions::default()).unwrap();
    assert!(matches!(as_value, Value::Extension(99, _)));
    assert!(matches!(
        deserialize::<BTreeMap<String, Vec<u32>>>(&compressed, &SerializerOptions::default()),
        Err(SerializationError::Read(_))
    ));
}

#[test]
fn old_spec_binary() {
    let options = SerializerOptions::default().with_old_spec(true);
    let data = Bytes::from_static(&[1, 2, 3]);
    let bytes = serialize(&data, &options).unwrap();
    assert_eq!(bytes.as_ref(), &[0xa3, 1, 2, 3]);
    let restored: Bytes = deserialize(&bytes, &options).unwrap();
    assert_eq!(restored, data);
}

#[test]
fn serialize_reuses_pooled_buffers() {
    let pool = BufferPool::new(2);
    let options = SerializerOptions::default();
    let value = records();
    let first = serialize_pooled(&pool, &value, &options).unwrap();
    assert_eq!(pool.retained(), 1);
    let second = serialize_pooled(&pool, &value, &options).unwrap();
    assert_eq!(pool.retained(), 1);
    assert_eq!(first, second);
    let restored: BTreeMap<String, Vec<u32>> = deserialize(&first, &options).unwrap();
    assert_eq!(restored, value);
}

#[test]
fn untrusted_compressed_length_is_checked() {
    let mut payload = vec![code::INT32];
    payload.extend_from_slice(&i32::MAX.to_be_bytes());
    payload.extend_from_slice(&[0x03, 0x00]);
    let mut buffer = OutputBuffer::new();
    msgpack_codec::MessagePackWriter::new(&mut buffer)
        .write_ext(99, &payload)
        .unwrap();
    let options = SerializerOptions::UNTRUSTED.with_compression(Compression::Deflate);
    assert!(matches!(
        deserialize::<Value>(buffer.as_slice(), &options),
        Err(SerializationError::DecompressedLengthMismatch { actual: 0, .. })
    ));
}
