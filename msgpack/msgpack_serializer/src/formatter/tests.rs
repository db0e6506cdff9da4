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
use std::fmt::Debug;

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use msgpack_codec::{
    KeyHasher, MessagePackReader, MessagePackWriter, MsgPackReadError, OutputBuffer, Timestamp,
};
use uuid::Uuid;

use super::{MsgPackReadable, MsgPackWritable};
use crate::{SerializationError, SerializerOptions};

fn write<T: MsgPackWritable + ?Sized>(value: &T, options: &SerializerOptions) -> Vec<u8> {
    let mut buffer = OutputBuffer::new();
    let mut writer = MessagePackWriter::new(&mut buffer).with_old_spec(options.old_spec());
    value.write_to(&mut writer, options).unwrap();
    buffer.as_slice().to_vec()
}

fn read<T: MsgPackReadable>(bytes: &[u8], options: &SerializerOptions) -> Result<T, SerializationError> {
    let mut reader = MessagePackReader::new(bytes);
    let value = T::read_from(&mut reader, options)?;
    assert!(reader.end());
    Ok(value)
}

fn round_trip<T>(value: T)
where
    T: MsgPackWritable + MsgPackReadable + PartialEq + Debug,
{
    let options = SerializerOptions::default();
    let bytes = write(&value, &options);
    assert_eq!(read::<T>(&bytes, &options).unwrap(), value);
}

#[test]
fn primitives() {
    round_trip(true);
    round_trip(0u8);
    round_trip(u16::MAX);
    round_trip(70000u32);
    round_trip(u64::MAX);
    round_trip(-1i8);
    round_trip(i16::MIN);
    round_trip(-70000i32);
    round_trip(i64::MIN);
    round_trip(1.5f32);
    round_trip(-2.25f64);
    round_trip('x');
    round_trip("text".to_string());
    round_trip(Bytes::from_static(&[1, 2, 3]));
}

#[test]
fn float_bits_are_preserved() {
    let options = SerializerOptions::default();
    for x in [f32::from_bits(0x7fc0_0abc), f32::INFINITY, f32::NEG_INFINITY, -0.0] {
        let restored = read::<f32>(&write(&x, &options), &options).unwrap();
        assert_eq!(restored.to_bits(), x.to_bits());
    }
    for x in [
        f64::from_bits(0x7ff8_0000_0000_0abc),
        f64::INFINITY,
        f64::NEG_INFINITY,
        -0.0,
    ] {
        let restored = read::<f64>(&write(&x, &options), &options).unwrap();
        assert_eq!(restored.to_bits(), x.to_bits());
    }
}

#[test]
fn str_and_string_agree() {
    let options = SerializerOptions::default();
    assert_eq!(write("abc", &options), write(&"abc".to_string(), &options));
    assert_eq!(write("abc", &options), vec![0xa3, b'a', b'b', b'c']);
}

#[test]
fn options() {
    round_trip(Some(3u32));
    round_trip(None::<u32>);
    round_trip(vec![Some("a".to_string()), None]);
}

#[test]
fn nil_where_value_required() {
    let options = SerializerOptions::default();
    assert!(matches!(
        read::<String>(&[0xc0], &options),
        Err(SerializationError::UnexpectedNil)
    ));
    assert!(matches!(
        read::<Bytes>(&[0xc0], &options),
        Err(SerializationError::UnexpectedNil)
    ));
}

#[test]
fn sequences() {
    round_trip(Vec::<i32>::new());
    round_trip((0..100).collect::<Vec<i64>>());
    round_trip(vec![vec![1u8, 2], vec![], vec![3]]);
}

#[test]
fn btree_map() {
    let map = (0..20u32)
        .map(|i| (i.to_string(), i))
        .collect::<BTreeMap<_, _>>();
    round_trip(map);
}

#[test]
fn hash_map() {
    let options = SerializerOptions::default();
    let mut map = HashMap::with_hasher(KeyHasher::default());
    map.insert(1u32, "one".to_string());
    map.insert(2u32, "two".to_string());
    let bytes = write(&map, &options);
    let read_map = read::<HashMap<u32, String, KeyHasher>>(&bytes, &options).unwrap();
    assert_eq!(read_map, map);
}

#[test]
fn hash_map_with_untrusted_keys() {
    let options = SerializerOptions::UNTRUSTED;
    let mut map = HashMap::new();
    map.insert("key".to_string(), 1u8);
    let bytes = write(&map, &options);
    let read_map = read::<HashMap<String, u8, KeyHasher>>(&bytes, &options).unwrap();
    assert!(matches!(read_map.hasher(), KeyHasher::Hardened(_)));
    assert_eq!(read_map.get("key"), Some(&1));

    let mut vec_keys = HashMap::new();
    vec_keys.insert(vec![1u8], 1u8);
    let bytes = write(&vec_keys, &options);
    assert!(matches!(
        read::<HashMap<Vec<u8>, u8, KeyHasher>>(&bytes, &options),
        Err(SerializationError::TypeAccess(_))
    ));
}

#[test]
fn duplicate_keys_are_rejected() {
    let options = SerializerOptions::default();
    let bytes = [0x82, 0x01, 0xa1, b'a', 0x01, 0xa1, b'b'];
    assert!(matches!(
        read::<HashMap<u8, String, KeyHasher>>(&bytes, &options),
        Err(SerializationError::DuplicateKey)
    ));
    assert!(matches!(
        read::<BTreeMap<u8, String>>(&bytes, &options),
        Err(SerializationError::DuplicateKey)
    ));
}

#[test]
fn nesting_is_limited() {
    let options = SerializerOptions::default().with_security(
        SerializerOptions::UNTRUSTED
            .security()
            .with_maximum_object_graph_depth(2),
    );
    let shallow = vec![vec![1u8]];
    let bytes = write(&shallow, &options);
    assert_eq!(read::<Vec<Vec<u8>>>(&bytes, &options).unwrap(), shallow);

    let deep = vec![vec![vec![1u8]]];
    let bytes = write(&deep, &options);
    assert!(matches!(
        read::<Vec<Vec<Vec<u8>>>>(&bytes, &options),
        Err(SerializationError::Read(MsgPackReadError::DepthExceeded {
            max_depth: 2
        }))
    ));
}

#[test]
fn timestamps_and_dates() {
    round_trip(Timestamp::new(1_700_000_000, 123).unwrap());
    round_trip(Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 40).unwrap());
}

#[test]
fn old_spec_timestamp() {
    let options = SerializerOptions::default().with_old_spec(true);
    let mut buffer = OutputBuffer::new();
    let mut writer = MessagePackWriter::new(&mut buffer).with_old_spec(true);
    assert!(matches!(
        Timestamp::UNIX_EPOCH.write_to(&mut writer, &options),
        Err(SerializationError::Write(_))
    ));
}

#[test]
fn uuids() {
    let uuid = Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8);
    let options = SerializerOptions::default();
    let bytes = write(&uuid, &options);
    assert_eq!(&bytes[..2], &[0xd9, 36]);
    assert_eq!(&bytes[2..], b"67e55044-10b1-426f-9247-bb680e5fe0c8");
    round_trip(uuid);

    let mut buffer = OutputBuffer::new();
    MessagePackWriter::new(&mut buffer).write_str("not a uuid").unwrap();
    assert!(matches!(
        read::<Uuid>(buffer.as_slice(), &options),
        Err(SerializationError::InvalidUuid(_))
    ));
}
