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

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use msgpack_codec::{MessagePackReader, MessagePackWriter, MsgPackReadError, OutputBuffer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::CancellationToken;

use super::MessagePackStreamReader;
use crate::{StreamReadError, StreamReaderConfig};

/// Provides its data in a fixed sequence of chunks.
struct ChunkedRead {
    chunks: VecDeque<Bytes>,
}

impl ChunkedRead {
    fn new(data: &[u8], splits: &[usize]) -> Self {
        let mut chunks = VecDeque::new();
        let mut start = 0;
        for &end in splits {
            if end > start {
                chunks.push_back(Bytes::copy_from_slice(&data[start..end]));
                start = end;
            }
        }
        if start < data.len() {
            chunks.push_back(Bytes::copy_from_slice(&data[start..]));
        }
        ChunkedRead { chunks }
    }
}

impl AsyncRead for ChunkedRead {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(chunk) = self.chunks.front_mut() {
            let n = chunk.len().min(buf.remaining());
            buf.put_slice(&chunk[..n]);
            chunk.advance(n);
            if chunk.is_empty() {
                self.chunks.pop_front();
            }
        }
        Poll::Ready(Ok(()))
    }
}

fn encode<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut MessagePackWriter<'_, OutputBuffer>),
{
    let mut buffer = OutputBuffer::new();
    let mut writer = MessagePackWriter::new(&mut buffer);
    f(&mut writer);
    buffer.as_slice().to_vec()
}

fn test_values() -> Vec<Vec<u8>> {
    vec![
        encode(|w| w.write_u32(7)),
        encode(|w| w.write_str("first value").unwrap()),
        encode(|w| {
            w.write_map_header(2);
            w.write_str("a").unwrap();
            w.write_array_header(3);
            w.write_nil();
            w.write_bool(true);
            w.write_f64(1.25);
            w.write_str("b").unwrap();
            w.write_i64(-70000);
        }),
        encode(|w| w.write_bin(&[0xab; 10_000]).unwrap()),
        encode(|w| w.write_ext(4, &[1, 2, 3]).unwrap()),
        encode(|w| w.write_nil()),
    ]
}

fn concat(values: &[Vec<u8>]) -> Vec<u8> {
    values.iter().flatten().copied().collect()
}

fn random_splits(rng: &mut StdRng, len: usize) -> Vec<usize> {
    let mut splits = (0..rng.gen_range(1..20))
        .map(|_| rng.gen_range(0..=len))
        .collect::<Vec<_>>();
    splits.sort_unstable();
    splits
}

#[tokio::test]
async fn read_whole_values() {
    let values = test_values();
    let data = concat(&values);
    let mut reader = MessagePackStreamReader::new(ChunkedRead::new(&data, &[]));

    for expected in &values {
        let value = reader.read().await.unwrap().expect("Stream ended early.");
        assert_eq!(value.as_ref(), expected.as_slice());
    }
    assert!(reader.read().await.unwrap().is_none());
    assert!(reader.remaining_bytes().is_empty());
}

#[tokio::test]
async fn read_byte_at_a_time() {
    let values = test_values();
    let data = concat(&values);
    let splits = (1..data.len()).collect::<Vec<_>>();
    let config = StreamReaderConfig { read_size: 1 };
    let mut reader = MessagePackStreamReader::with_config(ChunkedRead::new(&data, &splits), config);

    for expected in &values {
        let value = reader.read().await.unwrap().expect("Stream ended early.");
        assert_eq!(value.as_ref(), expected.as_slice());
    }
    assert!(reader.read().await.unwrap().is_none());
}

#[tokio::test]
async fn read_random_splits() {
    let values = test_values();
    let data = concat(&values);
    let mut rng = StdRng::seed_from_u64(0x4d50);

    for _ in 0..50 {
        let splits = random_splits(&mut rng, data.len());
        let config = StreamReaderConfig {
            read_size: rng.gen_range(1..64),
        };
        let mut reader =
            MessagePackStreamReader::with_config(ChunkedRead::new(&data, &splits), config);
        for expected in &values {
            let value = reader.read().await.unwrap().expect("Stream ended early.");
            assert_eq!(value.as_ref(), expected.as_slice(), "Splits: {:?}", splits);
        }
        assert!(reader.read().await.unwrap().is_none());
    }
}

#[tokio::test]
async fn values_decode_after_framing() {
    let values = test_values();
    let data = concat(&values);
    let mut reader = MessagePackStreamReader::new(ChunkedRead::new(&data, &[3, 5, 40]));

    let first = reader.read().await.unwrap().unwrap();
    assert_eq!(MessagePackReader::new(&first).read_u32(), Ok(7));
    let second = reader.read().await.unwrap().unwrap();
    assert_eq!(
        MessagePackReader::new(&second).read_string(),
        Ok(Some("first value".to_string()))
    );
}

#[tokio::test]
async fn leftover_bytes_are_retained() {
    let mut data = encode(|w| w.write_u8(1));
    data.extend_from_slice(&[0xa5, b'a', b'b']);
    let mut reader = MessagePackStreamReader::new(ChunkedRead::new(&data, &[2]));

    assert_eq!(reader.read().await.unwrap(), Some(Bytes::from_static(&[0x01])));
    assert!(reader.read().await.unwrap().is_none());
    assert_eq!(reader.remaining_bytes(), &[0xa5, b'a', b'b']);

    let (_, leftover) = reader.into_inner();
    assert_eq!(leftover.as_ref(), &[0xa5, b'a', b'b']);
}

#[tokio::test]
async fn resume_with_buffer() {
    let data = encode(|w| w.write_str("hello").unwrap());
    let (head, tail) = data.split_at(2);
    let mut reader = MessagePackStreamReader::with_buffer(
        ChunkedRead::new(tail, &[]),
        head.into(),
        StreamReaderConfig::default(),
    );
    assert_eq!(reader.read().await.unwrap().as_deref(), Some(data.as_slice()));
}

#[tokio::test]
async fn invalid_data() {
    let data = [0x92, 0x01, 0xc1];
    let mut reader = MessagePackStreamReader::new(ChunkedRead::new(&data, &[]));
    assert!(matches!(
        reader.read().await,
        Err(StreamReadError::Format(MsgPackReadError::InvalidCode {
            code: 0xc1,
            ..
        }))
    ));
}

#[tokio::test]
async fn empty_stream() {
    let mut reader = MessagePackStreamReader::new(ChunkedRead::new(&[], &[]));
    assert!(reader.read().await.unwrap().is_none());
    assert!(reader.read_array_header().await.unwrap().is_none());
}

#[tokio::test]
async fn stream_array_elements() {
    let values = test_values();
    let mut data = encode(|w| w.write_array_header(values.len() as u32));
    data.extend(concat(&values));
    let mut rng = StdRng::seed_from_u64(0xa77a);

    for _ in 0..20 {
        let splits = random_splits(&mut rng, data.len());
        let config = StreamReaderConfig { read_size: 8 };
        let mut reader =
            MessagePackStreamReader::with_config(ChunkedRead::new(&data, &splits), config);
        assert_eq!(
            reader.read_array_header().await.unwrap(),
            Some(values.len() as u32)
        );
        for expected in &values {
            let value = reader.read().await.unwrap().expect("Stream ended early.");
            assert_eq!(value.as_ref(), expected.as_slice());
        }
        assert!(reader.read().await.unwrap().is_none());
    }
}

#[tokio::test]
async fn stream_map_entries() {
    let mut data = encode(|w| w.write_map_header(20));
    for i in 0..20 {
        data.extend(encode(|w| {
            w.write_u32(i);
            w.write_str(&i.to_string()).unwrap();
        }));
    }
    let mut reader = MessagePackStreamReader::new(ChunkedRead::new(&data, &[1, 2, 3]));
    assert_eq!(reader.read_map_header().await.unwrap(), Some(20));
    for i in 0..20u32 {
        let key = reader.read().await.unwrap().unwrap();
        let value = reader.read().await.unwrap().unwrap();
        assert_eq!(MessagePackReader::new(&key).read_u32(), Ok(i));
        assert_eq!(
            MessagePackReader::new(&value).read_string(),
            Ok(Some(i.to_string()))
        );
    }
}

#[tokio::test]
async fn header_of_wrong_type() {
    let data = encode(|w| w.write_map_header(1));
    let mut reader = MessagePackStreamReader::new(ChunkedRead::new(&data, &[]));
    assert!(matches!(
        reader.read_array_header().await,
        Err(StreamReadError::Format(MsgPackReadError::InvalidCode { .. }))
    ));
}

#[tokio::test]
async fn cancelled_before_read() {
    let (client, _server) = tokio::io::duplex(64);
    let mut reader = MessagePackStreamReader::new(client);
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(matches!(
        reader.read_with_cancellation(&cancel).await,
        Err(StreamReadError::Cancelled)
    ));
}

#[tokio::test]
async fn cancelled_while_waiting() {
    let (client, _server) = tokio::io::duplex(64);
    let mut reader = MessagePackStreamReader::new(client);
    let cancel = CancellationToken::new();
    let (result, _) = tokio::join!(reader.read_with_cancellation(&cancel), async {
        tokio::task::yield_now().await;
        cancel.cancel();
    });
    assert!(matches!(result, Err(StreamReadError::Cancelled)));
}

#[tokio::test]
async fn cancellable_read_completes() {
    let values = test_values();
    let data = concat(&values);
    let mut reader = MessagePackStreamReader::new(ChunkedRead::new(&data, &[10, 20]));
    let cancel = CancellationToken::new();
    for expected in &values {
        let value = reader
            .read_with_cancellation(&cancel)
            .await
            .unwrap()
            .expect("Stream ended early.");
        assert_eq!(value.as_ref(), expected.as_slice());
    }
    assert!(reader.read_with_cancellation(&cancel).await.unwrap().is_none());
}
