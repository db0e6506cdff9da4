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

use bytes::{Buf, Bytes, BytesMut};
use msgpack_codec::{MessagePackReader, MsgPackReadError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{complete_value_len, StreamReadError, StreamReaderConfig};

#[cfg(test)]
mod tests;

/// Reads complete top-level MessagePack values from a byte stream. Data is read from the
/// stream into a buffer until it contains at least one complete value. Any bytes following
/// that value are retained for subsequent reads.
#[derive(Debug)]
pub struct MessagePackStreamReader<R> {
    stream: R,
    buffer: BytesMut,
    read_size: usize,
    end_of_stream: bool,
}

impl<R: AsyncRead + Unpin> MessagePackStreamReader<R> {
    pub fn new(stream: R) -> Self {
        Self::with_config(stream, StreamReaderConfig::default())
    }

    pub fn with_config(stream: R, config: StreamReaderConfig) -> Self {
        Self::with_buffer(stream, BytesMut::new(), config)
    }

    /// Resume reading from a stream where some data has already been read.
    ///
    /// # Arguments
    /// * `stream` - The stream to read from.
    /// * `buffer` - Data that was read from the stream but not yet consumed.
    /// * `config` - Configuration for the reader.
    pub fn with_buffer(stream: R, buffer: BytesMut, config: StreamReaderConfig) -> Self {
        let StreamReaderConfig { read_size } = config;
        MessagePackStreamReader {
            stream,
            buffer,
            read_size: read_size.max(1),
            end_of_stream: false,
        }
    }

    /// Read the next complete value. Returns `None` when the stream is exhausted. If the
    /// stream ends part way through a value, those bytes remain available from
    /// [`MessagePackStreamReader::remaining_bytes`].
    pub async fn read(&mut self) -> Result<Option<Bytes>, StreamReadError> {
        loop {
            if let Some(value) = self.take_value()? {
                return Ok(Some(value));
            }
            if !self.fill().await? {
                return Ok(None);
            }
        }
    }

    /// As [`MessagePackStreamReader::read`] but will stop waiting for data if the token is
    /// cancelled. Data that has already been read remains in the buffer.
    pub async fn read_with_cancellation(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Bytes>, StreamReadError> {
        if cancel.is_cancelled() {
            return Err(StreamReadError::Cancelled);
        }
        loop {
            if let Some(value) = self.take_value()? {
                return Ok(Some(value));
            }
            let filled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamReadError::Cancelled),
                result = self.fill() => result?,
            };
            if !filled {
                return Ok(None);
            }
        }
    }

    /// Read the header of a top-level array. Its elements can then be read individually
    /// with [`MessagePackStreamReader::read`].
    pub async fn read_array_header(&mut self) -> Result<Option<u32>, StreamReadError> {
        self.read_header(|reader| reader.try_read_array_header()).await
    }

    /// Read the header of a top-level map. Its keys and values can then be read individually
    /// with [`MessagePackStreamReader::read`].
    pub async fn read_map_header(&mut self) -> Result<Option<u32>, StreamReadError> {
        self.read_header(|reader| reader.try_read_map_header()).await
    }

    async fn read_header<F>(&mut self, decode: F) -> Result<Option<u32>, StreamReadError>
    where
        F: Fn(&mut MessagePackReader<'_>) -> Result<Option<u32>, MsgPackReadError>,
    {
        loop {
            let mut reader = MessagePackReader::new(&self.buffer);
            if let Some(count) = decode(&mut reader)? {
                let consumed = reader.consumed();
                self.buffer.advance(consumed);
                return Ok(Some(count));
            }
            if !self.fill().await? {
                return Ok(None);
            }
        }
    }

    /// Bytes that have been read from the stream but not yet consumed.
    pub fn remaining_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Recover the stream and any bytes that have not been consumed.
    pub fn into_inner(self) -> (R, BytesMut) {
        let MessagePackStreamReader { stream, buffer, .. } = self;
        (stream, buffer)
    }

    fn take_value(&mut self) -> Result<Option<Bytes>, MsgPackReadError> {
        let MessagePackStreamReader { buffer, .. } = self;
        Ok(complete_value_len(buffer)?.map(|len| buffer.split_to(len).freeze()))
    }

    // Returns false if the stream is exhausted.
    async fn fill(&mut self) -> Result<bool, StreamReadError> {
        let MessagePackStreamReader {
            stream,
            buffer,
            read_size,
            end_of_stream,
        } = self;
        if *end_of_stream {
            return Ok(false);
        }
        buffer.reserve(*read_size);
        let count = stream.read_buf(buffer).await?;
        if count == 0 {
            *end_of_stream = true;
            debug!(leftover = buffer.len(), "MessagePack stream ended.");
            Ok(false)
        } else {
            trace!(count, buffered = buffer.len(), "Read data from the MessagePack stream.");
            Ok(true)
        }
    }
}
