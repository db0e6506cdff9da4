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

use bytes::{Bytes, BytesMut};


/// A growable destination for encoded MessagePack data.
pub trait WriteBuffer {
    /// Get a region into which data can be written. The region must be at least `size_hint`
    /// bytes long. A hint of 0 requests whatever space is immediately available (which may be
    /// none).
    fn writable(&mut self, size_hint: usize) -> &mut [u8];

    /// Mark the first `count` bytes of the last region returned by
    /// [`WriteBuffer::writable`] as written.
    fn commit(&mut self, count: usize);
}

impl<W: WriteBuffer + ?Sized> WriteBuffer for &mut W {
    fn writable(&mut self, size_hint: usize) -> &mut [u8] {
        (**self).writable(size_hint)
    }

    fn commit(&mut self, count: usize) {
        (**self).commit(count)
    }
}

const MIN_GROWTH: usize = 256;

/// A contiguous, growable [`WriteBuffer`]. Space is handed out from the tail of the
/// underlying buffer and is only considered to be part of the content once committed.
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    buffer: BytesMut,
    written: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        OutputBuffer {
            buffer: BytesMut::with_capacity(capacity),
            written: 0,
        }
    }

    /// The committed content.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.written]
    }

    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// The amount of memory held by the buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Discard the content, retaining the allocated memory.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.written = 0;
    }

    /// Discard any committed bytes beyond `len`.
    pub fn truncate(&mut self, len: usize) {
        if len < self.written {
            self.written = len;
        }
    }

    /// Copy the committed content into a new buffer.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_slice())
    }

    pub fn into_bytes(self) -> Bytes {
        let OutputBuffer {
            mut buffer,
            written,
        } = self;
        buffer.truncate(written);
        buffer.freeze()
    }
}

impl AsRef<[u8]> for OutputBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl WriteBuffer for OutputBuffer {
    fn writable(&mut self, size_hint: usize) -> &mut [u8] {
        let OutputBuffer { buffer, written } = self;
        let available = buffer.len() - *written;
        if available < size_hint {
            let growth = size_hint.max(MIN_GROWTH).max(*written);
            buffer.resize(*written + growth, 0);
        }
        &mut buffer[*written..]
    }

    fn commit(&mut self, count: usize) {
        debug_assert!(self.written + count <= self.buffer.len());
        self.written = (self.written + count).min(self.buffer.len());
    }
}
