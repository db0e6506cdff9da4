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

use bytes::{Buf, Bytes};
use thiserror::Error;


/// The memory backing a [`SequenceReader`]. Either a single contiguous buffer or a list of
/// buffers that are treated as a single logical sequence of bytes.
#[derive(Debug, Clone, Copy)]
enum Segments<'a> {
    Contiguous(&'a [u8]),
    Chunked(&'a [Bytes]),
}

impl<'a> Segments<'a> {
    fn count(&self) -> usize {
        match self {
            Segments::Contiguous(_) => 1,
            Segments::Chunked(chunks) => chunks.len(),
        }
    }

    fn get(&self, index: usize) -> &'a [u8] {
        match *self {
            Segments::Contiguous(bytes) if index == 0 => bytes,
            Segments::Chunked(chunks) => chunks.get(index).map(|chunk| &chunk[..]).unwrap_or(&[]),
            _ => &[],
        }
    }
}

/// Attempting to move the cursor of a [`SequenceReader`] outside of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("Cannot move the cursor by {requested} bytes, only {available} are available.")]
    OutOfRange { requested: usize, available: usize },
}

/// Fixed size values that can be read from a sequence in big endian byte order.
pub trait FromBigEndian: Sized + Copy {
    const SIZE: usize;

    /// Convert from the first [`FromBigEndian::SIZE`] bytes of `bytes`.
    fn from_be_slice(bytes: &[u8]) -> Self;
}

macro_rules! from_big_endian {
    ($($t:ty),*) => {
        $(
            impl FromBigEndian for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                #[inline]
                fn from_be_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                    <$t>::from_be_bytes(raw)
                }
            }
        )*
    };
}

from_big_endian!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

const MAX_BIG_ENDIAN_SIZE: usize = 8;

/// A forward only cursor over a sequence of bytes that may be split across a number of
/// separate buffers. The cursor can be rewound to any position that it has already passed.
///
/// The reader is cheap to copy; a copy has an independent position.
#[derive(Debug, Clone, Copy)]
pub struct SequenceReader<'a> {
    segments: Segments<'a>,
    index: usize,
    offset: usize,
    consumed: usize,
    length: usize,
}

impl<'a> SequenceReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        SequenceReader {
            segments: Segments::Contiguous(bytes),
            index: 0,
            offset: 0,
            consumed: 0,
            length: bytes.len(),
        }
    }

    pub fn from_segments(chunks: &'a [Bytes]) -> Self {
        let mut reader = SequenceReader {
            segments: Segments::Chunked(chunks),
            index: 0,
            offset: 0,
            consumed: 0,
            length: chunks.iter().map(Bytes::len).sum(),
        };
        reader.skip_exhausted();
        reader
    }

    /// Total length of the sequence.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.length - self.consumed
    }

    pub fn end(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether the sequence is backed by more than one buffer.
    pub fn is_chunked(&self) -> bool {
        matches!(self.segments, Segments::Chunked(_))
    }

    /// The unread part of the current segment.
    pub fn unread_span(&self) -> &'a [u8] {
        let segment = self.segments.get(self.index);
        &segment[self.offset.min(segment.len())..]
    }

    // Move forward past any segments that have been completely read.
    fn skip_exhausted(&mut self) {
        let last = self.segments.count().saturating_sub(1);
        while self.index < last && self.offset >= self.segments.get(self.index).len() {
            self.index += 1;
            self.offset = 0;
        }
    }

    pub fn try_peek(&self) -> Option<u8> {
        self.unread_span().first().copied()
    }

    pub fn try_read(&mut self) -> Option<u8> {
        let byte = self.try_peek()?;
        self.offset += 1;
        self.consumed += 1;
        self.skip_exhausted();
        Some(byte)
    }

    /// Read a multi-byte value stored in big endian order. If the value straddles two
    /// segments it is assembled from both.
    pub fn try_read_big_endian<T: FromBigEndian>(&mut self) -> Option<T> {
        let span = self.unread_span();
        let value = if span.len() >= T::SIZE {
            T::from_be_slice(span)
        } else {
            let mut scratch = [0u8; MAX_BIG_ENDIAN_SIZE];
            let target = &mut scratch[..T::SIZE];
            if !self.try_copy_to(target) {
                return None;
            }
            T::from_be_slice(target)
        };
        self.advance_unchecked(T::SIZE);
        Some(value)
    }

    /// Copy bytes from the current position to fill `dst`, without advancing.
    pub fn try_copy_to(&self, dst: &mut [u8]) -> bool {
        if dst.len() > self.remaining() {
            return false;
        }
        let mut copied = 0;
        let mut index = self.index;
        let mut offset = self.offset;
        while copied < dst.len() {
            let segment = self.segments.get(index);
            let available = &segment[offset.min(segment.len())..];
            let n = available.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&available[..n]);
            copied += n;
            index += 1;
            offset = 0;
        }
        true
    }

    fn advance_unchecked(&mut self, mut count: usize) {
        self.consumed += count;
        loop {
            let segment_len = self.segments.get(self.index).len();
            let available = segment_len - self.offset.min(segment_len);
            if count <= available {
                self.offset += count;
                break;
            } else {
                count -= available;
                self.index += 1;
                self.offset = 0;
            }
        }
        self.skip_exhausted();
    }

    /// Move the cursor forward.
    pub fn advance(&mut self, count: usize) -> Result<(), CursorError> {
        let available = self.remaining();
        if count > available {
            Err(CursorError::OutOfRange {
                requested: count,
                available,
            })
        } else {
            self.advance_unchecked(count);
            Ok(())
        }
    }

    /// Move the cursor back over bytes that have already been read.
    pub fn rewind(&mut self, mut count: usize) -> Result<(), CursorError> {
        if count > self.consumed {
            return Err(CursorError::OutOfRange {
                requested: count,
                available: self.consumed,
            });
        }
        self.consumed -= count;
        while count > self.offset {
            count -= self.offset;
            self.index -= 1;
            self.offset = self.segments.get(self.index).len();
        }
        self.offset -= count;
        self.skip_exhausted();
        Ok(())
    }

    /// A view of the next `len` bytes, without advancing.
    pub fn peek_slice(&self, len: usize) -> Option<SequenceSlice<'a>> {
        if len > self.remaining() {
            None
        } else {
            Some(SequenceSlice {
                segments: self.segments,
                index: self.index,
                offset: self.offset,
                len,
            })
        }
    }

    /// Take a view of the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Option<SequenceSlice<'a>> {
        let slice = self.peek_slice(len)?;
        self.advance_unchecked(len);
        Some(slice)
    }
}

/// A view of a range of bytes within a sequence. The range may span several segments. No
/// data is copied unless explicitly requested.
#[derive(Debug, Clone, Copy)]
pub struct SequenceSlice<'a> {
    segments: Segments<'a>,
    index: usize,
    offset: usize,
    len: usize,
}

impl<'a> SequenceSlice<'a> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// If the entire range lies within a single segment, get it as a slice.
    pub fn as_contiguous(&self) -> Option<&'a [u8]> {
        let segment = self.segments.get(self.index);
        let start = self.offset.min(segment.len());
        segment.get(start..start + self.len)
    }

    /// Iterate over the parts of the range that lie in each segment.
    pub fn chunks(&self) -> SliceChunks<'a> {
        SliceChunks { slice: *self }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Convert to a [`Bytes`]. If the range lies within a single shared buffer, no data is
    /// copied.
    pub fn to_bytes(&self) -> Bytes {
        match self.segments {
            Segments::Chunked(chunks) => match chunks.get(self.index) {
                Some(chunk) if self.offset + self.len <= chunk.len() => {
                    chunk.slice(self.offset..self.offset + self.len)
                }
                _ => Bytes::from(self.to_vec()),
            },
            Segments::Contiguous(bytes) => {
                Bytes::copy_from_slice(&bytes[self.offset..self.offset + self.len])
            }
        }
    }

    fn current(&self) -> &'a [u8] {
        let segment = self.segments.get(self.index);
        let start = self.offset.min(segment.len());
        let end = (start + self.len).min(segment.len());
        &segment[start..end]
    }
}

impl<'a> PartialEq for SequenceSlice<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.to_vec() == other.to_vec()
    }
}

impl<'a> PartialEq<[u8]> for SequenceSlice<'a> {
    fn eq(&self, other: &[u8]) -> bool {
        self.len == other.len() && self.to_vec() == other
    }
}

impl<'a> Buf for SequenceSlice<'a> {
    fn remaining(&self) -> usize {
        self.len
    }

    fn chunk(&self) -> &[u8] {
        if self.len == 0 {
            &[]
        } else {
            let mut slice = *self;
            while slice.current().is_empty() && slice.index + 1 < slice.segments.count() {
                slice.index += 1;
                slice.offset = 0;
            }
            slice.current()
        }
    }

    fn advance(&mut self, mut cnt: usize) {
        assert!(cnt <= self.len, "Advanced past the end of a sequence slice.");
        self.len -= cnt;
        while cnt > 0 {
            let segment_len = self.segments.get(self.index).len();
            let available = segment_len - self.offset.min(segment_len);
            if cnt < available {
                self.offset += cnt;
                cnt = 0;
            } else {
                cnt -= available;
                self.index += 1;
                self.offset = 0;
            }
        }
    }
}

/// Iterator over the segments of a [`SequenceSlice`].
#[derive(Debug, Clone)]
pub struct SliceChunks<'a> {
    slice: SequenceSlice<'a>,
}

impl<'a> Iterator for SliceChunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let SliceChunks { slice } = self;
        while slice.len > 0 {
            let chunk = slice.current();
            slice.index += 1;
            slice.offset = 0;
            if !chunk.is_empty() {
                slice.len -= chunk.len();
                return Some(chunk);
            }
        }
        None
    }
}
