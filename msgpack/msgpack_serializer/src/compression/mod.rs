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

use std::borrow::Cow;
use std::io::{self, Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use msgpack_codec::code::{self, extension};
use msgpack_codec::{
    ExtensionHeader, MessagePackReader, MessagePackWriter, MsgPackReadError, MsgPackWriteError,
    WriteBuffer,
};

use crate::SerializationError;


/// The uncompressed length is always written as an `int 32`.
const LENGTH_PREFIX_LEN: usize = 5;

/// Space reserved up front for decompression is limited to this multiple of the input size.
const MAX_RESERVE_RATIO: usize = 4;

/// A block compression algorithm.
pub trait BlockCompressor {
    /// Append the compressed form of `input` to `output`.
    fn compress(&self, input: &[u8], output: &mut Vec<u8>) -> io::Result<()>;

    /// Append the decompressed form of `input` to `output`. No more than `expected_len + 1`
    /// bytes will be produced.
    fn decompress(&self, input: &[u8], expected_len: usize, output: &mut Vec<u8>) -> io::Result<()>;
}

/// DEFLATE compression (RFC 1951).
#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateCompressor {
    level: flate2::Compression,
}

impl DeflateCompressor {
    /// # Arguments
    /// * `level` - Compression level from 0 (none) to 9 (best).
    pub fn new(level: u32) -> Self {
        DeflateCompressor {
            level: flate2::Compression::new(level.min(9)),
        }
    }
}

impl BlockCompressor for DeflateCompressor {
    fn compress(&self, input: &[u8], output: &mut Vec<u8>) -> io::Result<()> {
        let mut encoder = DeflateEncoder::new(output, self.level);
        encoder.write_all(input)?;
        encoder.finish()?;
        Ok(())
    }

    fn decompress(&self, input: &[u8], expected_len: usize, output: &mut Vec<u8>) -> io::Result<()> {
        output.reserve(expected_len.min(input.len().saturating_mul(MAX_RESERVE_RATIO)));
        DeflateDecoder::new(input)
            .take(expected_len as u64 + 1)
            .read_to_end(output)?;
        Ok(())
    }
}

/// Write `document` (a complete MessagePack document) as a compressed extension block. The
/// payload of the extension is the length of the document as an `int 32` followed by the
/// compressed bytes.
pub(crate) fn write_compressed<W, C>(
    writer: &mut MessagePackWriter<'_, W>,
    document: &[u8],
    compressor: &C,
) -> Result<(), SerializationError>
where
    W: WriteBuffer,
    C: BlockCompressor + ?Sized,
{
    let uncompressed_len = i32::try_from(document.len())
        .map_err(|_| MsgPackWriteError::LengthOverflow(document.len()))?;
    let mut compressed = Vec::with_capacity(document.len() / 2);
    compressor.compress(document, &mut compressed)?;
    let payload_len = LENGTH_PREFIX_LEN + compressed.len();
    let payload_len =
        u32::try_from(payload_len).map_err(|_| MsgPackWriteError::LengthOverflow(payload_len))?;
    writer.write_ext_header(ExtensionHeader::new(extension::COMPRESSED_BLOCK, payload_len));
    writer.write_explicit_i32(uncompressed_len);
    writer.write_raw(&compressed);
    Ok(())
}

/// Whether the next token is a compressed extension block.
pub(crate) fn is_compressed_block(reader: &MessagePackReader<'_>) -> bool {
    let mut peek = reader.clone();
    matches!(
        peek.try_read_ext_header(),
        Ok(Some(ExtensionHeader { type_code, .. })) if type_code == extension::COMPRESSED_BLOCK
    )
}

/// Read a compressed extension block, giving the document that it contains.
pub(crate) fn read_compressed<C>(
    reader: &mut MessagePackReader<'_>,
    compressor: &C,
) -> Result<Vec<u8>, SerializationError>
where
    C: BlockCompressor + ?Sized,
{
    let ext = reader.read_ext()?;
    if ext.type_code != extension::COMPRESSED_BLOCK {
        return Err(MsgPackReadError::UnexpectedExtension {
            expected: extension::COMPRESSED_BLOCK,
            actual: ext.type_code,
        }
        .into());
    }
    let payload = match ext.data.as_contiguous() {
        Some(bytes) => Cow::Borrowed(bytes),
        None => Cow::Owned(ext.data.to_vec()),
    };
    let mut payload_reader = MessagePackReader::new(&payload);
    let length_code = payload_reader.next_code()?;
    if length_code != code::INT32 {
        return Err(MsgPackReadError::invalid_code(length_code).into());
    }
    let declared = payload_reader.read_i32()?;
    let expected = usize::try_from(declared).map_err(|_| MsgPackReadError::NumericOverflow {
        code: code::INT32,
        target: "usize",
    })?;
    let compressed = &payload[payload_reader.consumed()..];
    let mut document = Vec::new();
    compressor.decompress(compressed, expected, &mut document)?;
    if document.len() != expected {
        return Err(SerializationError::DecompressedLengthMismatch {
            expected,
            actual: document.len(),
        });
    }
    Ok(document)
}
