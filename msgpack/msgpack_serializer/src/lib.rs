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

//! Serialization of Rust values to and from MessagePack, built on the primitives in
//! [`msgpack_codec`].
//!
//! Types implement [`MsgPackWritable`] and [`MsgPackReadable`] by calling the reader and
//! writer operations in the order that mirrors their structure. The [`serialize`] and
//! [`deserialize`] functions apply the [`SerializerOptions`] to a complete document,
//! including the optional compression of large documents.

mod compression;
mod error;
mod formatter;
mod options;
mod pool;
mod serializer;
mod value;

pub use compression::{BlockCompressor, DeflateCompressor};
pub use error::SerializationError;
pub use formatter::{MsgPackReadable, MsgPackWritable};
pub use options::{Compression, SerializerOptions};
pub use pool::{BufferPool, PooledBuffer};
pub use serializer::{deserialize, deserialize_segments, serialize, serialize_into};
pub use value::Value;

#[cfg(test)]
mod tests;
