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

//! Encoding and decoding of the MessagePack wire format directly against byte buffers.
//!
//! [`MessagePackWriter`] emits the most compact encoding of each token into a growable
//! [`WriteBuffer`]. [`MessagePackReader`] decodes tokens from one or more contiguous
//! buffers, accepting every valid encoding. A [`SecurityPolicy`] limits the nesting depth
//! and the hashing of map keys when reading data from an untrusted source.

mod buffer;
pub mod code;
mod ext;
pub mod primitives;
mod reader;
mod security;
mod sequence;
mod timestamp;
mod writer;

pub use buffer::{OutputBuffer, WriteBuffer};
pub use code::MessagePackType;
pub use ext::{ExtensionHeader, ExtensionResult};
pub use reader::{MessagePackReader, MsgPackReadError};
pub use security::{DepthGuard, KeyHasher, KeyHasherState, SecurityPolicy, TypeAccessError};
pub use sequence::{CursorError, FromBigEndian, SequenceReader, SequenceSlice, SliceChunks};
pub use timestamp::{InvalidNanoseconds, Timestamp};
pub use writer::{MessagePackWriter, MsgPackWriteError};
