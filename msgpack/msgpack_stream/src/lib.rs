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

//! Delimiting complete top-level MessagePack values in a continuous byte stream.

mod config;
mod decoder;
mod error;
mod reader;

pub use config::StreamReaderConfig;
pub use decoder::MessagePackFrameDecoder;
pub use error::StreamReadError;
pub use reader::MessagePackStreamReader;

use msgpack_codec::{MessagePackReader, MsgPackReadError};

/// If `bytes` starts with a complete MessagePack value, the length of its encoding.
pub(crate) fn complete_value_len(bytes: &[u8]) -> Result<Option<usize>, MsgPackReadError> {
    let mut reader = MessagePackReader::new(bytes);
    if reader.try_skip()? {
        Ok(Some(reader.consumed()))
    } else {
        Ok(None)
    }
}
