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
use tokio_util::codec::Decoder;

use crate::{complete_value_len, StreamReadError};


/// Splits a byte stream into complete top-level MessagePack values, for use with
/// [`tokio_util::codec::FramedRead`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MessagePackFrameDecoder;

impl Decoder for MessagePackFrameDecoder {
    type Item = Bytes;
    type Error = StreamReadError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(complete_value_len(src)?.map(|len| src.split_to(len).freeze()))
    }
}
