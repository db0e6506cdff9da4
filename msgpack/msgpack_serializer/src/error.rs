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

use msgpack_codec::{MsgPackReadError, MsgPackWriteError, TypeAccessError};
use thiserror::Error;

/// Errors that can occur serializing or deserializing a value.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error(transparent)]
    Read(#[from] MsgPackReadError),
    #[error(transparent)]
    Write(#[from] MsgPackWriteError),
    #[error(transparent)]
    TypeAccess(#[from] TypeAccessError),
    #[error("Compressing or decompressing a block failed: {0}")]
    Compression(#[from] std::io::Error),
    #[error("A compressed block should contain {expected} bytes but contained {actual}.")]
    DecompressedLengthMismatch { expected: usize, actual: usize },
    #[error("A map contained more than one entry with the same key.")]
    DuplicateKey,
    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
    #[error("Nil was found where a value was required.")]
    UnexpectedNil,
}
