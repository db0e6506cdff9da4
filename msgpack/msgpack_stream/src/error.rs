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

use msgpack_codec::MsgPackReadError;
use thiserror::Error;

/// Errors that can occur reading values from a byte stream.
#[derive(Debug, Error)]
pub enum StreamReadError {
    #[error("Reading from the stream failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("The stream contained invalid MessagePack data: {0}")]
    Format(#[from] MsgPackReadError),
    #[error("The read was cancelled.")]
    Cancelled,
}
