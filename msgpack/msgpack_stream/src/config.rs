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

const DEFAULT_READ_SIZE: usize = 4096;

/// Configuration for a [`crate::MessagePackStreamReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReaderConfig {
    /// The minimum amount of space to make available in the buffer for each read from the
    /// underlying stream.
    pub read_size: usize,
}

impl StreamReaderConfig {
    pub const DEFAULT: StreamReaderConfig = StreamReaderConfig {
        read_size: DEFAULT_READ_SIZE,
    };
}

impl Default for StreamReaderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
