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

use msgpack_codec::SecurityPolicy;

#[cfg(test)]
mod tests;

const DEFAULT_COMPRESSION_MIN_LENGTH: usize = 64;

/// The compression applied to complete documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    /// Documents are stored in a DEFLATE compressed extension block.
    Deflate,
}

/// Options that apply to a complete serialization or deserialization. Options are
/// immutable; the `with_*` methods produce modified copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerOptions {
    security: SecurityPolicy,
    compression: Compression,
    compression_min_length: usize,
    old_spec: bool,
}

impl SerializerOptions {
    pub const DEFAULT: SerializerOptions = SerializerOptions {
        security: SecurityPolicy::DEFAULT,
        compression: Compression::None,
        compression_min_length: DEFAULT_COMPRESSION_MIN_LENGTH,
        old_spec: false,
    };

    /// Options for reading data from an untrusted source.
    pub const UNTRUSTED: SerializerOptions = SerializerOptions {
        security: SecurityPolicy::UNTRUSTED,
        ..Self::DEFAULT
    };

    pub fn security(&self) -> &SecurityPolicy {
        &self.security
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Documents that encode to fewer bytes than this are never compressed.
    pub fn compression_min_length(&self) -> usize {
        self.compression_min_length
    }

    pub fn old_spec(&self) -> bool {
        self.old_spec
    }

    pub fn with_security(self, security: SecurityPolicy) -> Self {
        SerializerOptions { security, ..self }
    }

    pub fn with_compression(self, compression: Compression) -> Self {
        SerializerOptions {
            compression,
            ..self
        }
    }

    pub fn with_compression_min_length(self, compression_min_length: usize) -> Self {
        SerializerOptions {
            compression_min_length,
            ..self
        }
    }

    pub fn with_old_spec(self, old_spec: bool) -> Self {
        SerializerOptions { old_spec, ..self }
    }
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
