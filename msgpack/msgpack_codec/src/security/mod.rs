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

use std::any::{type_name, TypeId};
use std::collections::hash_map::{DefaultHasher, RandomState};
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, FixedOffset, Utc};
use fnv::{FnvBuildHasher, FnvHasher};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::reader::{MessagePackReader, MsgPackReadError};
use crate::timestamp::Timestamp;


/// Limits that are applied when deserializing data from sources that may be hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityPolicy {
    maximum_object_graph_depth: usize,
    hash_collision_resistant: bool,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SecurityPolicy {
    /// For data from a trusted source: no depth limit and fast hashing of map keys.
    pub const TRUSTED: SecurityPolicy = SecurityPolicy {
        maximum_object_graph_depth: usize::MAX,
        hash_collision_resistant: false,
    };

    /// For data from an untrusted source: containers may be nested at most 500 deep and map
    /// keys are hashed with randomly keyed SipHash.
    pub const UNTRUSTED: SecurityPolicy = SecurityPolicy {
        maximum_object_graph_depth: 500,
        hash_collision_resistant: true,
    };

    pub const DEFAULT: SecurityPolicy = Self::TRUSTED;

    pub fn maximum_object_graph_depth(&self) -> usize {
        self.maximum_object_graph_depth
    }

    pub fn hash_collision_resistant(&self) -> bool {
        self.hash_collision_resistant
    }

    pub fn with_maximum_object_graph_depth(self, maximum_object_graph_depth: usize) -> Self {
        SecurityPolicy {
            maximum_object_graph_depth,
            ..self
        }
    }

    pub fn with_hash_collision_resistant(self, hash_collision_resistant: bool) -> Self {
        SecurityPolicy {
            hash_collision_resistant,
            ..self
        }
    }

    /// Enter a nested container. The depth of the reader is restored when the returned guard
    /// is dropped, so the guard must be held while the contents of the container are read.
    ///
    /// # Arguments
    /// * `reader` - The reader that is about to enter the container.
    pub fn depth_step<'r, 'a>(
        &self,
        reader: &'r mut MessagePackReader<'a>,
    ) -> Result<DepthGuard<'r, 'a>, MsgPackReadError> {
        let max_depth = self.maximum_object_graph_depth;
        if reader.depth >= max_depth {
            warn!(
                max_depth,
                consumed = reader.consumed(),
                "Maximum object graph depth exceeded."
            );
            Err(MsgPackReadError::DepthExceeded { max_depth })
        } else {
            reader.depth += 1;
            Ok(DepthGuard { reader })
        }
    }

    /// Choose the hashing strategy for map keys of type `K`. With collision resistance
    /// enabled, only a fixed set of key types are permitted.
    pub fn key_hasher<K: ?Sized + 'static>(&self) -> Result<KeyHasher, TypeAccessError> {
        if !self.hash_collision_resistant {
            Ok(KeyHasher::Fast(FnvBuildHasher::default()))
        } else if is_hardened_key::<K>() {
            Ok(KeyHasher::Hardened(RandomState::new()))
        } else {
            Err(TypeAccessError {
                type_name: type_name::<K>(),
            })
        }
    }

    /// Create a map that hashes its keys according to this policy.
    pub fn new_map<K: 'static, V>(
        &self,
        capacity: usize,
    ) -> Result<HashMap<K, V, KeyHasher>, TypeAccessError> {
        let hasher = self.key_hasher::<K>()?;
        Ok(HashMap::with_capacity_and_hasher(capacity, hasher))
    }
}

fn is_hardened_key<K: ?Sized + 'static>() -> bool {
    let id = TypeId::of::<K>();
    [
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<u128>(),
        TypeId::of::<usize>(),
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<i128>(),
        TypeId::of::<isize>(),
        TypeId::of::<bool>(),
        TypeId::of::<char>(),
        TypeId::of::<String>(),
        TypeId::of::<Box<str>>(),
        TypeId::of::<&'static str>(),
        TypeId::of::<Uuid>(),
        TypeId::of::<DateTime<Utc>>(),
        TypeId::of::<DateTime<FixedOffset>>(),
        TypeId::of::<Timestamp>(),
    ]
    .contains(&id)
}

/// A map key type has not been vetted for use with collision resistant hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("The type {type_name} is not permitted as a map key for untrusted data.")]
pub struct TypeAccessError {
    pub type_name: &'static str,
}

/// Holds a reader one level deeper in the object graph. Dropping the guard returns the
/// reader to the previous depth.
#[derive(Debug)]
pub struct DepthGuard<'r, 'a> {
    reader: &'r mut MessagePackReader<'a>,
}

impl<'r, 'a> Deref for DepthGuard<'r, 'a> {
    type Target = MessagePackReader<'a>;

    fn deref(&self) -> &Self::Target {
        self.reader
    }
}

impl<'r, 'a> DerefMut for DepthGuard<'r, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.reader
    }
}

impl<'r, 'a> Drop for DepthGuard<'r, 'a> {
    fn drop(&mut self) {
        self.reader.depth -= 1;
    }
}

/// The hashing strategy for map keys selected by a [`SecurityPolicy`].
#[derive(Debug, Clone)]
pub enum KeyHasher {
    Fast(FnvBuildHasher),
    Hardened(RandomState),
}

impl Default for KeyHasher {
    fn default() -> Self {
        KeyHasher::Fast(FnvBuildHasher::default())
    }
}

impl BuildHasher for KeyHasher {
    type Hasher = KeyHasherState;

    fn build_hasher(&self) -> Self::Hasher {
        match self {
            KeyHasher::Fast(inner) => KeyHasherState::Fast(inner.build_hasher()),
            KeyHasher::Hardened(inner) => KeyHasherState::Hardened(inner.build_hasher()),
        }
    }
}

/// Hasher created by a [`KeyHasher`].
pub enum KeyHasherState {
    Fast(FnvHasher),
    Hardened(DefaultHasher),
}

impl Hasher for KeyHasherState {
    fn finish(&self) -> u64 {
        match self {
            KeyHasherState::Fast(inner) => inner.finish(),
            KeyHasherState::Hardened(inner) => inner.finish(),
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        match self {
            KeyHasherState::Fast(inner) => inner.write(bytes),
            KeyHasherState::Hardened(inner) => inner.write(bytes),
        }
    }
}
