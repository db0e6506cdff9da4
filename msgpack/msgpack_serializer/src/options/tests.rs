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

use super::{Compression, SerializerOptions};

#[test]
fn default_options() {
    let options = SerializerOptions::default();
    assert_eq!(options.security(), &SecurityPolicy::TRUSTED);
    assert_eq!(options.compression(), Compression::None);
    assert_eq!(options.compression_min_length(), 64);
    assert!(!options.old_spec());
}

#[test]
fn with_methods_leave_original() {
    let base = SerializerOptions::DEFAULT;
    let modified = base
        .with_compression(Compression::Deflate)
        .with_compression_min_length(10)
        .with_old_spec(true)
        .with_security(SecurityPolicy::UNTRUSTED);
    assert_eq!(base, SerializerOptions::default());
    assert_eq!(modified.compression(), Compression::Deflate);
    assert_eq!(modified.compression_min_length(), 10);
    assert!(modified.old_spec());
    assert_eq!(modified.security(), &SecurityPolicy::UNTRUSTED);
    assert_eq!(
        SerializerOptions::UNTRUSTED.security(),
        &SecurityPolicy::UNTRUSTED
    );
}
