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

use crate::sequence::SequenceSlice;

/// The header of an extension value: its type code and the length of its payload in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionHeader {
    pub type_code: i8,
    pub length: u32,
}

impl ExtensionHeader {
    pub const fn new(type_code: i8, length: u32) -> Self {
        ExtensionHeader { type_code, length }
    }
}

/// An extension value whose payload has not been interpreted.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionResult<'a> {
    pub type_code: i8,
    pub data: SequenceSlice<'a>,
}

impl<'a> ExtensionResult<'a> {
    pub fn header(&self) -> ExtensionHeader {
        ExtensionHeader::new(self.type_code, self.data.len() as u32)
    }
}
