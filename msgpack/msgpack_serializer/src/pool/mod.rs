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

use std::ops::{Deref, DerefMut};

use msgpack_codec::OutputBuffer;
use parking_lot::{const_mutex, Mutex};
use tracing::trace;

#[cfg(test)]
mod tests;

const DEFAULT_MAX_RETAINED: usize = 32;
const MAX_RETAINED_CAPACITY: usize = 1 << 20;

static SHARED: BufferPool = BufferPool::new(DEFAULT_MAX_RETAINED);

/// A stack of reusable output buffers. Buffers are rented with [`BufferPool::rent`] and are
/// returned automatically when the rental is dropped. At most a fixed number of buffers
/// are kept and very large buffers are discarded rather than retained.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<OutputBuffer>>,
    max_retained: usize,
}

impl BufferPool {
    pub const fn new(max_retained: usize) -> Self {
        BufferPool {
            buffers: const_mutex(Vec::new()),
            max_retained,
        }
    }

    /// A pool that is shared by the whole process.
    pub fn shared() -> &'static BufferPool {
        &SHARED
    }

    /// Take an empty buffer from the pool, or create one if the pool is empty.
    pub fn rent(&self) -> PooledBuffer<'_> {
        let buffer = self.buffers.lock().pop();
        trace!(reused = buffer.is_some(), "Renting an output buffer.");
        PooledBuffer {
            pool: self,
            buffer: buffer.unwrap_or_default(),
        }
    }

    /// The number of idle buffers held by the pool.
    pub fn retained(&self) -> usize {
        self.buffers.lock().len()
    }

    fn give_back(&self, mut buffer: OutputBuffer) {
        let capacity = buffer.capacity();
        if capacity == 0 || capacity > MAX_RETAINED_CAPACITY {
            trace!(capacity, "Discarding an output buffer.");
            return;
        }
        buffer.reset();
        let mut guard = self.buffers.lock();
        if guard.len() < self.max_retained {
            guard.push(buffer);
            trace!(capacity, "Returned an output buffer to the pool.");
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(DEFAULT_MAX_RETAINED)
    }
}

/// A buffer rented from a [`BufferPool`]. The buffer is cleared and returned to the pool
/// when this is dropped.
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    buffer: OutputBuffer,
}

impl<'p> PooledBuffer<'p> {
    /// Keep the buffer rather than returning it to the pool.
    pub fn take(mut self) -> OutputBuffer {
        std::mem::take(&mut self.buffer)
    }
}

impl<'p> Deref for PooledBuffer<'p> {
    type Target = OutputBuffer;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<'p> DerefMut for PooledBuffer<'p> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl<'p> Drop for PooledBuffer<'p> {
    fn drop(&mut self) {
        let PooledBuffer { pool, buffer } = self;
        pool.give_back(std::mem::take(buffer));
    }
}
