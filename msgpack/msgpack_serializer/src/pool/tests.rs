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

use std::thread;

use msgpack_codec::MessagePackWriter;

use super::BufferPool;

#[test]
fn rented_buffers_are_reused() {
    let pool = BufferPool::new(4);
    {
        let mut buffer = pool.rent();
        MessagePackWriter::new(&mut *buffer).write_str("data").unwrap();
        assert_eq!(buffer.as_slice(), &[0xa4, b'd', b'a', b't', b'a']);
    }
    assert_eq!(pool.retained(), 1);

    let buffer = pool.rent();
    assert!(buffer.is_empty());
    assert!(buffer.capacity() > 0);
    assert_eq!(pool.retained(), 0);
}

#[test]
fn unused_buffers_are_not_retained() {
    let pool = BufferPool::new(4);
    drop(pool.rent());
    assert_eq!(pool.retained(), 0);
}

#[test]
fn retention_is_bounded() {
    let pool = BufferPool::new(2);
    let mut rented = (0..5).map(|_| pool.rent()).collect::<Vec<_>>();
    for buffer in rented.iter_mut() {
        MessagePackWriter::new(&mut **buffer).write_nil();
    }
    drop(rented);
    assert_eq!(pool.retained(), 2);
}

#[test]
fn large_buffers_are_discarded() {
    let pool = BufferPool::new(2);
    {
        let mut buffer = pool.rent();
        MessagePackWriter::new(&mut *buffer)
            .write_bin(&vec![0; 2 << 20])
            .unwrap();
    }
    assert_eq!(pool.retained(), 0);
}

#[test]
fn taken_buffers_are_not_returned() {
    let pool = BufferPool::new(2);
    let mut buffer = pool.rent();
    MessagePackWriter::new(&mut *buffer).write_bool(true);
    let owned = buffer.take();
    assert_eq!(owned.as_slice(), &[0xc3]);
    assert_eq!(pool.retained(), 0);
}

#[test]
fn concurrent_rental() {
    let pool = BufferPool::new(8);
    thread::scope(|scope| {
        for i in 0..8u32 {
            let pool = &pool;
            scope.spawn(move || {
                for _ in 0..100 {
                    let mut buffer = pool.rent();
                    assert!(buffer.is_empty());
                    MessagePackWriter::new(&mut *buffer).write_u32(i);
                    assert_eq!(buffer.len(), 1);
                }
            });
        }
    });
    assert!(pool.retained() <= 8);
    assert!(pool.retained() > 0);
}

#[test]
fn shared_pool() {
    let first = BufferPool::shared() as *const BufferPool;
    let second = BufferPool::shared() as *const BufferPool;
    assert_eq!(first, second);
}
