// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::hash::Hasher;

use byteorder::ByteOrder;
use byteorder::LE;

const C1: u32 = 0xcc9e2d51;
const C2: u32 = 0x1b873593;

/// The 32-bit variant of MurmurHash3, a fast non-cryptographic hash function used to turn join
/// keys into the signed 32-bit hashes stored by every sketch.
#[derive(Debug)]
pub struct MurmurHash3X86_32 {
    h1: u32,
    total: u32,
    buf: [u8; 4],
    buf_len: usize,
}

impl MurmurHash3X86_32 {
    /// Creates a hasher with the given seed.
    pub fn with_seed(seed: u32) -> Self {
        MurmurHash3X86_32 {
            h1: seed,
            total: 0,
            buf: [0; 4],
            buf_len: 0,
        }
    }

    /// Returns the 32-bit hash of everything written so far.
    pub fn finish32(&self) -> u32 {
        let mut h1 = self.h1;
        let total = self.total.wrapping_add(self.buf_len as u32);

        // tail
        if self.buf_len > 0 {
            let mut buf = [0u8; 4];
            buf[..self.buf_len].copy_from_slice(&self.buf[..self.buf_len]);
            let mut k1 = u32::from_le_bytes(buf);
            k1 = k1.wrapping_mul(C1);
            k1 = k1.rotate_left(15);
            k1 = k1.wrapping_mul(C2);
            h1 ^= k1;
        }

        h1 ^= total;
        fmix32(h1)
    }

    #[inline]
    fn update(&mut self, mut k1: u32) {
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        self.h1 ^= k1;

        self.h1 = self.h1.rotate_left(13);
        self.h1 = self.h1.wrapping_mul(5).wrapping_add(0xe6546b64);

        self.total = self.total.wrapping_add(4);
    }
}

impl Hasher for MurmurHash3X86_32 {
    fn finish(&self) -> u64 {
        self.finish32() as u64
    }

    fn write(&mut self, mut bytes: &[u8]) {
        if self.buf_len + bytes.len() < 4 {
            self.buf[self.buf_len..self.buf_len + bytes.len()].copy_from_slice(bytes);
            self.buf_len += bytes.len();
            return;
        }

        if self.buf_len != 0 {
            let wanted = 4 - self.buf_len;
            self.buf[self.buf_len..].copy_from_slice(&bytes[..wanted]);
            let k1 = LE::read_u32(&self.buf);
            self.update(k1);
            bytes = &bytes[wanted..];
            self.buf_len = 0;
        }

        let blocks = bytes.len() >> 2;
        for i in 0..blocks {
            let lo = i << 2;
            let k1 = LE::read_u32(&bytes[lo..lo + 4]);
            self.update(k1);
        }

        let len = bytes.len() % 4;
        if len > 0 {
            self.buf[0..len].copy_from_slice(&bytes[blocks << 2..]);
            self.buf_len = len;
        }
    }
}

/// Finalization mix: force all bits of a hash block to avalanche.
#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^ (h >> 16)
}
