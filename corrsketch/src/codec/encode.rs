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

use byteorder::BigEndian;
use byteorder::ByteOrder;

/// An append-only byte buffer for the big-endian sketch encodings.
pub struct SketchBytes {
    bytes: Vec<u8>,
}

impl SketchBytes {
    /// Constructs an empty `SketchBytes` with at least the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Consumes the `SketchBytes` and returns the underlying `Vec<u8>`.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, n: u8) {
        self.bytes.push(n);
    }

    /// Writes a row count as a big-endian `u32`.
    pub fn write_u32_be(&mut self, n: u32) {
        self.bytes.extend_from_slice(&n.to_be_bytes());
    }

    /// Writes hash keys as consecutive 4-byte big-endian integers.
    pub fn write_keys(&mut self, keys: &[i32]) {
        let start = self.grow(keys.len() * size_of::<i32>());
        BigEndian::write_i32_into(keys, &mut self.bytes[start..]);
    }

    /// Writes values as consecutive 8-byte big-endian doubles.
    pub fn write_values(&mut self, values: &[f64]) {
        let start = self.grow(values.len() * size_of::<f64>());
        BigEndian::write_f64_into(values, &mut self.bytes[start..]);
    }

    // zero-extends the buffer by `n` bytes and returns where the new bytes start
    fn grow(&mut self, n: usize) -> usize {
        let start = self.bytes.len();
        self.bytes.resize(start + n, 0);
        start
    }
}
