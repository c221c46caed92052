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

use std::io;
use std::io::Cursor;
use std::io::Read;

use byteorder::BigEndian;
use byteorder::ByteOrder;

/// A read cursor over bytes in the big-endian sketch encodings.
pub struct SketchSlice<'a> {
    slice: Cursor<&'a [u8]>,
}

impl SketchSlice<'_> {
    /// Creates a new `SketchSlice` from the given byte slice.
    pub fn new(slice: &[u8]) -> SketchSlice<'_> {
        SketchSlice {
            slice: Cursor::new(slice),
        }
    }

    /// Returns the number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        let len = self.slice.get_ref().len() as u64;
        len.saturating_sub(self.slice.position()) as usize
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.slice.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.slice.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Reads `count` hash keys written by `SketchBytes::write_keys`.
    pub fn read_keys(&mut self, count: usize) -> io::Result<Vec<i32>> {
        let buf = self.take(count * size_of::<i32>())?;
        let mut keys = vec![0; count];
        BigEndian::read_i32_into(&buf, &mut keys);
        Ok(keys)
    }

    /// Reads `count` values written by `SketchBytes::write_values`.
    pub fn read_values(&mut self, count: usize) -> io::Result<Vec<f64>> {
        let buf = self.take(count * size_of::<f64>())?;
        let mut values = vec![0.0; count];
        BigEndian::read_f64_into(&buf, &mut values);
        Ok(values)
    }

    fn take(&mut self, n: usize) -> io::Result<Vec<u8>> {
        if self.remaining() < n {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let mut buf = vec![0u8; n];
        self.slice.read_exact(&mut buf)?;
        Ok(buf)
    }
}
