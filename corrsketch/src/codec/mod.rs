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

//! Byte-level encodings shared by the sketch index and the frozen sketch format.
//!
//! Value arrays are stored as fixed-width big-endian IEEE-754 doubles, one per retained key and
//! in the same order as the key sequence. Hash keys are stored as 4 big-endian bytes so they can
//! be used directly as fingerprint terms.
//!
//! ```
//! use corrsketch::codec::decode_hash;
//! use corrsketch::codec::decode_values;
//! use corrsketch::codec::encode_hash;
//! use corrsketch::codec::encode_values;
//!
//! let bytes = encode_values(&[1.5, -2.25]);
//! assert_eq!(bytes.len(), 16);
//! assert_eq!(decode_values(&bytes).unwrap(), vec![1.5, -2.25]);
//!
//! let term = encode_hash(-7);
//! assert_eq!(decode_hash(&term).unwrap(), -7);
//! ```

mod decode;
mod encode;
pub(crate) mod family;

pub(crate) use self::decode::SketchSlice;
pub(crate) use self::encode::SketchBytes;
use crate::error::Error;

/// Width in bytes of one encoded value.
pub const VALUE_WIDTH: usize = size_of::<f64>();

/// Width in bytes of one encoded hash key.
pub const HASH_WIDTH: usize = size_of::<i32>();

/// Encodes values as a big-endian sequence of 8-byte doubles.
pub fn encode_values(values: &[f64]) -> Vec<u8> {
    let mut bytes = SketchBytes::with_capacity(values.len() * VALUE_WIDTH);
    bytes.write_values(values);
    bytes.into_bytes()
}

/// Decodes a byte sequence produced by [`encode_values`].
///
/// # Errors
///
/// Returns [`ErrorKind::Serialization`](crate::error::ErrorKind::Serialization) if the length is
/// not a multiple of 8.
pub fn decode_values(bytes: &[u8]) -> Result<Vec<f64>, Error> {
    if bytes.len() % VALUE_WIDTH != 0 {
        return Err(
            Error::deserial("value payload length must be a multiple of 8")
                .with_context("len", bytes.len()),
        );
    }
    SketchSlice::new(bytes)
        .read_values(bytes.len() / VALUE_WIDTH)
        .map_err(|_| Error::insufficient_bytes("values"))
}

/// Encodes a 32-bit hash key as 4 big-endian bytes.
pub fn encode_hash(hash: i32) -> [u8; HASH_WIDTH] {
    hash.to_be_bytes()
}

/// Decodes a hash key produced by [`encode_hash`], preserving its sign.
///
/// # Errors
///
/// Returns [`ErrorKind::Serialization`](crate::error::ErrorKind::Serialization) if `bytes` is not
/// exactly 4 bytes long.
pub fn decode_hash(bytes: &[u8]) -> Result<i32, Error> {
    let buf: [u8; HASH_WIDTH] = bytes.try_into().map_err(|_| {
        Error::deserial("hash key must be exactly 4 bytes").with_context("len", bytes.len())
    })?;
    Ok(i32::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_values_round_trip_lengths() {
        for len in [0usize, 1, 1000] {
            let values: Vec<f64> = (0..len)
                .map(|i| (i as f64 - 500.0) * 1234.5678 + 1e-9 * i as f64)
                .collect();
            let decoded = decode_values(&encode_values(&values)).unwrap();
            assert_eq!(decoded.len(), values.len());
            for (a, b) in values.iter().zip(decoded.iter()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn test_values_are_big_endian() {
        let bytes = encode_values(&[1.0]);
        assert_eq!(bytes, vec![0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_values_rejects_ragged_payload() {
        let err = decode_values(&[0u8; 12]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_hash_sign_is_preserved() {
        for hash in [i32::MIN, -1, 0, 1, 42, i32::MAX] {
            let term = encode_hash(hash);
            assert_eq!(decode_hash(&term).unwrap(), hash);
        }
        assert_eq!(encode_hash(-1), [0xff, 0xff, 0xff, 0xff]);
        assert_eq!(encode_hash(258), [0, 0, 1, 2]);
    }

    #[test]
    fn test_decode_hash_rejects_wrong_width() {
        assert_eq!(
            decode_hash(&[1, 2, 3]).unwrap_err().kind(),
            ErrorKind::Serialization
        );
        assert_eq!(
            decode_hash(&[1, 2, 3, 4, 5]).unwrap_err().kind(),
            ErrorKind::Serialization
        );
    }
}
