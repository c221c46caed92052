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

//! Key hashing and the order-key transform.
//!
//! Join keys reach a sketch as signed 32-bit MurmurHash3 values. Retention decisions are not made
//! on the raw hash bits but on an *order key*: the fractional part of `(h + 1) / φ`, where `φ` is
//! the golden ratio. The multiplicative (Fibonacci) transform spreads hashes near-uniformly over
//! `[0, 1)` and is a pure function of the hash, so two sketches built independently (on different
//! machines, in different runs) always agree on which keys rank lowest.

mod murmurhash;

use std::hash::Hasher;

pub use self::murmurhash::MurmurHash3X86_32;

/// Seed used when hashing join keys.
///
/// Sketches can only be compared when their keys were hashed with the same seed.
pub const DEFAULT_KEY_SEED: u32 = 0;

/// Reciprocal of the golden ratio, `(√5 - 1) / 2`.
#[allow(clippy::excessive_precision)]
pub const INV_GOLDEN_RATIO: f64 = 0.618_033_988_749_894_848_204_586_834_365_638_118;

/// Hashes raw key bytes with [`DEFAULT_KEY_SEED`].
///
/// # Examples
///
/// ```
/// # use corrsketch::hash::hash_key;
/// assert_eq!(hash_key(b"hello"), 0x248bfa47);
/// ```
pub fn hash_key(bytes: &[u8]) -> i32 {
    let mut hasher = MurmurHash3X86_32::with_seed(DEFAULT_KEY_SEED);
    hasher.write(bytes);
    hasher.finish32() as i32
}

/// Hashes the UTF-8 bytes of a string key.
pub fn hash_str(key: &str) -> i32 {
    hash_key(key.as_bytes())
}

/// Maps a hash to its order key in `[0, 1)`.
///
/// # Examples
///
/// ```
/// # use corrsketch::hash::order_key;
/// assert_eq!(order_key(-1), 0.0);
/// assert!((order_key(0) - 0.618033988749895).abs() < 1e-12);
/// assert!((0.0..1.0).contains(&order_key(i32::MIN)));
/// ```
pub fn order_key(hash: i32) -> f64 {
    let scaled = (hash as f64 + 1.0) * INV_GOLDEN_RATIO;
    let fraction = scaled - scaled.floor();
    debug_assert!((0.0..1.0).contains(&fraction), "order key out of range: {fraction}");
    fraction
}
