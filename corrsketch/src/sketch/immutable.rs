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

use std::sync::Arc;

use super::serialization::FLAGS_IS_EMPTY;
use super::serialization::FLAGS_UNIQUE_KEYS;
use super::serialization::PREAMBLE_BYTES;
use super::serialization::SERIAL_VERSION;
use crate::codec::HASH_WIDTH;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::VALUE_WIDTH;
use crate::codec::encode_values;
use crate::codec::family::Family;
use crate::correlation::CorrelationEstimate;
use crate::correlation::CorrelationEstimator;
use crate::correlation::default_estimator;
use crate::error::Error;
use crate::join::PairedSample;
use crate::join::merge_join;
use crate::synopsis::Samples;

/// The frozen, paired form of a correlation sketch.
///
/// Keys are sorted ascending and aligned with their values; this is the invariant every
/// cross-sketch operation relies on, and the only way to build a sketch establishes it. Once
/// created an immutable sketch never changes and is safe to share between threads.
///
/// # Examples
///
/// ```
/// # use corrsketch::sketch::ImmutableSketch;
/// let a = ImmutableSketch::new(vec![3, 1, 2], vec![30.0, 10.0, 20.0]).unwrap();
/// assert_eq!(a.keys(), &[1, 2, 3]);
/// assert_eq!(a.values(), &[10.0, 20.0, 30.0]);
///
/// let b = ImmutableSketch::new(vec![1, 2, 3, 4], vec![1.0, 2.5, 2.9, 7.0]).unwrap();
/// let estimate = a.correlation_to(&b).unwrap();
/// assert_eq!(estimate.sample_size, 3);
/// assert!(estimate.coefficient > 0.9);
/// ```
#[derive(Debug, Clone)]
pub struct ImmutableSketch {
    keys: Vec<i32>,
    values: Vec<f64>,
    unique_keys: bool,
    estimator: Arc<dyn CorrelationEstimator>,
}

impl ImmutableSketch {
    /// Creates a sketch from aligned keys and values, using [Pearson's coefficient].
    ///
    /// Rows are sorted by key; rows sharing a key keep their input order.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration)
    /// if `keys` and `values` differ in length.
    ///
    /// [Pearson's coefficient]: crate::correlation::Pearson
    pub fn new(keys: Vec<i32>, values: Vec<f64>) -> Result<Self, Error> {
        if keys.len() != values.len() {
            return Err(Error::invalid_config("sketch keys and values differ in length")
                .with_context("keys", keys.len())
                .with_context("values", values.len()));
        }
        let samples = Samples {
            keys,
            values,
            unique_keys: false,
        };
        Ok(Self::from_samples(samples, default_estimator()))
    }

    /// Freezes retained samples, sorting them by key.
    ///
    /// Uniqueness is recomputed from the sorted keys.
    pub fn from_samples(samples: Samples, estimator: Arc<dyn CorrelationEstimator>) -> Self {
        let mut rows: Vec<(i32, f64)> = samples.keys.into_iter().zip(samples.values).collect();
        rows.sort_by_key(|&(key, _)| key);
        let (keys, values) = rows.into_iter().unzip();
        Self::from_sorted(keys, values, estimator)
    }

    /// Creates a sketch from keys already sorted ascending.
    pub(crate) fn from_sorted(
        keys: Vec<i32>,
        values: Vec<f64>,
        estimator: Arc<dyn CorrelationEstimator>,
    ) -> Self {
        debug_assert!(keys.is_sorted());
        debug_assert_eq!(keys.len(), values.len());
        let unique_keys = !has_repeats(&keys);
        Self {
            keys,
            values,
            unique_keys,
            estimator,
        }
    }

    /// Returns this sketch comparing with `estimator` instead.
    pub fn with_estimator(mut self, estimator: Arc<dyn CorrelationEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Returns the retained keys, ascending.
    pub fn keys(&self) -> &[i32] {
        &self.keys
    }

    /// Returns the values, aligned with [`ImmutableSketch::keys`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns true if no key appears twice.
    pub fn unique_keys(&self) -> bool {
        self.unique_keys
    }

    /// Returns the estimator.
    pub fn estimator(&self) -> &Arc<dyn CorrelationEstimator> {
        &self.estimator
    }

    /// Returns the number of retained rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the values as fixed-width big-endian doubles, in key order.
    pub fn encoded_values(&self) -> Vec<u8> {
        encode_values(&self.values)
    }

    /// Pairs this sketch's values (`x`) with `other`'s (`y`) on shared keys.
    pub fn join(&self, other: &ImmutableSketch) -> PairedSample {
        merge_join(&self.keys, &self.values, &other.keys, &other.values)
    }

    /// Estimates the correlation with `other` using this sketch's estimator.
    ///
    /// Returns [`CorrelationEstimate::no_overlap`] when the sketches share no keys.
    ///
    /// # Errors
    ///
    /// Propagates estimator errors, such as a single shared key or a constant column.
    pub fn correlation_to(&self, other: &ImmutableSketch) -> Result<CorrelationEstimate, Error> {
        self.correlation_to_with(other, self.estimator.as_ref())
    }

    /// Estimates the correlation with `other` using `estimator`.
    ///
    /// # Errors
    ///
    /// Same as [`ImmutableSketch::correlation_to`].
    pub fn correlation_to_with(
        &self,
        other: &ImmutableSketch,
        estimator: &dyn CorrelationEstimator,
    ) -> Result<CorrelationEstimate, Error> {
        let paired = self.join(other);
        if paired.is_empty() {
            return Ok(CorrelationEstimate::no_overlap());
        }
        estimator.estimate(&paired.x, &paired.y)
    }

    /// Serializes this sketch to bytes.
    ///
    /// The estimator is not part of the payload.
    ///
    /// # Examples
    ///
    /// ```
    /// # use corrsketch::sketch::ImmutableSketch;
    /// let sketch = ImmutableSketch::new(vec![-4, 9], vec![0.5, 1e9]).unwrap();
    /// let bytes = sketch.serialize();
    /// assert_eq!(bytes.len(), 8 + 2 * 4 + 2 * 8);
    ///
    /// let restored = ImmutableSketch::deserialize(&bytes).unwrap();
    /// assert_eq!(restored.keys(), sketch.keys());
    /// assert_eq!(restored.values(), sketch.values());
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let family = Family::CORRELATION;
        let capacity = PREAMBLE_BYTES + self.keys.len() * (HASH_WIDTH + VALUE_WIDTH);
        let mut bytes = SketchBytes::with_capacity(capacity);

        let mut flags = 0;
        if self.is_empty() {
            flags |= FLAGS_IS_EMPTY;
        }
        if self.unique_keys {
            flags |= FLAGS_UNIQUE_KEYS;
        }

        bytes.write_u8(family.preamble_longs);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(family.id);
        bytes.write_u8(flags);
        bytes.write_u32_be(self.keys.len() as u32);

        bytes.write_keys(&self.keys);
        bytes.write_values(&self.values);
        bytes.into_bytes()
    }

    /// Deserializes a sketch that compares with [Pearson's coefficient].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Serialization`](crate::error::ErrorKind::Serialization) if the bytes
    /// are truncated, were produced by another encoder or version, or hold keys out of order.
    ///
    /// [Pearson's coefficient]: crate::correlation::Pearson
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_estimator(bytes, default_estimator())
    }

    /// Deserializes a sketch that compares with `estimator`.
    ///
    /// # Errors
    ///
    /// Same as [`ImmutableSketch::deserialize`].
    pub fn deserialize_with_estimator(
        bytes: &[u8],
        estimator: Arc<dyn CorrelationEstimator>,
    ) -> Result<Self, Error> {
        let family = Family::CORRELATION;
        let mut cursor = SketchSlice::new(bytes);

        let preamble_longs = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_bytes("preamble_longs"))?;
        let serial_version = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_bytes("serial_version"))?;
        let family_id = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_bytes("family_id"))?;
        let flags = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_bytes("flags"))?;
        let count = cursor
            .read_u32_be()
            .map_err(|_| Error::insufficient_bytes("count"))? as usize;

        family.validate_id(family_id)?;
        if serial_version != SERIAL_VERSION {
            return Err(Error::unsupported_serial_version(
                SERIAL_VERSION,
                serial_version,
            ));
        }
        if preamble_longs != family.preamble_longs {
            return Err(Error::deserial(format!(
                "invalid preamble longs: expected {}, got {preamble_longs}",
                family.preamble_longs
            )));
        }
        let is_empty = flags & FLAGS_IS_EMPTY != 0;
        if is_empty != (count == 0) {
            return Err(Error::deserial("empty flag disagrees with row count")
                .with_context("count", count));
        }
        if cursor.remaining() < count * (HASH_WIDTH + VALUE_WIDTH) {
            return Err(Error::insufficient_bytes("rows"));
        }

        let keys = cursor
            .read_keys(count)
            .map_err(|_| Error::insufficient_bytes("keys"))?;
        let values = cursor
            .read_values(count)
            .map_err(|_| Error::insufficient_bytes("values"))?;

        if !keys.is_sorted() {
            return Err(Error::deserial("keys are not sorted ascending"));
        }
        let sketch = Self::from_sorted(keys, values, estimator);
        if sketch.unique_keys != (flags & FLAGS_UNIQUE_KEYS != 0) {
            return Err(Error::deserial("unique-keys flag disagrees with keys"));
        }
        Ok(sketch)
    }
}

fn has_repeats(sorted_keys: &[i32]) -> bool {
    sorted_keys.windows(2).any(|w| w[0] == w[1])
}
