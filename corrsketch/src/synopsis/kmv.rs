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

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;

use crate::aggregate::AggregateFunction;
use crate::aggregate::Aggregator;
use crate::error::Error;
use crate::hash::order_key;
use crate::synopsis::Sampler;
use crate::synopsis::Samples;
use crate::synopsis::Synopsis;
use crate::synopsis::ValueHash;

/// Default number of retained elements.
pub const DEFAULT_K: usize = 256;

/// K-minimum-values synopsis: retains the `k` elements with the smallest order keys.
///
/// A key seen again while retained folds its value with the configured aggregate function.
#[derive(Debug, Clone)]
pub struct Kmv {
    k: usize,
    aggregate: AggregateFunction,
    entries: HashMap<i32, Slot>,
    // max-heap on order key; its top is the horizon and the eviction candidate
    heap: BinaryHeap<HeapEntry>,
}

impl Kmv {
    /// Create a new builder for Kmv
    ///
    /// # Examples
    ///
    /// ```
    /// # use corrsketch::synopsis::Kmv;
    /// let sketch = Kmv::builder().k(128).build().unwrap();
    /// assert_eq!(sketch.k(), 128);
    /// ```
    pub fn builder() -> KmvBuilder {
        KmvBuilder::default()
    }

    /// Returns the configured capacity.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the aggregate function applied to repeated keys.
    pub fn aggregate(&self) -> AggregateFunction {
        self.aggregate
    }

    /// Returns true when `k` elements are retained.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.k
    }

    fn insert(&mut self, hash: i32, order_key: f64, value: f64) {
        self.entries.insert(
            hash,
            Slot {
                order_key,
                aggregator: Aggregator::with_value(self.aggregate, value),
            },
        );
        self.heap.push(HeapEntry { order_key, hash });
    }
}

impl Sampler for Kmv {
    fn update(&mut self, hash: i32, value: f64) {
        if let Some(slot) = self.entries.get_mut(&hash) {
            slot.aggregator.update(value);
            return;
        }

        let order_key = order_key(hash);
        if !self.is_full() {
            self.insert(hash, order_key, value);
            return;
        }

        // a full synopsis only admits keys below its current horizon
        let below_horizon = self.heap.peek().is_some_and(|top| order_key < top.order_key);
        if below_horizon {
            if let Some(evicted) = self.heap.pop() {
                self.entries.remove(&evicted.hash);
            }
            self.insert(hash, order_key, value);
        }
    }

    fn samples(&self) -> Samples {
        let mut samples = Samples {
            keys: Vec::with_capacity(self.entries.len()),
            values: Vec::with_capacity(self.entries.len()),
            unique_keys: true,
        };
        for (&hash, slot) in &self.entries {
            samples.keys.push(hash);
            samples.values.push(slot.aggregator.value());
        }
        samples
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Synopsis for Kmv {
    fn retained(&self) -> Vec<ValueHash> {
        self.entries
            .iter()
            .map(|(&hash, slot)| {
                ValueHash::with_order_key(hash, slot.order_key, slot.aggregator.value())
            })
            .collect()
    }

    fn num_retained(&self) -> usize {
        self.entries.len()
    }

    /// Returns the largest retained order key, or `1.0` when empty.
    fn kth(&self) -> f64 {
        self.heap.peek().map_or(1.0, |top| top.order_key)
    }

    /// The union sample is the `min(|A|, |B|)` smallest elements of the combined sample.
    fn union_sample_len(&self, other: &Self, union_len: usize) -> usize {
        self.num_retained()
            .min(other.num_retained())
            .min(union_len)
    }
}

/// Builder for Kmv
#[derive(Debug, Clone)]
pub struct KmvBuilder {
    k: usize,
    aggregate: AggregateFunction,
}

impl Default for KmvBuilder {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            aggregate: AggregateFunction::First,
        }
    }
}

impl KmvBuilder {
    /// Set the number of retained elements.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the aggregate function applied to repeated keys.
    pub fn aggregate(mut self, aggregate: AggregateFunction) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Build the Kmv.
    ///
    /// # Errors
    ///
    /// If `k` is zero, returns [`ErrorKind::InvalidConfiguration`].
    ///
    /// [`ErrorKind::InvalidConfiguration`]: crate::error::ErrorKind::InvalidConfiguration
    pub fn build(self) -> Result<Kmv, Error> {
        if self.k == 0 {
            return Err(Error::invalid_config("k must be positive").with_context("k", self.k));
        }
        Ok(Kmv {
            k: self.k,
            aggregate: self.aggregate,
            entries: HashMap::with_capacity(self.k.min(1 << 16)),
            heap: BinaryHeap::with_capacity(self.k.min(1 << 16)),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    order_key: f64,
    aggregator: Aggregator,
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    order_key: f64,
    hash: i32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key
            .total_cmp(&other.order_key)
            .then(self.hash.cmp(&other.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = Kmv::builder().k(0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_retains_k_smallest_order_keys() {
        let mut sketch = Kmv::builder().k(16).build().unwrap();
        for hash in 0..500 {
            sketch.update(hash, hash as f64);
        }
        assert_eq!(sketch.num_retained(), 16);

        let mut expected: Vec<f64> = (0..500).map(order_key).collect();
        expected.sort_by(f64::total_cmp);
        let mut retained: Vec<f64> = sketch.retained().iter().map(|e| e.order_key()).collect();
        retained.sort_by(f64::total_cmp);
        assert_eq!(retained, expected[..16].to_vec());
        assert_eq!(sketch.kth(), expected[15]);
    }

    #[test]
    fn test_repeated_key_is_folded() {
        let mut sketch = Kmv::builder()
            .k(4)
            .aggregate(AggregateFunction::Sum)
            .build()
            .unwrap();
        sketch.update(10, 1.0);
        sketch.update(10, 2.5);
        sketch.update(11, 4.0);
        assert_eq!(sketch.num_retained(), 2);

        let samples = sketch.samples();
        assert!(samples.unique_keys);
        let position = samples.keys.iter().position(|&k| k == 10).unwrap();
        assert_eq!(samples.values[position], 3.5);
    }

    #[test]
    fn test_default_keeps_first_value() {
        let mut sketch = Kmv::builder().k(4).build().unwrap();
        sketch.update(3, 1.0);
        sketch.update(3, 9.0);
        assert_eq!(sketch.retained()[0].value(), 1.0);
    }

    #[test]
    fn test_empty_kth_and_estimates() {
        let sketch = Kmv::builder().k(4).build().unwrap();
        assert!(sketch.is_empty());
        assert_eq!(sketch.kth(), 1.0);
        assert_eq!(sketch.distinct_values(), 0.0);
        assert_eq!(sketch.distinct_values_basic(), 0.0);
    }
}
