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

use std::collections::HashMap;

use crate::aggregate::AggregateFunction;
use crate::aggregate::Aggregator;
use crate::error::Error;
use crate::hash::order_key;
use crate::synopsis::Sampler;
use crate::synopsis::Samples;
use crate::synopsis::Synopsis;
use crate::synopsis::ValueHash;

/// Default order-key threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Generalized KMV synopsis: retains every element whose order key is at most a fixed threshold.
///
/// The expected sample size is `threshold * distinct_keys`, so a threshold of `0.1` keeps about a
/// tenth of a column's keys regardless of its size.
#[derive(Debug, Clone)]
pub struct Gkmv {
    threshold: f64,
    aggregate: AggregateFunction,
    entries: HashMap<i32, (f64, Aggregator)>,
    max_order_key: Option<f64>,
}

impl Gkmv {
    /// Create a new builder for Gkmv
    ///
    /// # Examples
    ///
    /// ```
    /// # use corrsketch::synopsis::Gkmv;
    /// let sketch = Gkmv::builder().threshold(0.25).build().unwrap();
    /// assert_eq!(sketch.threshold(), 0.25);
    /// ```
    pub fn builder() -> GkmvBuilder {
        GkmvBuilder::default()
    }

    /// Returns the retention threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the aggregate function applied to repeated keys.
    pub fn aggregate(&self) -> AggregateFunction {
        self.aggregate
    }
}

impl Sampler for Gkmv {
    fn update(&mut self, hash: i32, value: f64) {
        if let Some((_, aggregator)) = self.entries.get_mut(&hash) {
            aggregator.update(value);
            return;
        }

        let order_key = order_key(hash);
        if order_key > self.threshold {
            return;
        }
        self.entries.insert(
            hash,
            (order_key, Aggregator::with_value(self.aggregate, value)),
        );
        self.max_order_key = Some(match self.max_order_key {
            Some(max) => max.max(order_key),
            None => order_key,
        });
    }

    fn samples(&self) -> Samples {
        let (keys, values) = self
            .entries
            .iter()
            .map(|(&hash, (_, aggregator))| (hash, aggregator.value()))
            .unzip();
        Samples {
            keys,
            values,
            unique_keys: true,
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Synopsis for Gkmv {
    fn retained(&self) -> Vec<ValueHash> {
        self.entries
            .iter()
            .map(|(&hash, (order_key, aggregator))| {
                ValueHash::with_order_key(hash, *order_key, aggregator.value())
            })
            .collect()
    }

    fn num_retained(&self) -> usize {
        self.entries.len()
    }

    /// Returns the largest retained order key, or the threshold when empty.
    fn kth(&self) -> f64 {
        self.max_order_key.unwrap_or(self.threshold)
    }

    /// Both synopses already cover everything below their own horizon, so the union sample is every
    /// combined element up to `max(kth_a, kth_b)`: the whole combined sample.
    fn union_sample_len(&self, _other: &Self, union_len: usize) -> usize {
        union_len
    }
}

/// Builder for Gkmv
#[derive(Debug, Clone)]
pub struct GkmvBuilder {
    threshold: f64,
    aggregate: AggregateFunction,
}

impl Default for GkmvBuilder {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            aggregate: AggregateFunction::First,
        }
    }
}

impl GkmvBuilder {
    /// Set the order-key threshold, in `(0, 1]`.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the aggregate function applied to repeated keys.
    pub fn aggregate(mut self, aggregate: AggregateFunction) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Build the Gkmv.
    ///
    /// # Errors
    ///
    /// If the threshold is not in `(0, 1]`, returns [`ErrorKind::InvalidConfiguration`].
    ///
    /// [`ErrorKind::InvalidConfiguration`]: crate::error::ErrorKind::InvalidConfiguration
    pub fn build(self) -> Result<Gkmv, Error> {
        // positive condition so that NaN is rejected too
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(Error::invalid_config("threshold must be in (0, 1]")
                .with_context("threshold", self.threshold));
        }
        Ok(Gkmv {
            threshold: self.threshold,
            aggregate: self.aggregate,
            entries: HashMap::new(),
            max_order_key: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_threshold_validation() {
        for threshold in [0.0, -0.5, 1.5, f64::NAN] {
            let err = Gkmv::builder().threshold(threshold).build().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        }
        assert!(Gkmv::builder().threshold(1.0).build().is_ok());
    }

    #[test]
    fn test_retains_everything_below_threshold() {
        let mut sketch = Gkmv::builder().threshold(0.2).build().unwrap();
        for hash in 0..1000 {
            sketch.update(hash, 1.0);
        }
        let expected = (0..1000).filter(|&h| order_key(h) <= 0.2).count();
        assert_eq!(sketch.num_retained(), expected);
        assert!(sketch.retained().iter().all(|e| e.order_key() <= 0.2));
        assert!(sketch.kth() <= 0.2);
        assert!(sketch.num_retained() <= 1000);
    }

    #[test]
    fn test_empty_kth_is_threshold() {
        let sketch = Gkmv::builder().threshold(0.3).build().unwrap();
        assert_eq!(sketch.kth(), 0.3);
        assert_eq!(sketch.distinct_values(), 0.0);
    }

    #[test]
    fn test_full_threshold_counts_exactly() {
        let mut sketch = Gkmv::builder()
            .threshold(1.0)
            .aggregate(AggregateFunction::Max)
            .build()
            .unwrap();
        sketch.update(1, 1.0);
        sketch.update(1, 5.0);
        sketch.update(2, 2.0);
        assert_eq!(sketch.num_retained(), 2);
        let samples = sketch.samples();
        let position = samples.keys.iter().position(|&k| k == 1).unwrap();
        assert_eq!(samples.values[position], 5.0);
    }
}
