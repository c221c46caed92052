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

use super::ImmutableSketch;
use crate::correlation::CorrelationEstimate;
use crate::correlation::CorrelationEstimator;
use crate::correlation::default_estimator;
use crate::error::Error;
use crate::hash::hash_str;
use crate::synopsis::Sampler;
use crate::synopsis::Synopsis;

/// A mutable sketch of a (key, value) column.
///
/// Rows stream in through [`CorrelationSketch::update`]; the wrapped sampler decides what is
/// retained. Set-operation estimates are available when the sampler is a
/// [`Synopsis`]; correlation works with any sampler and between sketches of different kinds.
#[derive(Debug, Clone)]
pub struct CorrelationSketch<S> {
    sampler: S,
    estimator: Arc<dyn CorrelationEstimator>,
    cardinality: Option<u64>,
}

impl<S: Sampler> CorrelationSketch<S> {
    /// Creates a sketch over `sampler` that compares with [Pearson's coefficient].
    ///
    /// [Pearson's coefficient]: crate::correlation::Pearson
    pub fn new(sampler: S) -> Self {
        Self::with_estimator(sampler, default_estimator())
    }

    /// Creates a sketch over `sampler` that compares with `estimator`.
    pub fn with_estimator(sampler: S, estimator: Arc<dyn CorrelationEstimator>) -> Self {
        Self {
            sampler,
            estimator,
            cardinality: None,
        }
    }

    /// Records the exact number of distinct keys of the column, when known.
    ///
    /// [`CorrelationSketch::cardinality`] returns it instead of the synopsis estimate.
    pub fn set_cardinality(&mut self, cardinality: u64) {
        self.cardinality = Some(cardinality);
    }

    /// Hashes `key` and offers the row to the sampler.
    pub fn update(&mut self, key: &str, value: f64) {
        self.update_hash(hash_str(key), value);
    }

    /// Offers a row whose key is already hashed.
    pub fn update_hash(&mut self, hash: i32, value: f64) {
        self.sampler.update(hash, value);
    }

    /// Returns the wrapped sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Returns the estimator.
    pub fn estimator(&self) -> &Arc<dyn CorrelationEstimator> {
        &self.estimator
    }

    /// Returns true if the sampler retains nothing.
    pub fn is_empty(&self) -> bool {
        self.sampler.is_empty()
    }

    /// Freezes the current sample into its immutable paired form.
    pub fn to_immutable(&self) -> ImmutableSketch {
        ImmutableSketch::from_samples(self.sampler.samples(), self.estimator.clone())
    }

    /// Consumes the sketch, freezing its sample.
    pub fn freeze(self) -> ImmutableSketch {
        ImmutableSketch::from_samples(self.sampler.samples(), self.estimator)
    }

    /// Estimates the correlation between this column and `other`, joined on their keys.
    ///
    /// This sketch's values are `x` and this sketch's estimator is used. The coefficient is NaN
    /// when the sketches share no keys.
    ///
    /// # Errors
    ///
    /// Propagates estimator errors, such as too few shared keys or a constant column.
    pub fn correlation_to<T: Sampler>(
        &self,
        other: &CorrelationSketch<T>,
    ) -> Result<CorrelationEstimate, Error> {
        self.to_immutable().correlation_to(&other.to_immutable())
    }
}

impl<S: Synopsis> CorrelationSketch<S> {
    /// Returns the number of distinct keys of the column: the value recorded with
    /// [`CorrelationSketch::set_cardinality`], else the synopsis estimate.
    pub fn cardinality(&self) -> f64 {
        match self.cardinality {
            Some(cardinality) => cardinality as f64,
            None => self.sampler.distinct_values(),
        }
    }

    /// Estimates the fraction of this column's distinct keys that also occur in `other`.
    ///
    /// Returns `0.0` when the estimated intersection or cardinality is zero.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EmptySketch`](crate::error::ErrorKind::EmptySketch) if either
    /// synopsis is empty.
    pub fn containment(&self, other: &Self) -> Result<f64, Error> {
        let intersection = self.sampler.intersection_size(&other.sampler)?;
        let cardinality = self.cardinality();
        // positive conditions so that NaN falls through to zero too
        if !(intersection > 0.0 && cardinality > 0.0) {
            return Ok(0.0);
        }
        Ok(intersection / cardinality)
    }

    /// Estimates the Jaccard similarity of both columns' key sets.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EmptySketch`](crate::error::ErrorKind::EmptySketch) if either
    /// synopsis is empty.
    pub fn jaccard(&self, other: &Self) -> Result<f64, Error> {
        self.sampler.jaccard(&other.sampler)
    }

    /// Estimates the number of keys the columns share.
    ///
    /// # Errors
    ///
    /// Same as [`CorrelationSketch::jaccard`].
    pub fn intersection_size(&self, other: &Self) -> Result<f64, Error> {
        self.sampler.intersection_size(&other.sampler)
    }

    /// Estimates the number of distinct keys across both columns.
    ///
    /// # Errors
    ///
    /// Same as [`CorrelationSketch::jaccard`].
    pub fn union_size(&self, other: &Self) -> Result<f64, Error> {
        self.sampler.union_size(&other.sampler)
    }
}

#[cfg(test)]
mod tests {
    use googletest::assert_that;
    use googletest::prelude::near;

    use super::*;
    use crate::aggregate::AggregateFunction;
    use crate::correlation::Spearman;
    use crate::error::ErrorKind;
    use crate::priority::PrioritySketch;
    use crate::priority::PrioritySketchConfig;
    use crate::synopsis::Gkmv;
    use crate::synopsis::Kmv;

    fn kmv(k: usize) -> CorrelationSketch<Kmv> {
        CorrelationSketch::new(Kmv::builder().k(k).build().unwrap())
    }

    #[test]
    fn test_self_correlation() {
        let mut sketch = kmv(64);
        for i in 0..500 {
            sketch.update_hash(i, (i % 17) as f64 * 1.5);
        }
        let estimate = sketch.correlation_to(&sketch).unwrap();
        assert_that!(estimate.coefficient, near(1.0, 1e-9));
        assert_eq!(estimate.sample_size, 64);
    }

    #[test]
    fn test_disjoint_columns_have_no_overlap() {
        let mut a = kmv(16);
        let mut b = kmv(16);
        for i in 0..100 {
            a.update_hash(i, i as f64);
            b.update_hash(i + 1000, i as f64);
        }
        let estimate = a.correlation_to(&b).unwrap();
        assert!(!estimate.is_defined());
        assert_eq!(a.intersection_size(&b).unwrap(), 0.0);
        assert_eq!(a.containment(&b).unwrap(), 0.0);
    }

    #[test]
    fn test_correlation_across_sampler_kinds() {
        let mut kmv = kmv(1024);
        let mut gkmv = CorrelationSketch::new(Gkmv::builder().threshold(1.0).build().unwrap());
        for i in 0..200 {
            kmv.update_hash(i, i as f64);
            gkmv.update_hash(i, -(i as f64));
        }
        let estimate = kmv.correlation_to(&gkmv).unwrap();
        assert_eq!(estimate.sample_size, 200);
        assert_that!(estimate.coefficient, near(-1.0, 1e-9));
    }

    #[test]
    fn test_priority_sketch_correlation() {
        let config = PrioritySketchConfig {
            aggregate: AggregateFunction::Sum,
            ..Default::default()
        };
        let mut a = CorrelationSketch::new(PrioritySketch::new(config).unwrap());
        let mut b = CorrelationSketch::new(PrioritySketch::new(config).unwrap());
        for i in 0..100 {
            // each key twice, so sums double the values
            a.update_hash(i, i as f64);
            a.update_hash(i, i as f64);
            b.update_hash(i, i as f64 + 3.0);
        }
        let estimate = a.correlation_to(&b).unwrap();
        assert_eq!(estimate.sample_size, 100);
        assert_that!(estimate.coefficient, near(1.0, 1e-9));
    }

    #[test]
    fn test_estimator_is_pluggable() {
        let mut a = CorrelationSketch::with_estimator(
            Kmv::builder().k(32).build().unwrap(),
            Arc::new(Spearman::default()),
        );
        let mut b = kmv(32);
        for i in 0..32 {
            a.update_hash(i, i as f64);
            b.update_hash(i, (i as f64).powi(3));
        }
        assert_eq!(a.estimator().name(), "spearman");
        assert_that!(a.correlation_to(&b).unwrap().coefficient, near(1.0, 1e-12));
        assert!(b.correlation_to(&a).unwrap().coefficient < 1.0);
    }

    #[test]
    fn test_cardinality_prefers_recorded_value() {
        let mut sketch = kmv(8);
        for i in 0..1000 {
            sketch.update_hash(i, 0.0);
        }
        let estimate = sketch.cardinality();
        assert!(estimate > 0.0);
        sketch.set_cardinality(1000);
        assert_eq!(sketch.cardinality(), 1000.0);
    }

    #[test]
    fn test_containment_of_subset() {
        let mut small = CorrelationSketch::new(Gkmv::builder().threshold(0.5).build().unwrap());
        let mut large = CorrelationSketch::new(Gkmv::builder().threshold(0.5).build().unwrap());
        for i in 0..2000 {
            large.update_hash(i, 0.0);
            if i < 500 {
                small.update_hash(i, 0.0);
            }
        }
        small.set_cardinality(500);
        let containment = small.containment(&large).unwrap();
        assert_that!(containment, near(1.0, 0.15));
        let jaccard = small.jaccard(&large).unwrap();
        assert_that!(jaccard, near(0.25, 0.05));
    }

    #[test]
    fn test_zero_order_key_keeps_estimates_finite() {
        let mut a = kmv(4);
        let mut b = kmv(4);
        a.update_hash(-1, 1.0);
        b.update_hash(-1, 2.0);
        assert_eq!(a.cardinality(), 1.0);
        assert_eq!(a.containment(&b).unwrap(), 1.0);
        assert_eq!(a.jaccard(&b).unwrap(), 1.0);
    }

    #[test]
    fn test_set_operations_reject_empty() {
        let a = kmv(8);
        let mut b = kmv(8);
        b.update("x", 1.0);
        let err = a.jaccard(&b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptySketch);
        let err = b.containment(&a).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptySketch);
    }

    #[test]
    fn test_freeze_matches_to_immutable() {
        let mut sketch = kmv(8);
        for key in ["a", "b", "c"] {
            sketch.update(key, 1.0);
        }
        let frozen = sketch.to_immutable();
        assert_eq!(frozen.keys(), sketch.freeze().keys());
        assert!(frozen.keys().is_sorted());
    }
}
