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

//! Bounded min-hash synopses of a (key, value) column.
//!
//! A synopsis keeps a uniform sample of a column's distinct join keys, chosen by the smallest
//! [order keys](crate::hash::order_key), together with one value per retained key. Two variants
//! are provided:
//!
//! * [`Kmv`] keeps the `k` elements with the smallest order keys. Sample size is fixed and the
//!   covered fraction of the key space varies with the column's cardinality.
//! * [`Gkmv`] keeps every element whose order key is below a fixed threshold. Coverage is fixed
//!   and sample size varies, which suits columns of very different sizes (containment search).
//!
//! Both implement [`Synopsis`], which provides the distinct-count estimator `(m - 1) / kth` and
//! set-operation estimators (union, intersection, Jaccard) between two synopses of the same kind.
//!
//! ```
//! use corrsketch::synopsis::Kmv;
//! use corrsketch::synopsis::Synopsis;
//! use corrsketch::synopsis::Sampler;
//!
//! let mut a = Kmv::builder().k(64).build().unwrap();
//! let mut b = Kmv::builder().k(64).build().unwrap();
//! for hash in 0..1000 {
//!     a.update(hash, hash as f64);
//!     if hash % 2 == 0 {
//!         b.update(hash, -(hash as f64));
//!     }
//! }
//! let jaccard = a.jaccard(&b).unwrap();
//! assert!(jaccard > 0.3 && jaccard < 0.7);
//! ```

mod gkmv;
mod kmv;

use std::cmp::Ordering;

pub use self::gkmv::Gkmv;
pub use self::gkmv::GkmvBuilder;
pub use self::kmv::Kmv;
pub use self::kmv::KmvBuilder;
use crate::error::Error;
use crate::hash::order_key;

/// One sampled element: a key hash, its order key, and the value paired with it.
///
/// Elements order by order key; two elements with the same hash are the same logical key.
#[derive(Debug, Clone, Copy)]
pub struct ValueHash {
    hash: i32,
    order_key: f64,
    value: f64,
}

impl ValueHash {
    /// Creates an element, deriving its order key from `hash`.
    pub fn new(hash: i32, value: f64) -> Self {
        Self {
            hash,
            order_key: order_key(hash),
            value,
        }
    }

    pub(crate) fn with_order_key(hash: i32, order_key: f64, value: f64) -> Self {
        Self {
            hash,
            order_key,
            value,
        }
    }

    /// Returns the key hash.
    pub fn hash(&self) -> i32 {
        self.hash
    }

    /// Returns the order key in `[0, 1)`.
    pub fn order_key(&self) -> f64 {
        self.order_key
    }

    /// Returns the paired value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Total order by order key, then by hash.
    pub fn cmp_by_order(&self, other: &Self) -> Ordering {
        self.order_key
            .total_cmp(&other.order_key)
            .then(self.hash.cmp(&other.hash))
    }
}

impl PartialEq for ValueHash {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for ValueHash {}

/// Retained (key, value) rows of a sampler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Samples {
    /// Key hashes, in no particular order.
    pub keys: Vec<i32>,
    /// Values aligned with `keys`.
    pub values: Vec<f64>,
    /// True when no key appears more than once.
    pub unique_keys: bool,
}

impl Samples {
    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Anything that consumes a `(hash, value)` stream and retains a bounded sample of it.
pub trait Sampler {
    /// Offers one row to the sampler.
    fn update(&mut self, hash: i32, value: f64);

    /// Returns the currently retained rows.
    fn samples(&self) -> Samples;

    /// Returns true if nothing is retained.
    fn is_empty(&self) -> bool;
}

/// A min-hash synopsis supporting distinct-count and set-operation estimates.
///
/// Set operations take `&Self`: comparing synopses with different retention policies (a [`Kmv`]
/// against a [`Gkmv`]) has no well-defined union horizon and is rejected at compile time.
pub trait Synopsis: Sampler {
    /// Returns the retained elements, in no particular order.
    fn retained(&self) -> Vec<ValueHash>;

    /// Returns the number of retained elements.
    fn num_retained(&self) -> usize;

    /// Returns the synopsis horizon: the largest retained order key.
    fn kth(&self) -> f64;

    /// Returns how many of the smallest elements of the combined, order-sorted sample of `self`
    /// and `other` form the union sample.
    fn union_sample_len(&self, other: &Self, union_len: usize) -> usize;

    /// Returns the unbiased distinct-count estimate `(m - 1) / kth`.
    ///
    /// Returns `0.0` for an empty synopsis. A zero horizon means the sample cannot be scaled and
    /// `m` is returned as is.
    fn distinct_values(&self) -> f64 {
        let m = self.num_retained();
        if m == 0 {
            return 0.0;
        }
        let kth = self.kth();
        if kth > 0.0 {
            (m - 1) as f64 / kth
        } else {
            m as f64
        }
    }

    /// Returns the basic (biased) distinct-count estimate `m / kth`.
    fn distinct_values_basic(&self) -> f64 {
        let m = self.num_retained();
        if m == 0 {
            return 0.0;
        }
        let kth = self.kth();
        if kth > 0.0 { m as f64 / kth } else { m as f64 }
    }

    /// Estimates union, intersection and Jaccard similarity against `other` in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EmptySketch`](crate::error::ErrorKind::EmptySketch) if either synopsis
    /// is empty.
    fn set_estimates(&self, other: &Self) -> Result<SetEstimates, Error>
    where
        Self: Sized,
    {
        if self.is_empty() || other.is_empty() {
            return Err(Error::empty_sketch("set operation"));
        }
        let union = sorted_union(self.retained(), other.retained());
        let k = self.union_sample_len(other, union.len()).clamp(1, union.len());
        let sample = &union[..k];
        let common = sample.iter().filter(|e| e.in_both).count();
        let kth = sample[k - 1].order_key;

        let jaccard = common as f64 / k as f64;
        let union_size = if kth > 0.0 {
            (k - 1) as f64 / kth
        } else {
            k as f64
        };
        Ok(SetEstimates {
            union_size,
            intersection_size: jaccard * union_size,
            jaccard,
            sample_len: k,
        })
    }

    /// Estimates the number of distinct keys in the union of both columns.
    fn union_size(&self, other: &Self) -> Result<f64, Error>
    where
        Self: Sized,
    {
        Ok(self.set_estimates(other)?.union_size)
    }

    /// Estimates the number of distinct keys present in both columns.
    fn intersection_size(&self, other: &Self) -> Result<f64, Error>
    where
        Self: Sized,
    {
        Ok(self.set_estimates(other)?.intersection_size)
    }

    /// Estimates the Jaccard similarity of both columns' key sets.
    fn jaccard(&self, other: &Self) -> Result<f64, Error>
    where
        Self: Sized,
    {
        Ok(self.set_estimates(other)?.jaccard)
    }
}

/// Set-operation estimates between two synopses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetEstimates {
    /// Estimated number of distinct keys in the union.
    pub union_size: f64,
    /// Estimated number of distinct keys in the intersection.
    pub intersection_size: f64,
    /// Estimated Jaccard similarity.
    pub jaccard: f64,
    /// Number of union elements the estimates were computed from.
    pub sample_len: usize,
}

#[derive(Debug, Clone, Copy)]
struct UnionElement {
    order_key: f64,
    in_both: bool,
}

/// Merges two retained sets into one order-sorted sequence, collapsing shared hashes.
fn sorted_union(mut a: Vec<ValueHash>, mut b: Vec<ValueHash>) -> Vec<UnionElement> {
    a.sort_by(ValueHash::cmp_by_order);
    b.sort_by(ValueHash::cmp_by_order);

    let mut union = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp_by_order(&b[j]) {
            Ordering::Less => {
                union.push(UnionElement {
                    order_key: a[i].order_key,
                    in_both: false,
                });
                i += 1;
            }
            Ordering::Greater => {
                union.push(UnionElement {
                    order_key: b[j].order_key,
                    in_both: false,
                });
                j += 1;
            }
            Ordering::Equal => {
                union.push(UnionElement {
                    order_key: a[i].order_key,
                    in_both: true,
                });
                i += 1;
                j += 1;
            }
        }
    }
    let rest = a[i..].iter().chain(b[j..].iter());
    union.extend(rest.map(|e| UnionElement {
        order_key: e.order_key,
        in_both: false,
    }));
    union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_hash_identity_is_hash() {
        let a = ValueHash::new(7, 1.0);
        let b = ValueHash::new(7, 2.0);
        assert_eq!(a, b);
        assert_eq!(a.order_key(), b.order_key());
        assert_ne!(a, ValueHash::new(8, 1.0));
    }

    #[test]
    fn test_sorted_union_marks_shared_hashes() {
        let a: Vec<_> = [1, 2, 3].iter().map(|&h| ValueHash::new(h, 0.0)).collect();
        let b: Vec<_> = [3, 4].iter().map(|&h| ValueHash::new(h, 0.0)).collect();
        let union = sorted_union(a, b);
        assert_eq!(union.len(), 4);
        assert_eq!(union.iter().filter(|e| e.in_both).count(), 1);
        assert!(union.windows(2).all(|w| w[0].order_key <= w[1].order_key));
    }

    #[test]
    fn test_zero_horizon_counts_exactly() {
        // hash -1 is the one key whose order key is exactly zero
        assert_eq!(order_key(-1), 0.0);

        let mut kmv = Kmv::builder().k(4).build().unwrap();
        kmv.update(-1, 1.0);
        assert_eq!(kmv.kth(), 0.0);
        assert_eq!(kmv.distinct_values(), 1.0);
        assert_eq!(kmv.distinct_values_basic(), 1.0);

        let mut gkmv = Gkmv::builder().threshold(0.5).build().unwrap();
        gkmv.update(-1, 1.0);
        assert_eq!(gkmv.kth(), 0.0);
        assert_eq!(gkmv.distinct_values(), 1.0);
        assert_eq!(gkmv.distinct_values_basic(), 1.0);

        let estimates = kmv.set_estimates(&kmv).unwrap();
        assert!(estimates.union_size.is_finite());
        assert_eq!(estimates.jaccard, 1.0);
    }
}
