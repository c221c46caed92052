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

//! Correlations between every pair of columns in a corpus.
//!
//! This is the exhaustive alternative to the [sketch index](crate::index): each unordered pair of
//! sketches is compared directly. Pairs are independent, so they are computed in parallel.

use rayon::prelude::*;

use crate::correlation::CorrelationEstimate;
use crate::error::Error;
use crate::sketch::ImmutableSketch;

/// The comparison of two columns.
#[derive(Debug)]
pub struct PairCorrelation {
    /// Id of the left column; its values are `x`.
    pub left: String,
    /// Id of the right column; its values are `y`.
    pub right: String,
    /// The estimate, or the reason this pair has none.
    pub estimate: Result<CorrelationEstimate, Error>,
}

/// Estimates the correlation of every unordered pair of `columns`, using each left column's
/// estimator.
///
/// For `n` columns the result has `n * (n - 1) / 2` entries, ordered by the position of the left
/// column and then of the right column. A pair whose estimate fails keeps its error; the other
/// pairs are unaffected.
///
/// # Examples
///
/// ```
/// # use corrsketch::pairwise::all_pairs;
/// # use corrsketch::sketch::ImmutableSketch;
/// let columns = vec![
///     ("a".to_string(), ImmutableSketch::new(vec![1, 2, 3], vec![1.0, 2.0, 3.0]).unwrap()),
///     ("b".to_string(), ImmutableSketch::new(vec![1, 2, 3], vec![3.0, 2.0, 1.0]).unwrap()),
///     ("c".to_string(), ImmutableSketch::new(vec![1, 2, 3], vec![1.0, 1.0, 1.0]).unwrap()),
/// ];
/// let pairs = all_pairs(&columns);
/// assert_eq!(pairs.len(), 3);
/// assert_eq!(pairs[0].estimate.as_ref().unwrap().coefficient, -1.0);
/// assert!(pairs[1].estimate.is_err());
/// ```
pub fn all_pairs(columns: &[(String, ImmutableSketch)]) -> Vec<PairCorrelation> {
    let pairs: Vec<(usize, usize)> = (0..columns.len())
        .flat_map(|i| (i + 1..columns.len()).map(move |j| (i, j)))
        .collect();

    pairs
        .into_par_iter()
        .map(|(i, j)| {
            let (left, a) = &columns[i];
            let (right, b) = &columns[j];
            PairCorrelation {
                left: left.clone(),
                right: right.clone(),
                estimate: a.correlation_to(b),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_pair_order_and_count() {
        let columns: Vec<(String, ImmutableSketch)> = (0..6)
            .map(|c| {
                let values = (0..10).map(|i| ((i * (c + 1)) % 7) as f64).collect();
                let sketch = ImmutableSketch::new((0..10).collect(), values).unwrap();
                (format!("col{c}"), sketch)
            })
            .collect();
        let pairs = all_pairs(&columns);
        assert_eq!(pairs.len(), 15);
        assert_eq!((pairs[0].left.as_str(), pairs[0].right.as_str()), ("col0", "col1"));
        assert_eq!((pairs[14].left.as_str(), pairs[14].right.as_str()), ("col4", "col5"));
        assert!(pairs.windows(2).all(|w| (&w[0].left, &w[0].right) < (&w[1].left, &w[1].right)));
    }

    #[test]
    fn test_failures_stay_local() {
        let columns = vec![
            ("a".to_string(), ImmutableSketch::new(vec![1, 2], vec![1.0, 2.0]).unwrap()),
            ("b".to_string(), ImmutableSketch::new(vec![3, 4], vec![1.0, 2.0]).unwrap()),
            ("c".to_string(), ImmutableSketch::new(vec![1, 4], vec![0.0, 0.0]).unwrap()),
        ];
        let pairs = all_pairs(&columns);
        // a and b share nothing
        assert!(pairs[0].estimate.as_ref().unwrap().coefficient.is_nan());
        // a and c share only key 1
        let err = pairs[1].estimate.as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_fewer_than_two_columns() {
        assert!(all_pairs(&[]).is_empty());
        let single = vec![("a".to_string(), ImmutableSketch::new(vec![1], vec![1.0]).unwrap())];
        assert!(all_pairs(&single).is_empty());
    }
}
