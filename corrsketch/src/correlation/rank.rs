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

use super::CorrelationEstimate;
use super::CorrelationEstimator;
use super::Pearson;
use super::check_pairs;
use crate::error::Error;
use crate::stats::inverse_normal_cdf;
use crate::stats::mean_ranks;

/// Blom's offset for mapping ranks to normal scores.
const BLOM_OFFSET: f64 = 3.0 / 8.0;

/// Spearman's rank correlation: Pearson's coefficient of the mean ranks of both vectors.
///
/// Significance and interval come from the inner [`Pearson`] applied to the ranks.
#[derive(Debug, Clone, Default)]
pub struct Spearman {
    pearson: Pearson,
}

impl Spearman {
    /// Creates an estimator that applies `pearson` to ranks.
    pub fn new(pearson: Pearson) -> Self {
        Self { pearson }
    }
}

impl CorrelationEstimator for Spearman {
    fn name(&self) -> &'static str {
        "spearman"
    }

    fn estimate(&self, x: &[f64], y: &[f64]) -> Result<CorrelationEstimate, Error> {
        check_pairs(x, y)?;
        self.pearson.estimate(&mean_ranks(x), &mean_ranks(y))
    }
}

/// Rank-based inverse normal transform followed by Pearson's coefficient.
///
/// Each value is replaced by the normal quantile of its Blom-adjusted rank
/// `(rank - 3/8) / (n + 1/4)`, ties sharing their mean rank. This keeps Pearson's estimate robust
/// to skewed or heavy-tailed marginals.
///
/// # Examples
///
/// ```
/// # use corrsketch::correlation::CorrelationEstimator;
/// # use corrsketch::correlation::RankInverseNormal;
/// let rin = RankInverseNormal::default();
/// // monotone but far from linear
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [1.0, 10.0, 100.0, 1000.0, 1e6];
/// assert!((rin.estimate(&x, &y).unwrap().coefficient - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RankInverseNormal {
    pearson: Pearson,
}

impl RankInverseNormal {
    /// Creates an estimator that applies `pearson` to normal scores.
    pub fn new(pearson: Pearson) -> Self {
        Self { pearson }
    }
}

impl CorrelationEstimator for RankInverseNormal {
    fn name(&self) -> &'static str {
        "rin"
    }

    fn estimate(&self, x: &[f64], y: &[f64]) -> Result<CorrelationEstimate, Error> {
        check_pairs(x, y)?;
        self.pearson.estimate(&normal_scores(x), &normal_scores(y))
    }
}

fn normal_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    mean_ranks(values)
        .into_iter()
        .map(|rank| inverse_normal_cdf((rank - BLOM_OFFSET) / (n + 1.0 - 2.0 * BLOM_OFFSET)))
        .collect()
}
