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

//! Correlation estimators over paired samples.
//!
//! An estimator turns two aligned value vectors (the `x` and `y` of a merge-joined sample) into a
//! [`CorrelationEstimate`]. Estimators are chosen independently of the synopsis that produced the
//! sample and are shared as `Arc<dyn CorrelationEstimator>`:
//!
//! * [`Pearson`]: the sample correlation coefficient, with a t-test p-value and a Fisher-z
//!   confidence interval.
//! * [`Spearman`]: Pearson on mean ranks.
//! * [`RankInverseNormal`]: Pearson on ranks mapped to normal quantiles.
//! * [`Bootstrap`]: Pearson with a percentile interval from resampled pairs.
//!
//! Every estimator rejects vectors of unequal length or with fewer than two values
//! ([`ErrorKind::InsufficientData`](crate::error::ErrorKind::InsufficientData)), and vectors that
//! are constant or contain non-finite values
//! ([`ErrorKind::DegenerateInput`](crate::error::ErrorKind::DegenerateInput)).
//!
//! ```
//! use corrsketch::correlation::CorrelationEstimator;
//! use corrsketch::correlation::Pearson;
//!
//! let pearson = Pearson::default();
//! let estimate = pearson.estimate(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.5]).unwrap();
//! assert!(estimate.coefficient > 0.99);
//! assert!(estimate.significance.is_some());
//! ```

mod bootstrap;
mod pearson;
mod rank;

use std::fmt;
use std::sync::Arc;

pub use self::bootstrap::Bootstrap;
pub use self::bootstrap::BootstrapConfig;
pub use self::pearson::Pearson;
pub use self::rank::RankInverseNormal;
pub use self::rank::Spearman;
use crate::error::Error;

/// Default confidence level of interval estimates.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// A strategy computing a correlation coefficient from paired samples.
pub trait CorrelationEstimator: Send + Sync + fmt::Debug {
    /// Returns a short display name such as `"pearson"`.
    fn name(&self) -> &'static str;

    /// Estimates the correlation between `x` and `y`, which are aligned pairwise.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InsufficientData`](crate::error::ErrorKind::InsufficientData) or
    /// [`ErrorKind::DegenerateInput`](crate::error::ErrorKind::DegenerateInput) when the inputs
    /// cannot produce a defined coefficient.
    fn estimate(&self, x: &[f64], y: &[f64]) -> Result<CorrelationEstimate, Error>;
}

/// Returns the estimator sketches use when none is configured: [`Pearson`] at 95% confidence.
pub fn default_estimator() -> Arc<dyn CorrelationEstimator> {
    Arc::new(Pearson::default())
}

/// The result of a correlation estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationEstimate {
    /// Correlation coefficient in `[-1, 1]`; NaN when the sketches share no keys.
    pub coefficient: f64,
    /// Number of pairs the estimate was computed from.
    pub sample_size: usize,
    /// Significance test of the null hypothesis of zero correlation, when the estimator has one.
    pub significance: Option<Significance>,
    /// Interval estimate of the coefficient, when the estimator has one.
    pub interval: Option<ConfidenceInterval>,
}

impl CorrelationEstimate {
    /// Creates an estimate carrying only a coefficient.
    pub fn new(coefficient: f64, sample_size: usize) -> Self {
        Self {
            coefficient,
            sample_size,
            significance: None,
            interval: None,
        }
    }

    /// The estimate of two sketches that share no join keys.
    ///
    /// This is an expected outcome, not a failure, and is the only estimate with a NaN
    /// coefficient.
    pub fn no_overlap() -> Self {
        Self::new(f64::NAN, 0)
    }

    /// Returns true if the coefficient is defined.
    pub fn is_defined(&self) -> bool {
        !self.coefficient.is_nan()
    }
}

/// Student's t test of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Significance {
    /// `r * sqrt(df / (1 - r^2))`.
    pub t_statistic: f64,
    /// `n - 2`.
    pub degrees_of_freedom: usize,
    /// Probability of a coefficient at least this far from zero in either direction.
    pub p_value_two_tailed: f64,
    /// Probability of a coefficient at least this far from zero in the observed direction.
    pub p_value_one_tailed: f64,
}

/// An interval estimate of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
    /// Confidence level in `(0, 1)`.
    pub level: f64,
}

impl ConfidenceInterval {
    /// Returns true if `value` lies within the closed interval.
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

pub(crate) fn check_pairs(x: &[f64], y: &[f64]) -> Result<(), Error> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(Error::insufficient_data(x.len(), y.len()));
    }
    if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
        return Err(Error::degenerate_input("values must be finite"));
    }
    Ok(())
}

pub(crate) fn check_confidence_level(level: f64) -> Result<(), Error> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "confidence level must be in (0, 1), got {level}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_check_pairs() {
        assert!(check_pairs(&[1.0, 2.0], &[3.0, 4.0]).is_ok());

        let err = check_pairs(&[1.0], &[1.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        let err = check_pairs(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        let err = check_pairs(&[1.0, f64::NAN], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn test_confidence_level_bounds() {
        assert!(check_confidence_level(0.95).is_ok());
        for level in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let err = check_confidence_level(level).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        }
    }

    #[test]
    fn test_no_overlap_is_undefined() {
        let estimate = CorrelationEstimate::no_overlap();
        assert!(!estimate.is_defined());
        assert_eq!(estimate.sample_size, 0);
        assert!(estimate.significance.is_none());
    }

    #[test]
    fn test_estimators_are_interchangeable() {
        let estimators: Vec<Arc<dyn CorrelationEstimator>> = vec![
            default_estimator(),
            Arc::new(Spearman::default()),
            Arc::new(RankInverseNormal::default()),
            Arc::new(Bootstrap::new(BootstrapConfig::default().with_seed(7)).unwrap()),
        ];
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [1.5, 2.0, 3.5, 3.9, 5.2, 6.1];
        for estimator in estimators {
            let estimate = estimator.estimate(&x, &y).unwrap();
            assert!(estimate.coefficient > 0.9, "{}", estimator.name());
            assert_eq!(estimate.sample_size, 6);
        }
    }
}
