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

use super::ConfidenceInterval;
use super::CorrelationEstimate;
use super::CorrelationEstimator;
use super::DEFAULT_CONFIDENCE_LEVEL;
use super::Significance;
use super::check_confidence_level;
use super::check_pairs;
use crate::error::Error;
use crate::stats::LogFactorialCache;
use crate::stats::inverse_normal_cdf;
use crate::stats::student_t_two_tailed;

/// Pearson's product-moment correlation coefficient.
///
/// Besides the coefficient, an estimate carries a two-sided t test on `n - 2` degrees of freedom
/// (for `n > 2`) and a Fisher-z confidence interval at the configured level (for `n > 3`).
///
/// Log-factorials needed by the t distribution are memoized in a [`LogFactorialCache`]; estimators
/// built with [`Pearson::with_cache`] can share one cache.
///
/// # Examples
///
/// ```
/// # use corrsketch::correlation::CorrelationEstimator;
/// # use corrsketch::correlation::Pearson;
/// let pearson = Pearson::new(0.99).unwrap();
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [5.0, 4.0, 3.0, 2.0, 1.0];
/// let estimate = pearson.estimate(&x, &y).unwrap();
/// assert_eq!(estimate.coefficient, -1.0);
/// assert_eq!(estimate.interval.unwrap().level, 0.99);
/// ```
#[derive(Debug, Clone)]
pub struct Pearson {
    confidence_level: f64,
    cache: Arc<LogFactorialCache>,
}

impl Default for Pearson {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            cache: Arc::new(LogFactorialCache::new()),
        }
    }
}

impl Pearson {
    /// Creates an estimator reporting intervals at `confidence_level`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration)
    /// unless `confidence_level` is in `(0, 1)`.
    pub fn new(confidence_level: f64) -> Result<Self, Error> {
        Self::with_cache(confidence_level, Arc::new(LogFactorialCache::new()))
    }

    /// Creates an estimator that shares `cache` with other estimators.
    ///
    /// # Errors
    ///
    /// Same as [`Pearson::new`].
    pub fn with_cache(confidence_level: f64, cache: Arc<LogFactorialCache>) -> Result<Self, Error> {
        check_confidence_level(confidence_level)?;
        Ok(Self {
            confidence_level,
            cache,
        })
    }

    /// Returns the confidence level of reported intervals.
    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Returns the shared log-factorial cache.
    pub fn cache(&self) -> &Arc<LogFactorialCache> {
        &self.cache
    }

    fn significance(&self, r: f64, n: usize) -> Option<Significance> {
        if n < 3 {
            return None;
        }
        let df = n - 2;
        let t = if r.abs() == 1.0 {
            r * f64::INFINITY
        } else {
            r * (df as f64 / (1.0 - r * r)).sqrt()
        };
        let p = student_t_two_tailed(t, df, &self.cache);
        Some(Significance {
            t_statistic: t,
            degrees_of_freedom: df,
            p_value_two_tailed: p,
            p_value_one_tailed: p / 2.0,
        })
    }

    fn interval(&self, r: f64, n: usize) -> Option<ConfidenceInterval> {
        if n < 4 {
            return None;
        }
        let z = r.atanh();
        let se = 1.0 / ((n - 3) as f64).sqrt();
        let critical = inverse_normal_cdf(1.0 - (1.0 - self.confidence_level) / 2.0);
        Some(ConfidenceInterval {
            lower: (z - critical * se).tanh(),
            upper: (z + critical * se).tanh(),
            level: self.confidence_level,
        })
    }
}

impl CorrelationEstimator for Pearson {
    fn name(&self) -> &'static str {
        "pearson"
    }

    fn estimate(&self, x: &[f64], y: &[f64]) -> Result<CorrelationEstimate, Error> {
        check_pairs(x, y)?;
        let r = coefficient(x, y)?;
        let n = x.len();
        Ok(CorrelationEstimate {
            coefficient: r,
            sample_size: n,
            significance: self.significance(r, n),
            interval: self.interval(r, n),
        })
    }
}

/// Sample correlation coefficient of pre-validated pairs.
pub(crate) fn coefficient(x: &[f64], y: &[f64]) -> Result<f64, Error> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(Error::degenerate_input(
            "correlation is undefined for a vector with zero variance",
        ));
    }

    let r = sxy / (sxx * syy).sqrt();
    Ok(r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use googletest::assert_that;
    use googletest::prelude::near;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_known_coefficient() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let estimate = Pearson::default().estimate(&x, &y).unwrap();
        assert_that!(estimate.coefficient, near(0.8, 1e-12));
        assert_eq!(estimate.sample_size, 5);
    }

    #[test]
    fn test_significance() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let significance = Pearson::default()
            .estimate(&x, &y)
            .unwrap()
            .significance
            .unwrap();
        assert_eq!(significance.degrees_of_freedom, 3);
        // t = 0.8 * sqrt(3 / 0.36)
        assert_that!(significance.t_statistic, near(2.309401, 1e-6));
        assert_that!(significance.p_value_two_tailed, near(0.104088, 1e-6));
        assert_that!(
            significance.p_value_one_tailed,
            near(significance.p_value_two_tailed / 2.0, 1e-15)
        );
    }

    #[test]
    fn test_fisher_interval() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let interval = Pearson::default().estimate(&x, &y).unwrap().interval.unwrap();
        assert_that!(interval.lower, near(-0.279640, 1e-5));
        assert_that!(interval.upper, near(0.986196, 1e-5));
        assert!(interval.contains(0.8));
    }

    #[test]
    fn test_small_samples_skip_inference() {
        let estimate = Pearson::default().estimate(&[1.0, 2.0], &[3.0, 7.0]).unwrap();
        assert_eq!(estimate.coefficient, 1.0);
        assert!(estimate.significance.is_none());
        assert!(estimate.interval.is_none());

        let estimate = Pearson::default()
            .estimate(&[1.0, 2.0, 3.0], &[3.0, 7.0, 8.0])
            .unwrap();
        assert!(estimate.significance.is_some());
        assert!(estimate.interval.is_none());
    }

    #[test]
    fn test_perfect_correlation_has_zero_p_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let estimate = Pearson::default().estimate(&x, &y).unwrap();
        assert_eq!(estimate.coefficient, 1.0);
        assert_eq!(estimate.significance.unwrap().p_value_two_tailed, 0.0);
        let interval = estimate.interval.unwrap();
        assert_eq!((interval.lower, interval.upper), (1.0, 1.0));
    }

    #[test]
    fn test_zero_variance_is_degenerate() {
        let err = Pearson::default()
            .estimate(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(LogFactorialCache::new());
        let a = Pearson::with_cache(0.9, cache.clone()).unwrap();
        let b = Pearson::with_cache(0.99, cache.clone()).unwrap();
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..50).map(|i| ((i * 7) % 11) as f64).collect();
        a.estimate(&x, &y).unwrap();
        assert!(cache.len() > 2);
        let grown = cache.len();
        b.estimate(&x, &y).unwrap();
        assert_eq!(cache.len(), grown);
        assert!(Arc::ptr_eq(a.cache(), b.cache()));
    }

    #[test]
    fn test_invalid_level() {
        let err = Pearson::new(1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
}
