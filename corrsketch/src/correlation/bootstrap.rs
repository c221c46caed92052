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

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::ConfidenceInterval;
use super::CorrelationEstimate;
use super::CorrelationEstimator;
use super::DEFAULT_CONFIDENCE_LEVEL;
use super::check_confidence_level;
use super::check_pairs;
use super::pearson::coefficient;
use crate::error::Error;

/// Default number of bootstrap resamples.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Configuration of a [`Bootstrap`] estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapConfig {
    /// Number of resamples; must be positive.
    pub iterations: usize,
    /// Confidence level of the percentile interval, in `(0, 1)`.
    pub confidence_level: f64,
    /// Seed of the resampling generator. When `None`, every estimate draws a fresh seed.
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            seed: None,
        }
    }
}

impl BootstrapConfig {
    /// Returns this configuration with a fixed seed, making estimates reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Pearson's coefficient with a percentile bootstrap confidence interval.
///
/// Pairs are resampled with replacement `iterations` times and the coefficient of each resample
/// recorded; the interval spans the empirical `(1 - level) / 2` and `(1 + level) / 2` quantiles.
/// Resamples that happen to be constant in either vector have no coefficient and are skipped.
///
/// # Examples
///
/// ```
/// # use corrsketch::correlation::Bootstrap;
/// # use corrsketch::correlation::BootstrapConfig;
/// # use corrsketch::correlation::CorrelationEstimator;
/// let bootstrap = Bootstrap::new(BootstrapConfig::default().with_seed(42)).unwrap();
/// let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
/// let y: Vec<f64> = (0..40).map(|i| i as f64 + (i % 3) as f64).collect();
/// let estimate = bootstrap.estimate(&x, &y).unwrap();
/// let interval = estimate.interval.unwrap();
/// assert!(interval.lower <= estimate.coefficient && estimate.coefficient <= interval.upper);
/// ```
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: BootstrapConfig,
}

impl Bootstrap {
    /// Creates an estimator from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration)
    /// if `iterations` is zero or the confidence level is outside `(0, 1)`.
    pub fn new(config: BootstrapConfig) -> Result<Self, Error> {
        if config.iterations == 0 {
            return Err(Error::invalid_config(
                "bootstrap iterations must be positive",
            ));
        }
        check_confidence_level(config.confidence_level)?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    fn resample(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let n = x.len();
        let mut rx = vec![0.0; n];
        let mut ry = vec![0.0; n];
        let mut estimates = Vec::with_capacity(self.config.iterations);
        for _ in 0..self.config.iterations {
            for i in 0..n {
                let pick = rng.random_range(0..n);
                rx[i] = x[pick];
                ry[i] = y[pick];
            }
            if let Ok(r) = coefficient(&rx, &ry) {
                estimates.push(r);
            }
        }
        estimates.sort_by(f64::total_cmp);
        estimates
    }
}

impl CorrelationEstimator for Bootstrap {
    fn name(&self) -> &'static str {
        "bootstrap"
    }

    fn estimate(&self, x: &[f64], y: &[f64]) -> Result<CorrelationEstimate, Error> {
        check_pairs(x, y)?;
        let r = coefficient(x, y)?;

        let estimates = self.resample(x, y);
        let level = self.config.confidence_level;
        let alpha = 1.0 - level;
        let interval = match (
            quantile(&estimates, alpha / 2.0),
            quantile(&estimates, 1.0 - alpha / 2.0),
        ) {
            (Some(lower), Some(upper)) => Some(ConfidenceInterval {
                lower,
                upper,
                level,
            }),
            _ => None,
        };

        Ok(CorrelationEstimate {
            coefficient: r,
            sample_size: x.len(),
            significance: None,
            interval,
        })
    }
}

/// Linearly interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = q * last as f64;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    let fraction = position - below as f64;
    Some(sorted[below] + (sorted[above] - sorted[below]) * fraction)
}

#[cfg(test)]
mod tests {
    use googletest::assert_that;
    use googletest::prelude::near;

    use super::*;
    use crate::error::ErrorKind;

    fn noisy_line(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y = x
            .iter()
            .map(|v| v + rng.random_range(-10.0..10.0))
            .collect();
        (x, y)
    }

    #[test]
    fn test_invalid_config() {
        let config = BootstrapConfig {
            iterations: 0,
            ..Default::default()
        };
        let err = Bootstrap::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        let config = BootstrapConfig {
            confidence_level: 1.2,
            ..Default::default()
        };
        let err = Bootstrap::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_seeded_estimates_are_reproducible() {
        let (x, y) = noisy_line(60, 3);
        let bootstrap = Bootstrap::new(BootstrapConfig::default().with_seed(11)).unwrap();
        let first = bootstrap.estimate(&x, &y).unwrap();
        let second = bootstrap.estimate(&x, &y).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_interval_brackets_point_estimate() {
        let (x, y) = noisy_line(100, 5);
        let bootstrap = Bootstrap::new(BootstrapConfig::default().with_seed(1)).unwrap();
        let estimate = bootstrap.estimate(&x, &y).unwrap();
        let interval = estimate.interval.unwrap();
        assert_eq!(interval.level, 0.95);
        assert!(interval.lower < interval.upper);
        assert!(interval.contains(estimate.coefficient));
        assert!(estimate.significance.is_none());
    }

    #[test]
    fn test_wider_level_gives_wider_interval() {
        let (x, y) = noisy_line(80, 9);
        let narrow = BootstrapConfig {
            confidence_level: 0.5,
            ..BootstrapConfig::default().with_seed(2)
        };
        let wide = BootstrapConfig {
            confidence_level: 0.99,
            ..BootstrapConfig::default().with_seed(2)
        };
        let narrow = Bootstrap::new(narrow).unwrap().estimate(&x, &y).unwrap();
        let wide = Bootstrap::new(wide).unwrap().estimate(&x, &y).unwrap();
        let (narrow, wide) = (narrow.interval.unwrap(), wide.interval.unwrap());
        assert!(wide.lower <= narrow.lower);
        assert!(wide.upper >= narrow.upper);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 1.0), Some(5.0));
        assert_that!(quantile(&sorted, 0.125).unwrap(), near(1.5, 1e-12));
        assert_eq!(quantile(&[], 0.5), None);
    }
}
