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

//! Aggregation of values that share a join key.
//!
//! When a key repeats in a column (a one-to-many join), sketches fold the repeated values into one
//! with an [`AggregateFunction`]. Folding is streaming: an [`Aggregator`] holds constant state no
//! matter how many values it has seen.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Fold operator applied to the values of a repeated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggregateFunction {
    /// Sum of all values.
    Sum,
    /// Arithmetic mean, maintained as a running average.
    Mean,
    /// Largest value.
    Max,
    /// Smallest value.
    Min,
    /// First value seen.
    #[default]
    First,
    /// Last value seen.
    Last,
    /// Number of values seen.
    Count,
    /// No aggregation: repeated keys are kept as separate rows where the sketch allows it, and
    /// fold like [`AggregateFunction::First`] where it does not.
    None,
}

impl AggregateFunction {
    /// All functions, in registry order.
    pub const ALL: [AggregateFunction; 8] = [
        AggregateFunction::Sum,
        AggregateFunction::Mean,
        AggregateFunction::Max,
        AggregateFunction::Min,
        AggregateFunction::First,
        AggregateFunction::Last,
        AggregateFunction::Count,
        AggregateFunction::None,
    ];

    /// Returns the registry name of this function.
    pub const fn name(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Mean => "MEAN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
            AggregateFunction::First => "FIRST",
            AggregateFunction::Last => "LAST",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::None => "NONE",
        }
    }

    /// Returns true unless this is [`AggregateFunction::None`].
    pub const fn aggregates(self) -> bool {
        !matches!(self, AggregateFunction::None)
    }

    /// Creates an empty fold state for this function.
    pub fn aggregator(self) -> Aggregator {
        Aggregator::new(self)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateFunction {
    type Err = Error;

    /// Looks a function up by its registry name, ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```
    /// # use corrsketch::aggregate::AggregateFunction;
    /// let f: AggregateFunction = "mean".parse().unwrap();
    /// assert_eq!(f, AggregateFunction::Mean);
    /// assert!("median".parse::<AggregateFunction>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AggregateFunction::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::invalid_config("unknown aggregate function").with_context("name", s)
            })
    }
}

/// Streaming fold state for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregator {
    function: AggregateFunction,
    value: f64,
    count: u64,
}

impl Aggregator {
    /// Creates an empty aggregator.
    pub fn new(function: AggregateFunction) -> Self {
        Self {
            function,
            value: 0.0,
            count: 0,
        }
    }

    /// Creates an aggregator that has already seen `value`.
    pub fn with_value(function: AggregateFunction, value: f64) -> Self {
        let mut aggregator = Self::new(function);
        aggregator.update(value);
        aggregator
    }

    /// Folds one more value into the state.
    pub fn update(&mut self, x: f64) {
        self.count += 1;
        if self.count == 1 {
            self.value = match self.function {
                AggregateFunction::Count => 1.0,
                _ => x,
            };
            return;
        }
        match self.function {
            AggregateFunction::Sum => self.value += x,
            AggregateFunction::Mean => self.value += (x - self.value) / self.count as f64,
            AggregateFunction::Max => self.value = self.value.max(x),
            AggregateFunction::Min => self.value = self.value.min(x),
            AggregateFunction::Last => self.value = x,
            AggregateFunction::Count => self.value = self.count as f64,
            AggregateFunction::First | AggregateFunction::None => {}
        }
    }

    /// Returns the aggregated value; `0.0` before any update.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns how many values have been folded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the fold operator.
    pub fn function(&self) -> AggregateFunction {
        self.function
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn fold(function: AggregateFunction, values: &[f64]) -> f64 {
        let mut aggregator = function.aggregator();
        for &v in values {
            aggregator.update(v);
        }
        aggregator.value()
    }

    #[test]
    fn test_fold_operators() {
        let values = [3.0, -1.0, 4.0, 1.0, 5.0];
        assert_eq!(fold(AggregateFunction::Sum, &values), 12.0);
        assert!((fold(AggregateFunction::Mean, &values) - 2.4).abs() < 1e-12);
        assert_eq!(fold(AggregateFunction::Max, &values), 5.0);
        assert_eq!(fold(AggregateFunction::Min, &values), -1.0);
        assert_eq!(fold(AggregateFunction::First, &values), 3.0);
        assert_eq!(fold(AggregateFunction::Last, &values), 5.0);
        assert_eq!(fold(AggregateFunction::Count, &values), 5.0);
        assert_eq!(fold(AggregateFunction::None, &values), 3.0);
    }

    #[test]
    fn test_empty_aggregator() {
        let aggregator = AggregateFunction::Sum.aggregator();
        assert_eq!(aggregator.count(), 0);
        assert_eq!(aggregator.value(), 0.0);
    }

    #[test]
    fn test_registry_round_trip_by_name() {
        for function in AggregateFunction::ALL {
            assert_eq!(function.name().parse::<AggregateFunction>().unwrap(), function);
            assert_eq!(function.to_string(), function.name());
        }
        assert_eq!(
            " Sum ".parse::<AggregateFunction>().unwrap(),
            AggregateFunction::Sum
        );
        let err = "avg".parse::<AggregateFunction>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
}
