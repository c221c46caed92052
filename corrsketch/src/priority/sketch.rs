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
use std::collections::HashMap;

use crate::aggregate::AggregateFunction;
use crate::aggregate::Aggregator;
use crate::error::Error;
use crate::hash::order_key;
use crate::synopsis::Sampler;
use crate::synopsis::Samples;

/// Default number of retained keys.
pub const DEFAULT_MAX_SIZE: usize = 256;

/// How a key's weight is measured when computing its priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriorityWeight {
    /// Number of rows carrying the key (PRISK).
    #[default]
    Frequency,
    /// Magnitude of the key's value (WPRISK): `|aggregate|`, or the sum of `|value|` over the
    /// key's rows when no aggregate function is configured.
    Magnitude,
}

/// Configuration of a [`PrioritySketch`], validated once by [`PrioritySketch::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrioritySketchConfig {
    /// Fold operator for the values of a repeated key.
    pub aggregate: AggregateFunction,
    /// Number of distinct keys to retain.
    pub max_size: usize,
    /// Weighting used for priorities.
    pub weighting: PriorityWeight,
}

impl Default for PrioritySketchConfig {
    fn default() -> Self {
        Self {
            aggregate: AggregateFunction::Mean,
            max_size: DEFAULT_MAX_SIZE,
            weighting: PriorityWeight::Frequency,
        }
    }
}

impl PrioritySketchConfig {
    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// If `max_size` is zero, returns
    /// [`ErrorKind::InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration).
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_size == 0 {
            return Err(Error::invalid_config("max_size must be positive")
                .with_context("max_size", self.max_size));
        }
        Ok(())
    }
}

/// Priority sketch (PRISK / WPRISK).
///
/// Only the output sample is bounded: grouping state holds one entry per distinct key seen (and,
/// without an aggregate function, every raw row), and retention is applied when the sample is
/// read by a partial selection over the distinct keys. See the
/// [module level documentation](super) for more.
#[derive(Debug, Clone)]
pub struct PrioritySketch {
    config: PrioritySketchConfig,
    groups: HashMap<i32, Group>,
}

impl PrioritySketch {
    /// Creates an empty sketch.
    ///
    /// # Errors
    ///
    /// Returns the error of [`PrioritySketchConfig::validate`].
    pub fn new(config: PrioritySketchConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            groups: HashMap::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PrioritySketchConfig {
        &self.config
    }

    /// Returns the number of distinct keys seen so far.
    pub fn num_keys(&self) -> usize {
        self.groups.len()
    }

    /// Returns the priority threshold τ: the highest priority among keys that were not retained,
    /// or `0.0` when every key fits.
    pub fn threshold(&self) -> f64 {
        let mut priorities = self.priorities();
        if priorities.len() <= self.config.max_size {
            return 0.0;
        }
        let (_, tau, _) = priorities.select_nth_unstable_by(self.config.max_size, by_priority);
        tau.1
    }

    fn priority(&self, hash: i32, group: &Group) -> f64 {
        let weight = match self.config.weighting {
            PriorityWeight::Frequency => group.aggregator.count() as f64,
            PriorityWeight::Magnitude if self.config.aggregate.aggregates() => {
                group.aggregator.value().abs()
            }
            PriorityWeight::Magnitude => group.abs_sum,
        };
        let u = order_key(hash);
        if weight <= 0.0 || weight.is_nan() {
            0.0
        } else if u == 0.0 {
            f64::INFINITY
        } else {
            weight / u
        }
    }

    fn priorities(&self) -> Vec<(i32, f64)> {
        self.groups
            .iter()
            .map(|(&hash, group)| (hash, self.priority(hash, group)))
            .collect()
    }

    /// The `max_size` retained keys by descending priority.
    fn retained(&self) -> Vec<(i32, f64)> {
        let mut priorities = self.priorities();
        let max_size = self.config.max_size;
        if priorities.len() > max_size {
            priorities.select_nth_unstable_by(max_size, by_priority);
            priorities.truncate(max_size);
        }
        priorities.sort_by(by_priority);
        priorities
    }
}

impl Sampler for PrioritySketch {
    fn update(&mut self, hash: i32, value: f64) {
        let aggregate = self.config.aggregate;
        let group = self.groups.entry(hash).or_insert_with(|| Group {
            aggregator: aggregate.aggregator(),
            abs_sum: 0.0,
            rows: vec![],
        });
        group.aggregator.update(value);
        group.abs_sum += value.abs();
        if !aggregate.aggregates() {
            group.rows.push(value);
        }
    }

    fn samples(&self) -> Samples {
        let mut samples = Samples {
            unique_keys: true,
            ..Default::default()
        };
        for (hash, _) in self.retained() {
            let group = &self.groups[&hash];
            if self.config.aggregate.aggregates() {
                samples.keys.push(hash);
                samples.values.push(group.aggregator.value());
            } else {
                if group.rows.len() > 1 {
                    samples.unique_keys = false;
                }
                for &value in &group.rows {
                    samples.keys.push(hash);
                    samples.values.push(value);
                }
            }
        }
        samples
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// descending priority, ties broken by ascending hash
fn by_priority(a: &(i32, f64), b: &(i32, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

#[derive(Debug, Clone)]
struct Group {
    aggregator: Aggregator,
    abs_sum: f64,
    // raw values, kept only without an aggregate function
    rows: Vec<f64>,
}
