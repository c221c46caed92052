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

use corrsketch::aggregate::AggregateFunction;
use corrsketch::correlation::CorrelationEstimator;
use corrsketch::correlation::Pearson;
use corrsketch::error::ErrorKind;
use corrsketch::join::Table;
use corrsketch::priority::PrioritySketch;
use corrsketch::priority::PrioritySketchConfig;
use corrsketch::priority::PriorityWeight;
use corrsketch::sketch::CorrelationSketch;
use corrsketch::synopsis::Sampler;
use googletest::assert_that;
use googletest::prelude::near;

#[test]
fn test_sum_keeps_frequent_key() {
    let config = PrioritySketchConfig {
        aggregate: AggregateFunction::Sum,
        max_size: 3,
        ..Default::default()
    };
    let mut sketch = PrioritySketch::new(config).unwrap();
    let keys = [6, 1, 1, 1, 1, 1, 1, 1, 2, 3, 4, 5];
    let values = [6.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    for (&key, &value) in keys.iter().zip(&values) {
        sketch.update(key, value);
    }

    let samples = sketch.samples();
    assert!(samples.unique_keys);
    assert_eq!(samples.len(), 3);
    let position = samples.keys.iter().position(|&k| k == 1).unwrap();
    assert_eq!(samples.values[position], 7.0);
    assert_eq!(sketch.num_keys(), 6);
    assert!(sketch.threshold() > 0.0);
}

#[test]
fn test_frequent_keys_are_preferred() {
    let config = PrioritySketchConfig {
        aggregate: AggregateFunction::Count,
        max_size: 20,
        ..Default::default()
    };
    let mut sketch = PrioritySketch::new(config).unwrap();
    for key in 0..1000 {
        let repeats = if key < 10 { 100 } else { 1 };
        for _ in 0..repeats {
            sketch.update(key, 1.0);
        }
    }
    let samples = sketch.samples();
    assert_eq!(samples.len(), 20);
    for heavy in 0..10 {
        let position = samples.keys.iter().position(|&k| k == heavy).unwrap();
        assert_eq!(samples.values[position], 100.0);
    }
}

#[test]
fn test_without_aggregation_rows_repeat() {
    let config = PrioritySketchConfig {
        aggregate: AggregateFunction::None,
        max_size: 20,
        ..Default::default()
    };
    let mut sketch = PrioritySketch::new(config).unwrap();
    for key in 0..1000 {
        let repeats = if key < 10 { 100 } else { 1 };
        for row in 0..repeats {
            sketch.update(key, row as f64);
        }
    }
    let samples = sketch.samples();
    assert!(!samples.unique_keys);
    assert_eq!(samples.len(), 10 * 100 + 10);
}

#[test]
fn test_magnitude_weighting_prefers_large_values() {
    let config = PrioritySketchConfig {
        aggregate: AggregateFunction::Mean,
        max_size: 5,
        weighting: PriorityWeight::Magnitude,
    };
    let mut sketch = PrioritySketch::new(config).unwrap();
    for key in 0..500 {
        let value = if key % 100 == 7 { -1e9 } else { 1.0 };
        sketch.update(key, value);
    }
    let samples = sketch.samples();
    for big in [7, 107, 207, 307, 407] {
        assert!(samples.keys.contains(&big), "key {big} not retained");
    }
}

#[test]
fn test_one_to_many_join_matches_exact() {
    let config = PrioritySketchConfig {
        aggregate: AggregateFunction::None,
        max_size: 256,
        ..Default::default()
    };
    let mut many = CorrelationSketch::new(PrioritySketch::new(config).unwrap());
    let mut one =
        CorrelationSketch::new(PrioritySketch::new(PrioritySketchConfig::default()).unwrap());
    let mut many_rows = vec![];
    let mut one_rows = vec![];
    for key in 0..200 {
        for row in 0..=(key % 5) {
            let value = key as f64 + (row % 3) as f64;
            many.update_hash(key, value);
            many_rows.push((key, value));
        }
        one.update_hash(key, 2.0 * key as f64);
        one_rows.push((key, 2.0 * key as f64));
    }

    let estimate = many.correlation_to(&one).unwrap();
    let exact_join = Table::from_pairs(many_rows, AggregateFunction::None)
        .join(&Table::from_pairs(one_rows, AggregateFunction::None));
    let exact = Pearson::default()
        .estimate(&exact_join.x, &exact_join.y)
        .unwrap();
    assert_eq!(estimate.sample_size, exact_join.len());
    assert_that!(estimate.coefficient, near(exact.coefficient, 1e-12));
}

#[test]
fn test_zero_capacity_is_rejected() {
    let config = PrioritySketchConfig {
        max_size: 0,
        ..Default::default()
    };
    let err = PrioritySketch::new(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}
