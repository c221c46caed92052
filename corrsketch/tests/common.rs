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

use corrsketch::sketch::CorrelationSketch;
use corrsketch::sketch::ImmutableSketch;
use corrsketch::synopsis::Kmv;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Builds a frozen KMV sketch of the given string-keyed column.
#[allow(dead_code)] // false-positive
pub fn column_sketch(keys: &[&str], values: &[f64]) -> ImmutableSketch {
    assert_eq!(keys.len(), values.len());
    let mut sketch = CorrelationSketch::new(Kmv::builder().build().unwrap());
    for (key, &value) in keys.iter().zip(values) {
        sketch.update(key, value);
    }
    sketch.freeze()
}

/// Returns `n` rows `(key, x, y)` where `y = slope * x + noise`, reproducibly from `seed`.
#[allow(dead_code)] // false-positive
pub fn correlated_rows(n: usize, slope: f64, noise: f64, seed: u64) -> Vec<(String, f64, f64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let x: f64 = rng.random_range(-100.0..100.0);
            let y = slope * x + rng.random_range(-noise..=noise);
            (format!("key-{i}"), x, y)
        })
        .collect()
}
