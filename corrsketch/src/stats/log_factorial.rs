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

use std::f64::consts::PI;

use parking_lot::RwLock;

/// Largest `n` whose `ln n!` is memoized; larger arguments use Stirling's series.
const MAX_CACHED: usize = 1 << 16;

/// Lazily grown table of `ln n!`.
///
/// Lookups take a shared read lock; only a lookup past the end of the table takes the write lock
/// to extend it. A cache is cheap to share behind an `Arc` between estimators and threads.
///
/// # Examples
///
/// ```
/// # use corrsketch::stats::LogFactorialCache;
/// let cache = LogFactorialCache::new();
/// assert_eq!(cache.ln_factorial(0), 0.0);
/// assert!((cache.ln_factorial(5) - 120f64.ln()).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct LogFactorialCache {
    table: RwLock<Vec<f64>>,
}

impl Default for LogFactorialCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFactorialCache {
    /// Creates a cache holding `ln 0!` and `ln 1!`.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(vec![0.0, 0.0]),
        }
    }

    /// Returns the number of memoized entries.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Returns true if nothing is memoized; never the case for a constructed cache.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Returns `ln n!`.
    pub fn ln_factorial(&self, n: usize) -> f64 {
        if n > MAX_CACHED {
            return stirling_ln_factorial(n as f64);
        }
        if let Some(&value) = self.table.read().get(n) {
            return value;
        }

        let mut table = self.table.write();
        // another writer may have grown the table while we waited
        while table.len() <= n {
            let i = table.len();
            let next = table[i - 1] + (i as f64).ln();
            table.push(next);
        }
        table[n]
    }

    /// Returns `ln Γ(m / 2)` for a positive integer `m`.
    pub fn ln_gamma_half(&self, m: usize) -> f64 {
        assert!(m > 0, "gamma is undefined at zero");
        if m % 2 == 0 {
            // Γ(n) = (n - 1)!
            self.ln_factorial(m / 2 - 1)
        } else {
            // Γ(n + 1/2) = (2n)! √π / (4^n n!)
            let n = m / 2;
            self.ln_factorial(2 * n) + 0.5 * PI.ln()
                - n as f64 * 4f64.ln()
                - self.ln_factorial(n)
        }
    }

    /// Returns `ln B(a / 2, b / 2)` for positive integers `a` and `b`.
    pub fn ln_beta_half(&self, a: usize, b: usize) -> f64 {
        self.ln_gamma_half(a) + self.ln_gamma_half(b) - self.ln_gamma_half(a + b)
    }
}

fn stirling_ln_factorial(n: f64) -> f64 {
    n * n.ln() - n + 0.5 * (2.0 * PI * n).ln() + 1.0 / (12.0 * n) - 1.0 / (360.0 * n.powi(3))
}
