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

//! Joins of key/value columns on their key hashes.
//!
//! [`merge_join`] pairs two key arrays that are sorted ascending in one linear pass; it is how
//! sketches line up their samples. [`Table`] is the exact counterpart: a whole column joined
//! without sampling, used to validate sketch estimates.

use std::collections::BTreeMap;

use crate::aggregate::AggregateFunction;
use crate::aggregate::Aggregator;
use crate::error::Error;

/// Values of two columns aligned on their shared keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairedSample {
    /// Shared keys, ascending.
    pub keys: Vec<i32>,
    /// Values of the left column.
    pub x: Vec<f64>,
    /// Values of the right column.
    pub y: Vec<f64>,
}

impl PairedSample {
    /// Returns the number of pairs.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the columns share no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the same pairs with the columns exchanged.
    pub fn swapped(self) -> Self {
        Self {
            keys: self.keys,
            x: self.y,
            y: self.x,
        }
    }
}

/// Merge-joins two columns whose keys are sorted ascending.
///
/// Keys present in both columns produce one pair per combination of their rows, so unique keys
/// produce exactly one pair. Runs in `O(|a| + |b| + pairs)`.
///
/// Both key slices must be sorted ascending and the same length as their value slices; violating
/// this is a logic error that yields an incomplete join.
///
/// # Examples
///
/// ```
/// # use corrsketch::join::merge_join;
/// let paired = merge_join(&[1, 3, 5], &[10.0, 30.0, 50.0], &[3, 4, 5], &[0.3, 0.4, 0.5]);
/// assert_eq!(paired.keys, vec![3, 5]);
/// assert_eq!(paired.x, vec![30.0, 50.0]);
/// assert_eq!(paired.y, vec![0.3, 0.5]);
/// ```
pub fn merge_join(
    keys_a: &[i32],
    values_a: &[f64],
    keys_b: &[i32],
    values_b: &[f64],
) -> PairedSample {
    debug_assert!(keys_a.is_sorted() && keys_b.is_sorted());
    debug_assert_eq!(keys_a.len(), values_a.len());
    debug_assert_eq!(keys_b.len(), values_b.len());

    let mut paired = PairedSample::default();
    let (mut i, mut j) = (0, 0);
    while i < keys_a.len() && j < keys_b.len() {
        let key = keys_a[i];
        if key < keys_b[j] {
            i += 1;
        } else if key > keys_b[j] {
            j += 1;
        } else {
            let run_a = run_end(keys_a, i);
            let run_b = run_end(keys_b, j);
            for &x in &values_a[i..run_a] {
                for &y in &values_b[j..run_b] {
                    paired.keys.push(key);
                    paired.x.push(x);
                    paired.y.push(y);
                }
            }
            i = run_a;
            j = run_b;
        }
    }
    paired
}

/// Returns the end of the run of keys equal to `keys[start]`.
fn run_end(keys: &[i32], start: usize) -> usize {
    let key = keys[start];
    start + keys[start..].iter().take_while(|&&k| k == key).count()
}

/// How the values of a column are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnType {
    /// Quantities.
    #[default]
    Numerical,
    /// Category codes.
    Categorical,
}

/// A typed value column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    /// Column values.
    pub values: Vec<f64>,
    /// Value interpretation.
    pub column_type: ColumnType,
}

impl Column {
    /// Creates a numerical column.
    pub fn numerical(values: Vec<f64>) -> Self {
        Self {
            values,
            column_type: ColumnType::Numerical,
        }
    }

    /// Creates a categorical column.
    pub fn categorical(values: Vec<f64>) -> Self {
        Self {
            values,
            column_type: ColumnType::Categorical,
        }
    }
}

/// A key/value column with keys sorted ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    keys: Vec<i32>,
    values: Column,
    unique_keys: bool,
}

impl Table {
    /// Creates a table from aligned keys and values, sorting rows by key.
    ///
    /// Rows with equal keys keep their input order.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration)
    /// if `keys` and `values` differ in length.
    pub fn new(keys: Vec<i32>, values: Column) -> Result<Self, Error> {
        if keys.len() != values.values.len() {
            return Err(Error::invalid_config("table keys and values differ in length")
                .with_context("keys", keys.len())
                .with_context("values", values.values.len()));
        }

        let rows = keys.into_iter().zip(values.values).collect();
        Ok(Self::from_rows(rows, values.column_type))
    }

    /// Creates a numerical table from `(key, value)` rows.
    ///
    /// Unless `aggregate` is [`AggregateFunction::None`], rows sharing a key are folded into one
    /// and the table has unique keys.
    ///
    /// # Examples
    ///
    /// ```
    /// # use corrsketch::aggregate::AggregateFunction;
    /// # use corrsketch::join::Table;
    /// let table = Table::from_pairs([(2, 1.0), (1, 5.0), (2, 3.0)], AggregateFunction::Sum);
    /// assert_eq!(table.keys(), &[1, 2]);
    /// assert_eq!(table.values().values, vec![5.0, 4.0]);
    /// assert!(table.unique_keys());
    /// ```
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (i32, f64)>,
        aggregate: AggregateFunction,
    ) -> Self {
        if !aggregate.aggregates() {
            return Self::from_rows(pairs.into_iter().collect(), ColumnType::Numerical);
        }

        let mut groups: BTreeMap<i32, Aggregator> = BTreeMap::new();
        for (key, value) in pairs {
            groups
                .entry(key)
                .or_insert_with(|| aggregate.aggregator())
                .update(value);
        }
        let (keys, values) = groups
            .into_iter()
            .map(|(key, aggregator)| (key, aggregator.value()))
            .unzip();
        Self {
            keys,
            values: Column::numerical(values),
            unique_keys: true,
        }
    }

    fn from_rows(mut rows: Vec<(i32, f64)>, column_type: ColumnType) -> Self {
        // stable, so rows sharing a key keep their input order
        rows.sort_by_key(|&(key, _)| key);
        let unique_keys = rows.windows(2).all(|w| w[0].0 != w[1].0);
        let (keys, values) = rows.into_iter().unzip();
        Self {
            keys,
            values: Column {
                values,
                column_type,
            },
            unique_keys,
        }
    }

    /// Returns the keys, ascending.
    pub fn keys(&self) -> &[i32] {
        &self.keys
    }

    /// Returns the value column, aligned with [`Table::keys`].
    pub fn values(&self) -> &Column {
        &self.values
    }

    /// Returns true if no key appears twice.
    pub fn unique_keys(&self) -> bool {
        self.unique_keys
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Joins this table with `other` on their keys; `x` holds this table's values.
    pub fn join(&self, other: &Table) -> PairedSample {
        merge_join(
            &self.keys,
            &self.values.values,
            &other.keys,
            &other.values.values,
        )
    }
}
