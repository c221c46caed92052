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

//! Correlation sketches.
//!
//! A [`CorrelationSketch`] wraps any [`Sampler`](crate::synopsis::Sampler) (a [`Kmv`], a
//! [`Gkmv`] or a [`PrioritySketch`]) together with the estimator used to compare it with other
//! sketches. Freezing it yields an [`ImmutableSketch`]: the retained keys sorted ascending with
//! their values, which is what correlations are computed from and what the
//! [sketch index](crate::index) stores.
//!
//! Two sketches of columns that share join keys estimate the correlation of the joined columns
//! by merge-joining their frozen samples; the join itself is never materialized.
//!
//! ```
//! use corrsketch::sketch::CorrelationSketch;
//! use corrsketch::synopsis::Kmv;
//!
//! let mut a = CorrelationSketch::new(Kmv::builder().k(128).build().unwrap());
//! let mut b = CorrelationSketch::new(Kmv::builder().k(128).build().unwrap());
//! for i in 0..1000 {
//!     let key = format!("row-{i}");
//!     a.update(&key, i as f64);
//!     b.update(&key, 2.0 * i as f64 + (i % 7) as f64);
//! }
//! let estimate = a.correlation_to(&b).unwrap();
//! assert!(estimate.coefficient > 0.99);
//! ```
//!
//! [`Kmv`]: crate::synopsis::Kmv
//! [`Gkmv`]: crate::synopsis::Gkmv
//! [`PrioritySketch`]: crate::priority::PrioritySketch

mod correlation_sketch;
mod immutable;
mod serialization;

pub use self::correlation_sketch::CorrelationSketch;
pub use self::immutable::ImmutableSketch;
